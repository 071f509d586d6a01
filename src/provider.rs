//! Provider contracts for speech capture, audio playback, and the
//! conversational backend.
//!
//! The voice loop is written entirely against these traits. Production
//! code plugs in a real recognizer, synthesizer, and remote model; tests
//! and the simulator plug in scripted stand-ins.

use crate::error::Result;
use crate::recipe::Recipe;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Event emitted by a speech-capture session.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureEvent {
    /// Capture session opened and listening.
    Start,
    /// The recognizer detected the onset of user speech.
    SpeechStart,
    /// The recognizer detected the end of user speech.
    SpeechEnd,
    /// A transcript, interim or final.
    Transcript { text: String, is_final: bool },
    /// Capture session closed (end of stream or abort).
    End,
    /// Recognition error. `code` is the provider's error identifier
    /// ("no-speech", "aborted", "not-allowed", ...).
    Error { code: String, message: String },
}

/// Speech-capture contract. Implementations own the microphone session
/// and stream [`CaptureEvent`]s to the supplied channel.
#[async_trait]
pub trait SpeechCapture: Send + Sync {
    /// Ask for microphone and recognition permission. Must be called
    /// before the first `start`; failure means the loop cannot run.
    async fn request_permission(&self) -> Result<()>;

    /// Open a capture session. Events flow into `events` until the
    /// session ends or is aborted.
    async fn start(&self, events: mpsc::Sender<CaptureEvent>) -> Result<()>;

    /// Close the session gracefully, letting buffered results flush.
    async fn stop(&self) -> Result<()>;

    /// Tear the session down immediately, discarding buffered results.
    /// Used between turns: a continuous session otherwise accumulates
    /// every prior utterance into future events.
    async fn abort(&self) -> Result<()>;
}

/// Text-to-speech playback contract.
#[async_trait]
pub trait TtsPlayer: Send + Sync {
    /// Synthesize and play `text`, resolving when playback finishes.
    async fn speak(&self, text: &str) -> Result<()>;

    /// Stop any in-progress playback immediately.
    async fn stop(&self) -> Result<()>;

    /// Whether audio is currently playing.
    fn is_speaking(&self) -> bool;
}

/// One prior exchange, for backend context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub user: String,
    pub assistant: String,
}

/// Request forwarded to the conversational backend when no local reply
/// applies.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub utterance: String,
    pub current_step: u32,
    pub recipe: Recipe,
    pub history: Vec<HistoryEntry>,
}

/// Backend reply. `text` may still carry an embedded step directive;
/// the controller parses and strips it before speaking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub text: String,
}

/// Conversational backend contract.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Resolve one user utterance into a reply.
    async fn chat(&self, request: ChatRequest) -> Result<ChatReply>;
}
