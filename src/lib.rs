//! Souschef: hands-free voice turn-taking for a spoken cooking assistant.
//!
//! The user's hands are busy (and messy), so the whole conversation runs
//! over an always-open microphone: the assistant listens, answers, and
//! keeps listening, and the user can talk over it at any time.
//!
//! # Architecture
//!
//! The controller is a single event loop built from small pure parts:
//! - **Capture**: a [`provider::SpeechCapture`] streams interim and final
//!   transcripts
//! - **Commit**: [`commit::CommitScheduler`] debounces the stream into
//!   discrete utterances
//! - **Echo/barge-in**: [`echo::EchoDiscriminator`] separates the
//!   assistant's own voice from deliberate interruptions
//! - **Intent + reply**: [`intent`] and [`reply`] answer recipe questions
//!   and navigation locally; everything else goes to a
//!   [`provider::ChatBackend`]
//! - **Turn controller**: [`controller::VoiceLoop`] owns the
//!   idle/listening/processing/speaking state machine

pub mod commit;
pub mod config;
pub mod controller;
pub mod directive;
pub mod echo;
pub mod error;
pub mod intent;
pub mod provider;
pub mod recipe;
pub mod reply;
pub mod text;

pub use config::VoiceConfig;
pub use controller::{
    VoiceCommand, VoiceHandle, VoiceLoop, VoiceManager, VoiceSnapshot, VoiceState,
};
pub use error::{Result, VoiceError};
pub use provider::{CaptureEvent, ChatBackend, ChatReply, ChatRequest, SpeechCapture, TtsPlayer};
pub use recipe::{Recipe, RecipeSession};
