//! The voice turn controller.
//!
//! Owns the listening / processing / speaking lifecycle for one cooking
//! session: it drives the capture provider, debounces transcripts into
//! committed utterances, resolves each utterance locally or via the
//! backend, plays the reply, and restarts capture between turns.
//!
//! The loop is a single task consuming discrete events, so the state
//! enum is the one source of truth; there are no flags living in
//! callbacks that can disagree with it. Observers get a [`VoiceSnapshot`]
//! through a watch channel.

use crate::commit::CommitScheduler;
use crate::config::VoiceConfig;
use crate::directive::parse_reply;
use crate::echo::{EchoDiscriminator, FragmentVerdict};
use crate::error::{Result, VoiceError};
use crate::intent::strip_wake_phrase;
use crate::provider::{
    CaptureEvent, ChatBackend, ChatRequest, HistoryEntry, SpeechCapture, TtsPlayer,
};
use crate::recipe::RecipeSession;
use crate::reply::{LocalReply, build_reply, read_step, should_handle_locally};
use crate::text::tokenize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant as TokioInstant, sleep, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Spoken when the backend fails or times out; the user is never left
/// in silence after speaking.
const FALLBACK_APOLOGY: &str =
    "Sorry, I couldn't work that out just now. Could you say it again?";

/// Spoken when the wake phrase arrives with nothing after it.
const WAKE_ACK: &str = "Yes?";

const EVENT_CHANNEL_SIZE: usize = 64;

/// Why the main select loop woke up.
enum Wake {
    Stop,
    Event(Option<CaptureEvent>),
    Command(Option<VoiceCommand>),
    DebounceDue,
}

/// Commands a [`VoiceHandle`] can inject into the running loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceCommand {
    /// Stop any in-progress playback and return to listening.
    Interrupt,
    /// Read the current step aloud.
    AnnounceStep,
}

/// Lifecycle state of the voice loop. Exactly one value at any instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoiceState {
    #[default]
    Idle,
    Listening,
    Processing,
    Speaking,
}

/// Observable session state, published through a watch channel.
#[derive(Debug, Clone, Default)]
pub struct VoiceSnapshot {
    pub state: VoiceState,
    pub loop_active: bool,
    pub current_step: u32,
    /// Latest uncommitted transcript fragment, for live display.
    pub live_transcript: Option<String>,
    pub last_reply: Option<String>,
    pub last_error: Option<String>,
}

/// Remote control for a running [`VoiceLoop`].
#[derive(Debug, Clone)]
pub struct VoiceHandle {
    cancel: CancellationToken,
    commands: mpsc::Sender<VoiceCommand>,
    snapshot: watch::Receiver<VoiceSnapshot>,
}

impl VoiceHandle {
    /// Stop the loop from any state, including mid-turn.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Cut off any in-progress playback and go back to listening.
    pub fn interrupt_and_listen(&self) {
        let _ = self.commands.try_send(VoiceCommand::Interrupt);
    }

    /// Ask the loop to read the current step aloud.
    pub fn announce_current_step(&self) {
        let _ = self.commands.try_send(VoiceCommand::AnnounceStep);
    }

    /// Current session snapshot.
    pub fn snapshot(&self) -> VoiceSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Wait for the next snapshot change.
    pub async fn changed(&mut self) -> Result<VoiceSnapshot> {
        self.snapshot
            .changed()
            .await
            .map_err(|_| VoiceError::Channel("voice loop ended".into()))?;
        Ok(self.snapshot.borrow().clone())
    }
}

/// Current time on the tokio clock, as a `std` instant so the pure
/// sub-components stay runtime-agnostic.
fn now() -> Instant {
    TokioInstant::now().into_std()
}

/// The turn-taking state machine.
pub struct VoiceLoop {
    config: VoiceConfig,
    capture: Arc<dyn SpeechCapture>,
    player: Arc<dyn TtsPlayer>,
    backend: Arc<dyn ChatBackend>,
    session: RecipeSession,
    scheduler: CommitScheduler,
    discriminator: EchoDiscriminator,
    /// One utterance queued while a turn is in flight. Last write wins.
    pending_utterance: Option<String>,
    /// Interruption keyword to merge onto the next committed transcript.
    barge_in_keyword: Option<String>,
    history: Vec<HistoryEntry>,
    /// Mirrors whether the provider has an open capture session; guards
    /// against double starts from overlapping events.
    recognition_active: bool,
    cancel: CancellationToken,
    command_tx: mpsc::Sender<VoiceCommand>,
    /// Taken by `drive`; the loop runs at most once.
    command_rx: Option<mpsc::Receiver<VoiceCommand>>,
    snapshot_tx: watch::Sender<VoiceSnapshot>,
}

impl VoiceLoop {
    pub fn new(
        config: VoiceConfig,
        session: RecipeSession,
        capture: Arc<dyn SpeechCapture>,
        player: Arc<dyn TtsPlayer>,
        backend: Arc<dyn ChatBackend>,
    ) -> Self {
        let scheduler = CommitScheduler::new(config.commit.clone());
        let discriminator = EchoDiscriminator::new(config.echo.clone(), config.wake.name.clone());
        let (snapshot_tx, _) = watch::channel(VoiceSnapshot {
            current_step: session.current_step_number(),
            ..VoiceSnapshot::default()
        });
        let (command_tx, command_rx) = mpsc::channel(8);
        Self {
            config,
            capture,
            player,
            backend,
            session,
            scheduler,
            discriminator,
            pending_utterance: None,
            barge_in_keyword: None,
            history: Vec::new(),
            recognition_active: false,
            cancel: CancellationToken::new(),
            command_tx,
            command_rx: Some(command_rx),
            snapshot_tx,
        }
    }

    /// Control handle; may be cloned and held across the loop's lifetime.
    pub fn handle(&self) -> VoiceHandle {
        VoiceHandle {
            cancel: self.cancel.clone(),
            commands: self.command_tx.clone(),
            snapshot: self.snapshot_tx.subscribe(),
        }
    }

    /// Run the voice loop until a stop command, a fatal error, or
    /// [`VoiceHandle::stop`].
    pub async fn run(mut self) -> Result<()> {
        let result = self.drive().await;
        self.teardown().await;
        result
    }

    async fn drive(&mut self) -> Result<()> {
        // Permission failure is fatal; the loop never starts.
        self.capture.request_permission().await?;
        let Some(mut command_rx) = self.command_rx.take() else {
            return Err(VoiceError::Channel("voice loop already ran".into()));
        };

        let (event_tx, mut event_rx) = mpsc::channel::<CaptureEvent>(EVENT_CHANNEL_SIZE);
        self.start_capture(&event_tx).await?;
        self.set_loop_active(true);
        info!(recipe = %self.session.recipe().title, "voice loop started");

        // Session introduction: name the recipe and read the current step.
        let intro = format!(
            "Let's cook {}. {}",
            self.session.recipe().title,
            read_step(&self.session)
        );
        self.speak(&intro, &mut event_rx, &mut command_rx).await;
        self.restart_capture(&event_tx).await?;
        self.set_state(VoiceState::Listening);
        if let Some(pending) = self.pending_utterance.take()
            && self
                .process_turns(pending, &event_tx, &mut event_rx, &mut command_rx)
                .await?
        {
            return Ok(());
        }

        loop {
            let deadline = self.scheduler.deadline().map(TokioInstant::from_std);
            let wake = {
                let cancel = self.cancel.clone();
                tokio::select! {
                    _ = cancel.cancelled() => Wake::Stop,
                    maybe = event_rx.recv() => Wake::Event(maybe),
                    cmd = command_rx.recv() => Wake::Command(cmd),
                    _ = sleep_until(deadline.unwrap_or_else(TokioInstant::now)),
                            if deadline.is_some() => Wake::DebounceDue,
                }
            };
            match wake {
                Wake::Stop => return Ok(()),
                Wake::Event(None) => {
                    return Err(VoiceError::Channel("capture event stream closed".into()));
                }
                Wake::Event(Some(event)) => {
                    if let Some(utterance) = self.listening_event(event, &event_tx).await?
                        && self
                            .process_turns(utterance, &event_tx, &mut event_rx, &mut command_rx)
                            .await?
                    {
                        return Ok(());
                    }
                }
                // The loop holds a sender, so recv never yields None.
                Wake::Command(None) => {}
                Wake::Command(Some(cmd)) => {
                    self.handle_command(cmd, &event_tx, &mut event_rx, &mut command_rx)
                        .await?;
                }
                Wake::DebounceDue => {
                    if let Some(commit) = self.scheduler.on_deadline(now()) {
                        let utterance = self.merge_barge_in(commit);
                        if self
                            .process_turns(utterance, &event_tx, &mut event_rx, &mut command_rx)
                            .await?
                        {
                            return Ok(());
                        }
                    }
                }
            }
        }
    }

    /// Apply one handle command while listening.
    async fn handle_command(
        &mut self,
        cmd: VoiceCommand,
        event_tx: &mpsc::Sender<CaptureEvent>,
        event_rx: &mut mpsc::Receiver<CaptureEvent>,
        command_rx: &mut mpsc::Receiver<VoiceCommand>,
    ) -> Result<()> {
        match cmd {
            VoiceCommand::Interrupt => {
                // Playback interrupts are handled inside `speak`; here the
                // assistant is silent, so just drop anything half-heard.
                self.scheduler.cancel();
                self.pending_utterance = None;
                self.barge_in_keyword = None;
                self.set_draft(None);
                let _ = self.player.stop().await;
            }
            VoiceCommand::AnnounceStep => {
                let line = read_step(&self.session);
                self.speak(&line, event_rx, command_rx).await;
                self.restart_capture(event_tx).await?;
                self.set_state(VoiceState::Listening);
            }
        }
        Ok(())
    }

    // ── listening ───────────────────────────────────────────────────

    /// Handle one capture event while listening. Returns a committed
    /// utterance when one becomes ready.
    async fn listening_event(
        &mut self,
        event: CaptureEvent,
        event_tx: &mpsc::Sender<CaptureEvent>,
    ) -> Result<Option<String>> {
        match event {
            CaptureEvent::Start => {
                self.recognition_active = true;
            }
            CaptureEvent::SpeechStart => {}
            CaptureEvent::SpeechEnd => self.scheduler.on_speech_end(now()),
            CaptureEvent::End => {
                self.recognition_active = false;
                if !self.cancel.is_cancelled() {
                    self.restart_capture(event_tx).await?;
                }
            }
            CaptureEvent::Error { code, message } => {
                self.recognition_error(code, message, event_tx).await?;
            }
            CaptureEvent::Transcript { text, is_final } => {
                return Ok(self.transcript(&text, is_final));
            }
        }
        Ok(None)
    }

    /// Run one transcript fragment through the discriminator and the
    /// commit scheduler.
    fn transcript(&mut self, text: &str, is_final: bool) -> Option<String> {
        match self.discriminator.classify(text, is_final, now()) {
            FragmentVerdict::Echo => {
                debug!(fragment = %text, "echo dropped");
                None
            }
            FragmentVerdict::Suppressed => {
                debug!(fragment = %text, "fragment suppressed");
                None
            }
            FragmentVerdict::Interruption { keyword } => {
                // Nothing is playing here; this came from a cooldown
                // command token or the wake phrase. Keep the keyword so
                // it survives even if the rest arrives separately.
                if let Some(k) = keyword {
                    self.barge_in_keyword.get_or_insert(k);
                }
                self.feed_scheduler(text, is_final)
            }
            FragmentVerdict::Speech => self.feed_scheduler(text, is_final),
        }
    }

    /// Feed the scheduler, keeping the published live draft in sync.
    fn feed_scheduler(&mut self, text: &str, is_final: bool) -> Option<String> {
        match self.scheduler.on_transcript(text, is_final, now()) {
            Some(commit) => {
                self.set_draft(None);
                Some(self.merge_barge_in(commit))
            }
            None => {
                self.set_draft(if is_final { None } else { Some(text.to_owned()) });
                None
            }
        }
    }

    async fn recognition_error(
        &mut self,
        code: String,
        message: String,
        event_tx: &mpsc::Sender<CaptureEvent>,
    ) -> Result<()> {
        if code == "not-allowed" || code == "service-not-allowed" {
            return Err(VoiceError::Permission(message));
        }
        let err = VoiceError::Recognition { code, message };
        if err.is_recoverable_recognition() {
            debug!(%err, "recoverable recognition error, restarting capture");
        } else {
            warn!(%err, "recognition error, restarting capture");
            self.set_error(err.to_string());
        }
        self.recognition_active = false;
        sleep(Duration::from_millis(self.config.capture.retry_delay_ms)).await;
        self.restart_capture(event_tx).await
    }

    /// Prefix a stored interruption keyword onto a committed transcript
    /// unless its words already arrived with the rest of the phrase.
    fn merge_barge_in(&mut self, utterance: String) -> String {
        let Some(keyword) = self.barge_in_keyword.take() else {
            return utterance;
        };
        let present = tokenize(&utterance);
        if tokenize(&keyword).iter().all(|t| present.contains(t)) {
            utterance
        } else {
            format!("{keyword} {utterance}")
        }
    }

    // ── processing ──────────────────────────────────────────────────

    /// Process one committed utterance, then drain the pending slot
    /// until no turn is queued. Returns true when the session should end.
    async fn process_turns(
        &mut self,
        first: String,
        event_tx: &mpsc::Sender<CaptureEvent>,
        event_rx: &mut mpsc::Receiver<CaptureEvent>,
        command_rx: &mut mpsc::Receiver<VoiceCommand>,
    ) -> Result<bool> {
        let mut utterance = first;
        loop {
            if self
                .process_one(utterance, event_tx, event_rx, command_rx)
                .await?
            {
                return Ok(true);
            }
            match self.pending_utterance.take() {
                Some(next) => utterance = next,
                None => return Ok(false),
            }
        }
    }

    async fn process_one(
        &mut self,
        utterance: String,
        event_tx: &mpsc::Sender<CaptureEvent>,
        event_rx: &mut mpsc::Receiver<CaptureEvent>,
        command_rx: &mut mpsc::Receiver<VoiceCommand>,
    ) -> Result<bool> {
        // A debounce scheduled for the previous turn must not fire into
        // this one.
        self.scheduler.cancel();
        self.set_draft(None);
        self.set_state(VoiceState::Processing);
        info!(%utterance, "processing utterance");

        let command = strip_wake_phrase(&utterance, &self.config.wake.name);
        let reply = if command.is_empty() {
            // The wake phrase was the whole utterance.
            LocalReply {
                text: WAKE_ACK.to_owned(),
                stop_loop: false,
            }
        } else if should_handle_locally(&command, &self.session) {
            build_reply(&command, &mut self.session)
        } else {
            self.backend_reply(&command, event_rx).await
        };

        self.history.push(HistoryEntry {
            user: if command.is_empty() { utterance } else { command },
            assistant: reply.text.clone(),
        });
        let limit = self.config.turn.history_limit;
        if self.history.len() > limit {
            let excess = self.history.len() - limit;
            self.history.drain(..excess);
        }

        self.speak(&reply.text, event_rx, command_rx).await;
        if reply.stop_loop {
            return Ok(true);
        }

        // Abort and reopen rather than resume: a continuous session
        // otherwise replays every prior utterance into future events.
        self.restart_capture(event_tx).await?;
        self.set_state(VoiceState::Listening);
        Ok(false)
    }

    /// Forward an utterance to the conversational backend, applying the
    /// responding ceiling and the step directive in its reply. Capture
    /// events arriving meanwhile feed the pending slot.
    async fn backend_reply(
        &mut self,
        command: &str,
        event_rx: &mut mpsc::Receiver<CaptureEvent>,
    ) -> LocalReply {
        let backend = Arc::clone(&self.backend);
        let request = ChatRequest {
            utterance: command.to_owned(),
            current_step: self.session.current_step_number(),
            recipe: self.session.recipe().clone(),
            history: self.history.clone(),
        };
        let call = async move { backend.chat(request).await };
        tokio::pin!(call);
        let ceiling =
            TokioInstant::now() + Duration::from_millis(self.config.turn.responding_ceiling_ms);

        let text = loop {
            let deadline = self.scheduler.deadline().map(TokioInstant::from_std);
            tokio::select! {
                result = &mut call => match result {
                    Ok(reply) => break reply.text,
                    Err(err) => {
                        warn!(%err, "backend call failed");
                        self.set_error(err.to_string());
                        break FALLBACK_APOLOGY.to_owned();
                    }
                },
                _ = sleep_until(ceiling) => {
                    warn!("backend response overdue, completing turn");
                    self.set_error("backend response overdue".to_owned());
                    break FALLBACK_APOLOGY.to_owned();
                }
                maybe = event_rx.recv() => {
                    if let Some(event) = maybe {
                        self.absorb_event(event);
                    }
                }
                _ = sleep_until(deadline.unwrap_or_else(TokioInstant::now)),
                        if deadline.is_some() => {
                    if let Some(commit) = self.scheduler.on_deadline(now()) {
                        let merged = self.merge_barge_in(commit);
                        self.pending_utterance = Some(merged);
                    }
                }
            }
        };

        let parsed = parse_reply(&text);
        if let Some(step) = parsed.step {
            let outcome = self.session.go_to(i64::from(step));
            debug!(?outcome, "backend step directive applied");
        }
        let spoken = if parsed.spoken.is_empty() {
            // Directive-only reply; read the step we just moved to.
            read_step(&self.session)
        } else {
            parsed.spoken
        };
        LocalReply {
            text: spoken,
            stop_loop: false,
        }
    }

    /// Handle a capture event that arrives while a turn is in flight.
    /// Committed utterances land in the pending slot, newest wins.
    fn absorb_event(&mut self, event: CaptureEvent) {
        match event {
            CaptureEvent::Start => self.recognition_active = true,
            CaptureEvent::End | CaptureEvent::Error { .. } => {
                // Capture is reopened after the turn completes anyway.
                self.recognition_active = false;
            }
            CaptureEvent::SpeechStart => {}
            CaptureEvent::SpeechEnd => self.scheduler.on_speech_end(now()),
            CaptureEvent::Transcript { text, is_final } => {
                if let Some(utterance) = self.transcript(&text, is_final) {
                    self.pending_utterance = Some(utterance);
                }
            }
        }
    }

    // ── speaking ────────────────────────────────────────────────────

    /// Play one reply, watching capture events for barge-in. Playback
    /// failures and timeouts complete the turn rather than hanging it.
    async fn speak(
        &mut self,
        text: &str,
        event_rx: &mut mpsc::Receiver<CaptureEvent>,
        command_rx: &mut mpsc::Receiver<VoiceCommand>,
    ) {
        self.discriminator.record_reply(text);
        self.set_state(VoiceState::Speaking);
        self.set_reply(text);
        self.discriminator.playback_started();

        let player = Arc::clone(&self.player);
        let line = text.to_owned();
        let playback = async move { player.speak(&line).await };
        tokio::pin!(playback);
        let timeout_at =
            TokioInstant::now() + Duration::from_millis(self.config.turn.playback_timeout_ms);
        let cancel = self.cancel.clone();

        loop {
            tokio::select! {
                result = &mut playback => {
                    if let Err(err) = result {
                        warn!(%err, "playback failed");
                        self.set_error(err.to_string());
                    }
                    break;
                }
                _ = sleep_until(timeout_at) => {
                    warn!("playback timed out, stopping");
                    self.set_error("playback timed out".to_owned());
                    let _ = self.player.stop().await;
                    break;
                }
                _ = cancel.cancelled() => {
                    let _ = self.player.stop().await;
                    break;
                }
                cmd = command_rx.recv() => {
                    match cmd {
                        Some(VoiceCommand::Interrupt) => {
                            info!("interrupt requested, stopping playback");
                            let _ = self.player.stop().await;
                            break;
                        }
                        // A step announcement cannot preempt one already
                        // being spoken.
                        Some(VoiceCommand::AnnounceStep) | None => {}
                    }
                }
                maybe = event_rx.recv() => {
                    let Some(event) = maybe else { break; };
                    if let CaptureEvent::Transcript { text, is_final } = event {
                        match self.discriminator.classify(&text, is_final, now()) {
                            FragmentVerdict::Interruption { keyword } => {
                                info!(fragment = %text, "barge-in, stopping playback");
                                if let Some(k) = keyword {
                                    self.barge_in_keyword = Some(k);
                                }
                                let _ = self.player.stop().await;
                                // Seed the scheduler so a short command
                                // commits even if nothing else follows.
                                if let Some(merged) = self.feed_scheduler(&text, is_final) {
                                    self.pending_utterance = Some(merged);
                                }
                                break;
                            }
                            FragmentVerdict::Echo | FragmentVerdict::Suppressed => {}
                            FragmentVerdict::Speech => {
                                if let Some(merged) = self.feed_scheduler(&text, is_final) {
                                    self.pending_utterance = Some(merged);
                                }
                            }
                        }
                    } else {
                        self.absorb_event(event);
                    }
                }
            }
        }
        self.discriminator.playback_stopped(now());
    }

    // ── capture lifecycle ───────────────────────────────────────────

    async fn start_capture(&mut self, event_tx: &mpsc::Sender<CaptureEvent>) -> Result<()> {
        if self.recognition_active {
            return Ok(());
        }
        self.capture.start(event_tx.clone()).await?;
        self.recognition_active = true;
        Ok(())
    }

    async fn restart_capture(&mut self, event_tx: &mpsc::Sender<CaptureEvent>) -> Result<()> {
        let _ = self.capture.abort().await;
        self.recognition_active = false;
        self.start_capture(event_tx).await
    }

    async fn teardown(&mut self) {
        self.scheduler.reset();
        self.pending_utterance = None;
        self.barge_in_keyword = None;
        self.set_draft(None);
        if self.player.is_speaking() {
            let _ = self.player.stop().await;
        }
        // A spoken stop command closes capture cleanly; cancellation
        // from the handle tears it down hard.
        if self.cancel.is_cancelled() {
            let _ = self.capture.abort().await;
        } else {
            let _ = self.capture.stop().await;
        }
        self.recognition_active = false;
        self.set_state(VoiceState::Idle);
        self.set_loop_active(false);
        info!("voice loop stopped");
    }

    // ── snapshot ────────────────────────────────────────────────────

    fn set_state(&mut self, state: VoiceState) {
        let step = self.session.current_step_number();
        self.snapshot_tx.send_modify(|s| {
            s.state = state;
            s.current_step = step;
        });
    }

    fn set_loop_active(&mut self, active: bool) {
        self.snapshot_tx.send_modify(|s| s.loop_active = active);
    }

    fn set_draft(&mut self, draft: Option<String>) {
        self.snapshot_tx.send_modify(|s| s.live_transcript = draft);
    }

    fn set_reply(&mut self, text: &str) {
        let text = text.to_owned();
        self.snapshot_tx.send_modify(|s| s.last_reply = Some(text));
    }

    fn set_error(&mut self, message: String) {
        self.snapshot_tx
            .send_modify(|s| s.last_error = Some(message));
    }
}

/// Owner-side switch over the voice loop. A [`VoiceLoop`] is consumed
/// by [`VoiceLoop::run`], so the manager holds a builder and spawns a
/// fresh loop each time the session is switched on.
///
/// Must be used inside a tokio runtime.
pub struct VoiceManager<F>
where
    F: FnMut() -> VoiceLoop,
{
    build: F,
    running: Option<(VoiceHandle, JoinHandle<Result<()>>)>,
}

impl<F> VoiceManager<F>
where
    F: FnMut() -> VoiceLoop,
{
    pub fn new(build: F) -> Self {
        Self {
            build,
            running: None,
        }
    }

    /// Whether a spawned loop is still alive. A loop winding down after
    /// [`VoiceManager::stop`] still counts until its task finishes.
    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|(_, join)| !join.is_finished())
    }

    /// Start the loop if it is not already running. Returns the control
    /// handle either way.
    pub fn start(&mut self) -> VoiceHandle {
        if let Some((handle, join)) = &self.running
            && !join.is_finished()
        {
            return handle.clone();
        }
        let voice = (self.build)();
        let handle = voice.handle();
        let join = tokio::spawn(voice.run());
        self.running = Some((handle.clone(), join));
        handle
    }

    /// Signal the running loop to stop. No-op when nothing is running.
    pub fn stop(&self) {
        if let Some((handle, _)) = &self.running {
            handle.stop();
        }
    }

    /// Flip the loop: start it when stopped, stop it when running.
    /// Returns the handle of a freshly started loop, `None` when the
    /// call stopped one instead.
    pub fn toggle(&mut self) -> Option<VoiceHandle> {
        if self.is_running() {
            self.stop();
            None
        } else {
            Some(self.start())
        }
    }
}
