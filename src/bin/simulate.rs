//! Scripted end-to-end demo of the voice loop.
//!
//! Runs a short cooking session against stand-in providers: a capture
//! device that replays a scripted conversation, a player that "speaks"
//! by logging, and a canned backend. Useful for eyeballing turn-taking
//! behavior without a microphone.
//!
//! Usage: `souschef-sim [config.toml]`

use async_trait::async_trait;
use souschef::error::Result;
use souschef::provider::{CaptureEvent, ChatBackend, ChatReply, ChatRequest};
use souschef::recipe::{Ingredient, Recipe, RecipeStep, Substitution};
use souschef::{RecipeSession, SpeechCapture, TtsPlayer, VoiceConfig, VoiceLoop};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// One capture session's worth of events, played back with delays.
type Segment = Vec<(u64, CaptureEvent)>;

/// Replays scripted capture sessions. Each `start` consumes the next
/// segment; `abort` invalidates any in-flight replay.
struct ScriptedCapture {
    segments: Mutex<Vec<Segment>>,
    generation: Arc<AtomicU64>,
}

impl ScriptedCapture {
    fn new(mut segments: Vec<Segment>) -> Self {
        segments.reverse();
        Self {
            segments: Mutex::new(segments),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }
}

#[async_trait]
impl SpeechCapture for ScriptedCapture {
    async fn request_permission(&self) -> Result<()> {
        Ok(())
    }

    async fn start(&self, events: mpsc::Sender<CaptureEvent>) -> Result<()> {
        let segment = self.segments.lock().await.pop().unwrap_or_default();
        let expected = self.generation.load(Ordering::SeqCst);
        let generation = Arc::clone(&self.generation);
        let _ = events.send(CaptureEvent::Start).await;
        tokio::spawn(async move {
            for (delay_ms, event) in segment {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                if generation.load(Ordering::SeqCst) != expected {
                    return;
                }
                if events.send(event).await.is_err() {
                    return;
                }
            }
        });
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.generation.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn abort(&self) -> Result<()> {
        self.generation.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// "Plays" audio by logging and sleeping roughly as long as speaking
/// the line would take.
struct LogPlayer {
    speaking: AtomicBool,
}

#[async_trait]
impl TtsPlayer for LogPlayer {
    async fn speak(&self, text: &str) -> Result<()> {
        self.speaking.store(true, Ordering::SeqCst);
        info!(">> {text}");
        let ms = (text.len() as u64 * 15).min(2500);
        tokio::time::sleep(Duration::from_millis(ms)).await;
        self.speaking.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.speaking.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_speaking(&self) -> bool {
        self.speaking.load(Ordering::SeqCst)
    }
}

/// Keyword-matched canned replies, with a step directive thrown in to
/// exercise the navigation path.
struct CannedBackend;

#[async_trait]
impl ChatBackend for CannedBackend {
    async fn chat(&self, request: ChatRequest) -> Result<ChatReply> {
        tokio::time::sleep(Duration::from_millis(300)).await;
        let text = if request.utterance.contains("burn") {
            "If the garlic is browning too fast, pull the pan off the heat \
             and turn it down. Let's go back to the oil step. [[step:2]]"
                .to_owned()
        } else {
            "Medium heat is right for this. You want gentle bubbling, not smoke.".to_owned()
        };
        Ok(ChatReply { text })
    }
}

fn sample_recipe() -> Recipe {
    Recipe {
        title: "Garlic Butter Pasta".to_owned(),
        steps: vec![
            RecipeStep {
                number: 1,
                instruction: "Bring a large pot of salted water to a boil.".to_owned(),
                duration_minutes: Some(8),
                tip: None,
            },
            RecipeStep {
                number: 2,
                instruction: "Warm the olive oil and butter in a pan over medium heat.".to_owned(),
                duration_minutes: Some(2),
                tip: Some("Do not let the butter brown.".to_owned()),
            },
            RecipeStep {
                number: 3,
                instruction: "Add the garlic and cook until fragrant.".to_owned(),
                duration_minutes: Some(1),
                tip: None,
            },
            RecipeStep {
                number: 4,
                instruction: "Toss the cooked pasta in the pan with a splash of pasta water."
                    .to_owned(),
                duration_minutes: Some(2),
                tip: None,
            },
        ],
        ingredients: vec![
            Ingredient {
                name: "garlic".to_owned(),
                quantity: 3.0,
                unit: "cloves".to_owned(),
                preparation: Some("thinly sliced".to_owned()),
                category: Some("produce".to_owned()),
            },
            Ingredient {
                name: "butter".to_owned(),
                quantity: 2.0,
                unit: "tablespoons".to_owned(),
                preparation: None,
                category: Some("dairy".to_owned()),
            },
        ],
        substitutions: vec![(
            "butter".to_owned(),
            vec![Substitution {
                name: "olive oil".to_owned(),
                ratio: "1:1".to_owned(),
                notes: Some("The sauce will be a little looser.".to_owned()),
            }],
        )],
    }
}

fn script() -> Vec<Segment> {
    vec![
        // After the introduction: an ingredient question, answered locally.
        vec![
            (400, transcript("how much", false)),
            (300, transcript("how much garlic", false)),
            (200, transcript("how much garlic", true)),
        ],
        // Navigation.
        vec![(600, transcript("next step", true))],
        // A cooking question the backend answers with a step directive.
        // Waits out the echo cooldown left by the previous reply.
        vec![(2000, transcript("help my garlic is starting to burn", true))],
        // Barge-in while the assistant reads the step, then session stop.
        vec![
            (100, transcript("chef stop listening", true)),
            (400, CaptureEvent::SpeechEnd),
        ],
        // Spare segment in case an extra restart consumes one.
        vec![],
        vec![],
    ]
}

fn transcript(text: &str, is_final: bool) -> CaptureEvent {
    CaptureEvent::Transcript {
        text: text.to_owned(),
        is_final,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => VoiceConfig::from_file(std::path::Path::new(&path))?,
        None => VoiceConfig::default(),
    };

    let session = RecipeSession::new(sample_recipe());
    let capture = Arc::new(ScriptedCapture::new(script()));
    let player = Arc::new(LogPlayer {
        speaking: AtomicBool::new(false),
    });
    let voice = VoiceLoop::new(config, session, capture, player, Arc::new(CannedBackend));

    let handle = voice.handle();
    let mut watcher = handle.clone();
    let join = tokio::spawn(voice.run());

    // Safety timeout in case the scripted stop command is lost.
    let finished = tokio::time::timeout(Duration::from_secs(60), async move {
        while let Ok(snapshot) = watcher.changed().await {
            if snapshot.loop_active {
                break;
            }
        }
        while let Ok(snapshot) = watcher.changed().await {
            if !snapshot.loop_active {
                break;
            }
        }
    })
    .await;
    if finished.is_err() {
        handle.stop();
    }

    join.await??;
    info!("simulation finished");
    Ok(())
}
