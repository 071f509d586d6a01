//! Configuration types for the voice turn-taking controller.
//!
//! The timing thresholds here are empirically tuned starting points, not
//! exact constants. Re-tune them against real kitchen-noise recordings.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration for a voice session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Speech capture settings passed to the speech I/O provider.
    pub capture: CaptureConfig,
    /// Utterance commit / debounce policy.
    pub commit: CommitConfig,
    /// Echo suppression and barge-in discrimination.
    pub echo: EchoConfig,
    /// Turn controller lifecycle and watchdog settings.
    pub turn: TurnConfig,
    /// Wake phrase settings.
    pub wake: WakeConfig,
}

/// Speech capture configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// BCP-47 language tag passed to the recognizer.
    pub language: String,
    /// Whether interim (non-final) results are requested.
    pub interim_results: bool,
    /// Continuous-mode recognition (session stays open across utterances).
    pub continuous: bool,
    /// Maximum recognition alternatives requested.
    pub max_alternatives: u8,
    /// Delay before retrying capture after a recognition error, in ms.
    pub retry_delay_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            language: "en-US".to_owned(),
            interim_results: true,
            continuous: true,
            max_alternatives: 1,
            retry_delay_ms: 400,
        }
    }
}

/// Utterance commit scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitConfig {
    /// Debounce delay for short utterances (<= `short_word_limit` words), in ms.
    ///
    /// Short commands ("next", "stop") should feel instantaneous.
    pub short_debounce_ms: u64,
    /// Debounce delay for medium utterances, in ms.
    pub medium_debounce_ms: u64,
    /// Base debounce delay for long utterances, in ms. Longer sentences
    /// need more time for the recognizer to stabilize.
    pub long_debounce_ms: u64,
    /// Word count at or below which the short delay applies.
    pub short_word_limit: usize,
    /// Word count at or below which the medium delay applies.
    pub medium_word_limit: usize,
    /// Commit delay after a provider speech-end signal, in ms.
    pub speech_end_delay_ms: u64,
    /// Force a commit if an interim transcript stops changing for this
    /// long, in ms. Guards against a dropped end-of-speech event.
    pub inactivity_ms: u64,
    /// Window within which a commit matching the previous committed
    /// utterance (after normalization) is silently discarded, in ms.
    pub duplicate_window_ms: u64,
}

impl Default for CommitConfig {
    fn default() -> Self {
        Self {
            short_debounce_ms: 350,
            medium_debounce_ms: 650,
            long_debounce_ms: 900,
            short_word_limit: 3,
            medium_word_limit: 8,
            speech_end_delay_ms: 250,
            inactivity_ms: 2000,
            duplicate_window_ms: 2200,
        }
    }
}

/// Echo suppression / barge-in discrimination configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EchoConfig {
    /// Echo-risk window after playback stops, in ms. Residual audio keeps
    /// leaking into the microphone briefly after playback halts.
    pub playback_cooldown_ms: u64,
    /// Secondary settling window after the cooldown expires, during which
    /// the echo heuristics are applied once more at full strength.
    pub settle_ms: u64,
    /// Token-overlap ratio (shared / candidate tokens) above which a
    /// fragment heard during playback is treated as echo. Higher than the
    /// idle ratio because false positives here drop real user speech.
    pub speaking_overlap_ratio: f32,
    /// Token-overlap ratio used outside active playback (settle window).
    pub idle_overlap_ratio: f32,
    /// Window within which a repeated, prefix-consistent interim fragment
    /// is trusted as a real interruption, in ms.
    pub interim_repeat_ms: u64,
    /// Minimum novel tokens of length >= 3 a final fragment needs to
    /// count as barge-in without a command word.
    pub min_novel_tokens: usize,
    /// Number of recent assistant replies kept for echo matching.
    pub reply_history: usize,
}

impl Default for EchoConfig {
    fn default() -> Self {
        Self {
            playback_cooldown_ms: 900,
            settle_ms: 600,
            speaking_overlap_ratio: 0.65,
            idle_overlap_ratio: 0.5,
            interim_repeat_ms: 1200,
            min_novel_tokens: 2,
            reply_history: 4,
        }
    }
}

/// Turn controller configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnConfig {
    /// Ceiling on how long the responding flag may stay set before it is
    /// force-cleared, in ms. Safety net against an unresolved backend or
    /// playback future deadlocking the loop.
    pub responding_ceiling_ms: u64,
    /// Hard timeout on audio playback, in ms. After this the playback is
    /// treated as failed and the turn completes.
    pub playback_timeout_ms: u64,
    /// Maximum conversation-history entries sent to the backend.
    pub history_limit: usize,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            responding_ceiling_ms: 8000,
            playback_timeout_ms: 30_000,
            history_limit: 10,
        }
    }
}

/// Wake phrase configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WakeConfig {
    /// The assistant's name, matched with word boundaries plus common
    /// STT confusions ("chef" also matches "shef", "jeff", "sheff").
    pub name: String,
}

impl Default for WakeConfig {
    fn default() -> Self {
        Self {
            name: "chef".to_owned(),
        }
    }
}

impl VoiceConfig {
    /// Load configuration from a TOML file, falling back to defaults for
    /// missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::error::VoiceError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config
    /// cannot be serialized.
    pub fn save_to_file(&self, path: &std::path::Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::VoiceError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path, e.g.
    /// `~/.config/souschef/config.toml` on Linux.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("souschef")
            .join("config.toml")
    }
}
