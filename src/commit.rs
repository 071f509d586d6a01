//! Utterance commit scheduling.
//!
//! Streaming recognizers emit a churn of interim transcripts before (and
//! sometimes instead of) a final one. The scheduler debounces that stream
//! into discrete committed utterances: finals commit immediately, interims
//! wait out a length-adaptive delay, a provider speech-end signal shortens
//! the wait, and an inactivity watchdog forces a commit when the end-of-
//! speech event never arrives.
//!
//! The scheduler holds no timers itself. It tracks deadlines as `Instant`s
//! and the caller drives it: sleep until [`CommitScheduler::deadline`],
//! then call [`CommitScheduler::on_deadline`]. This keeps every timing
//! rule testable with plain clock arithmetic.

use crate::config::CommitConfig;
use crate::text::{normalize, word_count};
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug)]
struct Pending {
    text: String,
    normalized: String,
    /// Earliest of the debounce and speech-end deadlines.
    deadline: Instant,
    /// When the normalized text last changed; the inactivity watchdog
    /// fires relative to this.
    unchanged_since: Instant,
}

/// Debounces interim transcripts into committed utterances.
#[derive(Debug)]
pub struct CommitScheduler {
    config: CommitConfig,
    pending: Option<Pending>,
    last_commit: Option<(String, Instant)>,
}

impl CommitScheduler {
    pub fn new(config: CommitConfig) -> Self {
        Self {
            config,
            pending: None,
            last_commit: None,
        }
    }

    /// Length-adaptive debounce delay. Short commands should feel
    /// instantaneous; longer sentences need time to stabilize.
    fn debounce_for(&self, text: &str) -> Duration {
        let words = word_count(text);
        let ms = if words <= self.config.short_word_limit {
            self.config.short_debounce_ms
        } else if words <= self.config.medium_word_limit {
            self.config.medium_debounce_ms
        } else {
            self.config.long_debounce_ms
        };
        Duration::from_millis(ms)
    }

    /// Feed one transcript event. A final transcript commits immediately
    /// (subject to duplicate suppression); an interim schedules or
    /// reschedules the debounce.
    pub fn on_transcript(&mut self, text: &str, is_final: bool, now: Instant) -> Option<String> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }

        if is_final {
            self.pending = None;
            return self.commit(trimmed.to_owned(), now);
        }

        let normalized = normalize(trimmed);
        let debounce = now + self.debounce_for(trimmed);
        let inactivity = Duration::from_millis(self.config.inactivity_ms);
        match &mut self.pending {
            Some(p) if p.normalized == normalized => {
                // Text stable; restart the debounce but leave the
                // watchdog anchor alone so it can still fire.
                p.deadline = debounce.min(p.unchanged_since + inactivity);
            }
            _ => {
                self.pending = Some(Pending {
                    text: trimmed.to_owned(),
                    normalized,
                    deadline: debounce,
                    unchanged_since: now,
                });
            }
        }
        None
    }

    fn watchdog_deadline(&self, unchanged_since: Instant) -> Instant {
        unchanged_since + Duration::from_millis(self.config.inactivity_ms)
    }

    /// Provider signalled end of speech; converge faster than the
    /// length-based debounce would.
    pub fn on_speech_end(&mut self, now: Instant) {
        if let Some(p) = &mut self.pending {
            let fast = now + Duration::from_millis(self.config.speech_end_delay_ms);
            p.deadline = p.deadline.min(fast);
        }
    }

    /// The next instant at which [`Self::on_deadline`] may produce a
    /// commit, or `None` when nothing is pending.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending
            .as_ref()
            .map(|p| p.deadline.min(self.watchdog_deadline(p.unchanged_since)))
    }

    /// Fire any due deadline. Returns the committed utterance when the
    /// pending transcript's time is up.
    pub fn on_deadline(&mut self, now: Instant) -> Option<String> {
        let due = self.deadline().is_some_and(|d| now >= d);
        if !due {
            return None;
        }
        let p = self.pending.take()?;
        self.commit(p.text, now)
    }

    /// Drop any pending transcript without committing. Called when a new
    /// turn begins or the loop stops; a stale debounce must never fire
    /// into a turn it was not scheduled for.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Forget the duplicate-suppression state as well. Used on full
    /// session teardown.
    pub fn reset(&mut self) {
        self.pending = None;
        self.last_commit = None;
    }

    fn commit(&mut self, text: String, now: Instant) -> Option<String> {
        let normalized = normalize(&text);
        if normalized.is_empty() {
            return None;
        }
        if let Some((prev, at)) = &self.last_commit
            && *prev == normalized
            && now.saturating_duration_since(*at)
                <= Duration::from_millis(self.config.duplicate_window_ms)
        {
            debug!(utterance = %text, "duplicate commit suppressed");
            return None;
        }
        self.last_commit = Some((normalized, now));
        Some(text)
    }
}
