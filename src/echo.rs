//! Echo / barge-in discrimination.
//!
//! While the assistant is speaking (or just finished), every incoming
//! transcript fragment is either the assistant's own voice leaking back
//! through the microphone, a deliberate interruption, or ordinary user
//! speech. Dropping a real interruption is worse than letting one echo
//! through, so the overlap threshold used during active playback is
//! higher than the one used in the settling window after it.

use crate::config::EchoConfig;
use crate::intent::{contains_wake_phrase, find_wake_phrase};
use crate::text::{normalize, token_overlap_ratio, tokenize};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Verdict for one transcript fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentVerdict {
    /// Deliberate user interruption; stop playback and start listening.
    /// Carries the trigger keyword when one was identified, so it can be
    /// merged back onto the front of the eventual committed transcript.
    Interruption { keyword: Option<String> },
    /// The assistant hearing itself; drop silently.
    Echo,
    /// Not trusted yet (single interim sample, or post-playback
    /// cooldown); drop without committing.
    Suppressed,
    /// Ordinary user speech; let the commit scheduler handle it.
    Speech,
}

/// Short command words that qualify a fragment as deliberate even when
/// most of its tokens overlap assistant speech.
fn is_command_token(token: &str) -> bool {
    matches!(
        token,
        "stop" | "wait" | "pause" | "next" | "back" | "previous" | "repeat" | "skip" | "go"
    )
}

/// Which suppression phase the discriminator is in for a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Assistant audio is playing right now.
    Speaking,
    /// Playback recently stopped; residual audio still leaks in.
    Cooldown,
    /// Cooldown expired; apply the echo heuristics once more before
    /// returning to normal sensitivity.
    Settle,
    /// Assistant silent; no heightened suspicion.
    Idle,
}

/// Classifies transcript fragments against recently spoken assistant text.
#[derive(Debug)]
pub struct EchoDiscriminator {
    config: EchoConfig,
    wake_name: String,
    /// Most-recent-last ring of assistant replies.
    replies: VecDeque<String>,
    speaking: bool,
    playback_stopped_at: Option<Instant>,
    /// Last untrusted interim fragment, for the stability gate.
    last_interim: Option<(String, Instant)>,
}

impl EchoDiscriminator {
    pub fn new(config: EchoConfig, wake_name: impl Into<String>) -> Self {
        Self {
            config,
            wake_name: wake_name.into(),
            replies: VecDeque::new(),
            speaking: false,
            playback_stopped_at: None,
            last_interim: None,
        }
    }

    /// Record a reply the assistant is about to speak.
    pub fn record_reply(&mut self, text: &str) {
        if self.replies.len() >= self.config.reply_history.max(1) {
            self.replies.pop_front();
        }
        self.replies.push_back(normalize(text));
    }

    /// Mark playback as started.
    pub fn playback_started(&mut self) {
        self.speaking = true;
    }

    /// Mark playback as stopped; begins the echo-risk cooldown.
    pub fn playback_stopped(&mut self, now: Instant) {
        self.speaking = false;
        self.playback_stopped_at = Some(now);
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking
    }

    fn phase(&self, now: Instant) -> Phase {
        if self.speaking {
            return Phase::Speaking;
        }
        let Some(stopped) = self.playback_stopped_at else {
            return Phase::Idle;
        };
        let since = now.saturating_duration_since(stopped);
        if since < Duration::from_millis(self.config.playback_cooldown_ms) {
            Phase::Cooldown
        } else if since
            < Duration::from_millis(self.config.playback_cooldown_ms + self.config.settle_ms)
        {
            Phase::Settle
        } else {
            Phase::Idle
        }
    }

    /// Classify one transcript fragment.
    pub fn classify(&mut self, fragment: &str, is_final: bool, now: Instant) -> FragmentVerdict {
        // Wake phrase always wins, even mid-cooldown.
        if contains_wake_phrase(fragment, &self.wake_name) {
            let lower = fragment.to_lowercase();
            let keyword = find_wake_phrase(fragment, &self.wake_name)
                .map(|(pos, len)| lower[pos..pos + len].to_owned());
            return FragmentVerdict::Interruption { keyword };
        }

        let candidate = normalize(fragment);
        if candidate.is_empty() {
            return FragmentVerdict::Suppressed;
        }
        let tokens = tokenize(fragment);

        match self.phase(now) {
            Phase::Idle => FragmentVerdict::Speech,
            Phase::Cooldown => {
                if let Some(cmd) = tokens.iter().find(|t| is_command_token(t)) {
                    FragmentVerdict::Interruption {
                        keyword: Some(cmd.clone()),
                    }
                } else {
                    FragmentVerdict::Suppressed
                }
            }
            Phase::Settle => {
                if self.is_echo(&candidate, &tokens, self.config.idle_overlap_ratio) {
                    FragmentVerdict::Echo
                } else {
                    FragmentVerdict::Speech
                }
            }
            Phase::Speaking => {
                if self.is_echo(&candidate, &tokens, self.config.speaking_overlap_ratio) {
                    return FragmentVerdict::Echo;
                }
                self.barge_in_verdict(&candidate, &tokens, is_final, now)
            }
        }
    }

    /// Substring containment against the reply ring, then token overlap
    /// against the most recent reply.
    fn is_echo(&self, candidate: &str, tokens: &[String], threshold: f32) -> bool {
        if self.replies.iter().any(|r| r.contains(candidate)) {
            return true;
        }
        let Some(current) = self.replies.back() else {
            return false;
        };
        let reply_tokens = tokenize(current);
        token_overlap_ratio(tokens, &reply_tokens) > threshold
    }

    /// The fragment survived the echo checks while the assistant was
    /// speaking; decide whether it is a trustworthy interruption.
    fn barge_in_verdict(
        &mut self,
        candidate: &str,
        tokens: &[String],
        is_final: bool,
        now: Instant,
    ) -> FragmentVerdict {
        let reply_tokens = self
            .replies
            .back()
            .map(|r| tokenize(r))
            .unwrap_or_default();
        let novel: Vec<&String> = tokens
            .iter()
            .filter(|t| !reply_tokens.contains(t))
            .collect();

        // A novel command word is enough on its own, interim or final.
        if let Some(cmd) = novel.iter().find(|t| is_command_token(t)) {
            self.last_interim = None;
            return FragmentVerdict::Interruption {
                keyword: Some((*cmd).clone()),
            };
        }

        if is_final {
            let strong = novel.iter().filter(|t| t.len() >= 3).count();
            if strong >= self.config.min_novel_tokens {
                self.last_interim = None;
                return FragmentVerdict::Interruption { keyword: None };
            }
            return FragmentVerdict::Suppressed;
        }

        // Interim without a command word: require the same fragment to
        // repeat within the stability window before acting.
        let window = Duration::from_millis(self.config.interim_repeat_ms);
        if let Some((prev, at)) = &self.last_interim
            && now.saturating_duration_since(*at) <= window
            && prefix_consistent(prev, candidate)
        {
            self.last_interim = None;
            return FragmentVerdict::Interruption { keyword: None };
        }
        self.last_interim = Some((candidate.to_owned(), now));
        FragmentVerdict::Suppressed
    }
}

/// Two interim samples describe the same utterance when one is a prefix
/// of the other, or their token sets differ by at most one token.
fn prefix_consistent(a: &str, b: &str) -> bool {
    if a.starts_with(b) || b.starts_with(a) {
        return true;
    }
    let ta = tokenize(a);
    let tb = tokenize(b);
    let shared = ta.iter().filter(|t| tb.contains(t)).count();
    shared + 1 >= ta.len().max(tb.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EchoConfig;
    use std::time::Duration;

    fn discriminator() -> EchoDiscriminator {
        EchoDiscriminator::new(EchoConfig::default(), "chef")
    }

    fn speaking(reply: &str) -> EchoDiscriminator {
        let mut d = discriminator();
        d.record_reply(reply);
        d.playback_started();
        d
    }

    // ── wake phrase override ────────────────────────────────────────

    #[test]
    fn wake_phrase_always_interrupts() {
        let mut d = speaking("simmer the sauce for ten minutes");
        let verdict = d.classify("hey chef", false, Instant::now());
        assert!(matches!(verdict, FragmentVerdict::Interruption { .. }));
    }

    #[test]
    fn wake_phrase_interrupts_during_cooldown() {
        let mut d = speaking("simmer the sauce");
        let now = Instant::now();
        d.playback_stopped(now);
        let verdict = d.classify("chef", false, now + Duration::from_millis(100));
        assert!(matches!(verdict, FragmentVerdict::Interruption { .. }));
    }

    // ── echo detection while speaking ───────────────────────────────

    #[test]
    fn containment_echo_is_dropped() {
        let mut d = speaking("Now simmer the sauce for ten minutes on low heat");
        let verdict = d.classify("simmer the sauce", true, Instant::now());
        assert_eq!(verdict, FragmentVerdict::Echo);
    }

    #[test]
    fn echo_matches_any_recent_reply() {
        let mut d = discriminator();
        d.record_reply("Going to step 4. Saute the onions until translucent.");
        d.record_reply("About 8 minutes for this step.");
        d.playback_started();
        let verdict = d.classify("saute the onions until translucent", true, Instant::now());
        assert_eq!(verdict, FragmentVerdict::Echo);
    }

    #[test]
    fn high_token_overlap_is_echo() {
        let mut d = speaking("chop the garlic finely and add it to the warm oil");
        let verdict = d.classify("chop garlic finely add warm oil", true, Instant::now());
        assert_eq!(verdict, FragmentVerdict::Echo);
    }

    #[test]
    fn reply_ring_is_bounded() {
        let mut d = discriminator();
        for i in 0..10 {
            d.record_reply(&format!("reply number {i}"));
        }
        d.playback_started();
        // The oldest replies fell out of the ring; this fragment now has
        // enough novel content to be an interruption when final.
        let verdict = d.classify("reply number zero extra words", true, Instant::now());
        assert!(matches!(verdict, FragmentVerdict::Interruption { .. }));
    }

    // ── barge-in ────────────────────────────────────────────────────

    #[test]
    fn novel_command_word_interrupts_even_interim() {
        let mut d = speaking("simmer the sauce for ten minutes");
        let verdict = d.classify("stop", false, Instant::now());
        assert_eq!(
            verdict,
            FragmentVerdict::Interruption {
                keyword: Some("stop".to_owned())
            }
        );
    }

    #[test]
    fn final_with_strong_novel_tokens_interrupts() {
        let mut d = speaking("simmer the sauce for ten minutes");
        let verdict = d.classify("where did I put the colander", true, Instant::now());
        assert_eq!(verdict, FragmentVerdict::Interruption { keyword: None });
    }

    #[test]
    fn single_interim_sample_is_not_trusted() {
        let mut d = speaking("simmer the sauce for ten minutes");
        let verdict = d.classify("how much butter", false, Instant::now());
        assert_eq!(verdict, FragmentVerdict::Suppressed);
    }

    #[test]
    fn repeated_interim_within_window_interrupts() {
        let mut d = speaking("simmer the sauce for ten minutes");
        let t0 = Instant::now();
        assert_eq!(
            d.classify("how much butter", false, t0),
            FragmentVerdict::Suppressed
        );
        let verdict = d.classify("how much butter do I", false, t0 + Duration::from_millis(400));
        assert_eq!(verdict, FragmentVerdict::Interruption { keyword: None });
    }

    #[test]
    fn repeated_interim_outside_window_stays_suppressed() {
        let mut d = speaking("simmer the sauce for ten minutes");
        let t0 = Instant::now();
        d.classify("how much butter", false, t0);
        let verdict = d.classify("how much butter", false, t0 + Duration::from_millis(2000));
        assert_eq!(verdict, FragmentVerdict::Suppressed);
    }

    // ── cooldown and settle ─────────────────────────────────────────

    #[test]
    fn cooldown_suppresses_ordinary_fragments() {
        let mut d = speaking("simmer the sauce");
        let now = Instant::now();
        d.playback_stopped(now);
        let verdict = d.classify("something unrelated entirely", true, now + Duration::from_millis(200));
        assert_eq!(verdict, FragmentVerdict::Suppressed);
    }

    #[test]
    fn cooldown_lets_command_tokens_through() {
        let mut d = speaking("simmer the sauce");
        let now = Instant::now();
        d.playback_stopped(now);
        let verdict = d.classify("go back", true, now + Duration::from_millis(200));
        assert!(matches!(verdict, FragmentVerdict::Interruption { .. }));
    }

    #[test]
    fn settle_window_still_catches_echo() {
        let mut d = speaking("simmer the sauce for ten minutes");
        let now = Instant::now();
        d.playback_stopped(now);
        let later = now + Duration::from_millis(1100); // past cooldown, inside settle
        let verdict = d.classify("simmer the sauce for ten minutes", true, later);
        assert_eq!(verdict, FragmentVerdict::Echo);
    }

    #[test]
    fn settle_window_passes_fresh_speech() {
        let mut d = speaking("simmer the sauce for ten minutes");
        let now = Instant::now();
        d.playback_stopped(now);
        let later = now + Duration::from_millis(1100);
        let verdict = d.classify("how much butter do I need", true, later);
        assert_eq!(verdict, FragmentVerdict::Speech);
    }

    #[test]
    fn ordinary_speech_when_idle() {
        let mut d = discriminator();
        d.record_reply("welcome to the recipe");
        let verdict = d.classify("how much butter", true, Instant::now());
        assert_eq!(verdict, FragmentVerdict::Speech);
    }

    #[test]
    fn idle_returns_after_settle_expires() {
        let mut d = speaking("simmer the sauce");
        let now = Instant::now();
        d.playback_stopped(now);
        let later = now + Duration::from_millis(2000); // past cooldown + settle
        let verdict = d.classify("simmer the sauce", true, later);
        assert_eq!(verdict, FragmentVerdict::Speech);
    }
}
