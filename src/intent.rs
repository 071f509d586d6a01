//! Intent classification over normalized utterance text.
//!
//! Each classifier is a pure predicate; none touches session state. The
//! precedence in [`classify`] is load-bearing: "I don't have two eggs"
//! must resolve as a substitution request, never as a jump to step two,
//! so substitution and cooking-question checks run before step-jump.

use crate::text::{expand_contractions, normalize, parse_number_word, word_count};

/// Classified intent of one utterance, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// End the voice session ("stop listening").
    StopSession,
    /// Ingredient substitution request.
    Substitution,
    /// Jump to an explicit step number.
    StepJump(u32),
    /// Go back one step.
    PreviousStep,
    /// Advance one step.
    NextStep,
    /// Done with the current step (advance).
    DoneStep,
    /// Ingredient amount/quantity question.
    IngredientAmount,
    /// Timing question for the current step.
    Timing,
    /// "What step am I on?"
    CurrentStep,
    /// Repeat the current step / last reply.
    Repeat,
    /// What can I say?
    Help,
    /// Restart from step one.
    StartOver,
    /// Open-ended cooking question with no local answer.
    CookingQuestion,
    /// Nothing recognized locally.
    Unknown,
}

/// Normalize for matching: lowercase, contractions expanded, punctuation
/// stripped. "I don't have eggs" → "i do not have eggs".
fn prepared(text: &str) -> String {
    normalize(&expand_contractions(&text.to_lowercase()))
}

/// Classify an utterance by the fixed priority order.
pub fn classify(text: &str) -> Intent {
    if is_stop_command(text) {
        return Intent::StopSession;
    }
    if is_substitution_intent(text) {
        return Intent::Substitution;
    }
    // Cooking-question vetoes step-jump: a number inside "how many eggs
    // do I need" is a quantity, not a navigation target.
    let cooking = is_cooking_question(text);
    if !cooking && let Some(n) = step_jump_target(text) {
        return Intent::StepJump(n);
    }
    if is_previous_step(text) {
        return Intent::PreviousStep;
    }
    if is_next_step(text) {
        return Intent::NextStep;
    }
    if is_done_with_step(text) {
        return Intent::DoneStep;
    }
    if is_ingredient_amount_question(text) {
        return Intent::IngredientAmount;
    }
    if is_timing_question(text) {
        return Intent::Timing;
    }
    if is_current_step_question(text) {
        return Intent::CurrentStep;
    }
    if is_repeat_request(text) {
        return Intent::Repeat;
    }
    if is_start_over(text) {
        return Intent::StartOver;
    }
    if is_help_request(text) {
        return Intent::Help;
    }
    if cooking {
        return Intent::CookingQuestion;
    }
    Intent::Unknown
}

/// Session-stop command. Highest priority, unconditional.
pub fn is_stop_command(text: &str) -> bool {
    let t = prepared(text);
    [
        "stop listening",
        "quit voice",
        "end voice",
        "stop voice",
        "exit voice",
        "turn off voice",
        "end the session",
    ]
    .iter()
    .any(|p| t.contains(p))
}

/// Substitution request. Deliberately broad: users phrase this many ways,
/// and a miss here falls through to step-jump misreads.
pub fn is_substitution_intent(text: &str) -> bool {
    let t = prepared(text);
    [
        "substitut",
        "swap",
        "replace",
        "instead of",
        "in place of",
        "do not have",
        "do not got",
        "ran out of",
        "am out of",
        "i am missing",
        "what can i use",
        "what else can i use",
        "is there an alternative",
        "alternative to",
        "alternative for",
    ]
    .iter()
    .any(|p| t.contains(p))
}

/// Ingredient/quantity/technique phrasing. Used both to answer amount
/// questions and as a veto on step-jump classification.
pub fn is_cooking_question(text: &str) -> bool {
    let t = prepared(text);
    [
        "how much",
        "how many",
        "how long",
        "how do i",
        "how should i",
        "what temperature",
        "what heat",
        "do i need",
        "quantity",
        "amount of",
    ]
    .iter()
    .any(|p| t.contains(p))
}

/// Explicit step-jump target, if any: "go to step 4", "step nine", a
/// bare number word alone, or a jump cue plus a short utterance with a
/// parseable number.
pub fn step_jump_target(text: &str) -> Option<u32> {
    let t = prepared(text);
    let words: Vec<&str> = t.split_whitespace().collect();

    // "step N" anywhere.
    for pair in words.windows(2) {
        if pair[0] == "step"
            && let Some(n) = parse_number_word(pair[1])
        {
            return Some(n);
        }
    }

    // A bare number or number word alone.
    if words.len() == 1
        && let Some(n) = parse_number_word(words[0])
    {
        return Some(n);
    }

    // Jump cue + short utterance containing a parseable number
    // ("go to four", "jump back to the third one").
    let has_cue = t.contains("go to")
        || t.contains("go back to")
        || t.contains("jump")
        || t.contains("back to")
        || t.contains("take me to");
    if has_cue && words.len() <= 7 {
        for w in &words {
            if let Some(n) = parse_number_word(w) {
                return Some(n);
            }
        }
    }

    None
}

/// Short-utterance keyword caps: "next"/"back" buried in a long sentence
/// is conversation, not navigation.
const NAV_WORD_CAP: usize = 9;

/// Previous-step command.
pub fn is_previous_step(text: &str) -> bool {
    if word_count(text) > NAV_WORD_CAP {
        return false;
    }
    let t = prepared(text);
    ["go back", "previous step", "back a step", "last step", "back up one"]
        .iter()
        .any(|p| t.contains(p))
        || t == "back"
        || t == "previous"
}

/// Next-step command.
pub fn is_next_step(text: &str) -> bool {
    if word_count(text) > NAV_WORD_CAP {
        return false;
    }
    let t = prepared(text);
    ["next step", "move on", "keep going", "what is next", "continue"]
        .iter()
        .any(|p| t.contains(p))
        || t == "next"
}

/// Done-with-step acknowledgement (advances, like next-step).
pub fn is_done_with_step(text: &str) -> bool {
    if word_count(text) > NAV_WORD_CAP {
        return false;
    }
    let t = prepared(text);
    [
        "done with this",
        "done with that",
        "finished this step",
        "finished that",
        "i am done",
        "i am finished",
        "all done",
    ]
    .iter()
    .any(|p| t.contains(p))
        || t == "done"
        || t == "finished"
}

/// Ingredient amount question ("how much garlic").
pub fn is_ingredient_amount_question(text: &str) -> bool {
    let t = prepared(text);
    t.contains("how much") || t.contains("how many")
}

/// Timing question ("how long does this step take").
pub fn is_timing_question(text: &str) -> bool {
    let t = prepared(text);
    t.contains("how long") || t.contains("how many minutes") || t.contains("set a timer")
}

/// "Which step am I on?"
pub fn is_current_step_question(text: &str) -> bool {
    let t = prepared(text);
    [
        "what step",
        "which step",
        "current step",
        "where are we",
        "where was i",
        "where am i",
    ]
    .iter()
    .any(|p| t.contains(p))
}

/// Repeat the current step instruction.
pub fn is_repeat_request(text: &str) -> bool {
    let t = prepared(text);
    [
        "repeat",
        "say that one more time",
        "what did you say",
        "read that",
        "read the step",
        "one more time",
    ]
    .iter()
    .any(|p| t.contains(p))
}

/// Help request ("what can I say"). A bare "help" counts only when the
/// utterance is nothing but the plea, so "help my sauce is burning" still
/// reaches the backend.
pub fn is_help_request(text: &str) -> bool {
    let t = prepared(text);
    if ["what can you do", "what can i say", "what can i ask"]
        .iter()
        .any(|p| t.contains(p))
    {
        return true;
    }
    word_count(&t) <= 2 && t.split_whitespace().any(|w| w == "help")
}

/// Restart from step one.
pub fn is_start_over(text: &str) -> bool {
    let t = prepared(text);
    ["start over", "start again", "from the beginning", "restart the recipe"]
        .iter()
        .any(|p| t.contains(p))
}

// ── wake phrase ─────────────────────────────────────────────────────

/// Common recognizer confusions for the assistant name.
fn name_variants(name: &str) -> Vec<&str> {
    if name == "chef" {
        vec!["chef", "chefs", "shef", "sheff", "jeff", "cheff"]
    } else {
        vec![name]
    }
}

/// Optional leading fillers the wake phrase tolerates ("hey chef").
const WAKE_FILLERS: [&str; 8] = ["hey", "hi", "hello", "ok", "okay", "um", "uh", "yo"];

/// Find the wake phrase in `text`, returning `(byte_pos, len)` of the
/// matched span (filler included when present) in the lowercased text.
/// Matches are word-bounded so "chefs knife" does not use the plural as
/// a boundary miss, but "chefs" alone as a whole word still wakes.
pub fn find_wake_phrase(text: &str, name: &str) -> Option<(usize, usize)> {
    let lower = text.to_lowercase();
    let mut best: Option<(usize, usize)> = None;

    for v in name_variants(name) {
        let mut search_from = 0;
        while search_from < lower.len() {
            let haystack = &lower[search_from..];
            let Some(rel_pos) = haystack.find(v) else {
                break;
            };
            let pos = search_from + rel_pos;
            let end = pos + v.len();

            let start_ok = pos == 0 || !lower.as_bytes()[pos - 1].is_ascii_alphanumeric();
            let end_ok = end >= lower.len() || !lower.as_bytes()[end].is_ascii_alphanumeric();

            if start_ok && end_ok {
                let span = extend_over_filler(&lower, pos, end);
                best = match best {
                    None => Some(span),
                    Some(prev) if span.0 < prev.0 => Some(span),
                    Some(prev) => Some(prev),
                };
                break;
            }
            search_from = pos + 1;
        }
    }
    best
}

/// Widen a name match to swallow an immediately preceding filler word
/// ("hey chef" strips as one phrase).
fn extend_over_filler(lower: &str, pos: usize, end: usize) -> (usize, usize) {
    let before = lower[..pos].trim_end_matches([' ', ',', '.', '!', '?']);
    for filler in WAKE_FILLERS {
        if before.ends_with(filler) {
            let f_pos = before.len() - filler.len();
            let boundary_ok =
                f_pos == 0 || !lower.as_bytes()[f_pos - 1].is_ascii_alphanumeric();
            if boundary_ok {
                return (f_pos, end - f_pos);
            }
        }
    }
    (pos, end - pos)
}

/// Whether the fragment contains the wake phrase at all.
pub fn contains_wake_phrase(text: &str, name: &str) -> bool {
    find_wake_phrase(text, name).is_some()
}

/// Strip a leading wake phrase so the remainder can be treated as the
/// command. Prefers text after the phrase, falls back to text before it,
/// and yields an empty string when the phrase was the whole utterance.
///
/// The match offsets index the lowercased text, whose byte layout can
/// differ from the original (Turkish 'İ' grows when lowercased), so the
/// remainder is sliced from the same lowercased copy and comes back
/// lowercased.
pub fn strip_wake_phrase(text: &str, name: &str) -> String {
    let lower = text.to_lowercase();
    let Some((pos, len)) = find_wake_phrase(&lower, name) else {
        return text.trim().to_owned();
    };

    let after = lower[pos + len..].trim_start_matches([',', ':', '.', '!', '?', ' ']);
    let after = after.trim();
    if !after.is_empty() {
        return after.to_owned();
    }

    let before = lower[..pos].trim_end_matches([',', ':', '.', '!', '?', ' ']);
    before.trim().to_owned()
}
