//! Text normalization and tokenization.
//!
//! Every matcher in the crate operates on normalized text: lowercase,
//! punctuation replaced by spaces, whitespace collapsed. These functions
//! are total; empty input yields empty output.

/// Lowercase, replace non-alphanumeric characters with spaces, collapse
/// whitespace runs, and trim. Idempotent.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalize then split into word tokens, dropping stop words.
pub fn tokenize(text: &str) -> Vec<String> {
    normalize(text)
        .split_whitespace()
        .filter(|w| !is_stop_word(w))
        .map(str::to_owned)
        .collect()
}

/// Articles, prepositions, and filler words that carry no intent signal.
fn is_stop_word(word: &str) -> bool {
    matches!(
        word,
        "a" | "an"
            | "the"
            | "to"
            | "of"
            | "in"
            | "on"
            | "at"
            | "for"
            | "with"
            | "and"
            | "or"
            | "is"
            | "are"
            | "it"
            | "this"
            | "that"
            | "please"
            | "again"
            | "um"
            | "uh"
            | "like"
            | "just"
    )
}

/// Expand common English contractions so recognizer output like "don't"
/// matches phrase patterns written as "do not" (and vice versa after
/// normalization strips the apostrophe).
pub fn expand_contractions(text: &str) -> String {
    text.replace("that'll", "that will")
        .replace("i'll", "i will")
        .replace("i'm", "i am")
        .replace("i've", "i have")
        .replace("it's", "it is")
        .replace("what's", "what is")
        .replace("can't", "cannot")
        .replace("won't", "will not")
        .replace("don't", "do not")
        .replace("doesn't", "does not")
        .replace("didn't", "did not")
        .replace("isn't", "is not")
        .replace("haven't", "have not")
        .replace("we're", "we are")
        .replace("let's", "let us")
}

/// Parse a cardinal or ordinal number word ("two", "second") or a digit
/// string into a step number. The fixed table covers one through twelve;
/// ordinals map to the same integers as their cardinals.
pub fn parse_number_word(word: &str) -> Option<u32> {
    if let Ok(n) = word.parse::<u32>() {
        return Some(n);
    }
    let n = match word {
        "one" | "first" => 1,
        "two" | "second" => 2,
        "three" | "third" => 3,
        "four" | "fourth" => 4,
        "five" | "fifth" => 5,
        "six" | "sixth" => 6,
        "seven" | "seventh" => 7,
        "eight" | "eighth" => 8,
        "nine" | "ninth" => 9,
        "ten" | "tenth" => 10,
        "eleven" | "eleventh" => 11,
        "twelve" | "twelfth" => 12,
        _ => return None,
    };
    Some(n)
}

/// Count of whitespace-separated words in the raw (un-tokenized) text.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Ratio of candidate tokens that also appear in the reference tokens.
/// Returns 0.0 for an empty candidate.
pub fn token_overlap_ratio(candidate: &[String], reference: &[String]) -> f32 {
    if candidate.is_empty() {
        return 0.0;
    }
    let shared = candidate.iter().filter(|t| reference.contains(t)).count();
    shared as f32 / candidate.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── normalize ───────────────────────────────────────────────────

    #[test]
    fn normalize_lowercases_and_strips_punctuation() {
        assert_eq!(normalize("Go to Step 4, now!"), "go to step 4 now");
    }

    #[test]
    fn normalize_collapses_whitespace() {
        assert_eq!(normalize("  what's   next?  "), "what s next");
    }

    #[test]
    fn normalize_is_idempotent() {
        for input in ["Hey, Chef!", "  step   TWO ", "don't", "", "éclair!"] {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn normalize_empty_is_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("?!., "), "");
    }

    // ── tokenize ────────────────────────────────────────────────────

    #[test]
    fn tokenize_drops_stop_words() {
        assert_eq!(
            tokenize("please go to the next step again"),
            vec!["go", "next", "step"]
        );
    }

    #[test]
    fn tokenize_empty_is_empty() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("the a an of").is_empty());
    }

    // ── contractions ────────────────────────────────────────────────

    #[test]
    fn expand_dont_have() {
        assert_eq!(
            expand_contractions("i don't have butter"),
            "i do not have butter"
        );
    }

    #[test]
    fn expand_whats_next() {
        assert_eq!(expand_contractions("what's next"), "what is next");
    }

    // ── number words ────────────────────────────────────────────────

    #[test]
    fn number_words_cardinal_and_ordinal() {
        assert_eq!(parse_number_word("two"), Some(2));
        assert_eq!(parse_number_word("second"), Some(2));
        assert_eq!(parse_number_word("twelfth"), Some(12));
        assert_eq!(parse_number_word("7"), Some(7));
        assert_eq!(parse_number_word("banana"), None);
    }

    // ── token overlap ───────────────────────────────────────────────

    #[test]
    fn overlap_ratio_full_and_partial() {
        let a = tokenize("add three cloves garlic");
        let b = tokenize("now add three cloves of minced garlic");
        assert!((token_overlap_ratio(&a, &b) - 1.0).abs() < f32::EPSILON);

        let c = tokenize("how much butter");
        let ratio = token_overlap_ratio(&c, &b);
        assert!(ratio < 0.5, "ratio was {ratio}");
    }

    #[test]
    fn overlap_ratio_empty_candidate_is_zero() {
        assert_eq!(token_overlap_ratio(&[], &tokenize("anything")), 0.0);
    }
}
