//! Step directives embedded in backend replies.
//!
//! The backend may ask the client to move the recipe position by
//! embedding a `[[step:N]]` tag anywhere in its reply text. Tags are an
//! internal protocol detail and must never be spoken aloud; parsing is
//! deliberately forgiving about case and interior whitespace, and when a
//! reply carries several tags the last one wins.

/// A backend reply split into its spoken text and optional step target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReply {
    /// Reply text with every directive tag removed.
    pub spoken: String,
    /// Target step from the last well-formed tag, if any.
    pub step: Option<u32>,
}

/// Extract and strip `[[step:N]]` directives from a backend reply.
pub fn parse_reply(text: &str) -> ParsedReply {
    let mut spoken = String::with_capacity(text.len());
    let mut step = None;
    let mut rest = text;

    while let Some(open) = rest.find("[[") {
        let after = &rest[open + 2..];
        let Some(close) = after.find("]]") else {
            break;
        };
        let body = &after[..close];
        if let Some(n) = parse_body(body) {
            step = Some(n);
            spoken.push_str(&rest[..open]);
        } else {
            // Not a step directive; keep the literal text.
            spoken.push_str(&rest[..open + 2 + close + 2]);
        }
        rest = &after[close + 2..];
    }
    spoken.push_str(rest);

    ParsedReply {
        spoken: collapse_spaces(&spoken),
        step,
    }
}

/// Parse the inside of a `[[...]]` span as `step : N`, case-insensitive,
/// whitespace tolerated around both parts.
fn parse_body(body: &str) -> Option<u32> {
    let (key, value) = body.split_once(':')?;
    if !key.trim().eq_ignore_ascii_case("step") {
        return None;
    }
    value.trim().parse::<u32>().ok()
}

/// Stripping a tag can leave doubled spaces or dangling space before
/// punctuation; tidy without disturbing intentional formatting.
fn collapse_spaces(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_space = false;
    for c in text.chars() {
        if c == ' ' {
            if !last_space {
                out.push(c);
            }
            last_space = true;
        } else {
            if last_space && matches!(c, '.' | ',' | '!' | '?') && out.ends_with(' ') {
                out.pop();
            }
            out.push(c);
            last_space = false;
        }
    }
    out.trim().to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_reply_passes_through() {
        let r = parse_reply("Sure, you can use shallots instead.");
        assert_eq!(r.spoken, "Sure, you can use shallots instead.");
        assert_eq!(r.step, None);
    }

    #[test]
    fn tag_is_parsed_and_stripped() {
        let r = parse_reply("Moving on. [[step:4]] Saute the onions.");
        assert_eq!(r.spoken, "Moving on. Saute the onions.");
        assert_eq!(r.step, Some(4));
    }

    #[test]
    fn tag_at_end_of_reply() {
        let r = parse_reply("Let's go back to the sauce. [[step:2]]");
        assert_eq!(r.spoken, "Let's go back to the sauce.");
        assert_eq!(r.step, Some(2));
    }

    #[test]
    fn case_and_whitespace_are_tolerated() {
        let r = parse_reply("Onward. [[ Step : 7 ]]");
        assert_eq!(r.spoken, "Onward.");
        assert_eq!(r.step, Some(7));
    }

    #[test]
    fn last_of_multiple_tags_wins() {
        let r = parse_reply("[[step:2]] Actually, let's skip ahead. [[step:5]]");
        assert_eq!(r.spoken, "Actually, let's skip ahead.");
        assert_eq!(r.step, Some(5));
    }

    #[test]
    fn malformed_tag_is_left_in_text() {
        let r = parse_reply("This [[note: careful]] stays verbatim.");
        assert_eq!(r.spoken, "This [[note: careful]] stays verbatim.");
        assert_eq!(r.step, None);
    }

    #[test]
    fn unterminated_tag_is_left_alone() {
        let r = parse_reply("Broken [[step:3 tail");
        assert_eq!(r.spoken, "Broken [[step:3 tail");
        assert_eq!(r.step, None);
    }

    #[test]
    fn non_numeric_step_is_ignored() {
        let r = parse_reply("Hmm [[step:next]] hmm.");
        assert_eq!(r.spoken, "Hmm [[step:next]] hmm.");
        assert_eq!(r.step, None);
    }

    #[test]
    fn stripping_does_not_double_spaces() {
        let r = parse_reply("Before [[step:3]] after.");
        assert_eq!(r.spoken, "Before after.");
    }
}
