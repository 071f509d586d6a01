//! Local reply builder: deterministic answers for navigation, step
//! readback, ingredient amounts, and known substitutions.
//!
//! Anything needing world knowledge (unknown substitutions, open-ended
//! cooking questions) is deferred to the conversational backend. The
//! routing decision lives in [`should_handle_locally`], not in the reply
//! text itself.

use crate::intent::{Intent, classify};
use crate::recipe::{NavOutcome, RecipeSession, Substitution};
use crate::text::normalize;

/// A locally built reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalReply {
    /// Text to speak.
    pub text: String,
    /// When true the voice loop ends after this reply is spoken.
    pub stop_loop: bool,
}

impl LocalReply {
    fn say(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            stop_loop: false,
        }
    }
}

/// Whether this utterance can be answered deterministically, without the
/// backend. Navigation and session control are always local; knowledge
/// questions are local only when the recipe data actually answers them.
pub fn should_handle_locally(transcript: &str, session: &RecipeSession) -> bool {
    match classify(transcript) {
        Intent::StopSession
        | Intent::StepJump(_)
        | Intent::PreviousStep
        | Intent::NextStep
        | Intent::DoneStep
        | Intent::CurrentStep
        | Intent::Repeat
        | Intent::Help
        | Intent::StartOver => true,
        Intent::Substitution => known_substitution(transcript, session).is_some(),
        Intent::IngredientAmount => session.find_ingredient(transcript).is_some(),
        Intent::Timing => session
            .current_step()
            .is_some_and(|s| s.duration_minutes.is_some()),
        Intent::CookingQuestion | Intent::Unknown => false,
    }
}

/// Build the local reply, mutating the step cursor for navigation
/// intents. For utterances [`should_handle_locally`] rejects, this still
/// returns a provisional holding line — the controller speaks the
/// backend's answer instead, so the holding line is only a fallback.
pub fn build_reply(transcript: &str, session: &mut RecipeSession) -> LocalReply {
    match classify(transcript) {
        Intent::StopSession => LocalReply {
            text: "Okay, ending the cooking session. Happy cooking!".to_owned(),
            stop_loop: true,
        },
        Intent::StepJump(n) => nav_reply(session.go_to(i64::from(n)), session),
        Intent::NextStep | Intent::DoneStep => {
            let outcome = session.next();
            if matches!(outcome, NavOutcome::OutOfRange { .. }) {
                LocalReply::say("That was the last step. You're all done!")
            } else {
                nav_reply(outcome, session)
            }
        }
        Intent::PreviousStep => {
            let outcome = session.previous();
            if matches!(outcome, NavOutcome::OutOfRange { .. }) {
                LocalReply::say("You're already on the first step.")
            } else {
                nav_reply(outcome, session)
            }
        }
        Intent::StartOver => {
            session.go_to(1);
            LocalReply::say(format!("Starting over. {}", read_step(session)))
        }
        Intent::CurrentStep => LocalReply::say(format!(
            "You're on step {} of {}. {}",
            session.current_step_number(),
            session.step_count(),
            step_instruction(session)
        )),
        Intent::Repeat => LocalReply::say(read_step(session)),
        Intent::IngredientAmount => match session.find_ingredient(transcript) {
            Some(ingredient) => {
                let mut text = format!("You need {}.", ingredient.spoken_amount());
                if let Some(prep) = &ingredient.preparation {
                    text.push_str(&format!(" ({prep})"));
                }
                LocalReply::say(text)
            }
            None => LocalReply::say("Let me check on that ingredient."),
        },
        Intent::Timing => match session.current_step().and_then(|s| s.duration_minutes) {
            Some(minutes) => LocalReply::say(format!("About {minutes} minutes for this step.")),
            None => LocalReply::say("Let me check the timing for you."),
        },
        Intent::Substitution => match known_substitution(transcript, session) {
            Some((ingredient, subs)) => LocalReply::say(substitution_text(&ingredient, subs)),
            None => LocalReply::say("Let me think about a good substitute."),
        },
        Intent::Help => LocalReply::say(
            "You can say things like: next step, go back, go to step three, \
             how much of an ingredient, repeat that, or stop listening.",
        ),
        Intent::CookingQuestion | Intent::Unknown => {
            LocalReply::say("Let me think about that.")
        }
    }
}

/// Find a substitution-table entry whose ingredient name appears in the
/// utterance.
fn known_substitution<'a>(
    transcript: &str,
    session: &'a RecipeSession,
) -> Option<(String, &'a [Substitution])> {
    let norm = normalize(transcript);
    for (name, subs) in &session.recipe().substitutions {
        if !subs.is_empty() && norm.contains(&normalize(name)) {
            return Some((name.clone(), subs.as_slice()));
        }
    }
    None
}

fn substitution_text(ingredient: &str, subs: &[Substitution]) -> String {
    let first = &subs[0];
    let mut text = format!(
        "Instead of {ingredient} you can use {} at a {} ratio.",
        first.name, first.ratio
    );
    if let Some(notes) = &first.notes {
        text.push_str(&format!(" Note: {notes}."));
    }
    if subs.len() > 1 {
        let others: Vec<&str> = subs[1..].iter().map(|s| s.name.as_str()).collect();
        text.push_str(&format!(" {} would also work.", others.join(" or ")));
    }
    text
}

fn nav_reply(outcome: NavOutcome, session: &RecipeSession) -> LocalReply {
    match outcome {
        NavOutcome::Moved(n) => {
            LocalReply::say(format!("Going to step {n}. {}", read_step(session)))
        }
        NavOutcome::AlreadyThere(n) => LocalReply::say(format!(
            "You're already on step {n}. {}",
            step_instruction(session)
        )),
        NavOutcome::OutOfRange { step_count, .. } => LocalReply::say(format!(
            "This recipe has steps 1 through {step_count}."
        )),
    }
}

fn step_instruction(session: &RecipeSession) -> String {
    session
        .current_step()
        .map(|s| s.instruction.clone())
        .unwrap_or_default()
}

/// Full spoken form of the current step: number, instruction, duration,
/// and tip when present.
pub fn read_step(session: &RecipeSession) -> String {
    let Some(step) = session.current_step() else {
        return "This recipe has no steps.".to_owned();
    };
    let mut text = format!("Step {}: {}", step.number, step.instruction);
    if let Some(minutes) = step.duration_minutes {
        text.push_str(&format!(" This takes about {minutes} minutes."));
    }
    if let Some(tip) = &step.tip {
        text.push_str(&format!(" Tip: {tip}"));
    }
    text
}
