//! Recipe data model and the per-session step cursor.
//!
//! The recipe itself is read-only during a voice session; only the step
//! cursor moves, and it always stays clamped to `[1, step_count]`.

use crate::text::{normalize, tokenize};
use serde::{Deserialize, Serialize};

/// One instruction step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeStep {
    /// 1-based step number.
    pub number: u32,
    /// Spoken instruction text.
    pub instruction: String,
    /// Optional duration in minutes.
    pub duration_minutes: Option<u32>,
    /// Optional tip appended when the step is read out.
    pub tip: Option<String>,
}

/// One ingredient line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub quantity: f32,
    pub unit: String,
    /// Optional preparation note ("minced", "room temperature").
    pub preparation: Option<String>,
    pub category: Option<String>,
}

impl Ingredient {
    /// Spoken form of the quantity: "3 cloves garlic", "0.5 cup butter".
    pub fn spoken_amount(&self) -> String {
        let qty = if (self.quantity.fract()).abs() < f32::EPSILON {
            format!("{}", self.quantity as u32)
        } else {
            format!("{}", self.quantity)
        };
        if self.unit.is_empty() {
            format!("{qty} {}", self.name)
        } else {
            format!("{qty} {} {}", self.unit, self.name)
        }
    }
}

/// A known substitution option for one ingredient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Substitution {
    pub name: String,
    /// Replacement ratio, e.g. "1:1".
    pub ratio: String,
    pub notes: Option<String>,
}

/// A complete recipe snapshot, as provided by the surrounding app.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub title: String,
    pub steps: Vec<RecipeStep>,
    pub ingredients: Vec<Ingredient>,
    /// Substitution table keyed by ingredient name.
    pub substitutions: Vec<(String, Vec<Substitution>)>,
}

impl Recipe {
    /// Substitution entries for an ingredient, matched on normalized name.
    pub fn substitutions_for(&self, ingredient: &str) -> Option<&[Substitution]> {
        let wanted = normalize(ingredient);
        self.substitutions
            .iter()
            .find(|(name, _)| normalize(name) == wanted)
            .map(|(_, subs)| subs.as_slice())
    }
}

/// Outcome of a navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavOutcome {
    /// The cursor moved to this step.
    Moved(u32),
    /// Already at the requested step; nothing changed.
    AlreadyThere(u32),
    /// Requested step is outside `[1, step_count]`; cursor unchanged.
    OutOfRange { requested: i64, step_count: u32 },
}

/// A recipe plus the mutable step cursor for one cooking session.
#[derive(Debug, Clone)]
pub struct RecipeSession {
    recipe: Recipe,
    current_step: u32,
}

impl RecipeSession {
    /// Start a session at step 1. Recipes with no steps are rejected by
    /// the surrounding app before a voice session starts; a defensive
    /// minimum of one step keeps the cursor invariant simple here.
    pub fn new(recipe: Recipe) -> Self {
        Self {
            recipe,
            current_step: 1,
        }
    }

    pub fn recipe(&self) -> &Recipe {
        &self.recipe
    }

    pub fn current_step_number(&self) -> u32 {
        self.current_step
    }

    pub fn step_count(&self) -> u32 {
        self.recipe.steps.len() as u32
    }

    /// The step the cursor points at, if the recipe has any steps.
    pub fn current_step(&self) -> Option<&RecipeStep> {
        self.recipe
            .steps
            .get(self.current_step.saturating_sub(1) as usize)
    }

    /// Jump to an absolute step. Out-of-range requests never mutate.
    pub fn go_to(&mut self, requested: i64) -> NavOutcome {
        let count = self.step_count();
        if requested < 1 || requested > i64::from(count) {
            return NavOutcome::OutOfRange {
                requested,
                step_count: count,
            };
        }
        let target = requested as u32;
        if target == self.current_step {
            NavOutcome::AlreadyThere(target)
        } else {
            self.current_step = target;
            NavOutcome::Moved(target)
        }
    }

    /// Advance one step.
    pub fn next(&mut self) -> NavOutcome {
        self.go_to(i64::from(self.current_step) + 1)
    }

    /// Go back one step.
    pub fn previous(&mut self) -> NavOutcome {
        self.go_to(i64::from(self.current_step) - 1)
    }

    /// Fuzzy-match an ingredient by name against a spoken query.
    ///
    /// Score: 5 when the normalized ingredient name appears as a
    /// substring of the normalized query, plus 1 per overlapping token.
    /// A match needs score >= 2. Ties break by first-seen order.
    pub fn find_ingredient(&self, query: &str) -> Option<&Ingredient> {
        let norm_query = normalize(query);
        let query_tokens = tokenize(query);

        let mut best: Option<(&Ingredient, u32)> = None;
        for ingredient in &self.recipe.ingredients {
            let norm_name = normalize(&ingredient.name);
            if norm_name.is_empty() {
                continue;
            }
            let mut score = 0u32;
            if norm_query.contains(&norm_name) {
                score += 5;
            }
            let name_tokens = tokenize(&ingredient.name);
            score += query_tokens
                .iter()
                .filter(|t| name_tokens.contains(t))
                .count() as u32;

            if score >= 2 {
                // Strictly-greater keeps the first-seen winner on ties.
                match best {
                    Some((_, prev)) if score <= prev => {}
                    _ => best = Some((ingredient, score)),
                }
            }
        }
        best.map(|(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(n: u32, text: &str) -> RecipeStep {
        RecipeStep {
            number: n,
            instruction: text.to_owned(),
            duration_minutes: None,
            tip: None,
        }
    }

    fn ingredient(name: &str, quantity: f32, unit: &str) -> Ingredient {
        Ingredient {
            name: name.to_owned(),
            quantity,
            unit: unit.to_owned(),
            preparation: None,
            category: None,
        }
    }

    pub(crate) fn test_recipe() -> Recipe {
        Recipe {
            title: "Garlic Butter Pasta".to_owned(),
            steps: (1..=5)
                .map(|n| step(n, &format!("Do the thing for step {n}.")))
                .collect(),
            ingredients: vec![
                ingredient("garlic", 3.0, "cloves"),
                ingredient("butter", 2.0, "tablespoons"),
                ingredient("olive oil", 1.0, "tablespoon"),
            ],
            substitutions: vec![(
                "butter".to_owned(),
                vec![Substitution {
                    name: "margarine".to_owned(),
                    ratio: "1:1".to_owned(),
                    notes: Some("milder flavor".to_owned()),
                }],
            )],
        }
    }

    // ── navigation ──────────────────────────────────────────────────

    #[test]
    fn go_to_moves_within_range() {
        let mut session = RecipeSession::new(test_recipe());
        assert_eq!(session.go_to(4), NavOutcome::Moved(4));
        assert_eq!(session.current_step_number(), 4);
    }

    #[test]
    fn out_of_range_never_mutates() {
        let mut session = RecipeSession::new(test_recipe());
        session.go_to(2);
        assert_eq!(
            session.go_to(9),
            NavOutcome::OutOfRange {
                requested: 9,
                step_count: 5
            }
        );
        assert_eq!(
            session.go_to(0),
            NavOutcome::OutOfRange {
                requested: 0,
                step_count: 5
            }
        );
        assert_eq!(session.current_step_number(), 2);
    }

    #[test]
    fn already_there_leaves_state_unchanged() {
        let mut session = RecipeSession::new(test_recipe());
        session.go_to(3);
        assert_eq!(session.go_to(3), NavOutcome::AlreadyThere(3));
        assert_eq!(session.current_step_number(), 3);
    }

    #[test]
    fn next_and_previous_clamp_at_edges() {
        let mut session = RecipeSession::new(test_recipe());
        assert!(matches!(
            session.previous(),
            NavOutcome::OutOfRange { requested: 0, .. }
        ));
        session.go_to(5);
        assert!(matches!(session.next(), NavOutcome::OutOfRange { .. }));
        assert_eq!(session.current_step_number(), 5);
    }

    // ── fuzzy ingredient match ──────────────────────────────────────

    #[test]
    fn substring_match_scores_high() {
        let session = RecipeSession::new(test_recipe());
        let found = session.find_ingredient("how much garlic do I need");
        assert_eq!(found.map(|i| i.name.as_str()), Some("garlic"));
    }

    #[test]
    fn token_overlap_alone_below_threshold_is_rejected() {
        let session = RecipeSession::new(test_recipe());
        // "oil" overlaps one token of "olive oil" — score 1, below 2.
        assert!(session.find_ingredient("how much oil").is_none());
    }

    #[test]
    fn multiword_name_matches_on_both_tokens() {
        let session = RecipeSession::new(test_recipe());
        let found = session.find_ingredient("how much olive oil");
        assert_eq!(found.map(|i| i.name.as_str()), Some("olive oil"));
    }

    #[test]
    fn ties_keep_first_seen_ingredient() {
        let mut recipe = test_recipe();
        recipe.ingredients = vec![
            ingredient("red pepper", 1.0, ""),
            ingredient("green pepper", 1.0, ""),
        ];
        let session = RecipeSession::new(recipe);
        // "pepper" alone: each scores 1 (token overlap), no match at all.
        assert!(session.find_ingredient("pepper please").is_none());
        // "red pepper" substring-matches the first entry.
        let found = session.find_ingredient("how much red pepper");
        assert_eq!(found.map(|i| i.name.as_str()), Some("red pepper"));
    }

    #[test]
    fn spoken_amount_formats() {
        assert_eq!(
            ingredient("garlic", 3.0, "cloves").spoken_amount(),
            "3 cloves garlic"
        );
        assert_eq!(
            ingredient("butter", 0.5, "cup").spoken_amount(),
            "0.5 cup butter"
        );
        assert_eq!(ingredient("eggs", 2.0, "").spoken_amount(), "2 eggs");
    }

    #[test]
    fn substitution_lookup_is_name_normalized() {
        let recipe = test_recipe();
        let subs = recipe.substitutions_for("Butter!").unwrap();
        assert_eq!(subs[0].name, "margarine");
        assert!(recipe.substitutions_for("saffron").is_none());
    }
}
