//! Prompts sent to the language model
//!
//! The wording here is part of the external contract: the validator expects
//! a bare integer back from the fill prompts and a short unformatted sentence
//! back from the suggestion prompt. Change the wording and the response
//! format may drift with it.

use super::AdvisoryPrompt;
use dishfill_domain::EstimationTables;
use dishfill_types::{Compartment, PerCompartment};

/// Token budget for the loading suggestion
pub const SUGGESTION_MAX_TOKENS: u32 = 50;

/// Token budget for a bare percentage answer
pub const FILL_MAX_TOKENS: u32 = 8;

/// What a prompt asks the model for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptPurpose {
    /// Overall percentage, first attempt
    FillPercentage,
    /// Overall percentage, retry after a rejected answer
    StrictFillPercentage,
    /// Free-text loading suggestion
    Suggestion,
}

impl PromptPurpose {
    pub fn label(&self) -> &'static str {
        match self {
            PromptPurpose::FillPercentage => "fill",
            PromptPurpose::StrictFillPercentage => "fill_strict",
            PromptPurpose::Suggestion => "suggestion",
        }
    }
}

// ============================================================================
// Shared prompt fragments
// ============================================================================

fn compartment_title(compartment: Compartment) -> &'static str {
    match compartment {
        Compartment::Large => "Large",
        Compartment::Medium => "Medium",
        Compartment::Small => "Small",
    }
}

/// One line per compartment: "- Large: Large plate and large bowl. There are 10 slots left"
fn remaining_lines(remaining: &PerCompartment<u32>) -> String {
    remaining
        .iter()
        .map(|(c, left)| {
            format!(
                "- {}: {}. There are {} slots left\n",
                compartment_title(c),
                c.contents(),
                left
            )
        })
        .collect()
}

// ============================================================================
// Prompt builders
// ============================================================================

/// Ask for a brief suggestion of what else fits before starting a wash
pub fn build_suggestion_prompt(counts: &PerCompartment<u32>, tables: &EstimationTables) -> AdvisoryPrompt {
    build_suggestion_prompt_with_budget(counts, tables, SUGGESTION_MAX_TOKENS)
}

pub fn build_suggestion_prompt_with_budget(
    counts: &PerCompartment<u32>,
    tables: &EstimationTables,
    max_tokens: u32,
) -> AdvisoryPrompt {
    let remaining = tables.capacity.remaining(counts);

    let mut text = String::from("The dishwasher has remaining capacity in three compartments:\n");
    text.push_str(&remaining_lines(&remaining));
    text.push_str("\nBased on this, suggest what types of items the user could add before starting a wash.\n\n");
    text.push_str(&format!(
        "Be brief, helpful and respond without any formatting. No more than {} tokens.",
        max_tokens
    ));

    AdvisoryPrompt {
        purpose: PromptPurpose::Suggestion,
        text,
        max_tokens,
    }
}

/// Ask for the overall fill percentage as a bare integer.
///
/// `strict` is used for the single retry after the first answer was rejected.
pub fn build_fill_prompt(
    counts: &PerCompartment<u32>,
    tables: &EstimationTables,
    strict: bool,
) -> AdvisoryPrompt {
    build_fill_prompt_with_budget(counts, tables, strict, FILL_MAX_TOKENS)
}

pub fn build_fill_prompt_with_budget(
    counts: &PerCompartment<u32>,
    tables: &EstimationTables,
    strict: bool,
    max_tokens: u32,
) -> AdvisoryPrompt {
    let capacity = &tables.capacity;
    let remaining = capacity.remaining(counts);
    let weights = tables.weights.as_table();

    let mut text = String::from("The dishwasher has three compartments:\n");
    for (c, count) in counts.iter() {
        text.push_str(&format!(
            "- {} ({}): {} of {} slots used, {} slots left\n",
            compartment_title(c),
            c.contents(),
            count,
            capacity.capacity_of(c),
            remaining.get(c)
        ));
    }
    text.push_str(&format!(
        "\nOverall fullness weights each compartment's fill ratio: large {}, medium {}, small {}.\n",
        weights.large, weights.medium, weights.small
    ));
    text.push_str("\nEstimate how full the dishwasher is overall as a percentage.\n\n");
    text.push_str("Respond with only a whole number between 0 and 100. No words, no explanation.");

    if strict {
        text.push_str(
            "\nYour previous answer could not be used. Reply with digits only, for example: 42",
        );
    }

    AdvisoryPrompt {
        purpose: if strict {
            PromptPurpose::StrictFillPercentage
        } else {
            PromptPurpose::FillPercentage
        },
        text,
        max_tokens,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggestion_prompt_lists_remaining_slots() {
        let tables = EstimationTables::default();
        let prompt = build_suggestion_prompt(&PerCompartment::new(4, 16, 25), &tables);
        assert_eq!(prompt.purpose, PromptPurpose::Suggestion);
        assert_eq!(prompt.max_tokens, 50);
        assert!(prompt
            .text
            .contains("- Large: Large plate and large bowl. There are 10 slots left"));
        assert!(prompt.text.contains(
            "- Medium: Medium plate, medium cup, medium bowl and a tea cup. There are 0 slots left"
        ));
        // Overfilled compartments report zero, never a negative count
        assert!(prompt.text.contains("and a glass. There are 0 slots left"));
        assert!(prompt.text.ends_with("No more than 50 tokens."));
    }

    #[test]
    fn test_fill_prompt_demands_bare_integer() {
        let tables = EstimationTables::default();
        let prompt = build_fill_prompt(&PerCompartment::new(7, 0, 10), &tables, false);
        assert_eq!(prompt.purpose, PromptPurpose::FillPercentage);
        assert_eq!(prompt.max_tokens, FILL_MAX_TOKENS);
        assert!(prompt.text.contains("7 of 14 slots used, 7 slots left"));
        assert!(prompt.text.contains("large 0.5, medium 0.3, small 0.2"));
        assert!(prompt.text.contains("whole number between 0 and 100"));
        assert!(!prompt.text.contains("previous answer"));
    }

    #[test]
    fn test_strict_fill_prompt_extends_standard_prompt() {
        let tables = EstimationTables::default();
        let counts = PerCompartment::new(1, 2, 3);
        let standard = build_fill_prompt(&counts, &tables, false);
        let strict = build_fill_prompt(&counts, &tables, true);
        assert_eq!(strict.purpose, PromptPurpose::StrictFillPercentage);
        assert!(strict.text.starts_with(&standard.text));
        assert!(strict.text.contains("digits only"));
    }

    #[test]
    fn test_prompt_is_stable_for_same_input() {
        let tables = EstimationTables::default();
        let counts = PerCompartment::new(3, 3, 3);
        assert_eq!(
            build_suggestion_prompt(&counts, &tables),
            build_suggestion_prompt(&counts, &tables)
        );
    }
}
