//! Prompt rendering for the two escalation tiers.
//!
//! Both variants present the claim as a TRUE/FALSE choice between option A
//! and option B and ask for a JSON `{"ruling": ...}` answer. The appeal
//! variant is marked as escalated and carries the ruling under appeal.

use appeal_registry::{Scenario, Verdict};

const ANSWER_FORMAT: &str = "Respond using ONLY the following JSON format:\n\
{\"ruling\": \"A\" or \"B\"}\n\
Your output must be only JSON without any formatting prefix or suffix.";

fn scenario_block(scenario: &Scenario) -> String {
    let mut block = format!(
        "CLAIM: {}\n\nOption A: {} (TRUE)\nOption B: {} (FALSE)\n\nCategory: {}",
        scenario.question, scenario.option_a, scenario.option_b, scenario.category
    );
    let context = scenario.context.as_deref().map(str::trim);
    if let Some(context) = context.filter(|c| !c.is_empty()) {
        block.push_str("\nContext: ");
        block.push_str(context);
    }
    block
}

/// Renders the prompt for the small optimistic panel.
pub fn render_initial(scenario: &Scenario) -> String {
    format!(
        "You are an AI validator. Evaluate if this claim is TRUE or FALSE.\n\n{}\n\n{}",
        scenario_block(scenario),
        ANSWER_FORMAT
    )
}

/// Renders the prompt for the appeal panel.
///
/// `previous` is the ruling being appealed; `None` renders as `none`.
pub fn render_appeal(scenario: &Scenario, previous: Option<Verdict>) -> String {
    let previous = previous.map_or("none", |v| v.as_str());
    format!(
        "You are an AI validator in an APPEAL of an earlier ruling. Evaluate carefully.\n\n\
         {}\nPrevious ruling: {}\n\n{}",
        scenario_block(scenario),
        previous,
        ANSWER_FORMAT
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> Scenario {
        Scenario::new("s1", "Cats beat dogs", "cats", "dogs", "Pets")
    }

    #[test]
    fn test_initial_prompt_contents() {
        let prompt = render_initial(&scenario());
        assert!(prompt.contains("CLAIM: Cats beat dogs"));
        assert!(prompt.contains("Option A: cats (TRUE)"));
        assert!(prompt.contains("Option B: dogs (FALSE)"));
        assert!(prompt.contains("Category: Pets"));
        assert!(prompt.contains(r#"{"ruling": "A" or "B"}"#));
        assert!(!prompt.contains("Previous ruling"));
        assert!(!prompt.contains("Context:"));
    }

    #[test]
    fn test_context_rendered_when_present() {
        let prompt = render_initial(&scenario().with_context("Shelter survey"));
        assert!(prompt.contains("Context: Shelter survey"));
    }

    #[test]
    fn test_blank_context_omitted() {
        for blank in ["", "   ", "\n\t"] {
            let scenario = Scenario {
                context: Some(blank.to_string()),
                ..scenario()
            };
            assert!(!render_initial(&scenario).contains("Context:"));
            assert!(!render_appeal(&scenario, None).contains("Context:"));
        }
    }

    #[test]
    fn test_appeal_prompt_surfaces_previous() {
        let prompt = render_appeal(&scenario(), Some(Verdict::A));
        assert!(prompt.contains("APPEAL"));
        assert!(prompt.contains("Previous ruling: A"));

        let fresh = render_appeal(&scenario(), None);
        assert!(fresh.contains("Previous ruling: none"));
    }
}
