const INTRO: &str = "You are a request routing coordinator. \
Analyze the user's request and decide which specialist handler should process it.";
const RULES_HEADER: &str = "Classify strictly by these rules:";
const RULES: &[&str] = &[
    "If the request is about booking, reserving or ordering (flights, hotels, restaurants), \
     output 'booker'.",
    "If the request asks for information, a lookup or general knowledge, output 'info'.",
    "If the request is unclear or fits neither category, output 'unclear'.",
];
const OUTPUT_RULE: &str =
    "Output exactly one word: 'booker', 'info' or 'unclear'. Do not add anything else.";

pub fn build_router_system_prompt() -> String {
    let rules = RULES
        .iter()
        .map(|rule| format!("- {}", rule))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "{intro}\n\n{rules_header}\n{rules}\n\n{output_rule}",
        intro = INTRO,
        rules_header = RULES_HEADER,
        rules = rules,
        output_rule = OUTPUT_RULE
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_names_every_label() {
        let prompt = build_router_system_prompt();
        for label in ["'booker'", "'info'", "'unclear'"] {
            assert!(prompt.contains(label));
        }
    }

    #[test]
    fn prompt_includes_rules() {
        let prompt = build_router_system_prompt();
        for rule in RULES {
            assert!(prompt.contains(rule));
        }
    }
}
