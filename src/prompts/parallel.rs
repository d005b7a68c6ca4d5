pub const SUMMARY_INSTRUCTION: &str = "Concisely summarize the following topic:";
pub const QUESTIONS_INSTRUCTION: &str =
    "Generate three interesting questions about the following topic:";
pub const KEY_TERMS_INSTRUCTION: &str =
    "Identify 5-10 key terms from the following topic, separated by commas:";
pub const TREND_INSTRUCTION: &str = "Analyze the following topic with a positive outlook:";

const SYNTHESIS_INTRO: &str = "Based on the following information:";
pub const SYNTHESIS_DIRECTIVE: &str = "Synthesize a comprehensive answer.";

/// System instruction for the synthesis call. `sections` are
/// `(heading, text)` pairs, emitted in the order given.
pub fn build_synthesis_system_prompt(sections: &[(&str, &str)]) -> String {
    let body = sections
        .iter()
        .map(|(heading, text)| format!("{}: {}", heading, text))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "{intro}\n{body}\n{directive}",
        intro = SYNTHESIS_INTRO,
        body = body,
        directive = SYNTHESIS_DIRECTIVE
    )
}

pub fn build_synthesis_user_prompt(topic: &str) -> String {
    format!("Original topic: {}", topic)
}
