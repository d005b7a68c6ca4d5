//! Startup banner and session summary display.

use std::time::Duration;

use crate::consts::{AUTHOR, VERSION, format_number};
use crate::llm::TokenUsage;

/// Run configuration for display in the startup banner.
pub struct BannerInfo<'a> {
    pub mode: &'a str,
    pub endpoint: &'a str,
    pub model: &'a str,
    pub temperature: f32,
    pub timeout: Option<Duration>,
}

pub fn render_banner(info: &BannerInfo) -> String {
    let timeout = match info.timeout {
        Some(limit) => format!("{}s", limit.as_secs_f32()),
        None => "none".to_string(),
    };
    format!(
        r#"
   maestro {version}
   by          {author}
   mode        {mode}
   endpoint    {endpoint}
   model       {model} (temperature {temperature})
   timeout     {timeout}
"#,
        version = VERSION,
        author = AUTHOR,
        mode = info.mode,
        endpoint = info.endpoint,
        model = info.model,
        temperature = info.temperature,
        timeout = timeout,
    )
}

/// Print the startup banner with run info.
pub fn print_banner(info: &BannerInfo) {
    println!("{}", render_banner(info));
}

/// Token usage line for the end of a session, if any tokens were reported.
pub fn render_session_summary(usage: TokenUsage) -> Option<String> {
    (usage.total() > 0).then(|| {
        format!(
            "session: {:>6} input + {:>6} output = {:>6} tokens",
            format_number(usage.input_tokens),
            format_number(usage.output_tokens),
            format_number(usage.total()),
        )
    })
}

pub fn print_session_summary(usage: TokenUsage) {
    if let Some(line) = render_session_summary(usage) {
        println!("{}", line);
    }
}
