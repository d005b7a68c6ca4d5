//! Project-wide constants.

pub const AUTHOR: &str = env!("CARGO_PKG_AUTHORS");
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable holding the LLM credential.
pub const API_KEY_ENV: &str = "API_KEY";

/// OpenAI-compatible endpoint used when `LLM_BASE_URL` is unset.
pub const DEFAULT_BASE_URL: &str = "https://dashscope.aliyuncs.com/compatible-mode/v1";

/// Default model when none is specified.
pub const DEFAULT_MODEL: &str = "qwen-plus";

pub const DEFAULT_TEMPERATURE: f32 = 0.0;

/// Per-request HTTP timeout for LLM calls.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 60_000;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";

/// Format a number with comma separators (e.g. 1,234,567).
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i).is_multiple_of(3) {
            result.push(',');
        }
        result.push(c);
    }
    result
}
