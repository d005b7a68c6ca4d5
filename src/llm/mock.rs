use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::{Completion, LanguageModel, Prompt, TokenUsage};
use crate::error::ServiceError;

enum Outcome {
    Reply(String),
    Fail(String),
}

struct Rule {
    needle: String,
    outcome: Outcome,
    delay: Duration,
    usage: Option<TokenUsage>,
}

/// A scripted model for tests.
///
/// Replies are chosen by the first rule whose needle occurs in the prompt's
/// system instruction, so concurrent callers get stable answers regardless
/// of scheduling. An empty needle matches everything.
pub struct MockModel {
    rules: Vec<Rule>,
    calls: Mutex<Vec<Prompt>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl Default for MockModel {
    fn default() -> Self {
        Self::new()
    }
}

impl MockModel {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    fn rule(
        mut self,
        needle: &str,
        outcome: Outcome,
        delay: Duration,
        usage: Option<TokenUsage>,
    ) -> Self {
        self.rules.push(Rule {
            needle: needle.to_string(),
            outcome,
            delay,
            usage,
        });
        self
    }

    pub fn reply(self, needle: &str, text: &str) -> Self {
        self.rule(needle, Outcome::Reply(text.to_string()), Duration::ZERO, None)
    }

    /// Reply only after `delay`, to shape completion order.
    pub fn reply_after(self, needle: &str, text: &str, delay: Duration) -> Self {
        self.rule(needle, Outcome::Reply(text.to_string()), delay, None)
    }

    pub fn reply_with_usage(self, needle: &str, text: &str, usage: TokenUsage) -> Self {
        self.rule(needle, Outcome::Reply(text.to_string()), Duration::ZERO, Some(usage))
    }

    pub fn fail(self, needle: &str, message: &str) -> Self {
        self.rule(needle, Outcome::Fail(message.to_string()), Duration::ZERO, None)
    }

    pub fn fail_after(self, needle: &str, message: &str, delay: Duration) -> Self {
        self.rule(needle, Outcome::Fail(message.to_string()), delay, None)
    }

    /// Every prompt received so far, in arrival order.
    pub fn calls(&self) -> Vec<Prompt> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Highest number of calls that were outstanding at the same time.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Calls currently outstanding. Dropped calls no longer count.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl LanguageModel for MockModel {
    async fn complete(&self, prompt: &Prompt) -> Result<Completion, ServiceError> {
        self.calls.lock().unwrap().push(prompt.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        let rule = self
            .rules
            .iter()
            .find(|r| prompt.system.contains(&r.needle))
            .ok_or_else(|| {
                ServiceError::Other(format!(
                    "MockModel: no reply scripted for system prompt {:?}",
                    prompt.system
                ))
            })?;

        // Always suspend once so concurrent callers overlap.
        if rule.delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(rule.delay).await;
        }

        match &rule.outcome {
            Outcome::Reply(text) => Ok(Completion {
                text: text.clone(),
                usage: rule.usage,
            }),
            Outcome::Fail(message) => Err(ServiceError::Other(message.clone())),
        }
    }

    fn model(&self) -> &str {
        "mock"
    }
}
