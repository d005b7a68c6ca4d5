use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::Engine;
use crate::error::{Error, Result};
use crate::llm::{LanguageModel, Prompt};
use crate::prompts::parallel::{
    KEY_TERMS_INSTRUCTION, QUESTIONS_INSTRUCTION, SUMMARY_INSTRUCTION, TREND_INSTRUCTION,
    build_synthesis_system_prompt, build_synthesis_user_prompt,
};

/// A named instruction applied to the topic during the fan-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTask {
    /// Identity of the task; also its position in the synthesis prompt.
    pub name: String,
    /// Label the task's output is given in the synthesis prompt.
    pub heading: String,
    pub instruction: String,
}

impl PromptTask {
    pub fn new(
        name: impl Into<String>,
        heading: impl Into<String>,
        instruction: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            heading: heading.into(),
            instruction: instruction.into(),
        }
    }

    /// Summary, questions, key terms and outlook.
    pub fn defaults() -> Vec<PromptTask> {
        vec![
            PromptTask::new("summary", "Summary", SUMMARY_INSTRUCTION),
            PromptTask::new("questions", "Related questions", QUESTIONS_INSTRUCTION),
            PromptTask::new("key_terms", "Key terms", KEY_TERMS_INSTRUCTION),
            PromptTask::new("trend", "Outlook", TREND_INSTRUCTION),
        ]
    }
}

#[derive(Debug, Clone, Default)]
pub struct FanOutConfig {
    /// Deadline for the gather. On expiry every outstanding call is
    /// dropped and the run fails with [`Error::Timeout`].
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone)]
struct TaskOutput {
    heading: String,
    text: String,
}

/// Every task's output plus the original topic, keyed by task name.
#[derive(Debug, Clone)]
pub struct SynthesisInput {
    topic: String,
    results: BTreeMap<String, TaskOutput>,
}

impl SynthesisInput {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            results: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, task: &PromptTask, text: String) {
        self.results.insert(
            task.name.clone(),
            TaskOutput {
                heading: task.heading.clone(),
                text,
            },
        );
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn get(&self, task: &str) -> Option<&str> {
        self.results.get(task).map(|o| o.text.as_str())
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// The synthesis prompt. Sections follow task-name order, so the text
    /// depends only on the contents, never on arrival order.
    pub fn to_prompt(&self) -> Prompt {
        let sections: Vec<(&str, &str)> = self
            .results
            .values()
            .map(|o| (o.heading.as_str(), o.text.as_str()))
            .collect();
        Prompt::new(
            build_synthesis_system_prompt(&sections),
            build_synthesis_user_prompt(&self.topic),
        )
    }
}

/// Runs every task concurrently against one topic, then synthesizes.
pub struct FanOutEngine {
    llm: Arc<dyn LanguageModel>,
    tasks: Vec<PromptTask>,
    config: FanOutConfig,
}

impl FanOutEngine {
    pub fn new(
        llm: Arc<dyn LanguageModel>,
        tasks: Vec<PromptTask>,
        config: FanOutConfig,
    ) -> Result<Self> {
        if tasks.is_empty() {
            return Err(Error::Configuration(
                "fan-out engine needs at least one task".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for task in &tasks {
            if !seen.insert(task.name.as_str()) {
                return Err(Error::Configuration(format!(
                    "duplicate fan-out task name: {}",
                    task.name
                )));
            }
        }

        Ok(Self { llm, tasks, config })
    }

    pub fn tasks(&self) -> &[PromptTask] {
        &self.tasks
    }

    /// Issue every task at once and wait for all of them. A failure does not
    /// cut the gather short; it is reported once everything has settled.
    async fn gather(&self, topic: &str) -> Result<SynthesisInput> {
        let futures: Vec<_> = self
            .tasks
            .iter()
            .map(|task| async move {
                let started = Instant::now();
                let prompt = Prompt::new(task.instruction.as_str(), topic);
                let result = self.llm.complete(&prompt).await;
                match &result {
                    Ok(_) => debug!(
                        task = %task.name,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "task completed"
                    ),
                    Err(e) => warn!(task = %task.name, error = %e, "task failed"),
                }
                (task, result)
            })
            .collect();

        let joined = futures::future::join_all(futures);
        let mut outcomes = match self.config.timeout {
            Some(limit) => tokio::time::timeout(limit, joined).await.map_err(|_| {
                warn!(timeout_ms = limit.as_millis() as u64, "fan-out timed out");
                Error::Timeout(limit)
            })?,
            None => joined.await,
        };

        // First failure by task name, so the reported error is stable too.
        outcomes.sort_by(|(a, _), (b, _)| a.name.cmp(&b.name));

        let mut input = SynthesisInput::new(topic);
        for (task, result) in outcomes {
            let completion = result.map_err(|e| Error::service(task.name.as_str(), e))?;
            input.insert(task, completion.text);
        }
        Ok(input)
    }
}

#[async_trait]
impl Engine for FanOutEngine {
    async fn run(&self, topic: &str) -> Result<String> {
        info!(tasks = self.tasks.len(), topic_len = topic.len(), "fanning out");

        let input = self.gather(topic).await?;

        debug!(results = input.len(), "all tasks settled, synthesizing");
        let completion = self
            .llm
            .complete(&input.to_prompt())
            .await
            .map_err(|e| Error::service("synthesis", e))?;

        info!("synthesis complete");
        Ok(completion.text)
    }
}
