use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use super::{Completion, LanguageModel, Prompt, TokenUsage};
use crate::error::ServiceError;

/// Wraps a model and sums the token usage of every successful call.
pub struct MeteredModel {
    inner: Arc<dyn LanguageModel>,
    usage: Mutex<TokenUsage>,
}

impl MeteredModel {
    pub fn new(inner: Arc<dyn LanguageModel>) -> Self {
        Self {
            inner,
            usage: Mutex::new(TokenUsage::default()),
        }
    }

    /// Usage accumulated since construction.
    pub fn usage(&self) -> TokenUsage {
        *self.usage.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl LanguageModel for MeteredModel {
    async fn complete(&self, prompt: &Prompt) -> Result<Completion, ServiceError> {
        let completion = self.inner.complete(prompt).await?;
        if let Some(usage) = completion.usage {
            self.usage
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .add(usage);
        }
        Ok(completion)
    }

    fn model(&self) -> &str {
        self.inner.model()
    }
}
