use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{Completion, LanguageModel, Prompt, TokenUsage};
use crate::config::Settings;
use crate::error::{Error, ServiceError};

/// A client for any OpenAI-compatible Chat Completions endpoint
/// (DashScope compatible mode by default).
pub struct OpenAiClient {
    http: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenAiClient {
    /// Build the client. Fails fast on a missing credential so no
    /// orchestration starts with a client that cannot authenticate.
    pub fn new(settings: &Settings) -> Result<Self, Error> {
        if settings.api_key.trim().is_empty() {
            return Err(Error::Configuration("LLM API key is empty".to_string()));
        }

        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| Error::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            url: format!("{}/chat/completions", settings.base_url.trim_end_matches('/')),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            temperature: settings.temperature,
        })
    }

    fn build_request<'a>(&'a self, prompt: &'a Prompt) -> ApiRequest<'a> {
        ApiRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: vec![
                Message {
                    role: "system",
                    content: &prompt.system,
                },
                Message {
                    role: "user",
                    content: &prompt.user,
                },
            ],
        }
    }

    fn parse_response(resp: ApiResponse) -> Result<Completion, ServiceError> {
        let text = resp
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ServiceError::Malformed("response has no choices".to_string()))?;

        if text.trim().is_empty() {
            return Err(ServiceError::Malformed("empty completion".to_string()));
        }

        Ok(Completion {
            text,
            usage: resp.usage.map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            }),
        })
    }
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    async fn complete(&self, prompt: &Prompt) -> Result<Completion, ServiceError> {
        debug!(url = %self.url, model = %self.model, "sending completion request");

        let resp = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&self.build_request(prompt))
            .send()
            .await
            .map_err(|source| ServiceError::Transport {
                url: self.url.clone(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "LLM API returned an error");
            return Err(ServiceError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let api_resp: ApiResponse = resp
            .json()
            .await
            .map_err(|e| ServiceError::Malformed(e.to_string()))?;

        let completion = Self::parse_response(api_resp)?;
        if let Some(usage) = completion.usage {
            debug!(
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "completion received"
            );
        }
        Ok(completion)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// --- API types ---

#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ApiResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}
