/// LLM Client: the single point of entry for all completion calls.
///
/// ARCHITECTURAL RULE: No other module may call the completion endpoint directly.
/// Interview logic depends on the `CompletionGateway` trait only; `LlmClient` is the
/// production implementation against any OpenAI-compatible chat-completions API.
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

pub mod extraction;
pub mod prompts;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// One entry of the message list sent to the completion endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Opaque completion call: model id + ordered messages in, raw text out.
///
/// Carried in `AppState` as `Arc<dyn CompletionGateway>`.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    async fn complete(&self, model_id: &str, messages: &[ChatMessage]) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl ChatCompletionResponse {
    /// Text of the first choice, if the provider returned any.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
    }
}

// Providers disagree on the error envelope; OpenAI and Gemini both nest it
// as {"error": {"message": ...}}, some proxies return a bare list of those.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProviderError {
    Single { error: ProviderErrorBody },
    List(Vec<ProviderError>),
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: String,
}

impl ProviderError {
    fn message(self) -> Option<String> {
        match self {
            ProviderError::Single { error } => Some(error.message),
            ProviderError::List(items) => items.into_iter().next().and_then(|e| e.message()),
        }
    }
}

/// Settings for the production gateway. Built from `Config` in `main`.
#[derive(Debug, Clone)]
pub struct LlmClientConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
    pub max_retries: u32,
}

/// OpenAI-compatible chat-completions client with retry on 429/5xx.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    endpoint: String,
    api_key: String,
    max_retries: u32,
    /// First retry delay; doubles on every further retry.
    backoff: Duration,
}

impl LlmClient {
    pub fn new(config: LlmClientConfig) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(config.timeout).build()?,
            endpoint: completions_url(&config.base_url),
            api_key: config.api_key,
            max_retries: config.max_retries,
            backoff: Duration::from_secs(1),
        })
    }

    /// Makes a raw call to the chat-completions endpoint, returning the full response.
    /// Retries on 429 (rate limit), 5xx and transport errors with exponential backoff,
    /// up to `max_retries` times after the first attempt.
    pub async fn call(
        &self,
        model_id: &str,
        messages: &[ChatMessage],
    ) -> Result<ChatCompletionResponse, LlmError> {
        let request_body = ChatCompletionRequest {
            model: model_id,
            messages,
        };

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s
                let delay = self.backoff * (1u32 << (attempt - 1).min(16));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<ProviderError>(&body)
                    .ok()
                    .and_then(ProviderError::message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let completion: ChatCompletionResponse = response.json().await?;

            if let Some(usage) = &completion.usage {
                debug!(
                    "LLM call succeeded: model={}, prompt_tokens={}, completion_tokens={}",
                    model_id, usage.prompt_tokens, usage.completion_tokens
                );
            }

            return Ok(completion);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: self.max_retries,
        }))
    }
}

#[async_trait]
impl CompletionGateway for LlmClient {
    async fn complete(&self, model_id: &str, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let response = self.call(model_id, messages).await?;
        response
            .text()
            .filter(|t| !t.trim().is_empty())
            .map(str::to_string)
            .ok_or(LlmError::EmptyContent)
    }
}

/// Joins the configured base URL with the chat-completions path.
fn completions_url(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

/// Scripted gateways for exercising the interview pipeline without a network.
#[cfg(test)]
pub mod stub {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// Replays queued replies in order and records every prompt it receives.
    /// Once the queue is empty every further call fails with a 503.
    #[derive(Default)]
    pub struct ScriptedGateway {
        replies: Mutex<VecDeque<Result<String, LlmError>>>,
        prompts: Mutex<Vec<(String, Vec<ChatMessage>)>>,
    }

    impl ScriptedGateway {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn reply(self, text: impl Into<String>) -> Self {
            self.replies.lock().unwrap().push_back(Ok(text.into()));
            self
        }

        pub fn fail(self, status: u16) -> Self {
            self.replies.lock().unwrap().push_back(Err(LlmError::Api {
                status,
                message: "scripted failure".to_string(),
            }));
            self
        }

        pub fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }

        /// Content of the first message of the n-th call.
        pub fn prompt(&self, n: usize) -> String {
            self.prompts.lock().unwrap()[n].1[0].content.clone()
        }

        pub fn model(&self, n: usize) -> String {
            self.prompts.lock().unwrap()[n].0.clone()
        }
    }

    #[async_trait]
    impl CompletionGateway for ScriptedGateway {
        async fn complete(
            &self,
            model_id: &str,
            messages: &[ChatMessage],
        ) -> Result<String, LlmError> {
            self.prompts
                .lock()
                .unwrap()
                .push((model_id.to_string(), messages.to_vec()));
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(LlmError::Api {
                    status: 503,
                    message: "no scripted reply left".to_string(),
                }))
        }
    }
}
