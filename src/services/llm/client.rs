//! Chat-completions client for any OpenAI-compatible endpoint.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::error::LlmError;
use super::types::{ChatMessage, ChatRequest, ChatResponse};
use super::LlmAdvisor;

const ENDPOINT_CHAT: &str = "/chat/completions";

pub struct OpenAiCompatibleClient {
    http: Client,
    provider: String,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
}

impl OpenAiCompatibleClient {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        provider: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
        max_tokens: u32,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let provider = provider.into();
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Network {
                provider: provider.clone(),
                message: format!("failed to build http client: {}", e),
            })?;

        Ok(Self {
            http,
            provider,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            temperature,
            max_tokens,
            timeout,
        })
    }

    fn request_error(&self, err: reqwest::Error) -> LlmError {
        if err.is_timeout() {
            LlmError::Timeout {
                provider: self.provider.clone(),
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else {
            LlmError::Network {
                provider: self.provider.clone(),
                message: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl LlmAdvisor for OpenAiCompatibleClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
        };

        let url = format!("{}{}", self.base_url, ENDPOINT_CHAT);
        debug!(provider = %self.provider, model = %self.model, "Calling chat completions");

        let start = Instant::now();
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after_ms = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .map(|s| s * 1000);
            let body = response.text().await.unwrap_or_default();

            return Err(match status.as_u16() {
                401 | 403 => LlmError::Auth {
                    provider: self.provider.clone(),
                    message: body,
                },
                429 => LlmError::RateLimited {
                    provider: self.provider.clone(),
                    retry_after_ms,
                },
                code => LlmError::Api {
                    provider: self.provider.clone(),
                    status: code,
                    message: body,
                },
            });
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                self.request_error(e)
            } else {
                LlmError::InvalidResponse {
                    provider: self.provider.clone(),
                    message: e.to_string(),
                }
            }
        })?;

        debug!(
            provider = %self.provider,
            latency_ms = start.elapsed().as_millis() as u64,
            "Chat completion received"
        );

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| LlmError::InvalidResponse {
                provider: self.provider.clone(),
                message: "no choices in response".to_string(),
            })
    }
}
