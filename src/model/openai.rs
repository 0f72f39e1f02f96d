// SPDX-License-Identifier: MIT

//! OpenAI Model - chat-completions API implementation
//!
//! Rate limits (429) and server errors (5xx) are retried with exponential
//! backoff before the failure is reported.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::env;
use std::time::Duration;

use super::{Content, GenerationConfig, Model, Role};
use crate::engine::error::ModelError;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const MAX_RETRIES: u32 = 3;
const DEFAULT_BACKOFF: Duration = Duration::from_millis(500);

/// Chat-completions client for OpenAI and compatible endpoints
pub struct OpenAIModel {
    client: Client,
    api_key: String,
    model_name: String,
    base_url: String,
    backoff: Duration,
}

impl OpenAIModel {
    /// Create a new OpenAIModel
    ///
    /// Requires `OPENAI_API_KEY` environment variable to be set.
    /// Optionally uses `OPENAI_BASE_URL` for custom endpoints.
    pub fn new(model_name: impl Into<String>) -> Result<Self, ModelError> {
        let api_key = env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ModelError::ApiKeyMissing("openai".to_string()))?;
        let base_url = env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        Ok(Self::with_endpoint(model_name, api_key, base_url))
    }

    pub fn with_endpoint(
        model_name: impl Into<String>,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model_name: model_name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            backoff: DEFAULT_BACKOFF,
        }
    }

    /// Base delay before the first retry; doubles on each further attempt
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    fn content_to_openai_message(content: &Content) -> Value {
        let role = match content.role {
            Role::System => "system",
            Role::User => "user",
            Role::Model => "assistant",
        };
        json!({ "role": role, "content": content.text })
    }

    fn request_body(&self, history: &[Content], config: Option<&GenerationConfig>) -> Value {
        let messages: Vec<Value> = history.iter().map(Self::content_to_openai_message).collect();

        let mut body = json!({
            "model": self.model_name,
            "messages": messages
        });

        if let Some(cfg) = config {
            if let Some(temp) = cfg.temperature {
                body["temperature"] = json!(temp);
            }
            if let Some(max_tokens) = cfg.max_output_tokens {
                body["max_tokens"] = json!(max_tokens);
            }
            if let Some(top_p) = cfg.top_p {
                body["top_p"] = json!(top_p);
            }
        }
        body
    }

    fn parse_openai_response(response: &Value) -> Result<Content, ModelError> {
        let choice = response["choices"]
            .as_array()
            .and_then(|c| c.first())
            .ok_or_else(|| ModelError::InvalidResponse("no choices in response".to_string()))?;

        let text = choice["message"]["content"]
            .as_str()
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| ModelError::InvalidResponse("empty message content".to_string()))?;

        Ok(Content::model(text))
    }

    fn is_retryable(status: StatusCode) -> bool {
        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
    }
}

#[async_trait]
impl Model for OpenAIModel {
    async fn generate_content(
        &self,
        history: &[Content],
        config: Option<&GenerationConfig>,
    ) -> Result<Content, ModelError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.request_body(history, config);

        log::debug!(
            "OpenAI request body: {}",
            serde_json::to_string_pretty(&body).unwrap_or_default()
        );

        let mut attempt = 0;
        loop {
            attempt += 1;
            let resp = self
                .client
                .post(&url)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await?;

            let status = resp.status();
            if status.is_success() {
                let resp_json: Value = resp.json().await?;
                log::debug!("OpenAI response: {}", resp_json);
                return Self::parse_openai_response(&resp_json);
            }

            let text = resp.text().await.unwrap_or_default();
            if !Self::is_retryable(status) || attempt > MAX_RETRIES {
                log::error!("OpenAI API error after {} attempt(s): {} {}", attempt, status, text);
                return Err(if status == StatusCode::TOO_MANY_REQUESTS {
                    ModelError::RateLimited { attempts: attempt }
                } else {
                    ModelError::Api {
                        status: status.as_u16(),
                        body: text,
                    }
                });
            }

            let delay = self.backoff * 2u32.pow(attempt - 1);
            log::warn!(
                "OpenAI returned {} (attempt {}/{}), retrying in {:?}",
                status,
                attempt,
                MAX_RETRIES + 1,
                delay
            );
            tokio::time::sleep(delay).await;
        }
    }
}
