//! Chat-completion client.
//!
//! [`ChatCompletion`] is the seam the session talks to; [`HttpChatClient`]
//! implements it against an OpenAI-style `chat/completions` endpoint.
//!
//! Retry strategy:
//! - HTTP 429 and 5xx → retry with exponential backoff
//! - other 4xx → fail immediately
//! - network errors → retry
//!
//! Providers disagree on where the reply text lives, so a successful
//! response is probed with a fixed list of shape matchers (see
//! [`extract_reply`]).

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

use crate::config::ChatConfig;
use crate::models::Role;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("chat client misconfigured: {0}")]
    Configuration(String),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("unrecognized response shape: {payload}")]
    ResponseShape { payload: String },
}

#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Send one completion request and return the assistant's reply text.
    async fn complete(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, ChatError>;
}

pub struct HttpChatClient {
    client: reqwest::Client,
    url: String,
    model: String,
    api_key: String,
    max_retries: u32,
    backoff_base: Duration,
}

impl HttpChatClient {
    /// Build a client from config. Fails if no API key can be resolved.
    pub fn new(config: &ChatConfig) -> Result<Self, ChatError> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            ChatError::Configuration(format!(
                "no API key: set chat.api_key or the {} environment variable",
                config.api_key_env
            ))
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url: config.base_url.clone(),
            model: config.model.clone(),
            api_key,
            max_retries: config.max_retries,
            backoff_base: Duration::from_secs(1),
        })
    }

    /// Override the first retry delay. Later retries double it.
    pub fn with_backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    fn request_body(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
        max_tokens: u32,
        temperature: f32,
    ) -> serde_json::Value {
        let mut all = Vec::with_capacity(messages.len() + 1);
        if !system_prompt.is_empty() {
            all.push(ChatMessage::new(Role::System, system_prompt));
        }
        all.extend_from_slice(messages);

        serde_json::json!({
            "model": self.model,
            "messages": all,
            "max_tokens": max_tokens,
            "temperature": temperature,
        })
    }
}

#[async_trait]
impl ChatCompletion for HttpChatClient {
    async fn complete(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, ChatError> {
        let body = self.request_body(system_prompt, messages, max_tokens, temperature);
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.backoff_base * (1u32 << (attempt - 1).min(5));
                tracing::debug!(attempt, ?delay, "retrying chat completion");
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .client
                .post(&self.url)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();
                    let text = response.text().await?;

                    if status.is_success() {
                        let json: serde_json::Value = serde_json::from_str(&text)
                            .map_err(|_| ChatError::ResponseShape { payload: text.clone() })?;
                        return extract_reply(&json).ok_or(ChatError::ResponseShape {
                            payload: text,
                        });
                    }

                    let err = ChatError::Api {
                        status: status.as_u16(),
                        body: text,
                    };
                    if status.as_u16() == 429 || status.is_server_error() {
                        tracing::warn!(status = status.as_u16(), attempt, "chat API transient error");
                        last_err = Some(err);
                        continue;
                    }
                    return Err(err);
                }
                Err(e) => {
                    tracing::warn!(error = %e, attempt, "chat request failed");
                    last_err = Some(ChatError::Network(e));
                }
            }
        }

        Err(last_err.unwrap_or_else(|| {
            ChatError::Configuration("chat completion failed after retries".to_string())
        }))
    }
}

type ShapeMatcher = fn(&serde_json::Value) -> Option<&str>;

fn choice_message_content(v: &serde_json::Value) -> Option<&str> {
    v.pointer("/choices/0/message/content")?.as_str()
}

fn choice_text(v: &serde_json::Value) -> Option<&str> {
    v.pointer("/choices/0/text")?.as_str()
}

fn data_content(v: &serde_json::Value) -> Option<&str> {
    v.pointer("/data/0/content")?.as_str()
}

fn data_text(v: &serde_json::Value) -> Option<&str> {
    v.pointer("/data/0/text")?.as_str()
}

const SHAPE_MATCHERS: [ShapeMatcher; 4] =
    [choice_message_content, choice_text, data_content, data_text];

/// First reply text found by the shape matchers, in order.
pub fn extract_reply(json: &serde_json::Value) -> Option<String> {
    SHAPE_MATCHERS
        .iter()
        .find_map(|matcher| matcher(json))
        .map(str::to_string)
}
