// SPDX-License-Identifier: MIT
//! OpenAI-style chat-completions client.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{ProviderError, Synthesizer};
use crate::config::ProviderConfig;

// Low temperature keeps file output stable enough to parse.
const TEMPERATURE: f64 = 0.2;
const TOP_P: f64 = 0.9;
/// Upper bound on error-body bytes echoed into logs and messages.
const MAX_ERROR_BODY: usize = 400;

/// Synthesizer backed by a chat-completions HTTP API.
pub struct OpenAiSynthesizer {
    client: reqwest::Client,
    base_url: String,
    model: String,
    max_tokens: u32,
    api_key: String,
    timeout: Duration,
}

impl OpenAiSynthesizer {
    /// Build the client with the configured hard timeout baked in.
    pub fn new(config: &ProviderConfig, api_key: String) -> anyhow::Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            api_key,
            timeout,
        })
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[async_trait]
impl Synthesizer for OpenAiSynthesizer {
    async fn synthesize(&self, directive: &str) -> Result<String, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "model": self.model,
                "messages": [
                    { "role": "user", "content": directive },
                ],
                "temperature": TEMPERATURE,
                "top_p": TOP_P,
                "max_tokens": self.max_tokens,
            }))
            .send()
            .await
            .map_err(|e| classify(e, self.timeout))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: truncate(&body, MAX_ERROR_BODY),
            });
        }

        let body: ChatResponse = resp.json().await.map_err(|e| classify(e, self.timeout))?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(ProviderError::EmptyResponse)?;

        debug!(model = %self.model, bytes = content.len(), "provider payload received");
        Ok(content)
    }
}

fn classify(e: reqwest::Error, timeout: Duration) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(timeout)
    } else {
        ProviderError::Transport(e)
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        s.chars().take(max_chars).collect()
    }
}
