//! Chat-completion client for the decision service.
//!
//! The session controller only depends on the [`DecisionService`] trait;
//! [`LlmClient`] is the production implementation, a blocking client for
//! OpenRouter-compatible `/chat/completions` endpoints.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::LlmConfig;

/// Role of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One entry of the conversation history sent to the decision service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// The decision-service seam consumed by the session controller.
///
/// Three call sites use it at different temperatures: directive selection
/// (0.7, exploratory), delta summarization (0.3), final summary (0.1).
pub trait DecisionService {
    /// Send an ordered message list, return one assistant message as plain
    /// text. Empty or missing content is an empty string, never an error.
    fn complete(&self, messages: &[ChatMessage], temperature: f32) -> Result<String>;
}

/// Blocking chat-completion client.
///
/// No automatic retries: a failed request propagates and ends the session
/// abnormally, since there is no fallback decision source. Callers needing
/// resilience wrap this boundary.
pub struct LlmClient {
    config: LlmConfig,
    agent: ureq::Agent,
}

impl LlmClient {
    /// Create a client from an explicit configuration.
    ///
    /// Fails if no API key is configured.
    pub fn new(config: LlmConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            anyhow::bail!(
                "API key not configured. Pass --api-key, set TERMPILOT_API_KEY, \
                 or add it to the config file."
            );
        }

        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(10))
            .timeout_read(Duration::from_secs(300)) // Long generations
            .build();

        Ok(Self { config, agent })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    provider: Option<ProviderPreference<'a>>,
}

/// OpenRouter provider routing preference.
#[derive(Serialize)]
struct ProviderPreference<'a> {
    order: &'a [String],
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl DecisionService for LlmClient {
    fn complete(&self, messages: &[ChatMessage], temperature: f32) -> Result<String> {
        let url = format!("{}/chat/completions", self.config.base_url);

        let provider = if self.config.provider_order.is_empty() {
            None
        } else {
            Some(ProviderPreference {
                order: &self.config.provider_order,
            })
        };

        let request = ChatRequest {
            model: &self.config.model,
            messages,
            temperature,
            provider,
        };

        let response: ChatResponse = self
            .agent
            .post(&url)
            .set("Authorization", &format!("Bearer {}", self.config.api_key))
            .send_json(&request)
            .context("Decision service request failed")?
            .into_json()
            .context("Failed to parse decision service response")?;

        // Missing content is an empty reply, not an error.
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        Ok(content.trim().to_string())
    }
}
