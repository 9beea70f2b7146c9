//! Narrator backed by an OpenAI-compatible chat completions API

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{NarrationConfig, NarrationContext, NarrationError, Narrator};

/// Chat message for the completions API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: &str) -> Self {
        Self {
            role: "system".to_string(),
            content: content.to_string(),
        }
    }

    pub fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Asks a chat model for one short paragraph per action
#[derive(Debug, Clone)]
pub struct ChatNarrator {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl ChatNarrator {
    /// Build from settings; fails when no API key is configured
    pub fn new(config: &NarrationConfig) -> Result<Self, NarrationError> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(NarrationError::NotConfigured)?
            .to_string();

        let client = Client::builder()
            .timeout(config.timeout().max(Duration::from_secs(1)))
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    /// Send one chat completion and return the first choice's text
    pub async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String, NarrationError> {
        let request = ChatRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        debug!("Sending narration request: {}", self.model);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("Narration API error: {} - {}", status, body);
            return Err(NarrationError::Api(status));
        }

        let chat: ChatResponse = response.json().await?;
        chat.choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(NarrationError::EmptyResponse)
    }
}

#[async_trait]
impl Narrator for ChatNarrator {
    async fn narrate(&self, context: &NarrationContext) -> Result<String, NarrationError> {
        self.chat(vec![
            ChatMessage::system("You narrate tabletop combat."),
            ChatMessage::user(&context.prompt()),
        ])
        .await
    }
}
