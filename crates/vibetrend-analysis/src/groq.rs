//! Groq OpenAI-compatible chat completions provider (fallback).

use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::error::{AnalysisError, ProviderError};
use crate::provider::{send_json, AnalysisProvider};

const DEFAULT_BASE_URL: &str = "https://api.groq.com";
const NAME: &str = "groq";

const SYSTEM_PROMPT: &str =
    "You are a startup trend analyst. Always answer with a single valid JSON object.";

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: Option<String>,
}

pub struct GroqProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GroqProvider {
    /// # Errors
    ///
    /// Returns [`AnalysisError::Http`] if the HTTP client cannot be built.
    pub fn new(api_key: &str, model: &str, timeout_secs: u64) -> Result<Self, AnalysisError> {
        Self::with_base_url(api_key, model, timeout_secs, DEFAULT_BASE_URL)
    }

    /// # Errors
    ///
    /// Returns [`AnalysisError::Http`] if the HTTP client cannot be built.
    pub fn with_base_url(
        api_key: &str,
        model: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, AnalysisError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            model: model.to_owned(),
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    async fn chat(&self, prompt: &str) -> Result<String, ProviderError> {
        let url = format!("{}/openai/v1/chat/completions", self.base_url);
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": prompt }
            ],
            "response_format": { "type": "json_object" },
            "temperature": 0.4
        });

        let response: ChatResponse = send_json(
            NAME,
            self.client.post(&url).bearer_auth(&self.api_key).json(&body),
        )
        .await?;

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| ProviderError::Validation {
                provider: NAME.to_owned(),
                reason: "no message content in response".to_owned(),
            })?;

        tracing::debug!(model = %self.model, chars = text.len(), "groq answered");
        Ok(text)
    }
}

impl AnalysisProvider for GroqProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn complete<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, ProviderError>> {
        Box::pin(self.chat(prompt))
    }
}
