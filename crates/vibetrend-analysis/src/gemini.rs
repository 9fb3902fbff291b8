//! Google Gemini `generateContent` provider (primary).

use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::error::{AnalysisError, ProviderError};
use crate::provider::{send_json, AnalysisProvider};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const NAME: &str = "gemini";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

pub struct GeminiProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiProvider {
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

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        // The key travels in a header so it never appears in logged URLs.
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "temperature": 0.4
            }
        });

        let response: GenerateResponse = send_json(
            NAME,
            self.client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .json(&body),
        )
        .await?;

        if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(ProviderError::Validation {
                provider: NAME.to_owned(),
                reason: format!("prompt blocked: {reason}"),
            });
        }

        let Some(candidate) = response.candidates.into_iter().next() else {
            return Err(ProviderError::Validation {
                provider: NAME.to_owned(),
                reason: "no candidates in response".to_owned(),
            });
        };
        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(ProviderError::Validation {
                provider: NAME.to_owned(),
                reason: format!(
                    "empty candidate (finish reason {})",
                    candidate.finish_reason.as_deref().unwrap_or("unknown")
                ),
            });
        }

        tracing::debug!(model = %self.model, chars = text.len(), "gemini answered");
        Ok(text)
    }
}

impl AnalysisProvider for GeminiProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn complete<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, ProviderError>> {
        Box::pin(self.generate(prompt))
    }
}
