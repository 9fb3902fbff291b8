//! The provider strategy interface and the HTTP status mapping shared by the
//! concrete providers.

use futures::future::BoxFuture;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use vibetrend_core::Lead;

use crate::error::ProviderError;
use crate::parse::{parse_batch, Verdict};
use crate::prompt::build_prompt;

const ERROR_BODY_CHARS: usize = 300;

/// One AI analysis service.
///
/// Implementors only provide `complete`; `analyze` builds the batch prompt
/// and validates the structured answer item by item.
pub trait AnalysisProvider: Send + Sync {
    /// Display name used in logs and on [`vibetrend_core::AnalyzedLead`].
    fn name(&self) -> &str;

    /// Send `prompt` and return the model's raw text answer.
    fn complete<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, ProviderError>>;

    /// Analyze `batch` in one request.
    ///
    /// `Err` means the whole call failed (transport, status, or an answer that
    /// is not the expected JSON document). `Ok` holds one entry per input
    /// lead, in input order, each either a validated verdict or the reason
    /// that item was rejected.
    fn analyze<'a>(
        &'a self,
        batch: &'a [Lead],
    ) -> BoxFuture<'a, Result<Vec<Result<Verdict, String>>, ProviderError>> {
        Box::pin(async move {
            let prompt = build_prompt(batch);
            let answer = self.complete(&prompt).await?;
            parse_batch(self.name(), &answer, batch.len())
        })
    }
}

/// Send `request` and decode a JSON body, mapping failures onto [`ProviderError`].
///
/// - 429 is `RateLimited` (with `Retry-After` seconds when present).
/// - 5xx, timeouts and connection failures are `Transient`.
/// - Any other non-success status is `Rejected`.
/// - A success body that is not the expected JSON is `Validation`.
pub(crate) async fn send_json<T: DeserializeOwned>(
    provider: &str,
    request: RequestBuilder,
) -> Result<T, ProviderError> {
    let response = request.send().await.map_err(|e| ProviderError::Transient {
        provider: provider.to_owned(),
        reason: describe_transport(&e),
    })?;

    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok());
        return Err(ProviderError::RateLimited {
            provider: provider.to_owned(),
            retry_after_secs,
        });
    }
    if status.is_server_error() {
        return Err(ProviderError::Transient {
            provider: provider.to_owned(),
            reason: format!("HTTP {}", status.as_u16()),
        });
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::Rejected {
            provider: provider.to_owned(),
            status: status.as_u16(),
            body: body.chars().take(ERROR_BODY_CHARS).collect(),
        });
    }

    let body = response.text().await.map_err(|e| ProviderError::Transient {
        provider: provider.to_owned(),
        reason: describe_transport(&e),
    })?;
    serde_json::from_str(&body).map_err(|e| ProviderError::Validation {
        provider: provider.to_owned(),
        reason: format!("response envelope is not valid JSON: {e}"),
    })
}

fn describe_transport(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "request timed out".to_owned()
    } else if err.is_connect() {
        format!("connection failed: {err}")
    } else {
        err.to_string()
    }
}
