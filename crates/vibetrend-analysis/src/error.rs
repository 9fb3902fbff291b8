use thiserror::Error;

/// Failure of a single provider call.
///
/// Every variant ends that provider's attempt for the affected leads; the
/// engine moves them to the next strategy instead of retrying in place.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} rate limited the request (retry after {retry_after_secs:?}s)")]
    RateLimited {
        provider: String,
        retry_after_secs: Option<u64>,
    },

    #[error("{provider} transient failure: {reason}")]
    Transient { provider: String, reason: String },

    #[error("{provider} rejected the request with HTTP {status}: {body}")]
    Rejected {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("{provider} returned an invalid response: {reason}")]
    Validation { provider: String, reason: String },
}

impl ProviderError {
    /// Short label for logs and failure summaries.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::RateLimited { .. } => "rate_limited",
            ProviderError::Transient { .. } => "transient",
            ProviderError::Rejected { .. } => "rejected",
            ProviderError::Validation { .. } => "validation",
        }
    }

    /// Whether the provider answered at all (as opposed to being unreachable,
    /// throttled or refusing the credentials).
    #[must_use]
    pub fn provider_answered(&self) -> bool {
        matches!(self, ProviderError::Validation { .. })
    }
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("no AI provider is configured (set GEMINI_API_KEY and/or GROQ_API_KEY)")]
    NoProviders,

    #[error("failed to build provider HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{task} failed on every provider: {}", .errors.join("; "))]
    Exhausted {
        task: &'static str,
        errors: Vec<String>,
        /// Whether any provider answered at all.
        provider_reachable: bool,
    },
}
