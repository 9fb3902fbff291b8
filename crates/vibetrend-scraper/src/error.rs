use thiserror::Error;
use vibetrend_core::{ArtifactError, SourceKind};

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rate limited by {domain} (retry after {retry_after_secs}s)")]
    RateLimited {
        domain: String,
        retry_after_secs: u64,
    },

    #[error("endpoint not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("{site} credentials are not configured ({missing})")]
    MissingCredentials {
        site: SourceKind,
        missing: &'static str,
    },

    #[error("{site} authentication failed: {reason}")]
    Auth { site: SourceKind, reason: String },

    #[error("no recognizable cards on {url}: {reason}")]
    Selector { url: String, reason: String },

    #[error("{site} API error: {message}")]
    Api { site: SourceKind, message: String },

    #[error("all {attempted} {site} topics failed; last error: {last_error}")]
    AllTopicsFailed {
        site: SourceKind,
        attempted: usize,
        last_error: String,
    },

    #[error("failed to persist scrape artifacts: {0}")]
    Artifact(#[from] ArtifactError),
}
