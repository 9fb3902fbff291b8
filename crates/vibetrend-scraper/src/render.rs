//! Fetch HTML for JavaScript-heavy pages.
//!
//! When a Browserless endpoint is configured the page is rendered by a headless
//! browser through its `/content` API; otherwise the raw server response is used.

use std::sync::Arc;

use crate::client::{trim_base, HttpClient};
use crate::error::ScraperError;

#[derive(Debug, Clone)]
struct Browserless {
    base_url: String,
    token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PageRenderer {
    http: Arc<HttpClient>,
    browserless: Option<Browserless>,
}

impl PageRenderer {
    /// Renderer that fetches pages directly without JavaScript execution.
    #[must_use]
    pub fn direct(http: Arc<HttpClient>) -> Self {
        Self {
            http,
            browserless: None,
        }
    }

    #[must_use]
    pub fn browserless(http: Arc<HttpClient>, base_url: &str, token: Option<&str>) -> Self {
        Self {
            http,
            browserless: Some(Browserless {
                base_url: trim_base(base_url),
                token: token.map(str::to_owned),
            }),
        }
    }

    #[must_use]
    pub fn is_headless(&self) -> bool {
        self.browserless.is_some()
    }

    /// Return the (rendered, when possible) HTML of `url`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError`] if the page or the render service responds with
    /// a failure status or cannot be reached.
    pub async fn render(&self, url: &str) -> Result<String, ScraperError> {
        let Some(browserless) = &self.browserless else {
            return self.http.get_text(url).await;
        };

        // Errors report the endpoint without the token.
        let display = format!("{}/content", browserless.base_url);
        let endpoint = match &browserless.token {
            Some(token) => format!("{display}?token={token}"),
            None => display.clone(),
        };

        let body = serde_json::json!({
            "url": url,
            "gotoOptions": { "waitUntil": "networkidle2", "timeout": 30_000 },
        });

        tracing::debug!(url, "rendering page through browserless");
        self.http
            .fetch_text(&display, |client| client.post(&endpoint).json(&body))
            .await
    }
}
