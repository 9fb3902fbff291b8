//! Shared HTTP client for source adapters.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use vibetrend_core::AppConfig;

use crate::error::ScraperError;
use crate::rate_limit::retry_with_backoff;

/// HTTP client with typed status mapping and retry on transient errors.
///
/// Adapters describe a request with a closure that is re-invoked on every
/// attempt, so bodies and auth headers are rebuilt rather than cloned.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl HttpClient {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            max_retries,
            backoff_base_ms,
        })
    }

    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the client cannot be constructed.
    pub fn from_config(config: &AppConfig) -> Result<Self, ScraperError> {
        Self::new(
            config.scraper_request_timeout_secs,
            &config.scraper_user_agent,
            config.scraper_max_retries,
            config.scraper_retry_backoff_base_ms,
        )
    }

    /// Send the request built by `build` and return the response body.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::RateLimited`] on HTTP 429 once retries are exhausted.
    /// - [`ScraperError::NotFound`] on HTTP 404.
    /// - [`ScraperError::UnexpectedStatus`] on any other non-2xx status.
    /// - [`ScraperError::Http`] on network failure.
    pub async fn fetch_text<F>(&self, url: &str, build: F) -> Result<String, ScraperError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let request = build(&self.client);
            async move {
                let response = request.send().await?;
                let response = check_status(url, response)?;
                Ok(response.text().await?)
            }
        })
        .await
    }

    /// Like [`Self::fetch_text`], then deserialize the body as JSON.
    ///
    /// # Errors
    ///
    /// Everything [`Self::fetch_text`] returns, plus [`ScraperError::Deserialize`].
    pub async fn fetch_json<T, F>(&self, url: &str, context: &str, build: F) -> Result<T, ScraperError>
    where
        T: DeserializeOwned,
        F: Fn(&Client) -> RequestBuilder,
    {
        let body = self.fetch_text(url, build).await?;
        serde_json::from_str(&body).map_err(|e| ScraperError::Deserialize {
            context: context.to_owned(),
            source: e,
        })
    }

    /// Plain GET returning the body.
    ///
    /// # Errors
    ///
    /// See [`Self::fetch_text`].
    pub async fn get_text(&self, url: &str) -> Result<String, ScraperError> {
        self.fetch_text(url, |client| {
            client
                .get(url)
                .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml")
        })
        .await
    }
}

fn check_status(url: &str, response: Response) -> Result<Response, ScraperError> {
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(60);
        return Err(ScraperError::RateLimited {
            domain: extract_domain(url),
            retry_after_secs,
        });
    }

    if status == StatusCode::NOT_FOUND {
        return Err(ScraperError::NotFound {
            url: url.to_owned(),
        });
    }

    if !status.is_success() {
        return Err(ScraperError::UnexpectedStatus {
            status: status.as_u16(),
            url: url.to_owned(),
        });
    }

    Ok(response)
}

pub(crate) fn extract_domain(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
        .unwrap_or_else(|| url.to_owned())
}

/// Normalise a base URL so path joins never produce a double slash.
pub(crate) fn trim_base(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_domain_reads_host() {
        assert_eq!(
            extract_domain("https://hn.algolia.com/api/v1/search?query=x"),
            "hn.algolia.com"
        );
        assert_eq!(extract_domain("not a url"), "not a url");
    }

    #[test]
    fn trim_base_drops_trailing_slashes() {
        assert_eq!(trim_base("http://127.0.0.1:9000//"), "http://127.0.0.1:9000");
    }
}
