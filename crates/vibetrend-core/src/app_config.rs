use std::path::PathBuf;

#[derive(Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub database_url: String,
    pub sources_path: PathBuf,
    pub log_level: String,
    pub schedule: String,

    pub primary_api_key: Option<String>,
    pub primary_model: String,
    pub fallback_api_key: Option<String>,
    pub fallback_model: String,
    pub provider_timeout_secs: u64,
    pub analysis_chunk_size: usize,
    pub analysis_max_leads: usize,

    pub scraper_request_timeout_secs: u64,
    pub scraper_user_agent: String,
    pub scraper_max_retries: u32,
    pub scraper_retry_backoff_base_ms: u64,
    pub source_timeout_secs: u64,
    pub global_fetch_timeout_secs: u64,

    pub reddit_client_id: Option<String>,
    pub reddit_client_secret: Option<String>,
    pub producthunt_api_key: Option<String>,
    pub producthunt_api_secret: Option<String>,
    pub bluesky_handle: Option<String>,
    pub bluesky_app_password: Option<String>,
    pub browserless_url: Option<String>,
    pub browserless_token: Option<String>,
}

fn redact(value: Option<&String>) -> Option<&'static str> {
    value.map(|_| "[redacted]")
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("data_dir", &self.data_dir)
            .field("database_url", &self.database_url)
            .field("sources_path", &self.sources_path)
            .field("log_level", &self.log_level)
            .field("schedule", &self.schedule)
            .field("primary_api_key", &redact(self.primary_api_key.as_ref()))
            .field("primary_model", &self.primary_model)
            .field("fallback_api_key", &redact(self.fallback_api_key.as_ref()))
            .field("fallback_model", &self.fallback_model)
            .field("provider_timeout_secs", &self.provider_timeout_secs)
            .field("analysis_chunk_size", &self.analysis_chunk_size)
            .field("analysis_max_leads", &self.analysis_max_leads)
            .field(
                "scraper_request_timeout_secs",
                &self.scraper_request_timeout_secs,
            )
            .field("scraper_user_agent", &self.scraper_user_agent)
            .field("scraper_max_retries", &self.scraper_max_retries)
            .field(
                "scraper_retry_backoff_base_ms",
                &self.scraper_retry_backoff_base_ms,
            )
            .field("source_timeout_secs", &self.source_timeout_secs)
            .field("global_fetch_timeout_secs", &self.global_fetch_timeout_secs)
            .field("reddit_client_id", &redact(self.reddit_client_id.as_ref()))
            .field(
                "reddit_client_secret",
                &redact(self.reddit_client_secret.as_ref()),
            )
            .field(
                "producthunt_api_key",
                &redact(self.producthunt_api_key.as_ref()),
            )
            .field(
                "producthunt_api_secret",
                &redact(self.producthunt_api_secret.as_ref()),
            )
            .field("bluesky_handle", &self.bluesky_handle)
            .field(
                "bluesky_app_password",
                &redact(self.bluesky_app_password.as_ref()),
            )
            .field("browserless_url", &self.browserless_url)
            .field(
                "browserless_token",
                &redact(self.browserless_token.as_ref()),
            )
            .finish()
    }
}
