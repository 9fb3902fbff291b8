use crate::app_config::AppConfig;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable has a default; provider keys and source credentials are
/// optional. Presence of what a phase actually needs is checked by that phase.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var).ok().filter(|v| !v.trim().is_empty())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_nonzero_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        match raw.parse::<usize>() {
            Ok(0) => Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: "must be greater than zero".to_string(),
            }),
            Ok(n) => Ok(n),
            Err(e) => Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            }),
        }
    };

    let data_dir = PathBuf::from(or_default("VIBETREND_DATA_DIR", "./.tmp"));
    let database_url = or_default("VIBETREND_DATABASE_URL", "sqlite://./vibetrend.db?mode=rwc");
    let sources_path = PathBuf::from(or_default(
        "VIBETREND_SOURCES_PATH",
        "./config/sources.yaml",
    ));
    let log_level = or_default("VIBETREND_LOG_LEVEL", "info");
    let schedule = or_default("VIBETREND_SCHEDULE", "0 0 9 * * MON");

    let primary_api_key = optional("GEMINI_API_KEY");
    let primary_model = or_default("VIBETREND_PRIMARY_MODEL", "gemini-2.5-flash");
    let fallback_api_key = optional("GROQ_API_KEY");
    let fallback_model = or_default("VIBETREND_FALLBACK_MODEL", "llama-3.3-70b-versatile");
    let provider_timeout_secs = parse_u64("VIBETREND_PROVIDER_TIMEOUT_SECS", "90")?;
    let analysis_chunk_size = parse_nonzero_usize("VIBETREND_ANALYSIS_CHUNK_SIZE", "10")?;
    let analysis_max_leads = parse_nonzero_usize("VIBETREND_ANALYSIS_MAX_LEADS", "200")?;

    let scraper_request_timeout_secs = parse_u64("VIBETREND_SCRAPER_REQUEST_TIMEOUT_SECS", "30")?;
    let scraper_user_agent = or_default(
        "VIBETREND_SCRAPER_USER_AGENT",
        "vibetrend/0.1 (trend-research)",
    );
    let scraper_max_retries = parse_u32("VIBETREND_SCRAPER_MAX_RETRIES", "2")?;
    let scraper_retry_backoff_base_ms =
        parse_u64("VIBETREND_SCRAPER_RETRY_BACKOFF_BASE_MS", "1000")?;
    let source_timeout_secs = parse_u64("VIBETREND_SOURCE_TIMEOUT_SECS", "120")?;
    let global_fetch_timeout_secs = parse_u64("VIBETREND_GLOBAL_FETCH_TIMEOUT_SECS", "300")?;

    Ok(AppConfig {
        data_dir,
        database_url,
        sources_path,
        log_level,
        schedule,
        primary_api_key,
        primary_model,
        fallback_api_key,
        fallback_model,
        provider_timeout_secs,
        analysis_chunk_size,
        analysis_max_leads,
        scraper_request_timeout_secs,
        scraper_user_agent,
        scraper_max_retries,
        scraper_retry_backoff_base_ms,
        source_timeout_secs,
        global_fetch_timeout_secs,
        reddit_client_id: optional("REDDIT_CLIENT_ID"),
        reddit_client_secret: optional("REDDIT_CLIENT_SECRET"),
        producthunt_api_key: optional("PRODUCTHUNT_API_KEY"),
        producthunt_api_secret: optional("PRODUCTHUNT_API_SECRET"),
        bluesky_handle: optional("BLUESKY_HANDLE"),
        bluesky_app_password: optional("BLUESKY_APP_PASSWORD"),
        browserless_url: optional("BROWSERLESS_URL"),
        browserless_token: optional("BROWSERLESS_TOKEN"),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::env::VarError;

    use super::*;

    fn lookup_from_map<'a>(
        map: &'a HashMap<&'a str, &'a str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'a {
        move |key| {
            map.get(key)
                .map(|v| (*v).to_string())
                .ok_or(VarError::NotPresent)
        }
    }

    #[test]
    fn build_app_config_succeeds_with_empty_env() {
        let map = HashMap::new();
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.data_dir.to_str(), Some("./.tmp"));
        assert_eq!(cfg.database_url, "sqlite://./vibetrend.db?mode=rwc");
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.primary_model, "gemini-2.5-flash");
        assert_eq!(cfg.fallback_model, "llama-3.3-70b-versatile");
        assert!(cfg.primary_api_key.is_none());
        assert!(cfg.fallback_api_key.is_none());
        assert_eq!(cfg.analysis_chunk_size, 10);
        assert_eq!(cfg.analysis_max_leads, 200);
        assert_eq!(cfg.scraper_request_timeout_secs, 30);
        assert_eq!(cfg.scraper_max_retries, 2);
        assert_eq!(cfg.scraper_retry_backoff_base_ms, 1000);
        assert_eq!(cfg.source_timeout_secs, 120);
        assert_eq!(cfg.global_fetch_timeout_secs, 300);
        assert_eq!(cfg.schedule, "0 0 9 * * MON");
    }

    #[test]
    fn deployment_environment_variable_is_not_read() {
        let mut map = HashMap::new();
        map.insert("VIBETREND_ENV", "not-an-environment");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert!(!format!("{cfg:?}").contains("not-an-environment"));
    }

    #[test]
    fn provider_keys_are_read_when_present() {
        let mut map = HashMap::new();
        map.insert("GEMINI_API_KEY", "g-key");
        map.insert("GROQ_API_KEY", "q-key");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.primary_api_key.as_deref(), Some("g-key"));
        assert_eq!(cfg.fallback_api_key.as_deref(), Some("q-key"));
    }

    #[test]
    fn blank_optional_values_are_treated_as_absent() {
        let mut map = HashMap::new();
        map.insert("GEMINI_API_KEY", "  ");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert!(cfg.primary_api_key.is_none());
    }

    #[test]
    fn invalid_timeout_is_rejected() {
        let mut map = HashMap::new();
        map.insert("VIBETREND_SOURCE_TIMEOUT_SECS", "soon");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "VIBETREND_SOURCE_TIMEOUT_SECS"),
            "expected InvalidEnvVar(VIBETREND_SOURCE_TIMEOUT_SECS), got: {result:?}"
        );
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        let mut map = HashMap::new();
        map.insert("VIBETREND_ANALYSIS_CHUNK_SIZE", "0");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "VIBETREND_ANALYSIS_CHUNK_SIZE"),
            "expected InvalidEnvVar(VIBETREND_ANALYSIS_CHUNK_SIZE), got: {result:?}"
        );
    }

    #[test]
    fn scraper_overrides_are_applied() {
        let mut map = HashMap::new();
        map.insert("VIBETREND_SCRAPER_USER_AGENT", "custom-agent/2.0");
        map.insert("VIBETREND_SCRAPER_MAX_RETRIES", "5");
        map.insert("VIBETREND_GLOBAL_FETCH_TIMEOUT_SECS", "60");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.scraper_user_agent, "custom-agent/2.0");
        assert_eq!(cfg.scraper_max_retries, 5);
        assert_eq!(cfg.global_fetch_timeout_secs, 60);
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let mut map = HashMap::new();
        map.insert("GEMINI_API_KEY", "super-secret");
        map.insert("BLUESKY_APP_PASSWORD", "hunter2");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("[redacted]"));
    }
}
