//! Concrete source adapters.

pub mod acquire;
pub mod bluesky;
pub mod hackernews;
pub mod indiehackers;
pub mod producthunt;
pub mod reddit;

use std::sync::Arc;

use vibetrend_core::AppConfig;

use crate::adapter::SourceAdapter;
use crate::client::HttpClient;
use crate::error::ScraperError;
use crate::render::PageRenderer;
use crate::trending::TrendingSource;

pub use acquire::AcquireAdapter;
pub use bluesky::{BlueskyAdapter, BlueskyCredentials};
pub use hackernews::HackerNewsAdapter;
pub use indiehackers::IndieHackersAdapter;
pub use producthunt::{ProductHuntAdapter, ProductHuntCredentials};
pub use reddit::{RedditAdapter, RedditCredentials};

fn pair<T>(
    a: Option<&String>,
    b: Option<&String>,
    build: impl FnOnce(String, String) -> T,
) -> Option<T> {
    match (a, b) {
        (Some(a), Some(b)) => Some(build(a.clone(), b.clone())),
        _ => None,
    }
}

fn producthunt_credentials(config: &AppConfig) -> Option<ProductHuntCredentials> {
    pair(
        config.producthunt_api_key.as_ref(),
        config.producthunt_api_secret.as_ref(),
        |api_key, api_secret| ProductHuntCredentials {
            api_key,
            api_secret,
        },
    )
}

/// Build the trending AI tools source (Product Hunt) with its own HTTP client.
///
/// # Errors
///
/// Returns [`ScraperError::Http`] if the HTTP client cannot be constructed.
pub fn build_trending_source(config: &AppConfig) -> Result<Arc<dyn TrendingSource>, ScraperError> {
    let http = Arc::new(HttpClient::from_config(config)?);
    Ok(Arc::new(ProductHuntAdapter::new(
        http,
        producthunt_credentials(config),
    )))
}

/// Build one adapter per source, in canonical order, sharing a single HTTP client.
///
/// Adapters are built regardless of whether the source is enabled; the
/// coordinator decides what runs.
///
/// # Errors
///
/// Returns [`ScraperError::Http`] if the HTTP client cannot be constructed.
pub fn build_adapters(config: &AppConfig) -> Result<Vec<Arc<dyn SourceAdapter>>, ScraperError> {
    let http = Arc::new(HttpClient::from_config(config)?);

    let renderer = match &config.browserless_url {
        Some(url) => {
            PageRenderer::browserless(Arc::clone(&http), url, config.browserless_token.as_deref())
        }
        None => PageRenderer::direct(Arc::clone(&http)),
    };

    let reddit = pair(
        config.reddit_client_id.as_ref(),
        config.reddit_client_secret.as_ref(),
        |client_id, client_secret| RedditCredentials {
            client_id,
            client_secret,
        },
    );
    let producthunt = producthunt_credentials(config);
    let bluesky = pair(
        config.bluesky_handle.as_ref(),
        config.bluesky_app_password.as_ref(),
        |handle, app_password| BlueskyCredentials {
            handle,
            app_password,
        },
    );

    tracing::debug!(
        reddit_oauth = reddit.is_some(),
        producthunt_oauth = producthunt.is_some(),
        bluesky_session = bluesky.is_some(),
        headless = renderer.is_headless(),
        "built source adapters"
    );

    Ok(vec![
        Arc::new(RedditAdapter::new(Arc::clone(&http), reddit)),
        Arc::new(HackerNewsAdapter::new(Arc::clone(&http))),
        Arc::new(ProductHuntAdapter::new(Arc::clone(&http), producthunt)),
        Arc::new(BlueskyAdapter::new(Arc::clone(&http), bluesky)),
        Arc::new(IndieHackersAdapter::new(renderer.clone())),
        Arc::new(AcquireAdapter::new(renderer)),
    ])
}
