//! Source of the weekly trending AI tools list.

use futures::future::BoxFuture;
use vibetrend_core::{TrendingSettings, TrendingTool};

use crate::error::ScraperError;

/// Fetches the week's trending tools, most voted first, at most
/// `settings.max_tools` of them.
pub trait TrendingSource: Send + Sync {
    fn fetch_trending<'a>(
        &'a self,
        settings: &'a TrendingSettings,
    ) -> BoxFuture<'a, Result<Vec<TrendingTool>, ScraperError>>;
}
