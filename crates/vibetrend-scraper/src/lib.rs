pub mod adapter;
pub mod client;
pub mod coordinator;
pub mod error;
pub mod html;
mod rate_limit;
pub mod render;
pub mod sources;
pub mod trending;

pub use adapter::{finalize, SourceAdapter};
pub use client::HttpClient;
pub use coordinator::{DayScrape, FetchCoordinator, FetchOutcome, SourceBatch, SourceUnavailable};
pub use error::ScraperError;
pub use render::PageRenderer;
pub use sources::{build_adapters, build_trending_source};
pub use trending::TrendingSource;
