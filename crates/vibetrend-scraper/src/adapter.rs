//! The contract every source adapter implements, plus the post-processing
//! shared by all of them.

use std::collections::HashSet;
use std::time::Duration;

use futures::future::BoxFuture;
use vibetrend_core::{Lead, SourceKind, SourceSettings};

use crate::error::ScraperError;

/// One external source, normalizing its records into [`Lead`]s.
///
/// `fetch` is restartable: each call performs a fresh, finite crawl bounded by
/// `settings.max_pages` and `settings.max_items`. A failure on a single topic
/// or page is logged and skipped; `Err` means the source produced nothing
/// usable (auth failure, every topic failed, or the page layout no longer
/// matches).
pub trait SourceAdapter: Send + Sync {
    fn kind(&self) -> SourceKind;

    fn fetch<'a>(
        &'a self,
        settings: &'a SourceSettings,
    ) -> BoxFuture<'a, Result<Vec<Lead>, ScraperError>>;
}

/// Apply the filters every adapter shares, in order: keyword match on title
/// and text, minimum engagement score, first-wins deduplication by
/// fingerprint, then truncation to `max_items`.
#[must_use]
pub fn finalize(leads: Vec<Lead>, settings: &SourceSettings) -> Vec<Lead> {
    let mut seen = HashSet::new();
    leads
        .into_iter()
        .filter(|lead| settings.matches_keywords(&format!("{} {}", lead.title, lead.raw_text)))
        .filter(|lead| lead.score >= settings.min_score)
        .filter(|lead| seen.insert(lead.fingerprint.clone()))
        .take(settings.max_items)
        .collect()
}

/// Enforces the per-source politeness delay between consecutive requests.
#[derive(Debug)]
pub(crate) struct Pacer {
    delay: Duration,
    started: bool,
}

impl Pacer {
    pub(crate) fn new(settings: &SourceSettings) -> Self {
        Self {
            delay: Duration::from_millis(settings.page_delay_ms),
            started: false,
        }
    }

    /// Sleep before every request except the first.
    pub(crate) async fn wait(&mut self) {
        if self.started && !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.started = true;
    }
}

/// Tracks per-topic outcomes so an adapter can fail only when nothing worked.
#[derive(Debug)]
pub(crate) struct TopicLog {
    site: SourceKind,
    attempted: usize,
    failed: usize,
    last_error: Option<String>,
}

impl TopicLog {
    pub(crate) fn new(site: SourceKind) -> Self {
        Self {
            site,
            attempted: 0,
            failed: 0,
            last_error: None,
        }
    }

    pub(crate) fn succeeded(&mut self) {
        self.attempted += 1;
    }

    pub(crate) fn failed(&mut self, topic: &str, err: &ScraperError) {
        self.attempted += 1;
        self.failed += 1;
        tracing::warn!(source = %self.site, topic, error = %err, "topic fetch failed, skipping");
        self.last_error = Some(err.to_string());
    }

    /// `Err` when at least one topic was attempted and all of them failed.
    pub(crate) fn finish(self) -> Result<(), ScraperError> {
        if self.attempted > 0 && self.failed == self.attempted {
            return Err(ScraperError::AllTopicsFailed {
                site: self.site,
                attempted: self.attempted,
                last_error: self.last_error.unwrap_or_default(),
            });
        }
        Ok(())
    }
}

/// First `max_chars` characters of `text`, on a char boundary.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
