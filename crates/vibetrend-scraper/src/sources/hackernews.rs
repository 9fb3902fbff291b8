//! Hacker News stories from the last week, via the Algolia search API.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, Utc};
use futures::future::BoxFuture;
use serde::Deserialize;
use vibetrend_core::{Lead, SourceKind, SourceSettings};

use crate::adapter::{finalize, Pacer, SourceAdapter, TopicLog};
use crate::client::{trim_base, HttpClient};
use crate::error::ScraperError;
use crate::html::clean_text;

const DEFAULT_BASE_URL: &str = "https://hn.algolia.com";
const LOOKBACK_DAYS: i64 = 7;
const MAX_HITS_PER_PAGE: usize = 50;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<Hit>,
    #[serde(rename = "nbPages", default)]
    nb_pages: usize,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "objectID")]
    object_id: String,
    title: Option<String>,
    url: Option<String>,
    points: Option<i64>,
    story_text: Option<String>,
}

pub struct HackerNewsAdapter {
    http: Arc<HttpClient>,
    base_url: String,
}

impl HackerNewsAdapter {
    #[must_use]
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self::with_base_url(http, DEFAULT_BASE_URL)
    }

    #[must_use]
    pub fn with_base_url(http: Arc<HttpClient>, base_url: &str) -> Self {
        Self {
            http,
            base_url: trim_base(base_url),
        }
    }

    async fn search(
        &self,
        query: &str,
        since_ts: i64,
        settings: &SourceSettings,
        hits_per_page: usize,
        pacer: &mut Pacer,
    ) -> Result<Vec<Lead>, ScraperError> {
        let url = format!("{}/api/v1/search", self.base_url);
        let mut leads = Vec::new();

        for page in 0..settings.max_pages {
            let params = [
                ("query", query.to_owned()),
                ("tags", "story".to_owned()),
                ("numericFilters", format!("created_at_i>{since_ts}")),
                ("hitsPerPage", hits_per_page.to_string()),
                ("page", page.to_string()),
            ];

            pacer.wait().await;
            let result: Result<SearchResponse, ScraperError> = self
                .http
                .fetch_json(&url, &format!("hn search '{query}'"), |client| {
                    client.get(&url).query(&params)
                })
                .await;

            let response = match result {
                Ok(response) => response,
                Err(err) if page > 0 => {
                    tracing::warn!(query, page, error = %err, "hn page failed, stopping pagination");
                    break;
                }
                Err(err) => return Err(err),
            };

            leads.extend(response.hits.into_iter().filter_map(to_lead));
            if page + 1 >= response.nb_pages {
                break;
            }
        }

        tracing::debug!(query, stories = leads.len(), "searched hacker news");
        Ok(leads)
    }

    async fn collect(&self, settings: &SourceSettings) -> Result<Vec<Lead>, ScraperError> {
        let since_ts = (Utc::now() - Duration::days(LOOKBACK_DAYS)).timestamp();
        let queries: Vec<&str> = settings
            .topics
            .iter()
            .map(|q| q.trim())
            .filter(|q| !q.is_empty())
            .collect();
        let hits_per_page = (settings.max_items / queries.len().max(1)).clamp(1, MAX_HITS_PER_PAGE);

        let mut pacer = Pacer::new(settings);
        let mut log = TopicLog::new(SourceKind::HackerNews);
        let mut leads = Vec::new();

        for query in queries {
            match self
                .search(query, since_ts, settings, hits_per_page, &mut pacer)
                .await
            {
                Ok(batch) => {
                    log.succeeded();
                    leads.extend(batch);
                }
                Err(err) => log.failed(query, &err),
            }
        }
        log.finish()?;

        // The same story often matches several queries.
        let mut seen_ids = HashSet::new();
        leads.retain(|lead| seen_ids.insert(lead.external_id.clone()));
        leads.sort_by(|a, b| b.score.cmp(&a.score));
        Ok(finalize(leads, settings))
    }
}

fn to_lead(hit: Hit) -> Option<Lead> {
    let title = hit.title.as_deref().map(str::trim).filter(|t| !t.is_empty())?;
    let item_url = format!("https://news.ycombinator.com/item?id={}", hit.object_id);
    let url = hit
        .url
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| item_url.clone());
    let raw_text = hit
        .story_text
        .as_deref()
        .map(clean_text)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| title.to_owned());
    let category = if title.to_lowercase().contains("show hn") {
        "show-hn"
    } else {
        "hackernews"
    };

    Some(
        Lead::new(
            SourceKind::HackerNews,
            hit.object_id,
            title,
            url,
            raw_text,
            Utc::now(),
        )
        .with_score(hit.points.unwrap_or(0))
        .with_category(category),
    )
}

impl SourceAdapter for HackerNewsAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::HackerNews
    }

    fn fetch<'a>(
        &'a self,
        settings: &'a SourceSettings,
    ) -> BoxFuture<'a, Result<Vec<Lead>, ScraperError>> {
        Box::pin(self.collect(settings))
    }
}
