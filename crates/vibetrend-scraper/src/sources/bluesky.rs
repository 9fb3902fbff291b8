//! Bluesky posts for build-in-public hashtags (AT protocol search).

use std::sync::Arc;

use chrono::Utc;
use futures::future::BoxFuture;
use serde::Deserialize;
use serde_json::json;
use vibetrend_core::{Lead, SourceKind, SourceSettings};

use crate::adapter::{finalize, truncate_chars, Pacer, SourceAdapter, TopicLog};
use crate::client::{trim_base, HttpClient};
use crate::error::ScraperError;

const DEFAULT_BASE_URL: &str = "https://bsky.social";
const TITLE_CHARS: usize = 100;
const MAX_SEARCH_LIMIT: usize = 100;

#[derive(Debug, Clone)]
pub struct BlueskyCredentials {
    pub handle: String,
    pub app_password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Session {
    access_jwt: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    posts: Vec<PostView>,
    cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostView {
    uri: String,
    author: Author,
    record: Record,
    #[serde(default)]
    like_count: i64,
    #[serde(default)]
    repost_count: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Author {
    handle: String,
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Record {
    #[serde(default)]
    text: String,
}

pub struct BlueskyAdapter {
    http: Arc<HttpClient>,
    credentials: Option<BlueskyCredentials>,
    base_url: String,
}

impl BlueskyAdapter {
    #[must_use]
    pub fn new(http: Arc<HttpClient>, credentials: Option<BlueskyCredentials>) -> Self {
        Self::with_base_url(http, credentials, DEFAULT_BASE_URL)
    }

    #[must_use]
    pub fn with_base_url(
        http: Arc<HttpClient>,
        credentials: Option<BlueskyCredentials>,
        base_url: &str,
    ) -> Self {
        Self {
            http,
            credentials,
            base_url: trim_base(base_url),
        }
    }

    async fn create_session(&self, creds: &BlueskyCredentials) -> Result<String, ScraperError> {
        let url = format!("{}/xrpc/com.atproto.server.createSession", self.base_url);
        let body = json!({ "identifier": creds.handle, "password": creds.app_password });
        let session: Session = self
            .http
            .fetch_json(&url, "bluesky session", |client| client.post(&url).json(&body))
            .await
            .map_err(|e| ScraperError::Auth {
                site: SourceKind::Bluesky,
                reason: e.to_string(),
            })?;
        Ok(session.access_jwt)
    }

    async fn search(
        &self,
        query: &str,
        token: &str,
        settings: &SourceSettings,
        limit: usize,
        pacer: &mut Pacer,
    ) -> Result<Vec<Lead>, ScraperError> {
        let url = format!("{}/xrpc/app.bsky.feed.searchPosts", self.base_url);
        let mut cursor: Option<String> = None;
        let mut leads = Vec::new();

        for page in 0..settings.max_pages {
            let mut params: Vec<(&str, String)> =
                vec![("q", query.to_owned()), ("limit", limit.to_string())];
            if let Some(next) = &cursor {
                params.push(("cursor", next.clone()));
            }

            pacer.wait().await;
            let result: Result<SearchResponse, ScraperError> = self
                .http
                .fetch_json(&url, &format!("bluesky search '{query}'"), |client| {
                    client.get(&url).query(&params).bearer_auth(token)
                })
                .await;

            let response = match result {
                Ok(response) => response,
                Err(err) if page > 0 => {
                    tracing::warn!(query, page, error = %err, "bluesky page failed, stopping pagination");
                    break;
                }
                Err(err) => return Err(err),
            };

            leads.extend(response.posts.into_iter().filter_map(|post| to_lead(post, query)));
            match response.cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => break,
            }
        }

        tracing::debug!(query, posts = leads.len(), "searched bluesky");
        Ok(leads)
    }

    async fn collect(&self, settings: &SourceSettings) -> Result<Vec<Lead>, ScraperError> {
        let creds = self
            .credentials
            .as_ref()
            .ok_or(ScraperError::MissingCredentials {
                site: SourceKind::Bluesky,
                missing: "BLUESKY_HANDLE/BLUESKY_APP_PASSWORD",
            })?;
        let token = self.create_session(creds).await?;

        let queries: Vec<&str> = settings
            .topics
            .iter()
            .map(|q| q.trim())
            .filter(|q| !q.is_empty())
            .collect();
        let limit = (settings.max_items / queries.len().max(1)).clamp(1, MAX_SEARCH_LIMIT);

        let mut pacer = Pacer::new(settings);
        let mut log = TopicLog::new(SourceKind::Bluesky);
        let mut leads = Vec::new();

        for query in queries {
            match self.search(query, &token, settings, limit, &mut pacer).await {
                Ok(batch) => {
                    log.succeeded();
                    leads.extend(batch);
                }
                // Search is not offered for every query on every PDS.
                Err(ScraperError::UnexpectedStatus { status: 400, .. }) => {
                    tracing::info!(query, "bluesky search unavailable for query, skipping");
                }
                Err(err) => log.failed(query, &err),
            }
        }
        log.finish()?;

        leads.sort_by(|a, b| b.score.cmp(&a.score));
        Ok(finalize(leads, settings))
    }
}

fn to_lead(post: PostView, query: &str) -> Option<Lead> {
    let text = post.record.text.trim();
    if text.is_empty() {
        return None;
    }
    let rkey = post.uri.rsplit('/').next().unwrap_or_default();
    if rkey.is_empty() {
        return None;
    }
    let display = post
        .author
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(&post.author.handle);

    let mut title = format!("{display}: {}", truncate_chars(text, TITLE_CHARS));
    if text.chars().count() > TITLE_CHARS {
        title.push_str("...");
    }
    let url = format!("https://bsky.app/profile/{}/post/{rkey}", post.author.handle);
    let category = query.trim_start_matches('#').to_lowercase();

    Some(
        Lead::new(SourceKind::Bluesky, post.uri.clone(), title, url, text, Utc::now())
            .with_score(post.like_count + post.repost_count)
            .with_category(category),
    )
}

impl SourceAdapter for BlueskyAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::Bluesky
    }

    fn fetch<'a>(
        &'a self,
        settings: &'a SourceSettings,
    ) -> BoxFuture<'a, Result<Vec<Lead>, ScraperError>> {
        Box::pin(self.collect(settings))
    }
}
