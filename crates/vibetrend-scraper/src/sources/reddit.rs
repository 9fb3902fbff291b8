//! Reddit: top posts of the week per subreddit.
//!
//! Uses client-credentials OAuth when an app id/secret is configured and the
//! public JSON listing otherwise.

use std::sync::Arc;

use chrono::Utc;
use futures::future::BoxFuture;
use serde::Deserialize;
use vibetrend_core::{Lead, SourceKind, SourceSettings};

use crate::adapter::{finalize, truncate_chars, Pacer, SourceAdapter, TopicLog};
use crate::client::{trim_base, HttpClient};
use crate::error::ScraperError;

const PUBLIC_BASE: &str = "https://www.reddit.com";
const OAUTH_BASE: &str = "https://oauth.reddit.com";
const SELFTEXT_CHARS: usize = 500;

#[derive(Debug, Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
    after: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: PostData,
}

#[derive(Debug, Deserialize)]
struct PostData {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    selftext: String,
    #[serde(default)]
    permalink: String,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    stickied: bool,
    subreddit: Option<String>,
}

pub struct RedditAdapter {
    http: Arc<HttpClient>,
    credentials: Option<RedditCredentials>,
    auth_base: String,
    public_base: String,
    oauth_base: String,
}

impl RedditAdapter {
    #[must_use]
    pub fn new(http: Arc<HttpClient>, credentials: Option<RedditCredentials>) -> Self {
        Self {
            http,
            credentials,
            auth_base: PUBLIC_BASE.to_owned(),
            public_base: PUBLIC_BASE.to_owned(),
            oauth_base: OAUTH_BASE.to_owned(),
        }
    }

    /// Point every Reddit endpoint at `base_url` (for tests with wiremock).
    #[must_use]
    pub fn with_base_url(
        http: Arc<HttpClient>,
        credentials: Option<RedditCredentials>,
        base_url: &str,
    ) -> Self {
        let base = trim_base(base_url);
        Self {
            http,
            credentials,
            auth_base: base.clone(),
            public_base: base.clone(),
            oauth_base: base,
        }
    }

    async fn fetch_token(&self, creds: &RedditCredentials) -> Result<String, ScraperError> {
        let url = format!("{}/api/v1/access_token", self.auth_base);
        let token: TokenResponse = self
            .http
            .fetch_json(&url, "reddit access token", |client| {
                client
                    .post(&url)
                    .basic_auth(&creds.client_id, Some(&creds.client_secret))
                    .form(&[("grant_type", "client_credentials")])
            })
            .await?;
        Ok(token.access_token)
    }

    async fn fetch_subreddit(
        &self,
        subreddit: &str,
        token: Option<&str>,
        settings: &SourceSettings,
        per_page: usize,
        pacer: &mut Pacer,
    ) -> Result<Vec<Lead>, ScraperError> {
        let base = if token.is_some() {
            &self.oauth_base
        } else {
            &self.public_base
        };
        let url = format!("{base}/r/{subreddit}/top.json");
        let mut after: Option<String> = None;
        let mut leads = Vec::new();

        for page in 0..settings.max_pages {
            let mut query: Vec<(&str, String)> = vec![
                ("t", "week".to_owned()),
                ("limit", per_page.to_string()),
                ("raw_json", "1".to_owned()),
            ];
            if let Some(cursor) = &after {
                query.push(("after", cursor.clone()));
            }

            pacer.wait().await;
            let result: Result<Listing, ScraperError> = self
                .http
                .fetch_json(&url, &format!("r/{subreddit} listing"), |client| {
                    let request = client.get(&url).query(&query);
                    match token {
                        Some(token) => request.bearer_auth(token),
                        None => request,
                    }
                })
                .await;

            let listing = match result {
                Ok(listing) => listing,
                // Later pages are best effort; keep what earlier pages produced.
                Err(err) if page > 0 => {
                    tracing::warn!(subreddit, page, error = %err, "reddit page failed, stopping pagination");
                    break;
                }
                Err(err) => return Err(err),
            };

            leads.extend(
                listing
                    .data
                    .children
                    .into_iter()
                    .filter_map(|child| to_lead(child.data, subreddit)),
            );

            match listing.data.after {
                Some(cursor) if !cursor.is_empty() => after = Some(cursor),
                _ => break,
            }
        }

        tracing::debug!(subreddit, posts = leads.len(), "fetched subreddit");
        Ok(leads)
    }

    async fn collect(&self, settings: &SourceSettings) -> Result<Vec<Lead>, ScraperError> {
        let token = match &self.credentials {
            Some(creds) => match self.fetch_token(creds).await {
                Ok(token) => Some(token),
                Err(err) => {
                    tracing::warn!(error = %err, "reddit token exchange failed, using public listings");
                    None
                }
            },
            None => None,
        };

        let topics: Vec<&str> = settings
            .topics
            .iter()
            .map(|t| t.trim().trim_start_matches("r/"))
            .filter(|t| !t.is_empty())
            .collect();
        let per_page = (settings.max_items / topics.len().max(1)).clamp(10, 100);

        let mut pacer = Pacer::new(settings);
        let mut log = TopicLog::new(SourceKind::Reddit);
        let mut leads = Vec::new();

        for subreddit in topics {
            match self
                .fetch_subreddit(subreddit, token.as_deref(), settings, per_page, &mut pacer)
                .await
            {
                Ok(batch) => {
                    log.succeeded();
                    leads.extend(batch);
                }
                Err(err) => log.failed(subreddit, &err),
            }
        }
        log.finish()?;

        leads.sort_by(|a, b| b.score.cmp(&a.score));
        Ok(finalize(leads, settings))
    }
}

fn to_lead(post: PostData, subreddit: &str) -> Option<Lead> {
    if post.stickied {
        return None;
    }
    let title = post.title.trim();
    if title.is_empty() || post.permalink.is_empty() {
        return None;
    }

    let selftext = post.selftext.trim();
    let raw_text = if selftext.is_empty() || selftext == "[deleted]" || selftext == "[removed]" {
        title.to_owned()
    } else {
        format!("{title}\n\n{}", truncate_chars(selftext, SELFTEXT_CHARS))
    };
    let category = format!("r/{}", post.subreddit.as_deref().unwrap_or(subreddit));

    Some(
        Lead::new(
            SourceKind::Reddit,
            post.id,
            title,
            format!("https://reddit.com{}", post.permalink),
            raw_text,
            Utc::now(),
        )
        .with_score(post.score)
        .with_category(category),
    )
}

impl SourceAdapter for RedditAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::Reddit
    }

    fn fetch<'a>(
        &'a self,
        settings: &'a SourceSettings,
    ) -> BoxFuture<'a, Result<Vec<Lead>, ScraperError>> {
        Box::pin(self.collect(settings))
    }
}
