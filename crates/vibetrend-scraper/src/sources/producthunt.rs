//! Product Hunt launches of the last week, ordered by votes (GraphQL v2 API).
//!
//! The same adapter also serves the trending AI tools list: the week's
//! top-voted launches narrowed to one topic.

use std::sync::Arc;

use chrono::{Duration, SecondsFormat, Utc};
use futures::future::BoxFuture;
use serde::Deserialize;
use serde_json::json;
use vibetrend_core::{Lead, SourceKind, SourceSettings, TrendingSettings, TrendingTool};

use crate::adapter::{finalize, Pacer, SourceAdapter};
use crate::client::{trim_base, HttpClient};
use crate::error::ScraperError;
use crate::trending::TrendingSource;

const DEFAULT_BASE_URL: &str = "https://api.producthunt.com";
const LOOKBACK_DAYS: i64 = 7;
const MAX_PAGE_SIZE: usize = 50;

const POSTS_QUERY: &str = r"
query GetPosts($first: Int!, $after: String, $postedAfter: DateTime) {
  posts(first: $first, after: $after, postedAfter: $postedAfter, order: VOTES) {
    edges {
      node {
        id
        name
        tagline
        description
        url
        website
        votesCount
        topics { edges { node { slug } } }
      }
    }
    pageInfo { hasNextPage endCursor }
  }
}";

#[derive(Debug, Clone)]
pub struct ProductHuntCredentials {
    pub api_key: String,
    pub api_secret: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    data: Option<GraphqlData>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct GraphqlData {
    posts: Connection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Connection {
    #[serde(default)]
    edges: Vec<Edge>,
    page_info: PageInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Edge {
    node: PostNode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostNode {
    id: String,
    name: String,
    #[serde(default)]
    tagline: String,
    description: Option<String>,
    url: String,
    website: Option<String>,
    #[serde(default)]
    votes_count: i64,
    topics: Option<TopicConnection>,
}

#[derive(Debug, Deserialize)]
struct TopicConnection {
    #[serde(default)]
    edges: Vec<TopicEdge>,
}

#[derive(Debug, Deserialize)]
struct TopicEdge {
    node: TopicNode,
}

#[derive(Debug, Deserialize)]
struct TopicNode {
    slug: String,
}

pub struct ProductHuntAdapter {
    http: Arc<HttpClient>,
    credentials: Option<ProductHuntCredentials>,
    base_url: String,
}

impl ProductHuntAdapter {
    #[must_use]
    pub fn new(http: Arc<HttpClient>, credentials: Option<ProductHuntCredentials>) -> Self {
        Self::with_base_url(http, credentials, DEFAULT_BASE_URL)
    }

    #[must_use]
    pub fn with_base_url(
        http: Arc<HttpClient>,
        credentials: Option<ProductHuntCredentials>,
        base_url: &str,
    ) -> Self {
        Self {
            http,
            credentials,
            base_url: trim_base(base_url),
        }
    }

    async fn fetch_token(&self, creds: &ProductHuntCredentials) -> Result<String, ScraperError> {
        let url = format!("{}/v2/oauth/token", self.base_url);
        let body = json!({
            "client_id": creds.api_key,
            "client_secret": creds.api_secret,
            "grant_type": "client_credentials",
        });
        let token: TokenResponse = self
            .http
            .fetch_json(&url, "product hunt token", |client| client.post(&url).json(&body))
            .await
            .map_err(|e| ScraperError::Auth {
                site: SourceKind::ProductHunt,
                reason: e.to_string(),
            })?;
        Ok(token.access_token)
    }

    async fn token(&self) -> Result<Option<String>, ScraperError> {
        match &self.credentials {
            Some(creds) => Ok(Some(self.fetch_token(creds).await?)),
            None => Ok(None),
        }
    }

    async fn collect(&self, settings: &SourceSettings) -> Result<Vec<Lead>, ScraperError> {
        let token = self.token().await?;

        let url = format!("{}/v2/api/graphql", self.base_url);
        let posted_after = posted_after();
        let wanted: Vec<String> = settings
            .topics
            .iter()
            .map(|t| t.trim().to_lowercase())
            .collect();

        let mut pacer = Pacer::new(settings);
        let mut cursor: Option<String> = None;
        let mut leads = Vec::new();

        for page in 0..settings.max_pages {
            let remaining = settings.max_items.saturating_sub(leads.len());
            if remaining == 0 {
                break;
            }
            let body = json!({
                "query": POSTS_QUERY,
                "variables": {
                    "first": remaining.min(MAX_PAGE_SIZE),
                    "after": cursor,
                    "postedAfter": posted_after,
                },
            });

            pacer.wait().await;
            let result = self.fetch_page(&url, &body, token.as_deref()).await;
            let connection = match result {
                Ok(connection) => connection,
                Err(err) if page > 0 => {
                    tracing::warn!(page, error = %err, "product hunt page failed, stopping pagination");
                    break;
                }
                Err(err) => return Err(err),
            };

            leads.extend(
                connection
                    .edges
                    .into_iter()
                    .filter_map(|edge| to_lead(edge.node, &wanted)),
            );

            match connection.page_info {
                PageInfo {
                    has_next_page: true,
                    end_cursor: Some(next),
                } => cursor = Some(next),
                _ => break,
            }
        }

        tracing::debug!(posts = leads.len(), "fetched product hunt launches");
        Ok(finalize(leads, settings))
    }

    async fn collect_trending(
        &self,
        settings: &TrendingSettings,
    ) -> Result<Vec<TrendingTool>, ScraperError> {
        let token = self.token().await?;
        let url = format!("{}/v2/api/graphql", self.base_url);
        let body = json!({
            "query": POSTS_QUERY,
            "variables": {
                "first": settings.candidates.min(MAX_PAGE_SIZE),
                "after": null,
                "postedAfter": posted_after(),
            },
        });

        let connection = self.fetch_page(&url, &body, token.as_deref()).await?;
        let tools = trending_tools(
            connection.edges.into_iter().map(|edge| edge.node),
            settings,
        );
        tracing::debug!(tools = tools.len(), topic = %settings.topic, "fetched trending tools");
        Ok(tools)
    }

    async fn fetch_page(
        &self,
        url: &str,
        body: &serde_json::Value,
        token: Option<&str>,
    ) -> Result<Connection, ScraperError> {
        let response: GraphqlResponse = self
            .http
            .fetch_json(url, "product hunt posts", |client| {
                let request = client.post(url).json(body);
                match token {
                    Some(token) => request.bearer_auth(token),
                    None => request,
                }
            })
            .await?;

        if let Some(data) = response.data {
            return Ok(data.posts);
        }
        let message = response
            .errors
            .into_iter()
            .map(|e| e.message)
            .collect::<Vec<_>>()
            .join("; ");
        Err(ScraperError::Api {
            site: SourceKind::ProductHunt,
            message: if message.is_empty() {
                "response carried no data".to_owned()
            } else {
                message
            },
        })
    }
}

fn posted_after() -> String {
    (Utc::now() - Duration::days(LOOKBACK_DAYS)).to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn topic_slugs(node: &mut PostNode) -> Vec<String> {
    node.topics
        .take()
        .map(|t| t.edges.into_iter().map(|e| e.node.slug).collect())
        .unwrap_or_default()
}

/// Tagline, then the longer description when there is one.
fn describe(tagline: &str, description: Option<&str>, separator: &str) -> String {
    match description.map(str::trim) {
        Some(description) if !description.is_empty() => {
            format!("{}{separator}{description}", tagline.trim())
        }
        _ => tagline.trim().to_owned(),
    }
}

/// The maker's website, or the Product Hunt page when none is listed.
fn launch_url(website: Option<String>, fallback: String) -> String {
    website.filter(|w| !w.trim().is_empty()).unwrap_or(fallback)
}

/// Launches carrying the trending topic, most voted first, capped.
fn trending_tools(
    nodes: impl IntoIterator<Item = PostNode>,
    settings: &TrendingSettings,
) -> Vec<TrendingTool> {
    let topic = settings.topic.trim().to_lowercase();
    let mut tools: Vec<TrendingTool> = nodes
        .into_iter()
        .filter_map(|mut node| {
            let topics = topic_slugs(&mut node);
            if !topics.iter().any(|slug| slug.to_lowercase() == topic) {
                return None;
            }
            Some(TrendingTool {
                name: node.name.trim().to_owned(),
                description: describe(&node.tagline, node.description.as_deref(), " - "),
                url: launch_url(node.website, node.url),
                votes: node.votes_count,
                topics,
            })
        })
        .collect();
    tools.sort_by(|a, b| b.votes.cmp(&a.votes));
    tools.truncate(settings.max_tools);
    tools
}

/// Posts with no topics are kept; otherwise at least one topic must be wanted.
fn to_lead(mut node: PostNode, wanted: &[String]) -> Option<Lead> {
    let topics = topic_slugs(&mut node);
    let relevant = topics.iter().find(|slug| wanted.contains(&slug.to_lowercase()));
    if relevant.is_none() && !topics.is_empty() {
        return None;
    }
    let category = relevant.cloned().unwrap_or_else(|| "general".to_owned());

    let raw_text = describe(&node.tagline, node.description.as_deref(), "\n\n");
    let url = launch_url(node.website, node.url);

    Some(
        Lead::new(
            SourceKind::ProductHunt,
            node.id,
            node.name.trim(),
            url,
            raw_text,
            Utc::now(),
        )
        .with_score(node.votes_count)
        .with_category(category),
    )
}

impl SourceAdapter for ProductHuntAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::ProductHunt
    }

    fn fetch<'a>(
        &'a self,
        settings: &'a SourceSettings,
    ) -> BoxFuture<'a, Result<Vec<Lead>, ScraperError>> {
        Box::pin(self.collect(settings))
    }
}

impl TrendingSource for ProductHuntAdapter {
    fn fetch_trending<'a>(
        &'a self,
        settings: &'a TrendingSettings,
    ) -> BoxFuture<'a, Result<Vec<TrendingTool>, ScraperError>> {
        Box::pin(self.collect_trending(settings))
    }
}
