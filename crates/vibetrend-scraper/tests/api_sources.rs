//! Integration tests for the JSON-API source adapters.
//!
//! Every test stands up a `wiremock` server and points the adapter at it, so
//! no real network traffic is made.

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vibetrend_core::{SourceKind, SourceSettings, TrendingSettings};
use vibetrend_scraper::sources::{
    BlueskyAdapter, BlueskyCredentials, HackerNewsAdapter, ProductHuntAdapter,
    ProductHuntCredentials, RedditAdapter, RedditCredentials,
};
use vibetrend_scraper::{HttpClient, ScraperError, SourceAdapter, TrendingSource};

/// 5-second timeout, no retries, no back-off.
fn test_http() -> Arc<HttpClient> {
    Arc::new(HttpClient::new(5, "vibetrend-test/0.1", 0, 0).expect("failed to build test client"))
}

fn settings(kind: SourceKind, topics: &[&str]) -> SourceSettings {
    let mut settings = SourceSettings::default_for(kind);
    settings.topics = topics.iter().map(|t| (*t).to_string()).collect();
    settings.keywords.clear();
    settings.page_delay_ms = 0;
    settings.min_score = 0;
    settings
}

fn reddit_post(id: &str, title: &str, score: i64, stickied: bool) -> serde_json::Value {
    json!({
        "kind": "t3",
        "data": {
            "id": id,
            "title": title,
            "selftext": "We launched an AI tool for invoices.",
            "permalink": format!("/r/SaaS/comments/{id}/slug/"),
            "score": score,
            "stickied": stickied,
            "subreddit": "SaaS"
        }
    })
}

fn reddit_listing(children: Vec<serde_json::Value>, after: Option<&str>) -> serde_json::Value {
    json!({ "kind": "Listing", "data": { "children": children, "after": after } })
}

// ---------------------------------------------------------------------------
// Reddit
// ---------------------------------------------------------------------------

#[tokio::test]
async fn reddit_public_listing_skips_stickied_posts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/r/SaaS/top.json"))
        .and(query_param("t", "week"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reddit_listing(
            vec![
                reddit_post("mod1", "Weekly feedback thread", 900, true),
                reddit_post("abc", "I built an AI invoice tool", 120, false),
            ],
            None,
        )))
        .mount(&server)
        .await;

    let adapter = RedditAdapter::with_base_url(test_http(), None, &server.uri());
    let leads = adapter
        .fetch(&settings(SourceKind::Reddit, &["SaaS"]))
        .await
        .expect("reddit fetch should succeed");

    assert_eq!(leads.len(), 1);
    let lead = &leads[0];
    assert_eq!(lead.source, SourceKind::Reddit);
    assert_eq!(lead.external_id, "abc");
    assert_eq!(lead.url, "https://reddit.com/r/SaaS/comments/abc/slug/");
    assert_eq!(lead.score, 120);
    assert_eq!(lead.category.as_deref(), Some("r/SaaS"));
    assert!(lead.raw_text.starts_with("I built an AI invoice tool\n\n"));
}

#[tokio::test]
async fn reddit_uses_bearer_token_when_credentials_exist() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/access_token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "tok-123", "token_type": "bearer"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/r/startups/top.json"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reddit_listing(
            vec![reddit_post("xyz", "Micro SaaS ideas that worked", 55, false)],
            None,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let creds = RedditCredentials {
        client_id: "id".to_string(),
        client_secret: "secret".to_string(),
    };
    let adapter = RedditAdapter::with_base_url(test_http(), Some(creds), &server.uri());
    let leads = adapter
        .fetch(&settings(SourceKind::Reddit, &["startups"]))
        .await
        .expect("reddit fetch should succeed");

    assert_eq!(leads.len(), 1);
    assert_eq!(leads[0].external_id, "xyz");
}

#[tokio::test]
async fn reddit_follows_after_cursor_up_to_max_pages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/r/SaaS/top.json"))
        .and(query_param("after", "t3_page2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reddit_listing(
            vec![reddit_post("p2", "Second page launch", 10, false)],
            Some("t3_page3"),
        )))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/r/SaaS/top.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reddit_listing(
            vec![reddit_post("p1", "First page launch", 20, false)],
            Some("t3_page2"),
        )))
        .mount(&server)
        .await;

    let mut settings = settings(SourceKind::Reddit, &["SaaS"]);
    settings.max_pages = 2;
    let adapter = RedditAdapter::with_base_url(test_http(), None, &server.uri());
    let leads = adapter.fetch(&settings).await.expect("reddit fetch should succeed");

    let ids: Vec<&str> = leads.iter().map(|l| l.external_id.as_str()).collect();
    assert_eq!(ids, vec!["p1", "p2"]);
}

#[tokio::test]
async fn reddit_one_failing_subreddit_does_not_fail_the_source() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/r/broken/top.json"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/r/SaaS/top.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reddit_listing(
            vec![reddit_post("ok", "Still works", 5, false)],
            None,
        )))
        .mount(&server)
        .await;

    let adapter = RedditAdapter::with_base_url(test_http(), None, &server.uri());
    let leads = adapter
        .fetch(&settings(SourceKind::Reddit, &["broken", "SaaS"]))
        .await
        .expect("partial failure should still succeed");
    assert_eq!(leads.len(), 1);
}

#[tokio::test]
async fn reddit_fails_when_every_subreddit_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let adapter = RedditAdapter::with_base_url(test_http(), None, &server.uri());
    let result = adapter
        .fetch(&settings(SourceKind::Reddit, &["SaaS", "startups"]))
        .await;

    assert!(
        matches!(
            result,
            Err(ScraperError::AllTopicsFailed {
                site: SourceKind::Reddit,
                attempted: 2,
                ..
            })
        ),
        "expected AllTopicsFailed, got: {result:?}"
    );
}

// ---------------------------------------------------------------------------
// Hacker News
// ---------------------------------------------------------------------------

fn hn_response(hits: serde_json::Value) -> serde_json::Value {
    json!({ "hits": hits, "nbPages": 1, "page": 0 })
}

#[tokio::test]
async fn hackernews_maps_hits_and_applies_min_score() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/search"))
        .and(query_param("query", "Show HN"))
        .and(query_param("tags", "story"))
        .respond_with(ResponseTemplate::new(200).set_body_json(hn_response(json!([
            {
                "objectID": "101",
                "title": "Show HN: AI copilot for spreadsheets",
                "url": "https://sheetpilot.io",
                "points": 250,
                "story_text": null
            },
            {
                "objectID": "102",
                "title": "Show HN: My weekend project",
                "url": null,
                "points": 3,
                "story_text": "<p>Tiny thing</p>"
            },
            {
                "objectID": "103",
                "title": "Ask-style post without link",
                "url": "",
                "points": 40,
                "story_text": "<p>Details &amp; more</p>"
            }
        ]))))
        .mount(&server)
        .await;

    let mut settings = settings(SourceKind::HackerNews, &["Show HN"]);
    settings.min_score = 10;
    let adapter = HackerNewsAdapter::with_base_url(test_http(), &server.uri());
    let leads = adapter.fetch(&settings).await.expect("hn fetch should succeed");

    let ids: Vec<&str> = leads.iter().map(|l| l.external_id.as_str()).collect();
    assert_eq!(ids, vec!["101", "103"]);
    assert_eq!(leads[0].category.as_deref(), Some("show-hn"));
    assert_eq!(leads[0].raw_text, "Show HN: AI copilot for spreadsheets");
    assert_eq!(leads[1].url, "https://news.ycombinator.com/item?id=103");
    assert_eq!(leads[1].raw_text, "Details & more");
    assert_eq!(leads[1].category.as_deref(), Some("hackernews"));
}

#[tokio::test]
async fn hackernews_dedups_stories_matching_several_queries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(hn_response(json!([
            {
                "objectID": "7",
                "title": "Show HN: SaaS boilerplate",
                "url": "https://boiler.dev",
                "points": 80
            }
        ]))))
        .expect(2)
        .mount(&server)
        .await;

    let adapter = HackerNewsAdapter::with_base_url(test_http(), &server.uri());
    let leads = adapter
        .fetch(&settings(SourceKind::HackerNews, &["Show HN", "SaaS"]))
        .await
        .expect("hn fetch should succeed");
    assert_eq!(leads.len(), 1);
}

// ---------------------------------------------------------------------------
// Product Hunt
// ---------------------------------------------------------------------------

fn ph_post(id: &str, name: &str, votes: i64, topics: &[&str]) -> serde_json::Value {
    let topic_edges: Vec<serde_json::Value> = topics
        .iter()
        .map(|slug| json!({ "node": { "slug": slug } }))
        .collect();
    json!({
        "node": {
            "id": id,
            "name": name,
            "tagline": "Ship faster",
            "description": "An AI assistant for founders",
            "url": format!("https://www.producthunt.com/posts/{id}"),
            "website": format!("https://{id}.app"),
            "votesCount": votes,
            "topics": { "edges": topic_edges }
        }
    })
}

#[tokio::test]
async fn producthunt_keeps_posts_with_matching_or_no_topics() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/api/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "posts": {
                    "edges": [
                        ph_post("aiwriter", "AI Writer", 500, &["artificial-intelligence", "writing"]),
                        ph_post("petcam", "PetCam", 300, &["pets"]),
                        ph_post("mystery", "Mystery Tool", 100, &[])
                    ],
                    "pageInfo": { "hasNextPage": false, "endCursor": null }
                }
            }
        })))
        .mount(&server)
        .await;

    let adapter = ProductHuntAdapter::with_base_url(test_http(), None, &server.uri());
    let leads = adapter
        .fetch(&settings(SourceKind::ProductHunt, &["artificial-intelligence", "saas"]))
        .await
        .expect("product hunt fetch should succeed");

    let ids: Vec<&str> = leads.iter().map(|l| l.external_id.as_str()).collect();
    assert_eq!(ids, vec!["aiwriter", "mystery"]);
    assert_eq!(leads[0].url, "https://aiwriter.app");
    assert_eq!(leads[0].score, 500);
    assert_eq!(leads[0].category.as_deref(), Some("artificial-intelligence"));
    assert_eq!(leads[1].category.as_deref(), Some("general"));
}

#[tokio::test]
async fn producthunt_exchanges_token_and_sends_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/oauth/token"))
        .and(body_string_contains("client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "ph-tok"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/api/graphql"))
        .and(header("authorization", "Bearer ph-tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "posts": {
                    "edges": [ph_post("one", "One", 10, &["saas"])],
                    "pageInfo": { "hasNextPage": false, "endCursor": null }
                }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let creds = ProductHuntCredentials {
        api_key: "key".to_string(),
        api_secret: "secret".to_string(),
    };
    let adapter = ProductHuntAdapter::with_base_url(test_http(), Some(creds), &server.uri());
    let leads = adapter
        .fetch(&settings(SourceKind::ProductHunt, &["saas"]))
        .await
        .expect("product hunt fetch should succeed");
    assert_eq!(leads.len(), 1);
}

#[tokio::test]
async fn producthunt_graphql_errors_surface_as_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/api/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": null,
            "errors": [{ "message": "complexity limit exceeded" }]
        })))
        .mount(&server)
        .await;

    let adapter = ProductHuntAdapter::with_base_url(test_http(), None, &server.uri());
    let result = adapter.fetch(&settings(SourceKind::ProductHunt, &["saas"])).await;

    match result {
        Err(ScraperError::Api { site, message }) => {
            assert_eq!(site, SourceKind::ProductHunt);
            assert!(message.contains("complexity"));
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn producthunt_trending_keeps_top_voted_ai_launches() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/api/graphql"))
        .and(body_string_contains("\"first\":20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "posts": {
                    "edges": [
                        ph_post("petcam", "PetCam", 900, &["pets"]),
                        ph_post("agentkit", "AgentKit", 400, &["developer-tools", "Artificial-Intelligence"]),
                        ph_post("voicebox", "VoiceBox", 700, &["artificial-intelligence"]),
                        ph_post("notetaker", "NoteTaker", 200, &["artificial-intelligence"]),
                        ph_post("untagged", "Untagged", 800, &[])
                    ],
                    "pageInfo": { "hasNextPage": true, "endCursor": "c1" }
                }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let settings = TrendingSettings {
        candidates: 20,
        max_tools: 2,
        ..TrendingSettings::default()
    };
    let adapter = ProductHuntAdapter::with_base_url(test_http(), None, &server.uri());
    let tools = adapter
        .fetch_trending(&settings)
        .await
        .expect("trending fetch should succeed");

    let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["VoiceBox", "AgentKit"]);
    assert_eq!(tools[0].url, "https://voicebox.app");
    assert_eq!(tools[0].votes, 700);
    assert_eq!(tools[0].description, "Ship faster - An AI assistant for founders");
}

#[tokio::test]
async fn producthunt_trending_failure_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/api/graphql"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let adapter = ProductHuntAdapter::with_base_url(test_http(), None, &server.uri());
    let result = adapter.fetch_trending(&TrendingSettings::default()).await;
    assert!(result.is_err(), "got: {result:?}");
}

// ---------------------------------------------------------------------------
// Bluesky
// ---------------------------------------------------------------------------

fn bluesky_creds() -> BlueskyCredentials {
    BlueskyCredentials {
        handle: "founder.bsky.social".to_string(),
        app_password: "app-pass".to_string(),
    }
}

#[tokio::test]
async fn bluesky_without_credentials_is_unavailable() {
    let adapter = BlueskyAdapter::with_base_url(test_http(), None, "http://127.0.0.1:9");
    let result = adapter
        .fetch(&settings(SourceKind::Bluesky, &["#buildinpublic"]))
        .await;
    assert!(
        matches!(result, Err(ScraperError::MissingCredentials { site: SourceKind::Bluesky, .. })),
        "expected MissingCredentials, got: {result:?}"
    );
}

#[tokio::test]
async fn bluesky_session_failure_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/xrpc/com.atproto.server.createSession"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let adapter = BlueskyAdapter::with_base_url(test_http(), Some(bluesky_creds()), &server.uri());
    let result = adapter
        .fetch(&settings(SourceKind::Bluesky, &["#buildinpublic"]))
        .await;
    assert!(
        matches!(result, Err(ScraperError::Auth { site: SourceKind::Bluesky, .. })),
        "expected Auth error, got: {result:?}"
    );
}

#[tokio::test]
async fn bluesky_scores_engagement_and_skips_unsearchable_tags() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/xrpc/com.atproto.server.createSession"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"accessJwt": "jwt-1", "handle": "founder.bsky.social"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/xrpc/app.bsky.feed.searchPosts"))
        .and(query_param("q", "#nosearch"))
        .respond_with(ResponseTemplate::new(400))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/xrpc/app.bsky.feed.searchPosts"))
        .and(header("authorization", "Bearer jwt-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "posts": [{
                "uri": "at://did:plc:abc/app.bsky.feed.post/3kxyz",
                "author": { "handle": "maker.bsky.social", "displayName": "Maker" },
                "record": { "text": "Day 30 of building my AI SaaS in public: 12 paying users" },
                "likeCount": 40,
                "repostCount": 5
            }]
        })))
        .mount(&server)
        .await;

    let adapter = BlueskyAdapter::with_base_url(test_http(), Some(bluesky_creds()), &server.uri());
    let leads = adapter
        .fetch(&settings(SourceKind::Bluesky, &["#nosearch", "#buildinpublic"]))
        .await
        .expect("bluesky fetch should succeed");

    assert_eq!(leads.len(), 1);
    let lead = &leads[0];
    assert_eq!(lead.score, 45);
    assert_eq!(lead.url, "https://bsky.app/profile/maker.bsky.social/post/3kxyz");
    assert_eq!(
        lead.title,
        "Maker: Day 30 of building my AI SaaS in public: 12 paying users"
    );
    assert_eq!(lead.category.as_deref(), Some("buildinpublic"));
}
