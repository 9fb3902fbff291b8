//! Indie Hackers feed and product pages, scraped from rendered HTML.

use chrono::Utc;
use futures::future::BoxFuture;
use vibetrend_core::{Lead, SourceKind, SourceSettings};

use crate::adapter::{finalize, truncate_chars, Pacer, SourceAdapter, TopicLog};
use crate::client::trim_base;
use crate::error::ScraperError;
use crate::html::{
    absolutize, anchor_cards, article_cards, classed_text, first_heading, first_href,
    first_paragraph, parse_amount, Card,
};
use crate::render::PageRenderer;

const DEFAULT_BASE_URL: &str = "https://www.indiehackers.com";
const DESCRIPTION_CHARS: usize = 500;
const LINK_MARKERS: [&str; 2] = ["/post/", "/product/"];

pub struct IndieHackersAdapter {
    renderer: PageRenderer,
    base_url: String,
}

impl IndieHackersAdapter {
    #[must_use]
    pub fn new(renderer: PageRenderer) -> Self {
        Self::with_base_url(renderer, DEFAULT_BASE_URL)
    }

    #[must_use]
    pub fn with_base_url(renderer: PageRenderer, base_url: &str) -> Self {
        Self {
            renderer,
            base_url: trim_base(base_url),
        }
    }

    async fn scrape_page(&self, path: &str) -> Result<Vec<Lead>, ScraperError> {
        let url = format!("{}/{path}", self.base_url);
        let html = self.renderer.render(&url).await?;
        let category = if path.starts_with("product") {
            "product-launch"
        } else {
            "indie-hackers"
        };

        let mut cards: Vec<(Option<String>, Card<'_>)> =
            article_cards(&html).into_iter().map(|card| (None, card)).collect();
        for marker in LINK_MARKERS {
            if !cards.is_empty() {
                break;
            }
            cards = anchor_cards(&html, marker)
                .into_iter()
                .map(|(href, card)| (Some(href), card))
                .collect();
        }
        if cards.is_empty() {
            return Err(ScraperError::Selector {
                url,
                reason: "no article, /post/ or /product/ link cards".to_owned(),
            });
        }

        let leads: Vec<Lead> = cards
            .into_iter()
            .filter_map(|(href, card)| self.to_lead(href, &card, category))
            .collect();
        tracing::debug!(path, posts = leads.len(), headless = self.renderer.is_headless(), "scraped indie hackers page");
        Ok(leads)
    }

    fn to_lead(&self, href: Option<String>, card: &Card<'_>, category: &str) -> Option<Lead> {
        let title = first_heading(card.inner)
            .or_else(|| classed_text(card.inner, &["title", "name"]))?;
        let href = href
            .or_else(|| first_href(card.inner, Some("/post/")))
            .or_else(|| first_href(card.inner, Some("/product/")))
            .or_else(|| first_href(card.inner, None))?;
        let url = absolutize(&href, &self.base_url);
        let external_id = href
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(&href)
            .to_owned();

        let description = first_paragraph(card.inner)
            .or_else(|| classed_text(card.inner, &["description", "excerpt", "tagline", "body"]))
            .map(|d| truncate_chars(&d, DESCRIPTION_CHARS))
            .unwrap_or_default();
        let raw_text = if description.is_empty() {
            title.clone()
        } else {
            format!("{title}\n\n{description}")
        };
        let score = classed_text(card.inner, &["vote", "upvote", "score"])
            .map_or(0, |text| parse_amount(&text));

        Some(
            Lead::new(SourceKind::IndieHackers, external_id, title, url, raw_text, Utc::now())
                .with_score(score)
                .with_category(category),
        )
    }

    async fn collect(&self, settings: &SourceSettings) -> Result<Vec<Lead>, ScraperError> {
        let mut pacer = Pacer::new(settings);
        let mut log = TopicLog::new(SourceKind::IndieHackers);
        let mut selector_miss: Option<ScraperError> = None;
        let mut leads = Vec::new();

        for path in settings.topics.iter().map(|p| p.trim().trim_matches('/')) {
            if path.is_empty() {
                continue;
            }
            pacer.wait().await;
            match self.scrape_page(path).await {
                Ok(batch) => {
                    log.succeeded();
                    leads.extend(batch);
                }
                Err(err) => {
                    log.failed(path, &err);
                    if selector_miss.is_none() && matches!(err, ScraperError::Selector { .. }) {
                        selector_miss = Some(err);
                    }
                }
            }
        }

        // A layout change is reported as such rather than as a generic failure.
        if let Err(all_failed) = log.finish() {
            return Err(selector_miss.unwrap_or(all_failed));
        }
        Ok(finalize(leads, settings))
    }
}

impl SourceAdapter for IndieHackersAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::IndieHackers
    }

    fn fetch<'a>(
        &'a self,
        settings: &'a SourceSettings,
    ) -> BoxFuture<'a, Result<Vec<Lead>, ScraperError>> {
        Box::pin(self.collect(settings))
    }
}
