//! Acquire.com marketplace listings. Listed revenue is used as the ranking score.

use chrono::Utc;
use futures::future::BoxFuture;
use vibetrend_core::{Lead, SourceKind, SourceSettings};

use crate::adapter::{finalize, truncate_chars, SourceAdapter};
use crate::client::trim_base;
use crate::error::ScraperError;
use crate::html::{
    absolutize, anchor_cards, article_cards, classed_text, first_heading, first_href,
    first_paragraph, parse_amount, Card,
};
use crate::render::PageRenderer;

const DEFAULT_BASE_URL: &str = "https://acquire.com";
const DESCRIPTION_CHARS: usize = 500;
const MIN_NAME_CHARS: usize = 3;

pub struct AcquireAdapter {
    renderer: PageRenderer,
    base_url: String,
}

impl AcquireAdapter {
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

    fn explore_url(&self, settings: &SourceSettings) -> String {
        let categories: Vec<&str> = settings
            .topics
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .collect();
        if categories.is_empty() {
            format!("{}/explore", self.base_url)
        } else {
            format!("{}/explore?categories={}", self.base_url, categories.join(","))
        }
    }

    async fn collect(&self, settings: &SourceSettings) -> Result<Vec<Lead>, ScraperError> {
        let url = self.explore_url(settings);
        let html = self.renderer.render(&url).await?;

        let mut cards: Vec<(Option<String>, Card<'_>)> =
            article_cards(&html).into_iter().map(|card| (None, card)).collect();
        if cards.is_empty() {
            cards = anchor_cards(&html, "/startup/")
                .into_iter()
                .map(|(href, card)| (Some(href), card))
                .collect();
        }
        if cards.is_empty() {
            return Err(ScraperError::Selector {
                url,
                reason: "no article or /startup/ link cards".to_owned(),
            });
        }

        let mut leads: Vec<Lead> = cards
            .into_iter()
            .filter_map(|(href, card)| self.to_lead(href, &card))
            .collect();
        tracing::debug!(listings = leads.len(), headless = self.renderer.is_headless(), "scraped acquire listings");

        leads.sort_by(|a, b| b.score.cmp(&a.score));
        Ok(finalize(leads, settings))
    }

    fn to_lead(&self, href: Option<String>, card: &Card<'_>) -> Option<Lead> {
        let name = first_heading(card.inner)
            .or_else(|| classed_text(card.inner, &["title", "name"]))
            .filter(|n| n.chars().count() >= MIN_NAME_CHARS)?;
        let href = href
            .or_else(|| first_href(card.inner, Some("/startup/")))
            .or_else(|| first_href(card.inner, None))?;
        let url = absolutize(&href, &self.base_url);
        let external_id = href
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(&href)
            .to_owned();

        let description = first_paragraph(card.inner)
            .or_else(|| classed_text(card.inner, &["description", "tagline"]))
            .map(|d| truncate_chars(&d, DESCRIPTION_CHARS))
            .unwrap_or_default();
        let revenue_text = classed_text(card.inner, &["revenue", "mrr", "arr"]);
        let revenue = revenue_text.as_deref().map_or(0, parse_amount);
        let category = classed_text(card.inner, &["category", "badge", "chip"])
            .map_or_else(|| "saas".to_owned(), |c| c.to_lowercase());

        let mut raw_text = name.clone();
        if !description.is_empty() {
            raw_text.push_str("\n\n");
            raw_text.push_str(&description);
        }
        if let Some(revenue_text) = revenue_text {
            raw_text.push_str("\nRevenue: ");
            raw_text.push_str(&revenue_text);
        }
        if let Some(price) = classed_text(card.inner, &["price", "asking"]) {
            raw_text.push_str("\nAsking price: ");
            raw_text.push_str(&price);
        }

        Some(
            Lead::new(SourceKind::Acquire, external_id, name, url, raw_text, Utc::now())
                .with_score(revenue)
                .with_category(category),
        )
    }
}

impl SourceAdapter for AcquireAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::Acquire
    }

    fn fetch<'a>(
        &'a self,
        settings: &'a SourceSettings,
    ) -> BoxFuture<'a, Result<Vec<Lead>, ScraperError>> {
        Box::pin(self.collect(settings))
    }
}
