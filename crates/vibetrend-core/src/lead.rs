use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fingerprint::fingerprint;

/// External trend source a [`Lead`] was collected from.
///
/// Declaration order is the canonical adapter order used by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Reddit,
    HackerNews,
    ProductHunt,
    Bluesky,
    IndieHackers,
    Acquire,
}

impl SourceKind {
    pub const ALL: [SourceKind; 6] = [
        SourceKind::Reddit,
        SourceKind::HackerNews,
        SourceKind::ProductHunt,
        SourceKind::Bluesky,
        SourceKind::IndieHackers,
        SourceKind::Acquire,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Reddit => "reddit",
            SourceKind::HackerNews => "hackernews",
            SourceKind::ProductHunt => "producthunt",
            SourceKind::Bluesky => "bluesky",
            SourceKind::IndieHackers => "indiehackers",
            SourceKind::Acquire => "acquire",
        }
    }

    /// Whether the source is scraped from rendered HTML rather than a JSON API.
    #[must_use]
    pub fn is_dynamic_page(self) -> bool {
        matches!(self, SourceKind::IndieHackers | SourceKind::Acquire)
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SourceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown source: {s}"))
    }
}

/// A single candidate trend/opportunity, normalized at the adapter boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub source: SourceKind,
    /// Source-native identifier (post id, story id, product slug).
    pub external_id: String,
    pub title: String,
    pub url: String,
    pub raw_text: String,
    /// Upvotes, points or likes. Used for ranking only.
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub category: Option<String>,
    pub collected_at: DateTime<Utc>,
    pub fingerprint: String,
}

impl Lead {
    /// Build a lead and derive its fingerprint from `title` and `url`.
    #[must_use]
    pub fn new(
        source: SourceKind,
        external_id: impl Into<String>,
        title: impl Into<String>,
        url: impl Into<String>,
        raw_text: impl Into<String>,
        collected_at: DateTime<Utc>,
    ) -> Self {
        let title = title.into();
        let url = url.into();
        let fingerprint = fingerprint(&title, &url);
        Self {
            source,
            external_id: external_id.into(),
            title,
            url,
            raw_text: raw_text.into(),
            score: 0,
            category: None,
            collected_at,
            fingerprint,
        }
    }

    #[must_use]
    pub fn with_score(mut self, score: i64) -> Self {
        self.score = score;
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// Which provider in the ordered strategy list produced an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderRole {
    Primary,
    Fallback,
}

impl ProviderRole {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderRole::Primary => "primary",
            ProviderRole::Fallback => "fallback",
        }
    }
}

impl std::fmt::Display for ProviderRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A [`Lead`] with its AI verdict attached.
///
/// Only ever constructed with a validated `vibe_score` in `0..=100` and
/// exactly three business ideas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedLead {
    #[serde(flatten)]
    pub lead: Lead,
    pub vibe_score: u8,
    pub summary: String,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    pub business_ideas: [String; 3],
    pub provider_used: ProviderRole,
    /// Display name of the concrete provider, e.g. `gemini`.
    pub provider_name: String,
    pub analyzed_at: DateTime<Utc>,
}

impl AnalyzedLead {
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.lead.fingerprint
    }
}

/// A lead that exhausted every provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedLead {
    pub fingerprint: String,
    /// One entry per provider attempt, in attempt order.
    pub errors: Vec<String>,
}

/// Lifecycle status of a fingerprint in the deduplication ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    Pending,
    Analyzed,
    AnalysisFailed,
}

impl LeadStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LeadStatus::Pending => "pending",
            LeadStatus::Analyzed => "analyzed",
            LeadStatus::AnalysisFailed => "analysis_failed",
        }
    }
}

impl std::fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LeadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(LeadStatus::Pending),
            "analyzed" => Ok(LeadStatus::Analyzed),
            "analysis_failed" => Ok(LeadStatus::AnalysisFailed),
            other => Err(format!("unknown lead status: {other}")),
        }
    }
}
