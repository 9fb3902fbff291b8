//! Per-source configuration loaded from `config/sources.yaml`.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::lead::SourceKind;
use crate::ConfigError;

/// Tuning and filtering for one source adapter.
///
/// `topics` is interpreted per source: subreddits for Reddit, search queries
/// for Hacker News, topic slugs for Product Hunt, hashtags for Bluesky, page
/// paths for Indie Hackers and listing categories for Acquire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSettings {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub topics: Vec<String>,
    /// Case-insensitive any-match filter applied to title + text. Empty accepts all.
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default = "default_max_items")]
    pub max_items: usize,
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
    /// Politeness delay between page fetches within this source.
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,
    /// Minimum engagement score; leads below it are dropped.
    #[serde(default)]
    pub min_score: i64,
}

fn default_enabled() -> bool {
    true
}

fn default_max_items() -> usize {
    50
}

fn default_max_pages() -> usize {
    1
}

fn default_page_delay_ms() -> u64 {
    1_000
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

impl SourceSettings {
    /// Built-in settings used when no sources file exists.
    #[must_use]
    pub fn default_for(kind: SourceKind) -> Self {
        let base = Self {
            enabled: true,
            topics: Vec::new(),
            keywords: Vec::new(),
            max_items: default_max_items(),
            max_pages: default_max_pages(),
            page_delay_ms: default_page_delay_ms(),
            min_score: 0,
        };

        match kind {
            SourceKind::Reddit => Self {
                topics: strings(&[
                    "SaaS",
                    "indiehackers",
                    "startups",
                    "SideProject",
                    "microsaas",
                    "Entrepreneur",
                    "nocode",
                    "webdev",
                ]),
                max_items: 100,
                ..base
            },
            SourceKind::HackerNews => Self {
                topics: strings(&["Show HN", "SaaS"]),
                max_items: 100,
                page_delay_ms: 500,
                min_score: 10,
                ..base
            },
            SourceKind::ProductHunt => Self {
                topics: strings(&[
                    "artificial-intelligence",
                    "developer-tools",
                    "saas",
                    "productivity",
                ]),
                max_items: 100,
                max_pages: 2,
                ..base
            },
            SourceKind::Bluesky => Self {
                topics: strings(&["#buildinpublic", "#saas"]),
                max_items: 100,
                page_delay_ms: 500,
                ..base
            },
            SourceKind::IndieHackers => Self {
                topics: strings(&["feed", "products"]),
                page_delay_ms: 1_500,
                ..base
            },
            SourceKind::Acquire => Self {
                topics: strings(&["saas", "technology", "software"]),
                page_delay_ms: 2_000,
                ..base
            },
        }
    }

    /// Whether `text` passes the keyword filter.
    #[must_use]
    pub fn matches_keywords(&self, text: &str) -> bool {
        if self.keywords.is_empty() {
            return true;
        }
        let haystack = text.to_lowercase();
        self.keywords
            .iter()
            .any(|kw| haystack.contains(&kw.trim().to_lowercase()))
    }
}

/// The weekly "trending AI tools" pull from Product Hunt.
///
/// Kept apart from the lead sources: trending tools are reviewed as a list and
/// never enter the deduplication ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingSettings {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Topic slug a launch must carry.
    #[serde(default = "default_trending_topic")]
    pub topic: String,
    /// Top-voted launches inspected before the topic filter.
    #[serde(default = "default_trending_candidates")]
    pub candidates: usize,
    #[serde(default = "default_trending_max_tools")]
    pub max_tools: usize,
}

fn default_trending_topic() -> String {
    "artificial-intelligence".to_string()
}

fn default_trending_candidates() -> usize {
    50
}

fn default_trending_max_tools() -> usize {
    10
}

impl Default for TrendingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            topic: default_trending_topic(),
            candidates: default_trending_candidates(),
            max_tools: default_trending_max_tools(),
        }
    }
}

/// Parsed `sources.yaml`. Sources missing from the file are disabled; a
/// missing `trending_ai` section uses the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcesFile {
    pub sources: BTreeMap<SourceKind, SourceSettings>,
    #[serde(default)]
    pub trending_ai: TrendingSettings,
}

impl Default for SourcesFile {
    fn default() -> Self {
        Self {
            sources: SourceKind::ALL
                .into_iter()
                .map(|kind| (kind, SourceSettings::default_for(kind)))
                .collect(),
            trending_ai: TrendingSettings::default(),
        }
    }
}

impl SourcesFile {
    /// Enabled sources in canonical adapter order.
    #[must_use]
    pub fn enabled(&self) -> Vec<(SourceKind, &SourceSettings)> {
        self.sources
            .iter()
            .filter(|(_, settings)| settings.enabled)
            .map(|(kind, settings)| (*kind, settings))
            .collect()
    }

    #[must_use]
    pub fn settings(&self, kind: SourceKind) -> Option<&SourceSettings> {
        self.sources.get(&kind)
    }
}

/// Load and validate the sources configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_sources(path: &Path) -> Result<SourcesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SourcesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_sources(&content)
}

/// Parse and validate sources YAML from a string.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is malformed or fails validation.
pub fn parse_sources(content: &str) -> Result<SourcesFile, ConfigError> {
    let file: SourcesFile = serde_yaml::from_str(content).map_err(ConfigError::SourcesFileParse)?;
    validate_sources(&file)?;
    Ok(file)
}

fn validate_sources(file: &SourcesFile) -> Result<(), ConfigError> {
    for (kind, settings) in file.enabled() {
        if settings.topics.iter().all(|t| t.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "source '{kind}' is enabled but has no topics"
            )));
        }
        if settings.max_items == 0 {
            return Err(ConfigError::Validation(format!(
                "source '{kind}' has max_items = 0"
            )));
        }
        if settings.max_pages == 0 {
            return Err(ConfigError::Validation(format!(
                "source '{kind}' has max_pages = 0"
            )));
        }
    }

    let trending = &file.trending_ai;
    if trending.enabled {
        if trending.topic.trim().is_empty() {
            return Err(ConfigError::Validation(
                "trending_ai is enabled but has no topic".to_string(),
            ));
        }
        if trending.candidates == 0 || trending.max_tools == 0 {
            return Err(ConfigError::Validation(
                "trending_ai needs candidates and max_tools above zero".to_string(),
            ));
        }
    }
    Ok(())
}
