//! Day-level trend material that sits beside the per-lead verdicts: the
//! trending AI tools list and the AI-written overview of the day's leads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An AI product among the week's most upvoted launches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendingTool {
    pub name: String,
    pub url: String,
    pub description: String,
    pub votes: i64,
    #[serde(default)]
    pub topics: Vec<String>,
}

/// AI deep-dive on one trending tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolReview {
    pub name: String,
    pub url: String,
    pub what_it_does: String,
    /// Whether the product looks real and how mature it seems.
    pub validation: String,
    pub review: String,
    pub revenue_potential: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergingPattern {
    pub pattern: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub examples: Vec<String>,
    #[serde(default)]
    pub opportunity: String,
}

/// Aggregate read of the day's analyzed leads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendOverview {
    pub summary: String,
    pub trending_categories: Vec<String>,
    #[serde(default)]
    pub emerging_patterns: Vec<EmergingPattern>,
    pub provider_name: String,
    pub generated_at: DateTime<Utc>,
}
