//! Day-level prompts: the overview of the analyzed leads and the deep-dive
//! on the trending AI tools list.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use vibetrend_core::{AnalyzedLead, EmergingPattern, ToolReview, TrendingTool};

use crate::error::ProviderError;
use crate::parse::find_document;

/// Leads shown to the model when writing the overview, best first.
pub const OVERVIEW_LEADS: usize = 30;
/// Tools sent for review; the list is already capped upstream.
pub const REVIEW_TOOLS: usize = 15;
const SUMMARY_CHARS: usize = 400;

const OVERVIEW_INSTRUCTIONS: &str = r#"You are an AI trend analyst writing the weekly brief for solo developers who build with "vibe coding" (AI-assisted development).

Below are this week's analyzed leads, each with a vibe score (0-100) and a short summary. Look across all of them and describe the week:
- what the overall trend is
- which categories keep coming up
- which patterns are emerging across sources, and how a solo developer could capitalize on them

Respond with a single JSON object and nothing else, in exactly this shape:
{
  "summary": "<2-3 sentence overview of this week's trends>",
  "trending_categories": ["<category>", "..."],
  "emerging_patterns": [
    {
      "pattern": "<pattern name>",
      "description": "<what this pattern is>",
      "examples": ["<lead title>", "..."],
      "opportunity": "<how to capitalize on it>"
    }
  ]
}

Leads:
"#;

const TOOLS_INSTRUCTIONS: &str = r#"You are an expert AI product analyst. Below are this week's top-voted AI tools on Product Hunt.

For each tool provide:
- validation: does it look like a real, functioning product based on its description and URL
- what_it_does: a clear, non-technical explanation
- review: a 2-sentence critique of its value proposition (pros and cons)
- revenue_potential: exactly 3 distinct ways a user could make money with this tool

Respond with a single JSON object and nothing else, in exactly this shape:
{
  "trending_tools_analysis": [
    {
      "name": "<tool name, copied verbatim>",
      "url": "<tool url>",
      "what_it_does": "...",
      "validation": "...",
      "review": "...",
      "revenue_potential": ["<idea 1>", "<idea 2>", "<idea 3>"]
    }
  ]
}

Tools:
"#;

#[derive(Serialize)]
struct OverviewItem<'a> {
    title: &'a str,
    source: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<&'a str>,
    vibe_score: u8,
    summary: String,
}

/// Overview fields as the model returns them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OverviewAnswer {
    pub summary: String,
    #[serde(default)]
    pub trending_categories: Vec<String>,
    #[serde(default)]
    pub emerging_patterns: Vec<EmergingPattern>,
}

#[derive(Deserialize)]
struct ToolsAnswer {
    trending_tools_analysis: Vec<ReviewItem>,
}

#[derive(Deserialize)]
struct ReviewItem {
    #[serde(default)]
    name: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    what_it_does: String,
    #[serde(default)]
    validation: String,
    #[serde(default)]
    review: String,
    #[serde(default)]
    revenue_potential: Vec<String>,
}

fn render(instructions: &str, items: &impl Serialize) -> String {
    // Plain strings and integers always serialize.
    let data = serde_json::to_string_pretty(items).unwrap_or_else(|_| "[]".to_owned());
    format!("{instructions}{data}\n")
}

/// Prompt over the `OVERVIEW_LEADS` highest-scoring leads.
#[must_use]
pub fn build_overview_prompt(leads: &[AnalyzedLead]) -> String {
    let mut ranked: Vec<&AnalyzedLead> = leads.iter().collect();
    ranked.sort_by(|a, b| b.vibe_score.cmp(&a.vibe_score));
    let items: Vec<OverviewItem<'_>> = ranked
        .into_iter()
        .take(OVERVIEW_LEADS)
        .map(|a| OverviewItem {
            title: &a.lead.title,
            source: a.lead.source.as_str(),
            category: a.lead.category.as_deref(),
            vibe_score: a.vibe_score,
            summary: a.summary.chars().take(SUMMARY_CHARS).collect(),
        })
        .collect();
    render(OVERVIEW_INSTRUCTIONS, &items)
}

#[must_use]
pub fn build_tools_prompt(tools: &[TrendingTool]) -> String {
    let tools = &tools[..tools.len().min(REVIEW_TOOLS)];
    render(TOOLS_INSTRUCTIONS, &tools)
}

/// # Errors
///
/// [`ProviderError::Validation`] when the answer has no overview object or
/// its summary is blank.
pub fn parse_overview(provider: &str, answer: &str) -> Result<OverviewAnswer, ProviderError> {
    find_document(answer, |value| {
        if !value.get("summary").is_some_and(Value::is_string) {
            return Err("answer has no \"summary\"".to_owned());
        }
        let parsed: OverviewAnswer = serde_json::from_value(value)
            .map_err(|e| format!("overview has the wrong shape: {e}"))?;
        if parsed.summary.trim().is_empty() {
            return Err("overview summary is empty".to_owned());
        }
        Ok(parsed)
    })
    .map_err(|reason| ProviderError::Validation {
        provider: provider.to_owned(),
        reason,
    })
}

/// Reviews in answer order. Unnamed entries are dropped, and a missing URL
/// is filled from the tool with the same name.
///
/// # Errors
///
/// [`ProviderError::Validation`] when the answer has no
/// `trending_tools_analysis` list or no usable entry in it.
pub fn parse_tool_reviews(
    provider: &str,
    answer: &str,
    tools: &[TrendingTool],
) -> Result<Vec<ToolReview>, ProviderError> {
    let items = find_document(answer, |value| {
        if !value.get("trending_tools_analysis").is_some_and(Value::is_array) {
            return Err("answer has no \"trending_tools_analysis\" list".to_owned());
        }
        serde_json::from_value::<ToolsAnswer>(value)
            .map(|answer| answer.trending_tools_analysis)
            .map_err(|e| format!("tool reviews have the wrong shape: {e}"))
    })
    .map_err(|reason| ProviderError::Validation {
        provider: provider.to_owned(),
        reason,
    })?;

    let reviews: Vec<ToolReview> = items
        .into_iter()
        .filter(|item| !item.name.trim().is_empty())
        .map(|item| {
            let name = item.name.trim().to_owned();
            let url = if item.url.trim().is_empty() {
                tools
                    .iter()
                    .find(|tool| tool.name.eq_ignore_ascii_case(&name))
                    .map(|tool| tool.url.clone())
                    .unwrap_or_default()
            } else {
                item.url.trim().to_owned()
            };
            ToolReview {
                name,
                url,
                what_it_does: item.what_it_does.trim().to_owned(),
                validation: item.validation.trim().to_owned(),
                review: item.review.trim().to_owned(),
                revenue_potential: item
                    .revenue_potential
                    .into_iter()
                    .map(|idea| idea.trim().to_owned())
                    .filter(|idea| !idea.is_empty())
                    .collect(),
            }
        })
        .collect();

    if reviews.is_empty() {
        return Err(ProviderError::Validation {
            provider: provider.to_owned(),
            reason: "no named tool reviews in answer".to_owned(),
        });
    }
    Ok(reviews)
}

#[cfg(test)]
#[path = "insights_test.rs"]
mod tests;
