//! Batch prompt for scoring leads as weekend-buildable SaaS opportunities.

use serde::Serialize;
use vibetrend_core::Lead;

const TEXT_CHARS: usize = 600;

const INSTRUCTIONS: &str = r#"You are an AI trend analyst specializing in startup opportunities for solo developers who build with "vibe coding" (AI-assisted development).

For EACH lead below, judge how attractive it is as a product a solo developer could build and sell with AI code generation. Consider:
- technical complexity (simpler is better)
- whether an MVP could ship in a weekend
- market validation (engagement score, paying users, revenue)
- alignment with AI and automation trends ("service as a software", AI wrappers, micro-SaaS, developer productivity, no-code adjacent tools)

Respond with a single JSON object and nothing else, in exactly this shape:
{
  "analyses": [
    {
      "id": "<the lead id, copied verbatim>",
      "vibe_score": <integer 0-100>,
      "summary": "<2-3 sentences: what it is and why it matters>",
      "pros": ["<strength>", "..."],
      "cons": ["<weakness>", "..."],
      "business_ideas": ["<idea 1>", "<idea 2>", "<idea 3>"]
    }
  ]
}

Rules:
- Include exactly one entry per lead id.
- "business_ideas" must contain exactly 3 distinct ideas a solo developer could build from this signal.
- "vibe_score" must be an integer from 0 (not buildable or not attractive) to 100 (ideal weekend build with clear demand).

Leads:
"#;

#[derive(Serialize)]
struct PromptItem<'a> {
    id: String,
    source: &'a str,
    title: &'a str,
    url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<&'a str>,
    score: i64,
    text: String,
}

/// Identifier a lead carries inside a batch prompt. Answers are matched back
/// by this id rather than by position.
#[must_use]
pub fn item_id(index: usize) -> String {
    format!("L{}", index + 1)
}

/// Render the analysis prompt for `batch`.
#[must_use]
pub fn build_prompt(batch: &[Lead]) -> String {
    let items: Vec<PromptItem<'_>> = batch
        .iter()
        .enumerate()
        .map(|(index, lead)| PromptItem {
            id: item_id(index),
            source: lead.source.as_str(),
            title: &lead.title,
            url: &lead.url,
            category: lead.category.as_deref(),
            score: lead.score,
            text: lead.raw_text.chars().take(TEXT_CHARS).collect(),
        })
        .collect();

    // Serializing plain strings and integers cannot fail.
    let data = serde_json::to_string_pretty(&items).unwrap_or_else(|_| "[]".to_owned());
    format!("{INSTRUCTIONS}{data}\n")
}
