//! Validation of the structured answer a provider returns for a batch.
//!
//! A document that cannot be located or parsed fails the whole call. Inside a
//! valid document each item is validated on its own, so one bad entry does
//! not discard its neighbours.

use serde_json::Value;

use crate::error::ProviderError;

pub const MAX_VIBE_SCORE: u8 = 100;
const BUSINESS_IDEAS: usize = 3;

/// A validated AI verdict for one lead.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub vibe_score: u8,
    pub summary: String,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    pub business_ideas: [String; 3],
}

/// Parse `answer` for a batch of `expected` leads.
///
/// Returns one entry per lead, in prompt order. Items are matched by their
/// `id` (`L1`, `L2`, ...); a lead with no matching item is an item error.
///
/// # Errors
///
/// [`ProviderError::Validation`] when the answer holds no JSON document with
/// an `analyses` list (or a bare list of items).
pub fn parse_batch(
    provider: &str,
    answer: &str,
    expected: usize,
) -> Result<Vec<Result<Verdict, String>>, ProviderError> {
    let items = extract_items(answer).map_err(|reason| ProviderError::Validation {
        provider: provider.to_owned(),
        reason,
    })?;

    let mut slots: Vec<Option<Result<Verdict, String>>> = vec![None; expected];
    for item in &items {
        let Some(index) = item.get("id").and_then(item_index) else {
            tracing::debug!(provider, "dropping analysis item without a usable id");
            continue;
        };
        // First answer for an id wins.
        if let Some(slot) = slots.get_mut(index) {
            if slot.is_none() {
                *slot = Some(validate_item(item));
            }
        }
    }

    Ok(slots
        .into_iter()
        .map(|slot| slot.unwrap_or_else(|| Err("missing from response".to_owned())))
        .collect())
}

fn extract_items(answer: &str) -> Result<Vec<Value>, String> {
    find_document(answer, analysis_items)
}

/// Strip markdown code fences, then scan the answer for the first JSON value
/// that `accept` takes.
///
/// Every `{` or `[` is a candidate start. A candidate that parses but is
/// refused by `accept` is skipped whole, so bracketed prose such as `[1]` or
/// a nested list never shadows the real document. The first rejection is
/// reported when nothing matches.
pub(crate) fn find_document<T>(
    answer: &str,
    accept: impl Fn(Value) -> Result<T, String>,
) -> Result<T, String> {
    let trimmed = answer.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map_or(trimmed, |rest| rest.trim_end().trim_end_matches("```"))
        .trim();

    let mut rejection: Option<String> = None;
    let mut pos = 0;
    while let Some(offset) = unfenced[pos..].find(['{', '[']) {
        let start = pos + offset;
        let mut stream = serde_json::Deserializer::from_str(&unfenced[start..]).into_iter::<Value>();
        match stream.next() {
            Some(Ok(value)) => match accept(value) {
                Ok(document) => return Ok(document),
                Err(reason) => {
                    rejection.get_or_insert(reason);
                    pos = start + stream.byte_offset().max(1);
                }
            },
            Some(Err(e)) => {
                rejection.get_or_insert_with(|| format!("answer is not valid JSON: {e}"));
                pos = start + 1;
            }
            None => break,
        }
    }

    Err(rejection.unwrap_or_else(|| "no JSON object found in answer".to_owned()))
}

/// Accepts `{"analyses": [...]}` or a bare list containing at least one object.
fn analysis_items(value: Value) -> Result<Vec<Value>, String> {
    match value {
        Value::Object(mut map) => match map.remove("analyses") {
            Some(Value::Array(items)) => Ok(items),
            _ => Err("answer has no \"analyses\" list".to_owned()),
        },
        Value::Array(items) if items.iter().any(Value::is_object) => Ok(items),
        _ => Err("answer has no \"analyses\" list".to_owned()),
    }
}

/// `"L3"`, `"3"` and `3` all address the third lead.
fn item_index(id: &Value) -> Option<usize> {
    let ordinal = match id {
        Value::String(s) => s.trim().trim_start_matches(['L', 'l']).parse::<usize>().ok()?,
        Value::Number(n) => usize::try_from(n.as_u64()?).ok()?,
        _ => return None,
    };
    ordinal.checked_sub(1)
}

fn validate_item(item: &Value) -> Result<Verdict, String> {
    let vibe_score = item
        .get("vibe_score")
        .ok_or("missing vibe_score")
        .and_then(|v| score(v).ok_or("vibe_score is not a number"))?;
    if !(0.0..=f64::from(MAX_VIBE_SCORE)).contains(&vibe_score) {
        return Err(format!("vibe_score {vibe_score} outside 0-{MAX_VIBE_SCORE}"));
    }

    let summary = item
        .get("summary")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or("missing summary")?
        .to_owned();

    let ideas = item
        .get("business_ideas")
        .and_then(string_list)
        .ok_or("missing business_ideas")?;
    let ideas_len = ideas.len();
    let business_ideas: [String; BUSINESS_IDEAS] = ideas
        .try_into()
        .map_err(|_| format!("expected {BUSINESS_IDEAS} business ideas, got {ideas_len}"))?;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let vibe_score = vibe_score.round() as u8;

    Ok(Verdict {
        vibe_score,
        summary,
        pros: item.get("pros").and_then(string_list).unwrap_or_default(),
        cons: item.get("cons").and_then(string_list).unwrap_or_default(),
        business_ideas,
    })
}

fn score(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// A list of non-empty strings; a single string counts as a one-item list.
fn string_list(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(vec![s.trim().to_owned()]),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
                .collect(),
        ),
        _ => None,
    }
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;
