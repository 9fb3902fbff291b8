//! Regex-based extraction helpers for rendered listing pages.
//!
//! These are deliberately forgiving: class names on the scraped sites change
//! often, so matching is by substring on `class` attributes and tag families
//! rather than exact selectors.

use std::sync::LazyLock;

use regex::Regex;

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<[^>]+>").expect("valid tag regex"));
static SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style|noscript)\b[^>]*>.*?</(script|style|noscript)>")
        .expect("valid script regex")
});
static ARTICLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<article\b([^>]*)>(.*?)</article>").expect("valid article regex")
});
static ANCHOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\b[^>]*href\s*=\s*["']([^"']+)["'][^>]*>(.*?)</a>"#)
        .expect("valid anchor regex")
});
static HREF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)href\s*=\s*["']([^"']+)["']"#).expect("valid href regex")
});
static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(?:h1|h2|h3|h4)\b[^>]*>(.*?)</(?:h1|h2|h3|h4)>").expect("valid heading regex")
});
static PARAGRAPH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<p\b[^>]*>(.*?)</p>").expect("valid paragraph regex"));
static CLASSED_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<[a-z][a-z0-9]*\b[^>]*class\s*=\s*["']([^"']*)["'][^>]*>"#)
        .expect("valid classed-element regex")
});
static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s?([km])?\b").expect("valid number regex"));

/// A block of markup believed to describe one post or listing.
#[derive(Debug, Clone)]
pub struct Card<'a> {
    pub attrs: &'a str,
    pub inner: &'a str,
}

/// Strip tags, decode common entities and collapse whitespace.
#[must_use]
pub fn clean_text(input: &str) -> String {
    let no_scripts = SCRIPT_RE.replace_all(input, " ");
    let no_tags = TAG_RE.replace_all(&no_scripts, " ");
    decode_entities(&no_tags)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn decode_entities(input: &str) -> String {
    input
        .replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Every `<article>` element on the page.
#[must_use]
pub fn article_cards(html: &str) -> Vec<Card<'_>> {
    ARTICLE_RE
        .captures_iter(html)
        .filter_map(|cap| {
            Some(Card {
                attrs: cap.get(1)?.as_str(),
                inner: cap.get(2)?.as_str(),
            })
        })
        .collect()
}

/// Anchors whose `href` contains `path_marker`, as cards whose inner markup is
/// the anchor content. Used when a page has no `<article>` wrappers.
#[must_use]
pub fn anchor_cards<'a>(html: &'a str, path_marker: &str) -> Vec<(String, Card<'a>)> {
    ANCHOR_RE
        .captures_iter(html)
        .filter_map(|cap| {
            let href = cap.get(1)?.as_str();
            if !href.contains(path_marker) {
                return None;
            }
            let whole = cap.get(0)?.as_str();
            Some((
                href.to_owned(),
                Card {
                    attrs: whole,
                    inner: cap.get(2)?.as_str(),
                },
            ))
        })
        .collect()
}

/// Text of the first heading in `fragment`.
#[must_use]
pub fn first_heading(fragment: &str) -> Option<String> {
    HEADING_RE
        .captures_iter(fragment)
        .filter_map(|cap| cap.get(1).map(|m| clean_text(m.as_str())))
        .find(|text| !text.is_empty())
}

/// Text of the first non-empty paragraph in `fragment`.
#[must_use]
pub fn first_paragraph(fragment: &str) -> Option<String> {
    PARAGRAPH_RE
        .captures_iter(fragment)
        .filter_map(|cap| cap.get(1).map(|m| clean_text(m.as_str())))
        .find(|text| !text.is_empty())
}

/// First `href` in `fragment`, optionally restricted to those containing `marker`.
#[must_use]
pub fn first_href(fragment: &str, marker: Option<&str>) -> Option<String> {
    HREF_RE
        .captures_iter(fragment)
        .filter_map(|cap| cap.get(1).map(|m| m.as_str().trim().to_owned()))
        .find(|href| {
            !href.is_empty()
                && !href.starts_with('#')
                && !href.starts_with("javascript:")
                && marker.map_or(true, |m| href.contains(m))
        })
}

/// Text of the first element whose class attribute contains any of `needles`.
#[must_use]
pub fn classed_text(fragment: &str, needles: &[&str]) -> Option<String> {
    // Opening tags are scanned one by one so nested classed elements are not
    // swallowed by an outer match; text runs up to the next closing tag.
    CLASSED_OPEN_RE
        .captures_iter(fragment)
        .filter(|cap| {
            cap.get(1).is_some_and(|class| {
                let class = class.as_str().to_lowercase();
                needles.iter().any(|needle| class.contains(needle))
            })
        })
        .filter_map(|cap| {
            let end = cap.get(0)?.end();
            let rest = &fragment[end..];
            let text_end = rest.find("</").unwrap_or(rest.len());
            Some(clean_text(&rest[..text_end]))
        })
        .find(|text| !text.is_empty())
}

/// Resolve a site-relative `href` against `origin`.
#[must_use]
pub fn absolutize(href: &str, origin: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_owned()
    } else if let Some(rest) = href.strip_prefix("//") {
        format!("https://{rest}")
    } else if href.starts_with('/') {
        format!("{}{href}", origin.trim_end_matches('/'))
    } else {
        format!("{}/{href}", origin.trim_end_matches('/'))
    }
}

/// Parse human-formatted amounts like `"1.2k"`, `"$45,000"` or `"$3M ARR"`.
///
/// Returns 0 when no number is present.
#[must_use]
pub fn parse_amount(text: &str) -> i64 {
    let lowered = text.to_lowercase().replace(',', "");
    let Some(cap) = NUMBER_RE.captures(&lowered) else {
        return 0;
    };
    let value: f64 = cap
        .get(1)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0.0);
    let multiplier = match cap.get(2).map(|m| m.as_str()) {
        Some("k") => 1_000.0,
        Some("m") => 1_000_000.0,
        _ => 1.0,
    };
    #[allow(clippy::cast_possible_truncation)]
    let amount = (value * multiplier).round() as i64;
    amount
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_strips_tags_scripts_and_entities() {
        assert_eq!(
            clean_text("<b>Ship&nbsp;it</b>\n<script>var x = 1;</script> &amp; grow"),
            "Ship it & grow"
        );
    }

    #[test]
    fn article_cards_capture_each_article() {
        let html = r#"<main><article class="a">one</article><article data-x="1">two</article></main>"#;
        let cards = article_cards(html);
        assert_eq!(cards.len(), 2);
        assert!(cards[0].attrs.contains("class=\"a\""));
        assert_eq!(cards[1].inner, "two");
    }

    #[test]
    fn anchor_cards_filter_by_path() {
        let html = r#"<a href="/post/abc"><h3>Title</h3></a><a href="/about">About</a>"#;
        let cards = anchor_cards(html, "/post/");
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].0, "/post/abc");
        assert_eq!(first_heading(cards[0].1.inner).as_deref(), Some("Title"));
    }

    #[test]
    fn first_href_honours_marker() {
        let html = r##"<a href="#top">x</a><a href="/u/bob">bob</a><a href="/post/9">p</a>"##;
        assert_eq!(first_href(html, None).as_deref(), Some("/u/bob"));
        assert_eq!(first_href(html, Some("/post/")).as_deref(), Some("/post/9"));
    }

    #[test]
    fn classed_text_matches_class_substring() {
        let html = r#"<div class="card"><span class="UpvoteCount_value">42</span></div>"#;
        assert_eq!(classed_text(html, &["upvote"]).as_deref(), Some("42"));
        assert!(classed_text(html, &["price"]).is_none());
    }

    #[test]
    fn absolutize_handles_relative_and_absolute() {
        assert_eq!(
            absolutize("/post/x", "https://www.indiehackers.com/"),
            "https://www.indiehackers.com/post/x"
        );
        assert_eq!(absolutize("https://a.io/b", "https://c.io"), "https://a.io/b");
        assert_eq!(absolutize("//cdn.io/x", "https://c.io"), "https://cdn.io/x");
    }

    #[test]
    fn parse_amount_understands_suffixes() {
        assert_eq!(parse_amount("$12.5k MRR"), 12_500);
        assert_eq!(parse_amount("$1,250,000"), 1_250_000);
        assert_eq!(parse_amount("$2M"), 2_000_000);
        assert_eq!(parse_amount("▲ 37"), 37);
        assert_eq!(parse_amount("n/a"), 0);
    }
}
