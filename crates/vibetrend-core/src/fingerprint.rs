//! Content fingerprints used as the deduplication identity of a lead.
//!
//! The fingerprint depends only on the normalized title and URL, so the same
//! story reported by two sources collapses to one ledger entry.

use sha2::{Digest, Sha256};
use url::{form_urlencoded, Url};

/// Query parameters that never change what a URL points at.
const TRACKING_PARAMS: &[&str] = &["ref", "ref_src", "source", "fbclid", "gclid"];

/// Lowercase, drop punctuation, collapse whitespace.
#[must_use]
pub fn normalize_title(title: &str) -> String {
    title
        .chars()
        .map(|ch| {
            if ch.is_alphanumeric() {
                ch.to_lowercase().next().unwrap_or(ch)
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Canonical form of a URL for identity purposes.
///
/// Scheme, default port, `www.` prefix, fragment, trailing slash and tracking
/// parameters (`utm_*` plus a small fixed list) are discarded. The remaining
/// query pairs are sorted and re-encoded, so percent-encoding and parameter
/// order do not matter. Input that does not parse as a URL (even after
/// assuming `https://`) is returned trimmed.
#[must_use]
pub fn normalize_url(url: &str) -> String {
    let trimmed = url.trim();
    let parsed = match Url::parse(trimmed) {
        Ok(parsed) => parsed,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            match Url::parse(&format!("https://{trimmed}")) {
                Ok(parsed) => parsed,
                Err(_) => return trimmed.to_owned(),
            }
        }
        Err(_) => return trimmed.to_owned(),
    };
    let Some(host) = parsed.host_str() else {
        return trimmed.to_owned();
    };

    let host = host.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    let port = parsed.port().map(|port| format!(":{port}")).unwrap_or_default();
    let path = parsed.path().trim_end_matches('/');

    let mut kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| {
            let key = key.to_lowercase();
            !key.is_empty() && !key.starts_with("utm_") && !TRACKING_PARAMS.contains(&key.as_str())
        })
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    if kept.is_empty() {
        return format!("{host}{port}{path}");
    }

    kept.sort();
    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(&kept)
        .finish();
    format!("{host}{port}{path}?{query}")
}

/// SHA-256 over `normalize_title(title) || 0x00 || normalize_url(url)`, hex-encoded.
#[must_use]
pub fn fingerprint(title: &str, url: &str) -> String {
    let input = format!("{}\x00{}", normalize_title(title), normalize_url(url));
    format!("{:x}", Sha256::digest(input.as_bytes()))
}
