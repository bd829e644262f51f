//! Parsing of free-form listing input and prices.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    error::{Result, StaysError},
    models::Platform,
};

static SCHEME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://").expect("failed to compile url scheme regex")
});

static HOST_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://(?:[^@/?#]*@)?([^/?#:]+)")
        .expect("failed to compile url host regex")
});

/// What the person typed into the listing box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedInput {
    /// A link to a hosting platform or any other site.
    Link {
        /// The link exactly as entered (trimmed).
        url: String,
        /// Platform recognised from the link.
        platform: Platform,
        /// Host component with `www.` removed, when one could be found.
        host: Option<String>,
    },
    /// A free-text label such as "Aunt May's cabin".
    PlainName {
        /// The trimmed text.
        name: String,
    },
}

impl ParsedInput {
    /// Display label for the resulting listing.
    pub fn name(&self) -> String {
        match self {
            ParsedInput::Link { platform, .. } if platform.is_known() => {
                format!("{} stay", platform.label())
            }
            ParsedInput::Link { url, host, .. } => host.clone().unwrap_or_else(|| url.clone()),
            ParsedInput::PlainName { name } => name.clone(),
        }
    }

    /// Platform tag for the resulting listing.
    pub fn platform(&self) -> Platform {
        match self {
            ParsedInput::Link { platform, .. } => *platform,
            ParsedInput::PlainName { .. } => Platform::Unknown,
        }
    }

    /// Link for the resulting listing, empty for free text.
    pub fn url(&self) -> &str {
        match self {
            ParsedInput::Link { url, .. } => url,
            ParsedInput::PlainName { .. } => "",
        }
    }
}

/// Classify raw listing input as a link or a plain name.
///
/// Fails only when the input is blank.
pub fn parse_input(raw: &str) -> Result<ParsedInput> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(StaysError::validation("empty input"));
    }

    if !SCHEME_RE.is_match(trimmed) {
        return Ok(ParsedInput::PlainName {
            name: trimmed.to_string(),
        });
    }

    Ok(ParsedInput::Link {
        url: trimmed.to_string(),
        platform: detect_platform(trimmed),
        host: extract_host(trimmed),
    })
}

/// First platform whose keyword occurs in `url` (case-sensitive).
pub fn detect_platform(url: &str) -> Platform {
    Platform::KEYWORDS
        .iter()
        .find(|(keyword, _)| url.contains(keyword))
        .map(|(_, platform)| *platform)
        .unwrap_or(Platform::Unknown)
}

fn extract_host(url: &str) -> Option<String> {
    let host = HOST_RE.captures(url)?.get(1)?.as_str();
    let host = host.strip_prefix("www.").unwrap_or(host);
    if host.is_empty() {
        None
    } else {
        Some(host.to_string())
    }
}

/// Parse a nightly price, returning `None` for anything that is not a
/// positive finite number. A leading `$` and `,` separators are accepted.
pub fn parse_price(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('$').unwrap_or(trimmed).trim_start();
    let cleaned: String = trimmed.chars().filter(|ch| *ch != ',').collect();
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value > 0.0)
}
