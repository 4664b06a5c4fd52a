//! Event title parsing
//!
//! DBLP headlines look like `"10th ESWC 2013: Montpellier, France"`; the part
//! before the colon is the title, the part after it the location. Suspicious
//! values are logged and still returned.

use chrono::Datelike;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

static VIRTUAL_LOCATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[virtual(?: event)?\]").expect("virtual location pattern is valid"));
static YEAR_AT_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{4}$").expect("year pattern is valid"));
static YEAR_ANYWHERE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{4}").expect("year pattern is valid"));
static LEADING_ORDINAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)(?:rd|nd|th|st|\.)").expect("ordinal pattern is valid"));

/// Largest ordinal that is not reported as suspicious
pub const MAX_PLAUSIBLE_ORDINAL: u32 = 100;

/// Structured view of a full event title
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTitle {
    pub title: String,
    pub year: Option<i32>,
    pub location: Option<String>,
    pub ordinal: Option<u32>,
}

impl ParsedTitle {
    pub fn parse(full_title: &str) -> Self {
        let (title, location) = extract_location(full_title);
        let year = extract_year(&title);
        let ordinal = extract_ordinal(&title);
        Self {
            title,
            year,
            location,
            ordinal,
        }
    }
}

fn extract_virtual_location(full_title: &str) -> Option<(String, Option<String>)> {
    let found = VIRTUAL_LOCATION.find(full_title)?;
    let location = found.as_str();
    let trimmed = full_title.trim_end();
    let title = trimmed.strip_suffix(location).unwrap_or(trimmed).trim_end();
    Some((title.to_string(), Some(location.to_string())))
}

/// Split `"<title>: <location>"`
///
/// Titles without a colon may carry a `[virtual]` marker instead, or use a
/// single semicolon as separator.
pub fn extract_location(full_title: &str) -> (String, Option<String>) {
    if !full_title.contains(':') {
        if let Some(split) = extract_virtual_location(full_title) {
            return split;
        }
        debug!(title = full_title, "Missing ':' in title");
        if full_title.matches(';').count() == 1 {
            return extract_location(&full_title.replace(';', ":"));
        }
    }

    let mut parts = full_title.split(':');
    let title = parts.next().unwrap_or_default().trim_end().to_string();
    let location = parts
        .next()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string);
    (title, location)
}

/// Four-digit year, preferably at the end of the title
pub fn extract_year(title: &str) -> Option<i32> {
    let found = match YEAR_AT_END.find(title) {
        Some(m) => m,
        None => {
            let m = YEAR_ANYWHERE.find(title);
            match m {
                Some(m) => debug!(year = m.as_str(), title, "Year not at end of title"),
                None => debug!(title, "No year in title"),
            }
            m?
        }
    };

    let year: i32 = found.as_str().parse().ok()?;
    let current_year = chrono::Utc::now().year();
    if year <= 1900 || year > current_year {
        warn!(year, title, "Suspicious year in title");
    }
    Some(year)
}

/// Leading numeric ordinal such as `10th`, `3rd` or `1.`
pub fn extract_ordinal(title: &str) -> Option<u32> {
    let captures = LEADING_ORDINAL.captures(title.trim_start())?;
    let ordinal: u32 = captures[1].parse().ok()?;
    if ordinal == 0 || ordinal > MAX_PLAUSIBLE_ORDINAL {
        warn!(ordinal, title, "Suspicious ordinal in title");
    }
    Some(ordinal)
}
