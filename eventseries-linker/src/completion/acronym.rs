//! Acronym completion from parenthesized tokens, e.g. `"... Conference (ISWC)"`

use crate::models::{Completion, CompletionPayload, Titled};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

pub const FOUND_BY: &str = "AcronymParser";

/// Longer parenthesized tokens are not acronyms
pub const MAX_ACRONYM_LEN: usize = 20;
/// Longer acronyms are kept but reported
pub const SUSPICIOUS_ACRONYM_LEN: usize = 12;

static PARENTHESIZED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(([^()]+)\)").expect("acronym pattern is valid"));

/// Last parenthesized token of `text`, if it looks like an acronym
pub fn extract_acronym(text: &str) -> Option<String> {
    let captures = PARENTHESIZED.captures_iter(text).last()?;
    let candidate = captures[1].trim();

    if candidate.is_empty() || !candidate.chars().any(char::is_alphabetic) {
        return None;
    }
    let len = candidate.chars().count();
    if len > MAX_ACRONYM_LEN {
        debug!(candidate, "Parenthesized token too long for an acronym");
        return None;
    }
    if len > SUSPICIOUS_ACRONYM_LEN {
        warn!(acronym = candidate, text, "Suspiciously long acronym");
    }
    Some(candidate.to_string())
}

/// Acronym of a record from its label and title; the label wins on conflict
pub fn acronym_of<T: Titled>(record: &T) -> Option<String> {
    let from_label = extract_acronym(record.label());
    let from_title = record.title().and_then(extract_acronym);

    match (from_label, from_title) {
        (Some(label), Some(title)) if label != title => {
            warn!(
                qid = %record.qid(),
                label_acronym = %label,
                title_acronym = %title,
                "Label and title disagree on acronym, using the label's"
            );
            Some(label)
        }
        (Some(label), _) => Some(label),
        (None, title) => title,
    }
}

/// Acronym completion for a record without an acronym
pub fn complete_acronym<T: Titled>(record: &T, current: Option<&str>) -> Option<Completion> {
    if current.is_some() {
        return None;
    }
    let acronym = acronym_of(record)?;
    Some(Completion::new(
        record.qid().clone(),
        FOUND_BY,
        CompletionPayload::Acronym(acronym),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Event, EventSeries};
    use eventseries_common::Qid;

    #[test]
    fn test_extract_acronym() {
        assert_eq!(
            extract_acronym("International Semantic Web Conference (ISWC)").as_deref(),
            Some("ISWC")
        );
        assert_eq!(extract_acronym("International Semantic Web Conference"), None);
        assert_eq!(extract_acronym("Proceedings (2009)"), None);
        assert_eq!(
            extract_acronym("Workshop (held in conjunction with a very long conference name)"),
            None
        );
        assert_eq!(
            extract_acronym("Workshop (Part 1) on Things (WoT)").as_deref(),
            Some("WoT")
        );
    }

    #[test]
    fn test_label_preferred_on_conflict() {
        let event = Event::new(Qid::parse("Q1").unwrap(), "Semantic Web Conference (SWC)")
            .with_title("International Semantic Web Conference (ISWC)");
        assert_eq!(acronym_of(&event).as_deref(), Some("SWC"));
    }

    #[test]
    fn test_title_used_when_label_has_none() {
        let series = EventSeries::new(Qid::parse("Q2").unwrap(), "ISWC")
            .with_title("International Semantic Web Conference (ISWC)");
        let completion = complete_acronym(&series, None).unwrap();
        assert_eq!(completion.payload, CompletionPayload::Acronym("ISWC".into()));
        assert!(complete_acronym(&series, Some("ISWC")).is_none());
    }
}
