//! Ordinal completion
//!
//! Numeric ordinals (`10th`, `3rd`, `1.`) and English ordinal words
//! (`First`, `Twenty-First`, ...) at the start of an event title.

use crate::models::{Completion, CompletionPayload, Event, Titled};
use crate::parsing::extract_ordinal;
use tracing::debug;

pub const FOUND_BY: &str = "OrdinalParser";

const UNIT_ORDINALS: [(&str, u32); 9] = [
    ("first", 1),
    ("second", 2),
    ("third", 3),
    ("fourth", 4),
    ("fifth", 5),
    ("sixth", 6),
    ("seventh", 7),
    ("eighth", 8),
    ("ninth", 9),
];

const TEEN_ORDINALS: [(&str, u32); 10] = [
    ("tenth", 10),
    ("eleventh", 11),
    ("twelfth", 12),
    ("thirteenth", 13),
    ("fourteenth", 14),
    ("fifteenth", 15),
    ("sixteenth", 16),
    ("seventeenth", 17),
    ("eighteenth", 18),
    ("nineteenth", 19),
];

/// (cardinal prefix, ordinal form, value)
const TENS: [(&str, &str, u32); 8] = [
    ("twenty", "twentieth", 20),
    ("thirty", "thirtieth", 30),
    ("forty", "fortieth", 40),
    ("fifty", "fiftieth", 50),
    ("sixty", "sixtieth", 60),
    ("seventy", "seventieth", 70),
    ("eighty", "eightieth", 80),
    ("ninety", "ninetieth", 90),
];

fn lookup(table: &[(&str, u32)], word: &str) -> Option<u32> {
    table.iter().find(|(w, _)| *w == word).map(|(_, n)| *n)
}

fn ordinal_word_value(word: &str) -> Option<u32> {
    if word == "hundredth" {
        return Some(100);
    }
    if let Some(n) = lookup(&UNIT_ORDINALS, word).or_else(|| lookup(&TEEN_ORDINALS, word)) {
        return Some(n);
    }
    if let Some((_, _, n)) = TENS.iter().find(|(_, ordinal, _)| *ordinal == word) {
        return Some(*n);
    }

    // "twenty-first", "thirty second"
    let (tens, unit) = word.split_once(['-', ' '])?;
    let (_, _, tens_value) = TENS.iter().find(|(cardinal, _, _)| *cardinal == tens)?;
    Some(tens_value + lookup(&UNIT_ORDINALS, unit)?)
}

/// Ordinal encoded as leading English word(s)
pub fn parse_ordinal_word(title: &str) -> Option<u32> {
    let mut words = title
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric() && c != '-').to_lowercase());
    let first = words.next()?;

    if let Some(n) = ordinal_word_value(&first) {
        return Some(n);
    }
    // Two-word form without hyphen
    let second = words.next()?;
    ordinal_word_value(&format!("{} {}", first, second))
}

/// Leading ordinal of a title, numeric or spelled out
pub fn parse_ordinal(title: &str) -> Option<u32> {
    extract_ordinal(title).or_else(|| parse_ordinal_word(title))
}

/// Ordinal completion for an event that has none yet
pub fn complete_ordinal(event: &Event) -> Option<Completion> {
    if event.ordinal.is_some() {
        return None;
    }
    let text = event.title_else_label();
    let ordinal = parse_ordinal(text)?;
    debug!(qid = %event.qid, ordinal, "Parsed ordinal");
    Some(Completion::new(
        event.qid.clone(),
        FOUND_BY,
        CompletionPayload::Ordinal(ordinal),
    ))
}
