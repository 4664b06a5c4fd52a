//! Inferred attribute values with provenance

use super::event::EventKind;
use eventseries_common::Qid;
use serde::{Deserialize, Serialize};

/// The inferred value of one completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CompletionPayload {
    Ordinal(u32),
    Acronym(String),
    CanonicalTitle(String),
    Kind(EventKind),
}

/// Discriminant of [`CompletionPayload`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PayloadKind {
    Ordinal,
    Acronym,
    CanonicalTitle,
    Kind,
}

impl CompletionPayload {
    pub fn kind(&self) -> PayloadKind {
        match self {
            CompletionPayload::Ordinal(_) => PayloadKind::Ordinal,
            CompletionPayload::Acronym(_) => PayloadKind::Acronym,
            CompletionPayload::CanonicalTitle(_) => PayloadKind::CanonicalTitle,
            CompletionPayload::Kind(_) => PayloadKind::Kind,
        }
    }
}

/// A gap-filling fact about one record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub qid: Qid,
    pub found_by: String,
    pub payload: CompletionPayload,
}

impl Completion {
    pub fn new(qid: Qid, found_by: impl Into<String>, payload: CompletionPayload) -> Self {
        Self {
            qid,
            found_by: found_by.into(),
            payload,
        }
    }

    pub fn kind(&self) -> PayloadKind {
        self.payload.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_json_shape() {
        let completion = Completion::new(
            Qid::parse("Q5").unwrap(),
            "ordinal_parser",
            CompletionPayload::Ordinal(10),
        );
        let value = serde_json::to_value(&completion).unwrap();
        assert_eq!(value["qid"], "Q5");
        assert_eq!(value["payload"]["kind"], "ordinal");
        assert_eq!(value["payload"]["value"], 10);
        assert_eq!(completion.kind(), PayloadKind::Ordinal);
    }
}
