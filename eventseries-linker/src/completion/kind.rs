//! Event kind completion from title keywords

use crate::models::{Completion, CompletionPayload, EventKind, Titled};

pub const FOUND_BY: &str = "KindFromTitle";

/// Kind implied by the words of a title; "workshop" takes precedence
pub fn kind_from_text(text: &str) -> EventKind {
    let lower = text.to_lowercase();
    if lower.contains("workshop") {
        EventKind::Workshop
    } else if lower.contains("conference") {
        EventKind::Conference
    } else {
        EventKind::Unknown
    }
}

/// Kind completion for a record whose kind is still unknown
pub fn complete_kind<T: Titled>(record: &T, current: EventKind) -> Option<Completion> {
    if current != EventKind::Unknown {
        return None;
    }
    let kind = match kind_from_text(record.title_else_label()) {
        EventKind::Unknown if record.title().is_some() => kind_from_text(record.label()),
        kind => kind,
    };
    if kind == EventKind::Unknown {
        return None;
    }
    Some(Completion::new(
        record.qid().clone(),
        FOUND_BY,
        CompletionPayload::Kind(kind),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Event;
    use eventseries_common::Qid;

    #[test]
    fn test_kind_from_text() {
        assert_eq!(
            kind_from_text("Joint Workshop at the Conference on AI"),
            EventKind::Workshop
        );
        assert_eq!(kind_from_text("ACM SIGKDD Conference"), EventKind::Conference);
        assert_eq!(kind_from_text("ISWC 2003"), EventKind::Unknown);
    }

    #[test]
    fn test_falls_back_to_label() {
        let event = Event::new(Qid::parse("Q1").unwrap(), "Workshop on Patterns 2009")
            .with_title("WOP 2009");
        let completion = complete_kind(&event, event.kind).unwrap();
        assert_eq!(completion.payload, CompletionPayload::Kind(EventKind::Workshop));
    }

    #[test]
    fn test_known_kind_untouched() {
        let mut event = Event::new(Qid::parse("Q1").unwrap(), "Workshop on Patterns");
        event.kind = EventKind::Conference;
        assert!(complete_kind(&event, event.kind).is_none());
    }
}
