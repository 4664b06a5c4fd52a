//! Voting over strategy proposals
//!
//! A link is accepted when enough distinct strategies propose it. There is no
//! weighting between strategies.

use super::cascade::StrategyProposals;
use crate::models::{Match, SeriesRef};
use eventseries_common::Qid;
use std::collections::HashMap;
use tracing::{debug, info};

pub const DEFAULT_REQUIRED_TO_PASS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossValidator {
    required_to_pass: usize,
}

impl Default for CrossValidator {
    fn default() -> Self {
        Self::new(DEFAULT_REQUIRED_TO_PASS)
    }
}

impl CrossValidator {
    pub fn new(required_to_pass: usize) -> Self {
        Self { required_to_pass }
    }

    pub fn required_to_pass(&self) -> usize {
        self.required_to_pass
    }

    /// Accepted links, in the order their (event, series) pair first appears
    ///
    /// `found_by` of an accepted link lists the distinct agreeing strategies
    /// joined by `+`. A `found_by` that already is such a list counts each
    /// of its names.
    pub fn merge(&self, proposals: &[StrategyProposals]) -> Vec<Match> {
        let mut order: Vec<(Qid, SeriesRef)> = Vec::new();
        let mut voters: HashMap<(Qid, SeriesRef), Vec<String>> = HashMap::new();

        for proposal in proposals {
            for m in &proposal.matches {
                let key = (m.event.clone(), m.series.clone());
                let names = voters.entry(key.clone()).or_insert_with(|| {
                    order.push(key);
                    Vec::new()
                });
                for name in m.found_by.split('+').filter(|n| !n.is_empty()) {
                    if !names.iter().any(|n| n == name) {
                        names.push(name.to_string());
                    }
                }
            }
        }

        let candidates = order.len();
        let accepted: Vec<Match> = order
            .into_iter()
            .filter_map(|key| {
                let names = voters.remove(&key)?;
                if names.len() < self.required_to_pass {
                    debug!(
                        event = %key.0,
                        series = %key.1,
                        votes = names.len(),
                        "Rejected link"
                    );
                    return None;
                }
                let (event, series) = key;
                Some(Match {
                    event,
                    series,
                    found_by: names.join("+"),
                })
            })
            .collect();

        info!(
            candidates,
            accepted = accepted.len(),
            required = self.required_to_pass,
            "Cross-validated proposals"
        );
        accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qid(s: &str) -> Qid {
        Qid::parse(s).unwrap()
    }

    fn proposals(name: &str, links: &[(&str, &str)]) -> StrategyProposals {
        StrategyProposals {
            name: name.to_string(),
            matches: links
                .iter()
                .map(|(e, s)| Match::new(qid(e), qid(s), name))
                .collect(),
        }
    }

    #[test]
    fn test_three_votes_pass() {
        let all = vec![
            proposals("A", &[("Q1", "Q2")]),
            proposals("B", &[("Q1", "Q2")]),
            proposals("C", &[("Q1", "Q2")]),
            proposals("D", &[("Q1", "Q3")]),
        ];
        let merged = CrossValidator::new(3).merge(&all);
        assert_eq!(merged, vec![Match::new(qid("Q1"), qid("Q2"), "A+B+C")]);
    }

    #[test]
    fn test_same_strategy_counts_once() {
        let all = vec![
            proposals("A", &[("Q1", "Q2"), ("Q1", "Q2")]),
            proposals("B", &[("Q1", "Q2")]),
        ];
        assert!(CrossValidator::new(3).merge(&all).is_empty());
        assert_eq!(CrossValidator::new(2).merge(&all).len(), 1);
    }

    #[test]
    fn test_joined_names_count_individually() {
        let all = vec![
            proposals("A+B", &[("Q1", "Q2")]),
            proposals("C", &[("Q1", "Q2")]),
        ];
        let merged = CrossValidator::default().merge(&all);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].found_by, "A+B+C");
    }

    #[test]
    fn test_first_seen_order() {
        let all = vec![
            proposals("A", &[("Q5", "Q6"), ("Q1", "Q2")]),
            proposals("B", &[("Q1", "Q2"), ("Q5", "Q6")]),
        ];
        let merged = CrossValidator::new(2).merge(&all);
        let events: Vec<&str> = merged.iter().map(|m| m.event.as_str()).collect();
        assert_eq!(events, vec!["Q5", "Q1"]);
    }

    #[test]
    fn test_name_refs_vote_separately() {
        let all = vec![
            StrategyProposals {
                name: "A".to_string(),
                matches: vec![Match::by_name(qid("Q1"), "ESWC", "A")],
            },
            proposals("B", &[("Q1", "Q2")]),
        ];
        assert!(CrossValidator::new(2).merge(&all).is_empty());
    }
}
