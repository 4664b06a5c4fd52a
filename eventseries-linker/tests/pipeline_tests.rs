//! End-to-end runs of the pipeline over small in-memory stores

use eventseries_common::config::{MatchingConfig, TomlConfig};
use eventseries_common::Qid;
use eventseries_linker::completion::AttributeCompletionEngine;
use eventseries_linker::matching::{CrossValidator, Evaluation, Matcher, MatcherCascade};
use eventseries_linker::models::{
    Event, EventKind, EventSeries, Match, Proceeding, SeriesRef, TrainingPair,
};
use eventseries_linker::sources::dblp::DblpParent;
use eventseries_linker::sources::{DblpEventSeries, InMemoryDblp, QueryResultSource};
use eventseries_linker::store::{CompletionCache, FileBackend, RecordStore};
use eventseries_linker::{Pipeline, Repository};
use std::sync::Arc;
use tempfile::TempDir;

fn qid(s: &str) -> Qid {
    Qid::parse(s).unwrap()
}

/// Strategy that always proposes the same links
struct FixedMatcher {
    name: &'static str,
    links: Vec<(&'static str, &'static str)>,
}

impl FixedMatcher {
    fn boxed(name: &'static str, links: &[(&'static str, &'static str)]) -> Box<dyn Matcher> {
        Box::new(Self {
            name,
            links: links.to_vec(),
        })
    }
}

impl Matcher for FixedMatcher {
    fn name(&self) -> &str {
        self.name
    }

    fn fit(&mut self, _pairs: &[TrainingPair]) -> Evaluation {
        Evaluation::default()
    }

    fn evaluation(&self) -> Option<&Evaluation> {
        None
    }

    fn propose(&self, _events: &[Event], _series: &[EventSeries]) -> Vec<Match> {
        self.links
            .iter()
            .map(|(event, series)| Match::new(qid(event), qid(series), self.name))
            .collect()
    }
}

fn voting_cascade() -> MatcherCascade {
    MatcherCascade::new(vec![
        FixedMatcher::boxed("A", &[("Q1", "Q2")]),
        FixedMatcher::boxed("B", &[("Q1", "Q2")]),
        FixedMatcher::boxed("C", &[("Q1", "Q2")]),
        FixedMatcher::boxed("D", &[("Q1", "Q3")]),
    ])
}

fn store() -> RecordStore {
    RecordStore::new(
        vec![
            Event::new(qid("Q1"), "3rd Workshop on Ontology Patterns"),
            Event::new(qid("Q4"), "WOP 2009").with_series(qid("Q2")),
        ],
        vec![
            EventSeries::new(qid("Q2"), "Workshop on Ontology Patterns (WOP)"),
            EventSeries::new(qid("Q3"), "Semantic Web Conference"),
        ],
        vec![],
    )
}

fn repository(dir: &TempDir) -> Repository {
    Repository::new(
        store(),
        CompletionCache::new(),
        Box::new(FileBackend::new(dir.path())),
    )
}

#[test]
fn test_three_of_four_strategies_agree() {
    let cascade = voting_cascade();
    let events = vec![Event::new(qid("Q1"), "Event")];
    let proposals = cascade.propose_all(&events, &[]);

    let merged = CrossValidator::new(3).merge(&proposals);
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].event, qid("Q1"));
    assert_eq!(merged[0].series, SeriesRef::Series(qid("Q2")));
    assert_eq!(merged[0].found_by, "A+B+C");
}

#[tokio::test]
async fn test_run_writes_back_accepted_matches() {
    let dir = TempDir::new().unwrap();
    let mut repo = repository(&dir);
    let mut pipeline = Pipeline::new(
        AttributeCompletionEngine::offline(),
        voting_cascade(),
        CrossValidator::new(3),
    );

    let report = pipeline.run_and_close(&mut repo).await.unwrap();
    assert_eq!(report.training_pairs, 1);
    assert_eq!(report.events_considered, 1);
    assert_eq!(report.proposals.len(), 4);
    assert_eq!(report.accepted_matches, 1);
    assert_eq!(report.new_matches, 1);
    assert!(report.completion.ordinals >= 1);

    let patched = repo.get_event_by_qid(&qid("Q1"), true).unwrap();
    assert_eq!(patched.ordinal, Some(3));
    assert_eq!(patched.kind, EventKind::Workshop);

    let reopened = Repository::open(store(), Box::new(FileBackend::new(dir.path())))
        .await
        .unwrap();
    assert_eq!(reopened.get_matches(), repo.get_matches());
    assert_eq!(reopened.cache(), repo.cache());
}

#[tokio::test]
async fn test_run_reports_annual_series() {
    let dir = TempDir::new().unwrap();
    let mut proceeding = Proceeding::new(qid("Q100"), "Proceedings of the Annual WOP 2009");
    proceeding.event = Some(qid("Q4"));
    let base = store();
    let store = RecordStore::new(
        base.events().iter().cloned(),
        base.all_series().iter().cloned(),
        vec![proceeding],
    );
    let mut repo = Repository::new(
        store,
        CompletionCache::new(),
        Box::new(FileBackend::new(dir.path())),
    );
    let mut pipeline = Pipeline::new(
        AttributeCompletionEngine::offline(),
        voting_cascade(),
        CrossValidator::new(3),
    );

    let report = pipeline.run_and_close(&mut repo).await.unwrap();
    assert_eq!(report.annual_proceedings, 1);
    assert_eq!(report.annual_series, 1);
}

#[tokio::test]
async fn test_second_run_adds_nothing() {
    let dir = TempDir::new().unwrap();
    let mut repo = repository(&dir);
    let mut pipeline = Pipeline::new(
        AttributeCompletionEngine::offline(),
        voting_cascade(),
        CrossValidator::new(3),
    );

    pipeline.run_and_close(&mut repo).await.unwrap();
    let completions = repo.cache().completion_count();

    let second = pipeline.run_and_close(&mut repo).await.unwrap();
    assert_eq!(second.completion.total(), 0);
    assert_eq!(second.accepted_matches, 1);
    assert_eq!(second.new_matches, 0);
    assert_eq!(repo.cache().completion_count(), completions);
    assert_eq!(repo.get_matches().len(), 1);
}

#[tokio::test]
async fn test_dblp_proposals_join_the_vote() {
    let dir = TempDir::new().unwrap();
    let mut dblp = InMemoryDblp::new();
    dblp.add_series(DblpEventSeries {
        dblp_id: "conf/wop".to_string(),
        name: "Workshop on Ontology Patterns".to_string(),
        abbreviation: Some("WOP".to_string()),
        venue_information: None,
    })
    .add_parent(
        "conf/wop/2012",
        DblpParent {
            dblp_id: "conf/wop".to_string(),
            name: "WOP".to_string(),
        },
    );

    let mut event = Event::new(qid("Q1"), "3rd Workshop on Ontology Patterns");
    event.dblp_id = Some("conf/wop/2012".to_string());
    let store = RecordStore::new(
        vec![event],
        vec![EventSeries::new(qid("Q2"), "Workshop on Ontology Patterns (WOP)")],
        vec![],
    );
    let mut repo = Repository::new(
        store,
        CompletionCache::new(),
        Box::new(FileBackend::new(dir.path())),
    )
    .with_dblp(Arc::new(dblp));

    // Two fixed votes plus the DBLP matcher reach the threshold of three
    let cascade = MatcherCascade::new(vec![
        FixedMatcher::boxed("A", &[("Q1", "Q2")]),
        FixedMatcher::boxed("B", &[("Q1", "Q2")]),
    ]);
    let mut pipeline = Pipeline::new(AttributeCompletionEngine::offline(), cascade, CrossValidator::new(3));

    let report = pipeline.run_and_close(&mut repo).await.unwrap();
    assert_eq!(report.proposals.last().map(|(name, n)| (name.as_str(), *n)), Some(("DblpMatcher", 1)));
    assert_eq!(report.accepted_matches, 1);
    assert_eq!(
        repo.get_matches()[0].found_by,
        "A+B+DblpMatcher::workshop_parent"
    );
}

#[tokio::test]
async fn test_configured_pipeline_over_query_results() {
    let dir = TempDir::new().unwrap();
    let query_dir = dir.path().join("queries");
    std::fs::create_dir_all(&query_dir).unwrap();
    std::fs::write(
        query_dir.join("wikidata_all_ceurws_events.json"),
        r#"[
            {"event": "http://www.wikidata.org/entity/Q1", "eventLabel": "ESWC 2013",
             "title": "Extended Semantic Web Conference 2013", "type": "academic conference"},
            {"event": "http://www.wikidata.org/entity/Q2", "eventLabel": "ISWC 2003",
             "title": "International Semantic Web Conference 2003",
             "series": "http://www.wikidata.org/entity/Q20"},
            {"eventLabel": "row without identity"}
        ]"#,
    )
    .unwrap();
    std::fs::write(
        query_dir.join("wikidata_all_ceurws_event_series.json"),
        r#"[
            {"series": "http://www.wikidata.org/entity/Q10", "seriesLabel": "ESWC",
             "title": "Extended Semantic Web Conference"},
            {"series": "http://www.wikidata.org/entity/Q20", "seriesLabel": "ISWC",
             "title": "International Semantic Web Conference"}
        ]"#,
    )
    .unwrap();

    let store = QueryResultSource::new(&query_dir).load_store().unwrap();
    assert_eq!(store.events().len(), 2);

    let mut repo = Repository::new(
        store,
        CompletionCache::new(),
        Box::new(FileBackend::new(dir.path().join("cache"))),
    );
    let config = TomlConfig {
        matching: MatchingConfig {
            required_to_pass: 3,
            training_epochs: 0,
            vector_dimensions: 8,
            ..Default::default()
        },
        ..Default::default()
    };
    let mut pipeline = Pipeline::from_config(&config, true).unwrap();

    let report = pipeline.run_and_close(&mut repo).await.unwrap();
    assert_eq!(report.evaluations.len(), 8);
    assert_eq!(report.events_considered, 1);
    // Every accepted link points the ESWC event at the ESWC series
    for m in repo.get_matches() {
        assert_eq!(m.event, qid("Q1"));
        assert_eq!(m.series, SeriesRef::Series(qid("Q10")));
        assert!(m.found_by.split('+').count() >= 3);
    }
    assert!(dir.path().join("cache").join("matches.json").exists());
}
