//! Repository facade over the record store and the completion cache
//!
//! Raw records never change; "patched" views apply the cached completions on
//! top of a clone. All writes go to the cache, which reaches the backend only
//! on [`Repository::close`].

use crate::error::LinkResult;
use crate::models::{Completion, Event, EventSeries, Match, Patchable, Proceeding, Titled, TrainingPair};
use crate::sources::DblpSource;
use crate::store::{CacheBackend, CompletionCache, RecordStore};
use eventseries_common::Qid;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

pub struct Repository {
    store: RecordStore,
    cache: CompletionCache,
    backend: Box<dyn CacheBackend>,
    dblp: Option<Arc<dyn DblpSource>>,
}

impl Repository {
    pub fn new(store: RecordStore, cache: CompletionCache, backend: Box<dyn CacheBackend>) -> Self {
        Self {
            store,
            cache,
            backend,
            dblp: None,
        }
    }

    /// Build a repository whose cache is loaded from `backend`
    pub async fn open(store: RecordStore, backend: Box<dyn CacheBackend>) -> LinkResult<Self> {
        let cache = CompletionCache::load(backend.as_ref()).await?;
        Ok(Self::new(store, cache, backend))
    }

    pub fn with_dblp(mut self, dblp: Arc<dyn DblpSource>) -> Self {
        self.dblp = Some(dblp);
        self
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn cache(&self) -> &CompletionCache {
        &self.cache
    }

    pub fn dblp(&self) -> Option<Arc<dyn DblpSource>> {
        self.dblp.clone()
    }

    fn patch<T: Patchable + Clone>(&self, record: &T, patched: bool) -> T {
        let mut record = record.clone();
        if patched {
            self.cache.apply(&mut record);
        }
        record
    }

    pub fn get_event_by_qid(&self, qid: &Qid, patched: bool) -> LinkResult<Event> {
        Ok(self.patch(self.store.event(qid)?, patched))
    }

    pub fn get_series_by_qid(&self, qid: &Qid, patched: bool) -> LinkResult<EventSeries> {
        Ok(self.patch(self.store.series(qid)?, patched))
    }

    pub fn get_proceeding_by_qid(&self, qid: &Qid, patched: bool) -> LinkResult<Proceeding> {
        Ok(self.patch(self.store.proceeding(qid)?, patched))
    }

    pub fn patched_events(&self) -> Vec<Event> {
        self.store.events().iter().map(|e| self.patch(e, true)).collect()
    }

    pub fn patched_series(&self) -> Vec<EventSeries> {
        self.store.all_series().iter().map(|s| self.patch(s, true)).collect()
    }

    /// Patched events without a series
    ///
    /// Unless `ignore_match_completions` is set, events already linked by an
    /// accepted match are left out too.
    pub fn events_without_series(&self, ignore_match_completions: bool) -> Vec<Event> {
        let matched: HashSet<&Qid> = if ignore_match_completions {
            HashSet::new()
        } else {
            self.cache.matches().iter().map(|m| &m.event).collect()
        };

        self.store
            .events()
            .iter()
            .filter(|e| e.part_of_series.is_none() && !matched.contains(&e.qid))
            .map(|e| self.patch(e, true))
            .collect()
    }

    pub fn get_matches(&self) -> &[Match] {
        self.cache.matches()
    }

    /// Returns how many completions were new
    pub fn add_completions(&mut self, completions: impl IntoIterator<Item = Completion>) -> usize {
        let added = self.cache.add_completions(completions);
        debug!(added, "Added completions");
        added
    }

    /// Returns how many matches were new; known (event, series) links are skipped
    pub fn add_matches(&mut self, matches: impl IntoIterator<Item = Match>) -> usize {
        let added = matches
            .into_iter()
            .filter(|m| self.cache.add_match(m.clone()))
            .count();
        debug!(added, "Added matches");
        added
    }

    /// Title pairs of events already linked to a series present in the store
    pub fn training_pairs(&self) -> Vec<TrainingPair> {
        self.store
            .events()
            .iter()
            .filter_map(|event| {
                let series = self.store.all_series().get(event.part_of_series.as_ref()?)?;
                Some(TrainingPair::new(
                    event.title_else_label(),
                    series.title_else_label(),
                ))
            })
            .collect()
    }

    /// Flush the cache to the backend
    pub async fn close(&self) -> LinkResult<()> {
        self.cache.store(self.backend.as_ref()).await?;
        info!("Repository closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LinkError;
    use crate::models::CompletionPayload;
    use crate::store::FileBackend;
    use tempfile::TempDir;

    fn qid(s: &str) -> Qid {
        Qid::parse(s).unwrap()
    }

    fn store() -> RecordStore {
        let events = vec![
            Event::new(qid("Q1"), "ISWC 2003").with_series(qid("Q10")),
            Event::new(qid("Q2"), "ESWC 2013"),
            Event::new(qid("Q3"), "KI 2019").with_series(qid("Q99")),
        ];
        let series = vec![EventSeries::new(qid("Q10"), "ISWC")
            .with_title("International Semantic Web Conference")];
        RecordStore::new(events, series, vec![])
    }

    fn repository(dir: &TempDir) -> Repository {
        Repository::new(
            store(),
            CompletionCache::new(),
            Box::new(FileBackend::new(dir.path())),
        )
    }

    #[test]
    fn test_patched_and_raw() {
        let dir = TempDir::new().unwrap();
        let mut repo = repository(&dir);
        repo.add_completions([Completion::new(
            qid("Q2"),
            "test",
            CompletionPayload::Acronym("ESWC".to_string()),
        )]);

        assert_eq!(repo.get_event_by_qid(&qid("Q2"), false).unwrap().acronym, None);
        assert_eq!(
            repo.get_event_by_qid(&qid("Q2"), true).unwrap().acronym.as_deref(),
            Some("ESWC")
        );
    }

    #[test]
    fn test_unknown_qid() {
        let dir = TempDir::new().unwrap();
        let repo = repository(&dir);
        assert!(matches!(
            repo.get_series_by_qid(&qid("Q404"), true),
            Err(LinkError::NotFound(_))
        ));
    }

    #[test]
    fn test_events_without_series() {
        let dir = TempDir::new().unwrap();
        let mut repo = repository(&dir);
        assert_eq!(repo.events_without_series(false).len(), 1);

        repo.add_matches([Match::new(qid("Q2"), qid("Q10"), "A+B+C")]);
        assert!(repo.events_without_series(false).is_empty());
        assert_eq!(repo.events_without_series(true).len(), 1);
    }

    #[test]
    fn test_add_matches_skips_known_links() {
        let dir = TempDir::new().unwrap();
        let mut repo = repository(&dir);
        let added = repo.add_matches([
            Match::new(qid("Q2"), qid("Q10"), "A+B+C"),
            Match::new(qid("Q2"), qid("Q10"), "D+E+F"),
        ]);
        assert_eq!(added, 1);
        assert_eq!(repo.get_matches().len(), 1);
    }

    #[test]
    fn test_training_pairs_need_known_series() {
        let dir = TempDir::new().unwrap();
        let repo = repository(&dir);
        assert_eq!(
            repo.training_pairs(),
            vec![TrainingPair::new("ISWC 2003", "International Semantic Web Conference")]
        );
    }

    #[tokio::test]
    async fn test_close_then_open_restores_cache() {
        let dir = TempDir::new().unwrap();
        let mut repo = repository(&dir);
        repo.add_matches([Match::new(qid("Q2"), qid("Q10"), "A+B+C")]);
        repo.close().await.unwrap();

        let reopened = Repository::open(store(), Box::new(FileBackend::new(dir.path())))
            .await
            .unwrap();
        assert_eq!(reopened.get_matches(), repo.get_matches());
    }
}
