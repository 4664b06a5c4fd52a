//! Completion engine: local parsing first, then external title lookups

use super::title_sources::{CeurSptClient, CeurWsScraper, VolumeTitleSource};
use super::{acronym, kind, ordinal};
use crate::error::LinkResult;
use crate::models::{Completion, CompletionPayload, PayloadKind, Proceeding};
use crate::repository::Repository;
use crate::store::{CompletionCache, RecordStore};
use eventseries_common::config::CompletionConfig;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub const TITLE_FOUND_BY: &str = "VolumeTitleLookup";

/// Counts of one completion run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionReport {
    pub ordinals: usize,
    pub acronyms: usize,
    pub kinds: usize,
    pub canonical_titles: usize,
    /// Individual source requests that failed (timeout, non-success status, unreadable body)
    pub failed_lookups: usize,
}

impl CompletionReport {
    fn count(&mut self, completions: &[Completion]) {
        for completion in completions {
            match completion.kind() {
                PayloadKind::Ordinal => self.ordinals += 1,
                PayloadKind::Acronym => self.acronyms += 1,
                PayloadKind::Kind => self.kinds += 1,
                PayloadKind::CanonicalTitle => self.canonical_titles += 1,
            }
        }
    }

    pub fn total(&self) -> usize {
        self.ordinals + self.acronyms + self.kinds + self.canonical_titles
    }
}

/// Result of a batch of volume title lookups
#[derive(Debug, Default)]
pub struct TitleLookupOutcome {
    pub completions: Vec<Completion>,
    pub failed_lookups: usize,
}

pub struct AttributeCompletionEngine {
    title_sources: Vec<Arc<dyn VolumeTitleSource>>,
    max_concurrent_lookups: usize,
}

impl AttributeCompletionEngine {
    /// Engine consulting `title_sources` in the given order
    pub fn new(title_sources: Vec<Arc<dyn VolumeTitleSource>>, max_concurrent_lookups: usize) -> Self {
        Self {
            title_sources,
            max_concurrent_lookups: max_concurrent_lookups.max(1),
        }
    }

    /// Engine with the CEUR-WS metadata service and page scraper
    pub fn from_config(config: &CompletionConfig) -> LinkResult<Self> {
        let sources: Vec<Arc<dyn VolumeTitleSource>> = vec![
            Arc::new(CeurSptClient::new(config)?),
            Arc::new(CeurWsScraper::new(config)?),
        ];
        Ok(Self::new(sources, config.max_concurrent_lookups))
    }

    /// Engine that only parses local text
    pub fn offline() -> Self {
        Self::new(Vec::new(), 1)
    }

    /// Ordinal, acronym and kind completions derivable from titles and labels
    pub fn complete_local(&self, store: &RecordStore, cache: &CompletionCache) -> Vec<Completion> {
        let mut completions = Vec::new();

        for event in store.events().iter() {
            if !cache.has_completion(&event.qid, PayloadKind::Ordinal) {
                completions.extend(ordinal::complete_ordinal(event));
            }
            if !cache.has_completion(&event.qid, PayloadKind::Acronym) {
                completions.extend(acronym::complete_acronym(event, event.acronym.as_deref()));
            }
            if !cache.has_completion(&event.qid, PayloadKind::Kind) {
                completions.extend(kind::complete_kind(event, event.kind));
            }
        }

        for series in store.all_series().iter() {
            if !cache.has_completion(&series.qid, PayloadKind::Acronym) {
                completions.extend(acronym::complete_acronym(series, series.acronym.as_deref()));
            }
            if !cache.has_completion(&series.qid, PayloadKind::Kind) {
                completions.extend(kind::complete_kind(series, series.kind));
            }
        }

        for proceeding in store.proceedings().iter() {
            if !cache.has_completion(&proceeding.qid, PayloadKind::Acronym) {
                completions.extend(acronym::complete_acronym(
                    proceeding,
                    proceeding.acronym.as_deref(),
                ));
            }
        }

        debug!(count = completions.len(), "Derived local completions");
        completions
    }

    /// Ask each source in order; the first non-empty title wins
    async fn lookup_title(&self, volume_number: u32) -> (Option<String>, usize) {
        let mut failures = 0;
        for source in &self.title_sources {
            match source.volume_title(volume_number).await {
                Ok(Some(title)) => return (Some(title), failures),
                Ok(None) => {
                    debug!(source = source.name(), volume_number, "No title from source");
                }
                Err(e) if e.is_recoverable() => {
                    failures += 1;
                    warn!(source = source.name(), volume_number, error = %e, "Title lookup failed");
                }
                Err(e) => {
                    failures += 1;
                    error!(source = source.name(), volume_number, error = %e, "Title source error");
                }
            }
        }
        (None, failures)
    }

    /// Canonical-title completions for proceedings that lack one
    ///
    /// Lookups run concurrently up to the configured limit. A failing target
    /// yields no completion and does not affect the others. Results come back
    /// in the order of `proceedings`.
    pub async fn complete_titles(
        &self,
        proceedings: &[Proceeding],
        cache: &CompletionCache,
    ) -> TitleLookupOutcome {
        if self.title_sources.is_empty() {
            return TitleLookupOutcome::default();
        }

        let targets: Vec<(usize, &Proceeding, u32)> = proceedings
            .iter()
            .filter(|p| {
                p.canonical_title.is_none()
                    && !cache.has_completion(&p.qid, PayloadKind::CanonicalTitle)
            })
            .filter_map(|p| match p.volume_number {
                Some(volume) => Some((p, volume)),
                None => {
                    debug!(qid = %p.qid, "Proceeding without volume number");
                    None
                }
            })
            .enumerate()
            .map(|(index, (p, volume))| (index, p, volume))
            .collect();

        info!(
            targets = targets.len(),
            max_concurrent = self.max_concurrent_lookups,
            "Looking up volume titles"
        );

        let mut results: Vec<(usize, Option<Completion>, usize)> = stream::iter(targets)
            .map(|(index, proceeding, volume)| async move {
                let (title, failures) = self.lookup_title(volume).await;
                let completion = title.map(|title| {
                    Completion::new(
                        proceeding.qid.clone(),
                        TITLE_FOUND_BY,
                        CompletionPayload::CanonicalTitle(title),
                    )
                });
                (index, completion, failures)
            })
            .buffer_unordered(self.max_concurrent_lookups)
            .collect()
            .await;

        results.sort_by_key(|(index, _, _)| *index);

        let failed_lookups = results.iter().map(|(_, _, failures)| failures).sum();
        let completions = results.into_iter().filter_map(|(_, c, _)| c).collect();
        TitleLookupOutcome {
            completions,
            failed_lookups,
        }
    }

    /// Run local completion, then title lookups, writing each phase into the
    /// repository once it has settled
    pub async fn run(&self, repo: &mut Repository) -> CompletionReport {
        let mut report = CompletionReport::default();

        let local = self.complete_local(repo.store(), repo.cache());
        report.count(&local);
        repo.add_completions(local);

        let proceedings: Vec<Proceeding> = repo.store().proceedings().iter().cloned().collect();
        let outcome = self.complete_titles(&proceedings, repo.cache()).await;
        report.count(&outcome.completions);
        report.failed_lookups = outcome.failed_lookups;
        repo.add_completions(outcome.completions);

        info!(
            ordinals = report.ordinals,
            acronyms = report.acronyms,
            kinds = report.kinds,
            canonical_titles = report.canonical_titles,
            failed_lookups = report.failed_lookups,
            "Completion finished"
        );
        report
    }
}
