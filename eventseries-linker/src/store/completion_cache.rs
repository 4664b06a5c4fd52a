//! Completion cache
//!
//! Holds every inferred attribute (per record id) and every accepted match.
//! Enrichment is incremental: adding a fact that is already cached is a no-op.
//! Persistence is explicit through [`CompletionCache::store`]; nothing is
//! written on drop.

use super::persistence::CacheBackend;
use crate::error::LinkResult;
use crate::models::{Completion, CompletionPayload, Match, Patchable, PayloadKind};
use eventseries_common::Qid;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Blob holding accepted matches
pub const MATCHES_BLOB: &str = "matches";
/// Blob holding completions of all records
pub const ITEM_COMPLETIONS_BLOB: &str = "item_completions";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionCache {
    completions: BTreeMap<Qid, Vec<Completion>>,
    matches: Vec<Match>,
}

impl CompletionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Completions recorded for `qid`, in insertion order
    pub fn completions_for(&self, qid: &Qid) -> &[Completion] {
        self.completions
            .get(qid)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn has_completion(&self, qid: &Qid, kind: PayloadKind) -> bool {
        self.completions_for(qid).iter().any(|c| c.kind() == kind)
    }

    /// Add one completion; returns false if an equal payload is already cached for the record
    pub fn add_completion(&mut self, completion: Completion) -> bool {
        let entry = self.completions.entry(completion.qid.clone()).or_default();
        if entry.iter().any(|c| c.payload == completion.payload) {
            return false;
        }
        entry.push(completion);
        true
    }

    /// Add many completions; returns how many were new
    pub fn add_completions(&mut self, completions: impl IntoIterator<Item = Completion>) -> usize {
        completions
            .into_iter()
            .filter(|c| self.add_completion(c.clone()))
            .count()
    }

    pub fn completion_count(&self) -> usize {
        self.completions.values().map(Vec::len).sum()
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    /// Add a match unless the same (event, series) link is already present
    pub fn add_match(&mut self, m: Match) -> bool {
        if self.matches.iter().any(|existing| existing.same_link(&m)) {
            return false;
        }
        self.matches.push(m);
        true
    }

    /// Apply the cached completions of `record` in insertion order; later ones win
    pub fn apply<T: Patchable>(&self, record: &mut T) {
        let qid = record.qid().clone();
        for completion in self.completions_for(&qid) {
            let applied = match &completion.payload {
                CompletionPayload::Ordinal(ordinal) => record.set_ordinal(*ordinal),
                CompletionPayload::Acronym(acronym) => record.set_acronym(acronym.clone()),
                CompletionPayload::CanonicalTitle(title) => {
                    record.set_canonical_title(title.clone())
                }
                CompletionPayload::Kind(kind) => record.set_kind(*kind),
            };
            if !applied {
                debug!(
                    qid = %qid,
                    kind = ?completion.kind(),
                    "Completion does not apply to this record type"
                );
            }
        }
    }

    /// Load both blobs; a missing blob yields an empty section
    pub async fn load(backend: &dyn CacheBackend) -> LinkResult<Self> {
        let mut cache = Self::new();

        if let Some(bytes) = backend.load_blob(ITEM_COMPLETIONS_BLOB).await? {
            let completions: Vec<Completion> = serde_json::from_slice(&bytes)?;
            for completion in completions {
                cache
                    .completions
                    .entry(completion.qid.clone())
                    .or_default()
                    .push(completion);
            }
        }
        if let Some(bytes) = backend.load_blob(MATCHES_BLOB).await? {
            cache.matches = serde_json::from_slice(&bytes)?;
        }

        info!(
            completions = cache.completion_count(),
            matches = cache.matches.len(),
            "Loaded completion cache"
        );
        Ok(cache)
    }

    /// Persist both blobs
    pub async fn store(&self, backend: &dyn CacheBackend) -> LinkResult<()> {
        let completions: Vec<&Completion> = self.completions.values().flatten().collect();
        backend
            .store_blob(ITEM_COMPLETIONS_BLOB, &serde_json::to_vec(&completions)?)
            .await?;
        backend
            .store_blob(MATCHES_BLOB, &serde_json::to_vec(&self.matches)?)
            .await?;

        info!(
            completions = completions.len(),
            matches = self.matches.len(),
            "Stored completion cache"
        );
        Ok(())
    }
}
