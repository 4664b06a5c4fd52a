//! Batch run: complete → annual series → fit → match → vote → write back
//!
//! Each phase reads the repository as it stands after the previous phase and
//! writes its results back only once it has finished.

use crate::completion::{AttributeCompletionEngine, CompletionReport, SeriesCompletion};
use crate::error::LinkResult;
use crate::matching::dblp_matcher::DEFAULT_PARALLEL_THRESHOLD;
use crate::matching::{CrossValidator, DblpMatcher, Evaluation, MatcherCascade, StrategyProposals};
use crate::repository::Repository;
use eventseries_common::config::TomlConfig;
use std::time::Instant;
use tracing::{error, info, warn};

const DBLP_STRATEGY: &str = "DblpMatcher";

/// Counts gathered during one run
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    pub completion: CompletionReport,
    /// Proceedings whose title marks them as annual
    pub annual_proceedings: usize,
    /// Distinct series found through annual proceedings
    pub annual_series: usize,
    pub training_pairs: usize,
    pub evaluations: Vec<(String, Evaluation)>,
    pub events_considered: usize,
    /// Proposals per strategy, in cascade order
    pub proposals: Vec<(String, usize)>,
    pub accepted_matches: usize,
    /// Accepted matches that were not already in the cache
    pub new_matches: usize,
}

pub struct Pipeline {
    engine: AttributeCompletionEngine,
    series_completion: SeriesCompletion,
    cascade: MatcherCascade,
    validator: CrossValidator,
    /// Event count above which DBLP matching runs in parallel
    parallel_threshold: usize,
}

impl Pipeline {
    pub fn new(engine: AttributeCompletionEngine, cascade: MatcherCascade, validator: CrossValidator) -> Self {
        Self {
            engine,
            series_completion: SeriesCompletion::default(),
            cascade,
            validator,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }

    pub fn with_parallel_threshold(mut self, parallel_threshold: usize) -> Self {
        self.parallel_threshold = parallel_threshold;
        self
    }

    pub fn with_series_completion(mut self, series_completion: SeriesCompletion) -> Self {
        self.series_completion = series_completion;
        self
    }

    /// Pipeline built from the configuration; `offline` skips volume title lookups
    pub fn from_config(config: &TomlConfig, offline: bool) -> LinkResult<Self> {
        let engine = if offline {
            AttributeCompletionEngine::offline()
        } else {
            AttributeCompletionEngine::from_config(&config.completion)?
        };
        let cascade = MatcherCascade::from_config(&config.matching)?;
        Ok(Self::new(
            engine,
            cascade,
            CrossValidator::new(config.matching.required_to_pass),
        )
        .with_parallel_threshold(config.matching.parallel_threshold)
        .with_series_completion(SeriesCompletion::new(&config.completion.annual_synonyms)))
    }

    pub async fn run(&mut self, repo: &mut Repository) -> LinkResult<PipelineReport> {
        let started = Instant::now();
        let mut report = PipelineReport {
            completion: self.engine.run(repo).await,
            ..Default::default()
        };

        let annual = self.series_completion.run(repo);
        report.annual_proceedings = annual.annual_proceedings.len();
        report.annual_series = annual.series.len();
        info!(
            proceedings = report.annual_proceedings,
            series = report.annual_series,
            "Series completion from annual proceedings"
        );

        let pairs = repo.training_pairs();
        report.training_pairs = pairs.len();
        if pairs.is_empty() {
            warn!("No events linked to a known series, strategies fit on nothing");
        }
        report.evaluations = self.cascade.fit_all(&pairs);

        let events = repo.events_without_series(true);
        let series = repo.patched_series();
        report.events_considered = events.len();
        info!(events = events.len(), series = series.len(), "Matching events without series");

        let mut proposals = self.cascade.propose_all(&events, &series);
        if let Some(source) = repo.dblp() {
            let dblp = DblpMatcher::new(source, self.parallel_threshold);
            proposals.push(StrategyProposals {
                name: DBLP_STRATEGY.to_string(),
                matches: dblp.match_events(&events, &series),
            });
        }
        report.proposals = proposals
            .iter()
            .map(|p| (p.name.clone(), p.matches.len()))
            .collect();

        let accepted = self.validator.merge(&proposals);
        report.accepted_matches = accepted.len();
        report.new_matches = repo.add_matches(accepted);

        info!(
            completions = report.completion.total(),
            training_pairs = report.training_pairs,
            accepted = report.accepted_matches,
            new = report.new_matches,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Pipeline finished"
        );
        Ok(report)
    }

    /// Run and flush the cache, also when the run fails
    pub async fn run_and_close(&mut self, repo: &mut Repository) -> LinkResult<PipelineReport> {
        let result = self.run(repo).await;
        if let Err(e) = &result {
            error!(error = %e, "Pipeline failed, flushing cache anyway");
        }
        repo.close().await?;
        result
    }
}
