//! Attribute completion
//!
//! Fills gaps in partial records (ordinal, acronym, event kind, canonical
//! volume title) and records each inferred value as a [`Completion`] with
//! provenance. Existing attributes are never overwritten and a fact already
//! cached for a (record, payload kind) is never derived again.
//!
//! [`Completion`]: crate::models::Completion

pub mod acronym;
pub mod engine;
pub mod kind;
pub mod ordinal;
pub mod series;
pub mod title_sources;

pub use engine::{AttributeCompletionEngine, CompletionReport};
pub use series::{AnnualSeries, SeriesCompletion};
pub use title_sources::{CeurSptClient, CeurWsScraper, VolumeTitleSource};
