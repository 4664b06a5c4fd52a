//! eventseries-linker library
//!
//! Links one-off academic events from the knowledge graph to the recurring
//! series they belong to. Partial records are first enriched with inferred
//! attributes, then a cascade of independent matchers proposes event→series
//! links which are accepted only when enough strategies agree.

pub mod completion;
pub mod error;
pub mod matching;
pub mod models;
pub mod parsing;
pub mod pipeline;
pub mod repository;
pub mod sources;
pub mod store;

pub use error::{LinkError, LinkResult};
pub use pipeline::{Pipeline, PipelineReport};
pub use repository::Repository;
