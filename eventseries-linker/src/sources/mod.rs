//! Read-only data sources: cached knowledge-graph query results and DBLP

pub mod dblp;
pub mod query;

pub use dblp::{DblpEvent, DblpEventSeries, DblpParent, DblpSource, InMemoryDblp};
pub use query::QueryResultSource;
