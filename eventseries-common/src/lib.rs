//! # Event Series Common Library
//!
//! Shared code for the event series linking workspace:
//! - Error type shared by all crates
//! - Knowledge-graph identifiers (QIDs)
//! - Configuration loading and root folder resolution

pub mod config;
pub mod error;
pub mod qid;

pub use error::{Error, Result};
pub use qid::Qid;
