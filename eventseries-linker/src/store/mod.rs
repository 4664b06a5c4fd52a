//! In-memory record tables, the completion cache and its persistence

pub mod completion_cache;
pub mod persistence;
pub mod record_store;

pub use completion_cache::CompletionCache;
pub use persistence::{open_backend, CacheBackend, FileBackend, SqliteBackend};
pub use record_store::{RecordStore, Table};
