//! Free-text title parsing

pub mod title;

pub use title::{extract_location, extract_ordinal, extract_year, ParsedTitle};
