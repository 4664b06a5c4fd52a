//! Record types shared by every stage of the pipeline

pub mod completion;
pub mod event;
pub mod matches;

pub use completion::{Completion, CompletionPayload, PayloadKind};
pub use event::{Event, EventKind, EventSeries, Patchable, Proceeding, Titled};
pub use matches::{Match, SeriesRef, TrainingPair};
