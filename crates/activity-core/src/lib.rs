//! activity-core: data model shared by the activity aggregator, its sources
//! and the runtime. Pure types, no IO.

pub mod error;
pub mod types;

pub use error::ActivityError;
pub use types::{
    ActivityRecord, DEFAULT_PAGE_SIZE, FetchCompletion, FetchOutcome, FetchRequest, ModelEvent,
    RawActivity,
};
