//! Error types for the activity model.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActivityError {
    /// A virtual row index at or past the current row count was requested.
    #[error("row index {index} out of range (row count {len})")]
    IndexOutOfRange { index: usize, len: usize },
}
