//! Error types for activity sources.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("no activity feed configured for account {0}")]
    UnknownAccount(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed activity payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("activity payload has no `ocs` envelope")]
    MissingEnvelope,
}
