use std::path::PathBuf;

use thiserror::Error;

#[allow(clippy::module_name_repetitions)]
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Failed to read talking lists from {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write talking lists to {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to replace {path} with the new snapshot: {source}")]
    Persist {
        path: PathBuf,
        source: tempfile::PersistError,
    },
    #[error("Talking list snapshot is not valid json {0}")]
    Json(#[from] serde_json::Error),
    #[error("Snapshot store lock was poisoned")]
    Poisoned,
}
