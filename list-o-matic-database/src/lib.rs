extern crate alloc;

pub mod error;
pub mod models;

use std::fs;
use std::io::{ErrorKind, Write as _};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub use error::DatabaseError;
use models::TalkingLists;
use tracing::debug;

/// Durable home of the talking lists.
///
/// The in-memory registry stays the source of truth, a store only keeps a copy that
/// survives a restart. Every save replaces the previous snapshot as a whole.
pub trait SnapshotStore: Send + Sync {
    fn load(&self) -> Result<TalkingLists, DatabaseError>;

    fn save(&self, lists: &TalkingLists) -> Result<(), DatabaseError>;
}

/// Keeps the snapshot as pretty printed JSON so an operator may edit it while the
/// server is stopped.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn directory(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl SnapshotStore for JsonFileStore {
    fn load(&self) -> Result<TalkingLists, DatabaseError> {
        let content = fs::read(&self.path).map_err(|source| DatabaseError::Read {
            path: self.path.clone(),
            source,
        })?;
        let lists: TalkingLists = serde_json::from_slice(&content)?;
        debug!("loaded {} talking lists from {}", lists.len(), self.path.display());
        Ok(lists)
    }

    fn save(&self, lists: &TalkingLists) -> Result<(), DatabaseError> {
        let json = serde_json::to_vec_pretty(lists)?;
        let write_error = |source| DatabaseError::Write {
            path: self.path.clone(),
            source,
        };

        // write next to the target so the rename below never crosses file systems
        let mut file = tempfile::NamedTempFile::new_in(self.directory()).map_err(write_error)?;
        file.write_all(&json).map_err(write_error)?;
        file.as_file().sync_all().map_err(write_error)?;
        file.persist(&self.path)
            .map_err(|source| DatabaseError::Persist {
                path: self.path.clone(),
                source,
            })?;
        debug!("saved {} talking lists to {}", lists.len(), self.path.display());
        Ok(())
    }
}

/// A store that never touches the disk but still goes through the JSON encoding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: Mutex<Option<String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The last saved snapshot, if any.
    pub fn snapshot(&self) -> Result<Option<String>, DatabaseError> {
        Ok(self
            .snapshot
            .lock()
            .map_err(|_| DatabaseError::Poisoned)?
            .clone())
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> Result<TalkingLists, DatabaseError> {
        let snapshot = self.snapshot.lock().map_err(|_| DatabaseError::Poisoned)?;
        match snapshot.as_deref() {
            Some(json) => Ok(serde_json::from_str(json)?),
            None => Err(DatabaseError::Read {
                path: PathBuf::from(":memory:"),
                source: ErrorKind::NotFound.into(),
            }),
        }
    }

    fn save(&self, lists: &TalkingLists) -> Result<(), DatabaseError> {
        let json = serde_json::to_string(lists)?;
        *self.snapshot.lock().map_err(|_| DatabaseError::Poisoned)? = Some(json);
        Ok(())
    }
}
