//! Snapshot persistence for the registration ledger.
//!
//! This module provides the [`SnapshotStore`] seam and the [`JsonSnapshotStore`]
//! used in production. A snapshot is the full ordered list of registrations,
//! serialized to a JSON file.

use std::{
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use log::{debug, info, warn};
use mockall::automock;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tokio::{fs, task};

use crate::registrations::{LedgerError, RegistrationEntry};

/// Full serializable state of the ledger at a point in time.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Registrations in insertion order.
    pub users: Vec<RegistrationEntry>,
}

/// Durable storage for ledger snapshots.
///
/// Implementations do not interpret the entries, they only move whole
/// snapshots between memory and stable storage.
#[automock]
pub trait SnapshotStore {
    /// Reads the stored snapshot.
    ///
    /// On first run, stores and returns an empty snapshot.
    async fn load(&self) -> Result<Snapshot, LedgerError>;
    /// Replaces the stored snapshot. A reader never observes a partial write.
    async fn save(&self, snapshot: &Snapshot) -> Result<(), LedgerError>;
}

/// Stores snapshots as pretty printed JSON in a single file.
///
/// Writes go to a temporary file next to the target which is then renamed over
/// it, so a crash mid-write leaves the previous snapshot intact.
///
/// # Examples
///
/// ```no_run
/// use porter::registrations::{JsonSnapshotStore, SnapshotStore};
///
/// # async fn example() -> Result<(), porter::registrations::LedgerError> {
/// let store = JsonSnapshotStore::new("data/users.json");
/// let snapshot = store.load().await?;
/// println!("{} registrations", snapshot.users.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct JsonSnapshotStore {
    /// Path to the JSON snapshot file.
    path: PathBuf,
}

impl JsonSnapshotStore {
    /// Creates a store backed by the file at `path`.
    ///
    /// Nothing is read or written until [`SnapshotStore::load`] or
    /// [`SnapshotStore::save`] is called.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonSnapshotStore { path: path.into() }
    }

    /// Directory receiving the temporary file.
    ///
    /// Must be on the same filesystem as the target for the rename to be atomic.
    fn temp_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

/// Writes `serialized` to `path` through a temporary file in `dir`.
///
/// The temporary file is deleted when dropped, which covers every early return.
/// The snapshot is only durable once `dir` itself has been synced after the rename.
fn write_atomically(dir: &Path, path: &Path, serialized: &[u8]) -> std::io::Result<()> {
    let mut temp_file = NamedTempFile::new_in(dir)?;
    temp_file.write_all(serialized)?;
    temp_file.as_file().sync_all()?;
    temp_file.persist(path).map_err(|e| e.error)?;
    sync_dir(dir)
}

/// Flushes the directory entry so a completed rename survives a crash.
#[cfg(unix)]
fn sync_dir(dir: &Path) -> std::io::Result<()> {
    std::fs::File::open(dir)?.sync_all()
}

/// Directories cannot be opened as files on this platform.
#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}

impl SnapshotStore for JsonSnapshotStore {
    async fn load(&self) -> Result<Snapshot, LedgerError> {
        let serialized_snapshot = match fs::read_to_string(&self.path).await {
            Ok(serialized) => serialized,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(
                    "no registrations found at {}, starting with an empty ledger",
                    self.path.display()
                );
                let snapshot = Snapshot::default();
                self.save(&snapshot).await?;
                return Ok(snapshot);
            }
            Err(e) => {
                return Err(LedgerError::StorageUnavailable(format!(
                    "failed to read {}: {}",
                    self.path.display(),
                    e
                )));
            }
        };

        let snapshot: Snapshot = serde_json::from_str(&serialized_snapshot).map_err(|e| {
            LedgerError::StorageCorrupt(format!("failed to parse {}: {}", self.path.display(), e))
        })?;

        info!(
            "loaded {} registrations from {}",
            snapshot.users.len(),
            self.path.display()
        );

        Ok(snapshot)
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<(), LedgerError> {
        let serialized_snapshot = serde_json::to_vec_pretty(snapshot).map_err(|e| {
            LedgerError::StorageUnavailable(format!("failed to serialize snapshot: {}", e))
        })?;

        let dir = self.temp_dir();
        let path = self.path.clone();
        task::spawn_blocking(move || write_atomically(&dir, &path, &serialized_snapshot))
            .await
            .map_err(|e| LedgerError::StorageUnavailable(format!("write task failed: {}", e)))?
            .map_err(|e| {
                LedgerError::StorageUnavailable(format!(
                    "failed to write {}: {}",
                    self.path.display(),
                    e
                ))
            })?;

        debug!("persisted {} registrations", snapshot.users.len());

        Ok(())
    }
}
