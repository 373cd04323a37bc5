//! State persistence
//!
//! Saves and loads the full store state as one JSON blob, with a separate
//! plain-text schema version marker. Uses atomic writes (write to temp file,
//! then rename) to prevent corruption.
//!
//! Storage location: `~/.local/share/lectern/` (configurable via `Config`)
//!
//! Files:
//! - `state.json` - The serialized `DatabaseState`
//! - `state.version` - The schema version the blob was written with
//!
//! Persistence is best-effort: the public `save`/`clear` never fail, they
//! log. A load that finds nothing usable is "no saved state", not an error.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use tracing::{debug, error, warn};

use crate::config::Config;
use crate::state::{DatabaseState, StateSnapshot, SCHEMA_VERSION};
use crate::storage::{StorageError, StorageResult};

/// Name of the throwaway probe file used by `is_available`
const PROBE_FILE: &str = ".lectern-probe";

/// Persistence adapter for the store state
pub struct StatePersistence {
    config: Config,
}

impl StatePersistence {
    /// Create a new persistence adapter with the given configuration
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Check if a persisted state blob exists on disk
    pub fn exists(&self) -> bool {
        self.config.state_path().exists()
    }

    /// Save the state, logging instead of failing
    ///
    /// Serialization errors, quota exhaustion, and plain write failures are
    /// all swallowed here; the in-memory state stays the source of truth for
    /// the running session.
    pub fn save(&self, state: &DatabaseState) {
        match self.try_save(state) {
            Ok(()) => debug!(path = ?self.config.state_path(), "state saved"),
            Err(err) if err.is_quota() => {
                warn!("storage quota exceeded; latest state was not saved");
            }
            Err(err) => error!(%err, "failed to save state"),
        }
    }

    /// Save the state, surfacing the failure
    pub fn try_save(&self, state: &DatabaseState) -> StorageResult<()> {
        let bytes = serde_json::to_vec(state)?;
        atomic_write(&self.config.state_path(), &bytes)?;
        atomic_write(&self.config.version_path(), SCHEMA_VERSION.as_bytes())?;
        Ok(())
    }

    /// Load the persisted state, if any
    ///
    /// Returns `None` when no blob exists, and also when the blob can't be
    /// read or parsed - a corrupt file means starting fresh, not failing.
    /// A version marker that doesn't match the running schema is warned
    /// about but the snapshot is still returned as-is; migrations would
    /// hook in here.
    pub fn load(&self) -> Option<StateSnapshot> {
        let path = self.config.state_path();
        if !path.exists() {
            return None;
        }

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) => {
                error!(?path, %err, "failed to read saved state; starting fresh");
                return None;
            }
        };

        let snapshot: StateSnapshot = match serde_json::from_slice(&bytes) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                error!(?path, %err, "saved state is unparsable; starting fresh");
                return None;
            }
        };

        match self.stored_version() {
            Some(version) if version == SCHEMA_VERSION => {}
            Some(version) => {
                warn!(
                    stored = %version,
                    current = %SCHEMA_VERSION,
                    "state version mismatch; using saved state as-is"
                );
            }
            None => {
                warn!("state blob has no version marker; using saved state as-is");
            }
        }

        Some(snapshot)
    }

    /// Read the stored schema version marker
    pub fn stored_version(&self) -> Option<String> {
        fs::read_to_string(self.config.version_path())
            .ok()
            .map(|v| v.trim().to_string())
    }

    /// Remove the state blob and version marker, logging instead of failing
    pub fn clear(&self) {
        for path in [self.config.state_path(), self.config.version_path()] {
            if path.exists() {
                if let Err(err) = fs::remove_file(&path) {
                    error!(?path, %err, "failed to clear saved state");
                }
            }
        }
    }

    /// Probe whether durable storage is usable in this environment
    ///
    /// Writes and deletes a throwaway file in the data directory. Fails for
    /// read-only mounts, missing permissions, and exhausted quota - the
    /// store then runs memory-only for the session.
    pub fn is_available(&self) -> bool {
        let probe = self.config.data_dir.join(PROBE_FILE);
        if fs::create_dir_all(&self.config.data_dir).is_err() {
            return false;
        }
        if fs::write(&probe, b"probe").is_err() {
            return false;
        }
        let _ = fs::remove_file(&probe);
        true
    }
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
///
/// This ensures the target file is never left in a partially-written state.
fn atomic_write(path: &Path, data: &[u8]) -> StorageResult<()> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| StorageError::CreateDirectory {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    // Create temp file in the same directory (for atomic rename)
    let temp_path = path.with_extension("tmp");

    let mut file =
        File::create(&temp_path).map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    file.write_all(data)
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    // Sync to disk before rename
    file.sync_all()
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    fs::rename(&temp_path, path).map_err(|source| StorageError::AtomicWriteFailed {
        from: temp_path,
        to: path.to_path_buf(),
        source,
    })?;

    Ok(())
}
