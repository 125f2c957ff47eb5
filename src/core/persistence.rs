/*
 * Persists the catalog snapshot and its save metadata to two slots in a local
 * data directory. Loading is lenient: anything missing, unreadable, malformed
 * or failing shape validation yields `None`, and the caller starts over with a
 * fresh snapshot. Saving reports errors, but callers treat them as a status
 * signal only; a failed save never undoes the in-memory change.
 *
 * Each slot is written to a `.tmp` sibling first and renamed into place, so a
 * concurrent reader sees either the previous or the new file in full.
 *
 * The trait (`PersistenceOperations`) lets the session run against an
 * in-memory or failing backend in tests; `CorePersistenceManager` is the
 * file-based implementation.
 */
use super::import;
use super::models::{SaveMetadata, Snapshot};
use super::path_utils;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const SNAPSHOT_SLOT_FILENAME: &str = "masterlist.db.v1.json";
pub const METADATA_SLOT_FILENAME: &str = "masterlist.meta.v1.json";

#[derive(Debug)]
pub enum PersistenceError {
    Io(io::Error),
    Serde(serde_json::Error),
    NoDataDirectory,
}

impl From<io::Error> for PersistenceError {
    fn from(err: io::Error) -> Self {
        PersistenceError::Io(err)
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        PersistenceError::Serde(err)
    }
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistenceError::Io(e) => write!(f, "Storage I/O error: {e}"),
            PersistenceError::Serde(e) => write!(f, "Storage serialization error: {e}"),
            PersistenceError::NoDataDirectory => {
                write!(f, "Could not determine data directory for autosave")
            }
        }
    }
}

impl std::error::Error for PersistenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PersistenceError::Io(e) => Some(e),
            PersistenceError::Serde(e) => Some(e),
            PersistenceError::NoDataDirectory => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PersistenceError>;

// What a successful `load` hands back. Metadata is optional; a snapshot
// without a readable metadata slot is still usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedState {
    pub snapshot: Snapshot,
    pub metadata: Option<SaveMetadata>,
}

pub trait PersistenceOperations {
    fn load(&self) -> Option<PersistedState>;
    fn save(&self, snapshot: &Snapshot, metadata: &SaveMetadata) -> Result<()>;
}

pub struct CorePersistenceManager {
    data_dir: Option<PathBuf>,
}

impl CorePersistenceManager {
    pub fn new(data_dir: PathBuf) -> Self {
        CorePersistenceManager {
            data_dir: Some(data_dir),
        }
    }

    /*
     * Uses the platform's local configuration directory for `app_name`. If no
     * such directory can be determined, loads find nothing and saves fail with
     * `NoDataDirectory`.
     */
    pub fn for_app(app_name: &str) -> Self {
        let data_dir = path_utils::get_base_app_config_local_dir(app_name);
        if data_dir.is_none() {
            log::warn!("CorePersistenceManager: No data directory for app '{app_name}'.");
        }
        CorePersistenceManager { data_dir }
    }

    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    fn slot_path(&self, file_name: &str) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join(file_name))
    }

    fn read_slot(path: &Path) -> Option<String> {
        match fs::read_to_string(path) {
            Ok(text) => Some(text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("CorePersistenceManager: Slot {path:?} does not exist.");
                None
            }
            Err(e) => {
                log::warn!("CorePersistenceManager: Failed to read slot {path:?}: {e}");
                None
            }
        }
    }

    fn write_slot_atomically(path: &Path, contents: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
            log::debug!("CorePersistenceManager: Created data directory {parent:?}.");
        }
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, contents)?;
        if let Err(e) = fs::rename(&temp_path, path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }
        Ok(())
    }
}

impl PersistenceOperations for CorePersistenceManager {
    fn load(&self) -> Option<PersistedState> {
        let snapshot_path = self.slot_path(SNAPSHOT_SLOT_FILENAME)?;
        log::trace!("CorePersistenceManager: Loading snapshot from {snapshot_path:?}");
        let raw = Self::read_slot(&snapshot_path)?;
        let snapshot = match import::parse_saved_snapshot(&raw) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log::warn!("CorePersistenceManager: Ignoring unusable snapshot slot: {e}");
                return None;
            }
        };

        let metadata = self
            .slot_path(METADATA_SLOT_FILENAME)
            .and_then(|path| Self::read_slot(&path))
            .and_then(|text| match serde_json::from_str::<SaveMetadata>(&text) {
                Ok(meta) => Some(meta),
                Err(e) => {
                    log::warn!("CorePersistenceManager: Ignoring unusable metadata slot: {e}");
                    None
                }
            });

        log::debug!(
            "CorePersistenceManager: Loaded snapshot v{} with {} categories.",
            snapshot.version,
            snapshot.categories.len()
        );
        Some(PersistedState { snapshot, metadata })
    }

    fn save(&self, snapshot: &Snapshot, metadata: &SaveMetadata) -> Result<()> {
        let snapshot_path = self
            .slot_path(SNAPSHOT_SLOT_FILENAME)
            .ok_or(PersistenceError::NoDataDirectory)?;
        let metadata_path = self
            .slot_path(METADATA_SLOT_FILENAME)
            .ok_or(PersistenceError::NoDataDirectory)?;

        let snapshot_bytes = serde_json::to_vec(snapshot)?;
        let metadata_bytes = serde_json::to_vec(metadata)?;
        Self::write_slot_atomically(&snapshot_path, &snapshot_bytes)?;
        Self::write_slot_atomically(&metadata_path, &metadata_bytes)?;
        log::debug!(
            "CorePersistenceManager: Saved snapshot v{} to {snapshot_path:?}.",
            snapshot.version
        );
        Ok(())
    }
}
