use serde::{Deserialize, Serialize};

/// Current on-disk schema number written into every snapshot.
pub const SCHEMA_VERSION: u32 = 1;

/// Base file name used for exports when nothing has been imported yet.
pub const MASTER_FILE_DEFAULT: &str = "MasterListDB.json";

// A category row: element 0 is the name, the rest are items in insertion order.
pub type CategoryRow = Vec<String>;

/*
 * The unit of persistence and export. Field names follow the JSON file format
 * (`updatedAt` in camelCase) so snapshots written by older versions of the
 * application load without conversion.
 */
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub schema: u32,
    pub version: u64,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
    pub categories: Vec<CategoryRow>,
}

impl Snapshot {
    /// Creates an empty version-1 snapshot stamped with `updated_at`.
    pub fn empty(updated_at: String) -> Self {
        Snapshot {
            schema: SCHEMA_VERSION,
            version: 1,
            updated_at,
            categories: Vec::new(),
        }
    }
}

// Lightweight record written next to the snapshot on every save.
// `loadedFileName` is the field name used by earlier releases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveMetadata {
    #[serde(rename = "savedAt")]
    pub saved_at: String,
    #[serde(rename = "sourceFileName", alias = "loadedFileName", default)]
    pub source_file_name: Option<String>,
}

/*
 * Tracks where the in-memory catalog stands relative to its persisted copy.
 * `Dirty` means a mutation has been committed in memory but the autosave has
 * not (yet) succeeded.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PersistenceState {
    #[default]
    Uninitialized,
    Loaded,
    Dirty,
    Saved,
}
