/*
 * The catalog session owns the category store together with its snapshot
 * metadata (schema, version, `updatedAt`), the name of the file it was
 * imported from, and the persistence backend.
 *
 * Every public mutator follows the same discipline: apply the change to the
 * store, and only if that succeeded bump the version exactly once and
 * autosave. A failed mutation leaves store, version and `updatedAt`
 * untouched. A failed autosave keeps the committed change, leaves the
 * persistence state `Dirty`, and keeps the save error for the status line.
 */
use super::category_store::{self, CategoryStore};
use super::exporter::{self, ExportReceipt, ExportSinkOperations};
use super::import;
use super::models::{MASTER_FILE_DEFAULT, PersistenceState, SaveMetadata, Snapshot};
use super::persistence::PersistenceOperations;
use super::timestamps;

pub struct CatalogSession {
    store: CategoryStore,
    schema: u32,
    version: u64,
    updated_at: String,
    source_file_name: Option<String>,
    persistence: Box<dyn PersistenceOperations>,
    persistence_state: PersistenceState,
    autosave_error: Option<String>,
}

impl CatalogSession {
    /*
     * Restores the last autosaved snapshot, or starts an empty version-1
     * catalog (and saves it right away) when there is none.
     */
    pub fn open(persistence: Box<dyn PersistenceOperations>) -> Self {
        let mut session = CatalogSession {
            store: CategoryStore::new(),
            schema: 0,
            version: 0,
            updated_at: String::new(),
            source_file_name: None,
            persistence,
            persistence_state: PersistenceState::Uninitialized,
            autosave_error: None,
        };
        match session.persistence.load() {
            Some(restored) => {
                log::info!(
                    "CatalogSession: Restored v{} with {} categories.",
                    restored.snapshot.version,
                    restored.snapshot.categories.len()
                );
                session.install_snapshot(restored.snapshot);
                session.source_file_name = restored.metadata.and_then(|m| m.source_file_name);
                session.persistence_state = PersistenceState::Loaded;
            }
            None => {
                log::info!("CatalogSession: No usable autosave, starting a new catalog.");
                session.install_snapshot(Snapshot::empty(timestamps::now_iso()));
                session.persistence_state = PersistenceState::Loaded;
                session.save();
            }
        }
        session
    }

    fn install_snapshot(&mut self, snapshot: Snapshot) {
        self.schema = snapshot.schema;
        self.version = snapshot.version;
        self.updated_at = snapshot.updated_at;
        self.store = CategoryStore::from_rows(snapshot.categories);
    }

    pub fn store(&self) -> &CategoryStore {
        &self.store
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn updated_at(&self) -> &str {
        &self.updated_at
    }

    pub fn source_file_name(&self) -> Option<&str> {
        self.source_file_name.as_deref()
    }

    #[cfg(test)]
    pub fn persistence_state(&self) -> PersistenceState {
        self.persistence_state
    }

    pub fn autosave_failed(&self) -> bool {
        self.autosave_error.is_some()
    }

    // Why the most recent save failed; cleared by the next successful save.
    pub fn autosave_error(&self) -> Option<&str> {
        self.autosave_error.as_deref()
    }

    /// Read-only projection of the current catalog; never mutates state.
    pub fn build_snapshot(&self) -> Snapshot {
        Snapshot {
            schema: self.schema,
            version: self.version,
            updated_at: self.updated_at.clone(),
            categories: self.store.rows().to_vec(),
        }
    }

    fn save(&mut self) {
        let snapshot = self.build_snapshot();
        let metadata = SaveMetadata {
            saved_at: timestamps::now_iso(),
            source_file_name: self.source_file_name.clone(),
        };
        match self.persistence.save(&snapshot, &metadata) {
            Ok(()) => {
                log::trace!(
                    "CatalogSession: Saved v{} ({:?} -> Saved).",
                    self.version,
                    self.persistence_state
                );
                self.persistence_state = PersistenceState::Saved;
                self.autosave_error = None;
            }
            Err(e) => {
                log::warn!("CatalogSession: Autosave of v{} failed: {e}", self.version);
                self.autosave_error = Some(e.to_string());
            }
        }
    }

    // Called once per committed, externally visible mutation.
    fn bump_version(&mut self) {
        self.version += 1;
        self.updated_at = timestamps::next_stamp_after(&self.updated_at, timestamps::now());
        self.persistence_state = PersistenceState::Dirty;
        self.save();
    }

    fn commit<T>(&mut self, result: category_store::Result<T>) -> category_store::Result<T> {
        if result.is_ok() {
            self.bump_version();
        }
        result
    }

    pub fn add_category(&mut self, name: &str) -> category_store::Result<usize> {
        let result = self.store.insert_category(name);
        self.commit(result)
    }

    pub fn delete_category(&mut self, name: &str) -> category_store::Result<usize> {
        let result = self.store.delete_category(name);
        self.commit(result)
    }

    pub fn add_item(&mut self, category: &str, item: &str) -> category_store::Result<()> {
        let result = self.store.add_item(category, item);
        self.commit(result)
    }

    pub fn remove_item(&mut self, category: &str, item: &str) -> category_store::Result<String> {
        let result = self.store.remove_item(category, item);
        self.commit(result)
    }

    pub fn edit_item(
        &mut self,
        category: &str,
        old_item: &str,
        new_item: &str,
    ) -> category_store::Result<()> {
        let result = self.store.edit_item(category, old_item, new_item);
        self.commit(result)
    }

    pub fn clear_items(&mut self, category: &str) -> category_store::Result<usize> {
        let result = self.store.clear_items(category);
        self.commit(result)
    }

    /*
     * Replaces the whole catalog with the contents of `text`. Parsing,
     * validation and legacy normalization all finish before the store is
     * touched. The imported snapshot keeps its own version and stamp, and is
     * autosaved together with `file_name` as the new source.
     */
    pub fn import_text(&mut self, file_name: &str, text: &str) -> import::Result<usize> {
        let snapshot = import::parse_snapshot(text)?;
        let count = snapshot.categories.len();
        self.install_snapshot(snapshot);
        self.source_file_name = Some(file_name.to_string());
        self.persistence_state = PersistenceState::Dirty;
        self.save();
        log::info!("CatalogSession: Imported {count} categories from '{file_name}'.");
        Ok(count)
    }

    /// Resets to an empty version-1 catalog with no source file.
    pub fn new_database(&mut self) {
        self.install_snapshot(Snapshot::empty(timestamps::now_iso()));
        self.source_file_name = None;
        self.persistence_state = PersistenceState::Dirty;
        self.save();
        log::info!("CatalogSession: Started a new empty catalog.");
    }

    pub fn export_base_name(&self) -> &str {
        self.source_file_name.as_deref().unwrap_or(MASTER_FILE_DEFAULT)
    }

    pub fn export(
        &self,
        preferred: Option<&dyn ExportSinkOperations>,
        fallback: &dyn ExportSinkOperations,
    ) -> exporter::Result<ExportReceipt> {
        let snapshot = self.build_snapshot();
        let file_name =
            exporter::name_export_file(self.export_base_name(), snapshot.version, timestamps::now());
        let body = exporter::render_export_body(&snapshot)?;
        exporter::write_export(preferred, fallback, &file_name, body.as_bytes())
    }
}
