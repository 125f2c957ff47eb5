/*
 * This module consolidates the core, platform-agnostic logic of the
 * application: the category store and its name index, the catalog session
 * (mutations, versioning, autosave), the persistence backend, import
 * validation with legacy-row normalization, and export naming and sinks.
 * Abstractions such as `PersistenceOperations` and `ExportSinkOperations`
 * are re-exported so the application logic can be driven by mocks in tests.
 */
pub mod catalog_session;
pub mod category_store;
pub mod exporter;
pub mod import;
pub mod models;
pub mod path_utils;
pub mod persistence;
pub mod timestamps;

#[cfg(test)]
pub use models::{SaveMetadata, Snapshot};

pub use category_store::StoreError;

pub use catalog_session::CatalogSession;

pub use persistence::CorePersistenceManager;
#[cfg(test)]
pub use persistence::{PersistenceError, PersistenceOperations};

pub use exporter::{DownloadSink, ExportSinkOperations, FolderSink};
#[cfg(test)]
pub use exporter::ExportError;
