//! Media import into the local library.
//!
//! Every remote media handle maps to at most one imported asset. Importing a
//! known handle returns the existing asset; the mapping is stored in SQLite
//! with a unique constraint on the handle, so concurrent imports of the same
//! media still produce a single record.

mod importer;
mod library;
mod model;
mod repository;

pub use importer::MediaImporter;
pub use library::{MediaLibrary, sanitize_file_name};
pub use model::{
    AssetId, BatchImportItem, ImportRecord, ImportRequest, ImportedAsset, InsertOutcome,
};
pub use repository::ImportRepository;
