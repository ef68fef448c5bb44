//! Idempotent media import.

use chat2blog_beeper::MediaBlob;
use chrono::Utc;
use tracing::{info, warn};

use super::library::MediaLibrary;
use super::model::{
    AssetId, BatchImportItem, ImportRecord, ImportRequest, ImportedAsset, InsertOutcome,
};
use super::repository::ImportRepository;
use crate::compose::default_file_name;
use crate::data_url;
use crate::error::{Error, Result};
use crate::source::MediaSource;

/// Imports remote media into the local library at most once per handle.
#[derive(Debug, Clone)]
pub struct MediaImporter {
    repository: ImportRepository,
    library: MediaLibrary,
}

impl MediaImporter {
    /// Creates an importer.
    #[must_use]
    pub const fn new(repository: ImportRepository, library: MediaLibrary) -> Self {
        Self {
            repository,
            library,
        }
    }

    /// Import record storage.
    #[must_use]
    pub const fn repository(&self) -> &ImportRepository {
        &self.repository
    }

    /// Media library.
    #[must_use]
    pub const fn library(&self) -> &MediaLibrary {
        &self.library
    }

    /// Imports the media behind `request.media_handle`.
    ///
    /// A handle that was imported before returns its existing asset without
    /// downloading anything.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is empty, the download fails, or the
    /// file or record cannot be stored.
    pub async fn import<S: MediaSource + Sync>(
        &self,
        source: &S,
        request: &ImportRequest,
    ) -> Result<ImportedAsset> {
        if let Some(existing) = self.existing(request).await? {
            return Ok(existing);
        }
        let blob = source.fetch_media(&request.media_handle).await?;
        self.store(request, &blob).await
    }

    /// Imports media whose bytes were already downloaded.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is empty or the file or record cannot
    /// be stored.
    pub async fn import_bytes(
        &self,
        request: &ImportRequest,
        blob: &MediaBlob,
    ) -> Result<ImportedAsset> {
        if let Some(existing) = self.existing(request).await? {
            return Ok(existing);
        }
        self.store(request, blob).await
    }

    /// Imports media supplied as a base64 `data:` URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDataUrl`] for undecodable URLs, otherwise as
    /// [`MediaImporter::import_bytes`].
    pub async fn import_data_url(
        &self,
        request: &ImportRequest,
        url: &str,
    ) -> Result<ImportedAsset> {
        if let Some(existing) = self.existing(request).await? {
            return Ok(existing);
        }
        let blob = data_url::decode(url)?;
        self.store(request, &blob).await
    }

    /// Imports several items one after another.
    ///
    /// A failing item is reported in its entry and does not stop the rest.
    pub async fn import_many<S: MediaSource + Sync>(
        &self,
        source: &S,
        requests: &[ImportRequest],
    ) -> Vec<BatchImportItem> {
        let mut results = Vec::with_capacity(requests.len());
        for request in requests {
            let item = match self.import(source, request).await {
                Ok(asset) => BatchImportItem {
                    media_handle: request.media_handle.clone(),
                    asset_id: Some(asset.asset_id),
                    error: None,
                },
                Err(e) => {
                    warn!(handle = %request.media_handle, error = %e, "Import failed");
                    BatchImportItem {
                        media_handle: request.media_handle.clone(),
                        asset_id: None,
                        error: Some(e.to_string()),
                    }
                }
            };
            results.push(item);
        }
        results
    }

    async fn existing(&self, request: &ImportRequest) -> Result<Option<ImportedAsset>> {
        if request.media_handle.is_empty() {
            return Err(Error::InvalidRequest("Media handle required".to_string()));
        }
        let record = self.repository.find_by_handle(&request.media_handle).await?;
        Ok(record.and_then(|record| {
            let id = record.id?;
            Some(self.asset(id, record, false))
        }))
    }

    async fn store(&self, request: &ImportRequest, blob: &MediaBlob) -> Result<ImportedAsset> {
        let mime_type = request
            .mime_type
            .clone()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| blob.mime_type().to_string());
        let file_name = request
            .file_name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| default_file_name(Some(&mime_type)));

        let stored_name = self.library.store(&file_name, &blob.bytes).await?;
        let mut record = ImportRecord {
            id: None,
            media_handle: request.media_handle.clone(),
            file_name: stored_name,
            mime_type,
            caption: request.caption.clone(),
            sender: request.sender.clone(),
            chat_id: request.chat_id.clone(),
            message_timestamp: request.timestamp.clone(),
            imported_at: Utc::now(),
        };

        let outcome = match self.repository.insert_if_absent(&record).await {
            Ok(outcome) => outcome,
            Err(e) => {
                self.discard(&record.file_name).await;
                return Err(e);
            }
        };

        match outcome {
            InsertOutcome::Created(id) => {
                info!(
                    handle = %record.media_handle,
                    asset_id = %id,
                    file = %record.file_name,
                    bytes = blob.len(),
                    "Imported media"
                );
                record.id = Some(id);
                Ok(self.asset(id, record, true))
            }
            InsertOutcome::Existing(id) => {
                warn!(
                    handle = %record.media_handle,
                    asset_id = %id,
                    "Media was imported concurrently, discarding duplicate file"
                );
                self.discard(&record.file_name).await;
                let winner = self
                    .repository
                    .get(id)
                    .await?
                    .ok_or(Error::Database(sqlx::Error::RowNotFound))?;
                Ok(self.asset(id, winner, false))
            }
        }
    }

    async fn discard(&self, file_name: &str) {
        if let Err(e) = self.library.remove(file_name).await {
            warn!(file = file_name, error = %e, "Failed to remove unrecorded media file");
        }
    }

    fn asset(&self, asset_id: AssetId, record: ImportRecord, created: bool) -> ImportedAsset {
        let url = self.library.url_for(&record.file_name);
        ImportedAsset {
            asset_id,
            media_handle: record.media_handle,
            file_name: record.file_name,
            mime_type: record.mime_type,
            url,
            created,
        }
    }
}
