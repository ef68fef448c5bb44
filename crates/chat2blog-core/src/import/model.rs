//! Import data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of an imported asset in the local library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(pub i64);

impl AssetId {
    /// Create a new asset ID.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mapping from a remote media handle to the asset created for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRecord {
    /// Asset identifier (None before the record is stored).
    pub id: Option<AssetId>,
    /// Remote media handle; unique across records.
    #[serde(rename = "mxcUrl")]
    pub media_handle: String,
    /// File name inside the media library.
    pub file_name: String,
    /// MIME type of the stored file.
    pub mime_type: String,
    /// Caption (the carrying message's text).
    pub caption: Option<String>,
    /// Sender of the carrying message.
    pub sender: Option<String>,
    /// Chat the media came from.
    pub chat_id: Option<String>,
    /// Timestamp of the carrying message.
    pub message_timestamp: Option<String>,
    /// When the import happened.
    pub imported_at: DateTime<Utc>,
}

impl ImportRecord {
    /// Whether the stored file is a video.
    #[must_use]
    pub fn is_video(&self) -> bool {
        self.mime_type.starts_with("video/")
    }
}

/// Result of an insert that must not duplicate a media handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new record was stored.
    Created(AssetId),
    /// A record for the handle already existed.
    Existing(AssetId),
}

impl InsertOutcome {
    /// The asset ID in either case.
    #[must_use]
    pub const fn asset_id(self) -> AssetId {
        match self {
            Self::Created(id) | Self::Existing(id) => id,
        }
    }

    /// Whether a new record was stored.
    #[must_use]
    pub const fn is_created(self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Media to import, with metadata from the message that carried it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRequest {
    /// Remote media handle.
    #[serde(alias = "mxcUrl")]
    pub media_handle: String,
    /// Preferred file name; derived from the MIME type when absent.
    #[serde(default)]
    pub file_name: Option<String>,
    /// MIME type; taken from the download when absent.
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Caption to keep with the asset.
    #[serde(default, alias = "text")]
    pub caption: Option<String>,
    /// Sender label.
    #[serde(default)]
    pub sender: Option<String>,
    /// Source chat.
    #[serde(default)]
    pub chat_id: Option<String>,
    /// Message timestamp.
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl ImportRequest {
    /// Creates a request with only the media handle set.
    #[must_use]
    pub fn new(media_handle: impl Into<String>) -> Self {
        Self {
            media_handle: media_handle.into(),
            ..Self::default()
        }
    }

    /// Sets the file name.
    #[must_use]
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Sets the chat.
    #[must_use]
    pub fn with_chat_id(mut self, chat_id: impl Into<String>) -> Self {
        self.chat_id = Some(chat_id.into());
        self
    }
}

/// Outcome of importing one piece of media.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedAsset {
    /// Asset the media handle maps to.
    pub asset_id: AssetId,
    /// Remote media handle.
    #[serde(rename = "mxcUrl")]
    pub media_handle: String,
    /// File name inside the media library.
    pub file_name: String,
    /// MIME type of the stored file.
    pub mime_type: String,
    /// Where the stored file can be reached.
    pub url: String,
    /// `false` when the handle had been imported before.
    pub created: bool,
}

/// Per-item result of a batch import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchImportItem {
    /// Remote media handle.
    #[serde(rename = "mxcUrl")]
    pub media_handle: String,
    /// Asset ID on success.
    pub asset_id: Option<AssetId>,
    /// Error message on failure.
    pub error: Option<String>,
}
