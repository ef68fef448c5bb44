//! Admin surface for the media browser.
//!
//! Every operation returns an [`Envelope`], which serializes to
//! `{"success": true, "data": ...}` or `{"success": false, "error": "..."}`.
//! Failures are reported inside the envelope, never as a Rust error.

use chat2blog_beeper::{BeeperClient, Chat, ChatFilter, ConnectionInfo, HandleScheme};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::aggregator::{AggregateStats, MediaAggregator, MediaItem};
use crate::cache::MediaCache;
use crate::compose::{PostAsset, PostFormat, asset_file_name, compose_post, default_file_name};
use crate::data_url;
use crate::error::{Error, Result};
use crate::import::{AssetId, BatchImportItem, ImportRequest, ImportedAsset, MediaImporter};

/// Number of chats requested from the remote by default.
pub const DEFAULT_CHAT_LIMIT: u32 = 200;

/// Skip label for media whose handle the browser cannot load.
pub const SKIPPED_UNSUPPORTED: &str = "unsupported";

/// Response wrapper shared by every admin operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// Whether the operation succeeded.
    pub success: bool,
    /// Payload on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Message on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    /// Successful envelope.
    pub const fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Failed envelope.
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    /// Converts back into a `Result`, with the error message as `Err`.
    ///
    /// # Errors
    ///
    /// Returns the error message of a failed envelope.
    pub fn into_result(self) -> std::result::Result<T, String> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            _ => Err(self.error.unwrap_or_else(|| "Unknown error".to_string())),
        }
    }
}

impl<T> From<Result<T>> for Envelope<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::err(e.to_string()),
        }
    }
}

/// Chat as shown in the chat picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatView {
    /// Chat identifier.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Chat type, `"unknown"` if not reported.
    #[serde(rename = "type")]
    pub kind: String,
    /// Network name.
    pub network: String,
    /// Last activity timestamp.
    pub last_activity: String,
    /// Avatar URL.
    pub avatar: String,
}

impl From<&Chat> for ChatView {
    fn from(chat: &Chat) -> Self {
        Self {
            id: chat.id.clone(),
            title: chat.display_title().to_string(),
            kind: chat.kind().to_string(),
            network: chat.network.clone().unwrap_or_default(),
            last_activity: chat.last_activity_key().to_string(),
            avatar: chat.avatar().unwrap_or_default().to_string(),
        }
    }
}

/// Chat picker payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatList {
    /// Chats, most recently active first.
    pub items: Vec<ChatView>,
    /// Whether the remote has more chats.
    pub has_more: bool,
}

/// Media item as shown in the media grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaView {
    /// Media handle, the same value as `mxcUrl`.
    pub id: String,
    /// Media handle.
    #[serde(rename = "mxcUrl")]
    pub media_handle: String,
    /// `<message id>_<attachment index>`, unique per attachment.
    pub attachment_key: String,
    /// Thumbnail handle: the poster if there is one, else the media itself.
    pub thumbnail: String,
    /// File name, defaulted from the MIME type.
    pub file_name: String,
    /// MIME type.
    pub mime_type: Option<String>,
    /// File size in bytes.
    pub file_size: u64,
    /// `image` or `video`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Whether the image is an animated GIF.
    pub is_gif: bool,
    /// Message timestamp.
    pub timestamp: Option<String>,
    /// Sender label.
    pub sender: String,
    /// Message text.
    pub text: String,
    /// Whether the media handle has been imported.
    pub imported: bool,
}

impl MediaView {
    fn new(item: MediaItem, imported: bool) -> Self {
        let file_name = item
            .file_name
            .clone()
            .unwrap_or_else(|| default_file_name(item.mime_type.as_deref()));
        Self {
            id: item.media_handle.clone(),
            attachment_key: format!(
                "{}_{}",
                item.message_id.as_deref().unwrap_or_default(),
                item.attachment_index
            ),
            thumbnail: item
                .poster_handle
                .unwrap_or_else(|| item.media_handle.clone()),
            media_handle: item.media_handle,
            file_name,
            mime_type: item.mime_type,
            file_size: item.file_size,
            kind: item.kind.to_string(),
            width: item.width,
            height: item.height,
            is_gif: item.is_gif,
            timestamp: item.timestamp,
            sender: item.sender,
            text: item.text,
            imported,
        }
    }
}

/// Media grid payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaListing {
    /// Media on this page.
    pub items: Vec<MediaView>,
    /// Whether older history remains.
    pub has_more: bool,
    /// Cursor for the next page.
    pub next_cursor: Option<String>,
    /// Aggregation statistics.
    pub stats: AggregateStats,
}

/// Result of setting or clearing the access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenStatus {
    /// The token was accepted by the remote.
    pub connected: bool,
    /// Number of accounts visible with the token.
    pub accounts: usize,
    /// The token was removed.
    pub cleared: bool,
}

/// Outcome of importing one aggregated page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageImport {
    /// Per-item results.
    pub results: Vec<BatchImportItem>,
    /// Whether older history remains.
    pub has_more: bool,
    /// Cursor for the next page.
    pub next_cursor: Option<String>,
}

/// Media selected for a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostMedia {
    /// Media handle.
    #[serde(alias = "mxcUrl")]
    pub media_handle: String,
    /// Already-downloaded media as a `data:` URL.
    #[serde(default)]
    pub data_url: Option<String>,
}

impl PostMedia {
    /// Media to be downloaded from the remote.
    #[must_use]
    pub fn remote(media_handle: impl Into<String>) -> Self {
        Self {
            media_handle: media_handle.into(),
            data_url: None,
        }
    }
}

/// Request to build a post from chat media.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRequest {
    /// Post title, also the base for imported file names.
    pub title: String,
    /// Optional intro paragraph.
    #[serde(default)]
    pub text: Option<String>,
    /// Layout.
    #[serde(default)]
    pub format: PostFormat,
    /// Media, in post order.
    pub media: Vec<PostMedia>,
    /// Chat the media came from.
    #[serde(default)]
    pub chat_id: Option<String>,
}

/// Media handle and the asset used for it in a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostImage {
    /// Media handle.
    #[serde(rename = "mxcUrl")]
    pub media_handle: String,
    /// Asset identifier.
    pub asset_id: AssetId,
}

/// Composed post, ready to hand to a blog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDraft {
    /// Post title.
    pub title: String,
    /// Block markup.
    pub content: String,
    /// Layout used.
    pub format: PostFormat,
    /// Assets newly imported for this post.
    pub imported: usize,
    /// Assets used, in post order.
    pub images: Vec<PostImage>,
    /// Messages for media that could not be imported.
    pub errors: Vec<String>,
}

/// Operations behind the media browser.
#[derive(Debug)]
pub struct AdminService {
    client: BeeperClient,
    aggregator: MediaAggregator,
    importer: MediaImporter,
    cache: MediaCache,
    chat_limit: u32,
}

impl AdminService {
    /// Creates the service.
    #[must_use]
    pub fn new(client: BeeperClient, aggregator: MediaAggregator, importer: MediaImporter) -> Self {
        Self {
            client,
            aggregator,
            importer,
            cache: MediaCache::new(),
            chat_limit: DEFAULT_CHAT_LIMIT,
        }
    }

    /// Sets how many chats are requested.
    #[must_use]
    pub const fn with_chat_limit(mut self, chat_limit: u32) -> Self {
        self.chat_limit = chat_limit;
        self
    }

    /// Remote client.
    #[must_use]
    pub const fn client(&self) -> &BeeperClient {
        &self.client
    }

    /// Media download cache.
    #[must_use]
    pub const fn cache(&self) -> &MediaCache {
        &self.cache
    }

    /// Checks the configured token against the remote.
    pub async fn test_connection(&self) -> Envelope<ConnectionInfo> {
        self.client.test_connection().await.map_err(Error::from).into()
    }

    /// Replaces the access token; an empty or missing token clears it.
    ///
    /// A new token is checked against the remote right away. The token stays
    /// set even when that check fails.
    pub async fn apply_token(&mut self, token: Option<String>) -> Envelope<TokenStatus> {
        self.client.set_token(token);
        if !self.client.is_configured() {
            return Envelope::ok(TokenStatus {
                connected: false,
                accounts: 0,
                cleared: true,
            });
        }

        match self.client.test_connection().await {
            Ok(info) => Envelope::ok(TokenStatus {
                connected: true,
                accounts: info.accounts,
                cleared: false,
            }),
            Err(e) => Envelope::err(format!("Token saved but connection failed: {e}")),
        }
    }

    /// Lists chats for the chat picker.
    pub async fn get_all_chats(&self, filter: ChatFilter) -> Envelope<ChatList> {
        self.try_get_all_chats(filter).await.into()
    }

    async fn try_get_all_chats(&self, filter: ChatFilter) -> Result<ChatList> {
        let page = self.client.list_chats_filtered(self.chat_limit, filter).await?;
        Ok(ChatList {
            items: page.items.iter().map(ChatView::from).collect(),
            has_more: page.has_more,
        })
    }

    /// Next page of media for a chat, annotated for display.
    ///
    /// Items whose handle the browser cannot load are left out.
    pub async fn get_media_messages(&self, chat_id: &str, cursor: Option<&str>) -> Envelope<MediaListing> {
        self.try_get_media_messages(chat_id, cursor).await.into()
    }

    async fn try_get_media_messages(&self, chat_id: &str, cursor: Option<&str>) -> Result<MediaListing> {
        let page = self.aggregate(chat_id, cursor).await?;
        let mut stats = page.stats;

        let mut items = Vec::with_capacity(page.items.len());
        for item in page.items {
            if !is_browsable(&item) {
                stats.skip(SKIPPED_UNSUPPORTED);
                continue;
            }
            let imported = self.importer.repository().is_imported(&item.media_handle).await?;
            items.push(MediaView::new(item, imported));
        }
        stats.media_count = items.len();

        Ok(MediaListing {
            items,
            has_more: page.has_more,
            next_cursor: page.next_cursor,
            stats,
        })
    }

    /// Imports one piece of media, downloading it unless already imported.
    pub async fn import_media(&self, request: &ImportRequest) -> Envelope<ImportedAsset> {
        let source = self.cache.through(&self.client);
        self.importer.import(&source, request).await.into()
    }

    /// Aggregates the next page of a chat and imports everything on it.
    pub async fn import_page(&self, chat_id: &str, cursor: Option<&str>) -> Envelope<PageImport> {
        self.try_import_page(chat_id, cursor).await.into()
    }

    async fn try_import_page(&self, chat_id: &str, cursor: Option<&str>) -> Result<PageImport> {
        let page = self.aggregate(chat_id, cursor).await?;
        let requests: Vec<ImportRequest> = page
            .items
            .iter()
            .filter(|item| is_browsable(item))
            .map(|item| ImportRequest {
                media_handle: item.media_handle.clone(),
                file_name: item.file_name.clone(),
                mime_type: item.mime_type.clone(),
                caption: Some(item.text.clone()).filter(|t| !t.is_empty()),
                sender: Some(item.sender.clone()),
                chat_id: Some(chat_id.to_string()),
                timestamp: item.timestamp.clone(),
            })
            .collect();

        let source = self.cache.through(&self.client);
        let results = self.importer.import_many(&source, &requests).await;
        Ok(PageImport {
            results,
            has_more: page.has_more,
            next_cursor: page.next_cursor,
        })
    }

    /// Every imported media handle.
    pub async fn imported_handles(&self) -> Envelope<Vec<String>> {
        self.importer.repository().imported_handles().await.into()
    }

    /// Imports the selected media and composes a post around it.
    ///
    /// Media that was imported before is reused. Individual import failures
    /// are listed in the draft; the call only fails when nothing could be
    /// imported.
    pub async fn create_post(&self, request: &PostRequest) -> Envelope<PostDraft> {
        self.try_create_post(request).await.into()
    }

    async fn try_create_post(&self, request: &PostRequest) -> Result<PostDraft> {
        let title = request.title.trim();
        if title.is_empty() {
            return Err(Error::InvalidRequest("Title is required".to_string()));
        }
        if request.media.is_empty() {
            return Err(Error::InvalidRequest("No media selected".to_string()));
        }

        let total = request.media.len();
        let mut assets = Vec::with_capacity(total);
        let mut images = Vec::with_capacity(total);
        let mut errors = Vec::new();
        let mut imported = 0;

        for (index, media) in request.media.iter().enumerate() {
            match self.import_for_post(request, title, index, media).await {
                Ok(asset) => {
                    if asset.created {
                        imported += 1;
                    }
                    images.push(PostImage {
                        media_handle: asset.media_handle.clone(),
                        asset_id: asset.asset_id,
                    });
                    assets.push(PostAsset::from(&asset));
                }
                Err(e) => {
                    warn!(handle = %media.media_handle, error = %e, "Skipping media for post");
                    errors.push(e.to_string());
                }
            }
        }

        if assets.is_empty() {
            return Err(Error::InvalidRequest(format!(
                "Failed to import media: {}",
                errors.join(", ")
            )));
        }

        let content = compose_post(request.text.as_deref(), &assets, request.format);
        info!(title, assets = assets.len(), imported, "Composed post");

        Ok(PostDraft {
            title: title.to_string(),
            content,
            format: request.format,
            imported,
            images,
            errors,
        })
    }

    async fn import_for_post(
        &self,
        request: &PostRequest,
        title: &str,
        index: usize,
        media: &PostMedia,
    ) -> Result<ImportedAsset> {
        let mut import = ImportRequest::new(media.media_handle.clone());
        import.chat_id.clone_from(&request.chat_id);

        if self.importer.repository().is_imported(&media.media_handle).await? {
            let source = self.cache.through(&self.client);
            return self.importer.import(&source, &import).await;
        }

        let blob = match &media.data_url {
            Some(url) => data_url::decode(url)?,
            None => self.cache.fetch(&self.client, &media.media_handle).await?,
        };
        import.file_name = Some(asset_file_name(
            title,
            index,
            request.media.len(),
            Some(blob.mime_type()),
        ));
        self.importer.import_bytes(&import, &blob).await
    }

    async fn aggregate(&self, chat_id: &str, cursor: Option<&str>) -> Result<crate::MediaPage> {
        if chat_id.trim().is_empty() {
            return Err(Error::InvalidRequest("Chat ID required".to_string()));
        }
        let cursor = cursor.filter(|c| !c.is_empty());
        self.aggregator.media_page(&self.client, chat_id, cursor).await
    }
}

fn is_browsable(item: &MediaItem) -> bool {
    !item.media_handle.is_empty() && HandleScheme::of(&item.media_handle).is_browsable()
}
