//! Aggregator output models.

use std::collections::BTreeMap;

use chat2blog_beeper::{Attachment, AttachmentKind, Message};
use serde::{Deserialize, Serialize};

/// Skip label for messages with a text body but no attachments.
pub const SKIPPED_TEXT: &str = "text";

/// Skip label for messages with neither text nor attachments.
pub const SKIPPED_EMPTY: &str = "empty";

/// One image or video attachment, flattened with its message's metadata.
///
/// `id` and `media_handle` are always the attachment's remote identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    /// Item identifier (the media handle).
    pub id: String,
    /// Remote media handle, the import deduplication key.
    #[serde(rename = "mxcUrl")]
    pub media_handle: String,
    /// Image or video.
    pub kind: AttachmentKind,
    /// Identifier of the message carrying the attachment.
    pub message_id: Option<String>,
    /// Position of the attachment within its message.
    pub attachment_index: usize,
    /// Message timestamp.
    pub timestamp: Option<String>,
    /// Message text, or `""`.
    pub text: String,
    /// Sender label.
    pub sender: String,
    /// MIME type.
    pub mime_type: Option<String>,
    /// Original file name.
    pub file_name: Option<String>,
    /// File size in bytes.
    pub file_size: u64,
    /// Poster/thumbnail handle.
    pub poster_handle: Option<String>,
    /// Width in pixels, 0 if unknown.
    pub width: u32,
    /// Height in pixels, 0 if unknown.
    pub height: u32,
    /// Whether the image is an animated GIF.
    pub is_gif: bool,
    /// Sort key of the carrying message.
    pub sort_key: Option<String>,
}

impl MediaItem {
    /// Flattens an attachment of `message`.
    #[must_use]
    pub fn from_attachment(message: &Message, index: usize, attachment: &Attachment) -> Self {
        let size = attachment.size.unwrap_or_default();
        Self {
            id: attachment.id.clone(),
            media_handle: attachment.id.clone(),
            kind: attachment.kind.clone(),
            message_id: message.id.clone(),
            attachment_index: index,
            timestamp: message.timestamp.clone(),
            text: message.text_or_empty().to_string(),
            sender: message.sender_label().to_string(),
            mime_type: attachment.mime_type.clone(),
            file_name: attachment.file_name.clone(),
            file_size: attachment.file_size,
            poster_handle: attachment.poster_img.clone(),
            width: size.width,
            height: size.height,
            is_gif: attachment.is_gif,
            sort_key: message.sort_key.clone(),
        }
    }
}

/// Counters accumulated over every batch of one aggregation call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStats {
    /// Messages seen across all fetched batches.
    pub total_messages: usize,
    /// Media items returned.
    pub media_count: usize,
    /// Skipped messages/attachments by label (`text`, `empty`, or a kind).
    pub skipped_types: BTreeMap<String, usize>,
}

impl AggregateStats {
    /// Counts one skipped message or attachment under `label`.
    pub fn skip(&mut self, label: &str) {
        *self.skipped_types.entry(label.to_string()).or_default() += 1;
    }

    /// Count recorded under `label`.
    #[must_use]
    pub fn skipped(&self, label: &str) -> usize {
        self.skipped_types.get(label).copied().unwrap_or(0)
    }
}

/// One logical page of media returned to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaPage {
    /// Media items in message order.
    pub items: Vec<MediaItem>,
    /// Whether the remote reported more history after the last batch.
    pub has_more: bool,
    /// Cursor for the next call, the sort key of the last message seen.
    pub next_cursor: Option<String>,
    /// Statistics for this call.
    pub stats: AggregateStats,
    /// Remote calls made for this page.
    pub batches: usize,
}

/// Sorts every message of a batch into media items or skip counters.
pub(crate) fn collect_media(
    messages: &[Message],
    items: &mut Vec<MediaItem>,
    stats: &mut AggregateStats,
) {
    for message in messages {
        if message.attachments.is_empty() {
            stats.skip(if message.text.is_some() {
                SKIPPED_TEXT
            } else {
                SKIPPED_EMPTY
            });
            continue;
        }

        for (index, attachment) in message.attachments.iter().enumerate() {
            if attachment.kind.is_media() {
                items.push(MediaItem::from_attachment(message, index, attachment));
            } else {
                stats.skip(attachment.kind.as_str());
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn message(json: &str) -> Message {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_text_and_empty_messages_are_counted() {
        let messages = vec![
            message(r#"{"id": "1", "text": "hello"}"#),
            message(r#"{"id": "2"}"#),
            message(r#"{"id": "3", "text": ""}"#),
        ];
        let mut items = Vec::new();
        let mut stats = AggregateStats::default();

        collect_media(&messages, &mut items, &mut stats);

        assert!(items.is_empty());
        assert_eq!(stats.skipped(SKIPPED_TEXT), 1);
        assert_eq!(stats.skipped(SKIPPED_EMPTY), 2);
    }

    #[test]
    fn test_one_item_per_media_attachment() {
        let messages = vec![message(
            r#"{
                "id": "m", "text": "album", "senderName": "Bob", "sortKey": "9",
                "attachments": [
                    {"id": "mxc://a/1", "type": "img", "mimeType": "image/jpeg"},
                    {"id": "mxc://a/2", "type": "audio"},
                    {"id": "mxc://a/3", "type": "video", "posterImg": "mxc://a/3p",
                     "size": {"width": 1920, "height": 1080}}
                ]
            }"#,
        )];
        let mut items = Vec::new();
        let mut stats = AggregateStats::default();

        collect_media(&messages, &mut items, &mut stats);

        assert_eq!(items.len(), 2);
        for item in &items {
            assert_eq!(item.id, item.media_handle);
            assert_eq!(item.sender, "Bob");
            assert_eq!(item.text, "album");
            assert_eq!(item.sort_key.as_deref(), Some("9"));
        }
        assert_eq!(items[0].attachment_index, 0);
        assert_eq!(items[1].attachment_index, 2);
        assert_eq!(items[1].poster_handle.as_deref(), Some("mxc://a/3p"));
        assert_eq!(items[1].width, 1920);
        assert_eq!(stats.skipped("audio"), 1);
    }

    #[test]
    fn test_media_item_serializes_handle_as_mxc_url() {
        let messages = vec![message(
            r#"{"id": "m", "attachments": [{"id": "mxc://a/1", "type": "img"}]}"#,
        )];
        let mut items = Vec::new();
        collect_media(&messages, &mut items, &mut AggregateStats::default());

        let json = serde_json::to_value(&items[0]).unwrap();
        assert_eq!(json["mxcUrl"], "mxc://a/1");
        assert_eq!(json["id"], "mxc://a/1");
        assert_eq!(json["kind"], "image");
        assert_eq!(json["sender"], "Unknown");
    }
}
