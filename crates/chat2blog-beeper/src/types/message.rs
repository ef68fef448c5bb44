//! Message and attachment types.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::de;

/// Pagination direction for the messages endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Walk into the past (older messages).
    #[default]
    Before,
    /// Walk towards the present (newer messages).
    After,
}

impl Direction {
    /// Query parameter value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
        }
    }
}

/// Kind of an attachment.
///
/// The two kinds that can be imported are closed variants; every other label
/// the remote reports is preserved verbatim so it can be counted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AttachmentKind {
    /// Still image (`img` on the wire).
    Image,
    /// Video.
    Video,
    /// Anything else, e.g. `audio` or `unknown`.
    Other(String),
}

impl AttachmentKind {
    /// Label used for display and skip statistics.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Other(label) => label,
        }
    }

    /// Whether attachments of this kind become media items.
    #[must_use]
    pub const fn is_media(&self) -> bool {
        matches!(self, Self::Image | Self::Video)
    }
}

impl Default for AttachmentKind {
    fn default() -> Self {
        Self::Other("unknown".to_string())
    }
}

impl From<String> for AttachmentKind {
    fn from(label: String) -> Self {
        match label.as_str() {
            "img" | "image" => Self::Image,
            "video" => Self::Video,
            "" => Self::default(),
            _ => Self::Other(label),
        }
    }
}

impl From<AttachmentKind> for String {
    fn from(kind: AttachmentKind) -> Self {
        match kind {
            AttachmentKind::Other(label) => label,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pixel dimensions of an attachment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    #[serde(default, deserialize_with = "de::lenient")]
    pub width: u32,
    /// Height in pixels.
    #[serde(default, deserialize_with = "de::lenient")]
    pub height: u32,
}

/// A file attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// Media handle (`mxc://...`); the import deduplication key.
    #[serde(default, deserialize_with = "de::lenient")]
    pub id: String,
    /// Attachment kind.
    #[serde(rename = "type", default, deserialize_with = "de::lenient")]
    pub kind: AttachmentKind,
    /// MIME type.
    #[serde(default, deserialize_with = "de::non_empty_string")]
    pub mime_type: Option<String>,
    /// Original file name.
    #[serde(default, deserialize_with = "de::non_empty_string")]
    pub file_name: Option<String>,
    /// File size in bytes.
    #[serde(default, deserialize_with = "de::lenient")]
    pub file_size: u64,
    /// Poster/thumbnail handle.
    #[serde(default, deserialize_with = "de::non_empty_string")]
    pub poster_img: Option<String>,
    /// Pixel dimensions.
    #[serde(default, deserialize_with = "de::lenient")]
    pub size: Option<Dimensions>,
    /// Whether the image is an animated GIF.
    #[serde(default, deserialize_with = "de::lenient")]
    pub is_gif: bool,
}

/// A chat message as returned by `GET /chats/{id}/messages`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Remote message identifier.
    #[serde(default, deserialize_with = "de::string_or_number")]
    pub id: Option<String>,
    /// Message timestamp.
    #[serde(default, deserialize_with = "de::string_or_number")]
    pub timestamp: Option<String>,
    /// Sender display name.
    #[serde(default, deserialize_with = "de::non_empty_string")]
    pub sender_name: Option<String>,
    /// Whether the local user sent this message.
    #[serde(default, deserialize_with = "de::lenient")]
    pub is_sender: bool,
    /// Free-text body.
    #[serde(default, deserialize_with = "de::non_empty_string")]
    pub text: Option<String>,
    /// Opaque pagination key.
    #[serde(default, deserialize_with = "de::string_or_number")]
    pub sort_key: Option<String>,
    /// Attachments in message order.
    #[serde(default, deserialize_with = "de::lenient")]
    pub attachments: Vec<Attachment>,
}

impl Message {
    /// Sender label: name, else `"You"` for own messages, else `"Unknown"`.
    #[must_use]
    pub fn sender_label(&self) -> &str {
        match (&self.sender_name, self.is_sender) {
            (Some(name), _) => name,
            (None, true) => "You",
            (None, false) => "Unknown",
        }
    }

    /// The text body, or `""`.
    #[must_use]
    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_kind_labels() {
        assert_eq!(AttachmentKind::from("img".to_string()), AttachmentKind::Image);
        assert_eq!(AttachmentKind::from("image".to_string()), AttachmentKind::Image);
        assert_eq!(AttachmentKind::from("video".to_string()), AttachmentKind::Video);
        assert_eq!(
            AttachmentKind::from("audio".to_string()),
            AttachmentKind::Other("audio".to_string())
        );
        assert_eq!(AttachmentKind::from(String::new()).as_str(), "unknown");
        assert!(AttachmentKind::Video.is_media());
        assert!(!AttachmentKind::Other("audio".to_string()).is_media());
    }

    #[test]
    fn test_message_deserialization() {
        let json = r#"{
            "id": "m1",
            "timestamp": "2024-06-01T10:00:00Z",
            "senderName": "Alice",
            "text": "look",
            "sortKey": 12345,
            "attachments": [
                {"id": "mxc://beeper.com/abc", "type": "img", "mimeType": "image/png",
                 "fileName": "a.png", "fileSize": 2048, "size": {"width": 640, "height": 480}},
                {"id": "mxc://beeper.com/def", "type": "audio"}
            ]
        }"#;

        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.sort_key.as_deref(), Some("12345"));
        assert_eq!(msg.sender_label(), "Alice");
        assert_eq!(msg.attachments.len(), 2);
        assert_eq!(msg.attachments[0].kind, AttachmentKind::Image);
        assert_eq!(msg.attachments[0].file_size, 2048);
        assert_eq!(msg.attachments[0].size.unwrap().width, 640);
        assert_eq!(msg.attachments[1].kind.as_str(), "audio");
    }

    #[test]
    fn test_message_tolerates_drift() {
        let json = r#"{
            "id": 7,
            "text": "",
            "isSender": true,
            "attachments": null,
            "sortKey": ""
        }"#;

        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.id.as_deref(), Some("7"));
        assert!(msg.text.is_none());
        assert!(msg.attachments.is_empty());
        assert!(msg.sort_key.is_none());
        assert_eq!(msg.sender_label(), "You");
    }

    #[test]
    fn test_attachment_without_type_is_unknown() {
        let att: Attachment =
            serde_json::from_str(r#"{"id": "mxc://x", "fileSize": "big"}"#).unwrap();
        assert_eq!(att.kind.as_str(), "unknown");
        assert_eq!(att.file_size, 0);
    }
}
