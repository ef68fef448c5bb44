//! Chat listing types.

use serde::{Deserialize, Serialize};

use super::de;

/// A chat as returned by `GET /chats`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    /// Remote chat identifier.
    #[serde(default, deserialize_with = "de::string_or_number_or_default")]
    pub id: String,
    /// Display title.
    #[serde(
        default,
        deserialize_with = "de::non_empty_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub title: Option<String>,
    /// Alternative name some networks report instead of a title.
    #[serde(
        default,
        deserialize_with = "de::non_empty_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,
    /// Chat type (`single`, `group`, ...).
    #[serde(
        rename = "type",
        default,
        deserialize_with = "de::non_empty_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub chat_type: Option<String>,
    /// Network the chat belongs to.
    #[serde(
        default,
        deserialize_with = "de::non_empty_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub network: Option<String>,
    /// Last activity timestamp, kept as the remote's string.
    #[serde(
        default,
        deserialize_with = "de::non_empty_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_activity: Option<String>,
    /// Avatar handle.
    #[serde(
        default,
        deserialize_with = "de::non_empty_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub avatar: Option<String>,
    /// Avatar URL (alternative field name).
    #[serde(
        default,
        deserialize_with = "de::non_empty_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub avatar_url: Option<String>,
    /// Profile image (alternative field name).
    #[serde(
        default,
        deserialize_with = "de::non_empty_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub profile_img: Option<String>,
}

impl Chat {
    /// Title for display: `title`, then `name`, then `"Unknown"`.
    #[must_use]
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or("Unknown")
    }

    /// Chat type, `"unknown"` when the remote omits it.
    #[must_use]
    pub fn kind(&self) -> &str {
        self.chat_type.as_deref().unwrap_or("unknown")
    }

    /// Whether this is a group chat.
    #[must_use]
    pub fn is_group(&self) -> bool {
        self.chat_type.as_deref() == Some("group")
    }

    /// First avatar-like field that is present.
    #[must_use]
    pub fn avatar(&self) -> Option<&str> {
        self.avatar
            .as_deref()
            .or(self.avatar_url.as_deref())
            .or(self.profile_img.as_deref())
    }

    /// Sort key for [`sort_by_last_activity`]; absent sorts as `""`.
    #[must_use]
    pub fn last_activity_key(&self) -> &str {
        self.last_activity.as_deref().unwrap_or("")
    }
}

/// Which chats a listing should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChatFilter {
    /// Every chat.
    #[default]
    All,
    /// Only chats whose type is `group`.
    Group,
}

impl ChatFilter {
    /// Whether `chat` passes this filter.
    #[must_use]
    pub fn matches(self, chat: &Chat) -> bool {
        match self {
            Self::All => true,
            Self::Group => chat.is_group(),
        }
    }
}

/// Sorts chats by `lastActivity`, newest first.
///
/// Timestamps are compared as plain strings, not parsed, so formats that are
/// not lexicographically ordered will not sort chronologically. Chats without
/// a timestamp sort last. The sort is stable.
pub fn sort_by_last_activity(chats: &mut [Chat]) {
    chats.sort_by(|a, b| b.last_activity_key().cmp(a.last_activity_key()));
}
