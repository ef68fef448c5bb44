//! Paginated list responses.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Whether the remote reports more items beyond this page.
    pub has_more: bool,
}

impl<T> Page<T> {
    /// Creates a page.
    #[must_use]
    pub const fn new(items: Vec<T>, has_more: bool) -> Self {
        Self { items, has_more }
    }

    /// An empty page with `has_more = false`.
    #[must_use]
    pub const fn empty() -> Self {
        Self::new(Vec::new(), false)
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Builds a page from a decoded response body.
///
/// Accepts either `{"items": [...], "hasMore": bool}` or a bare array. Any
/// other shape yields an empty page; items that are not objects are dropped.
pub(crate) fn page_from_value<T: DeserializeOwned>(value: Value, what: &str) -> Page<T> {
    let has_more = value
        .get("hasMore")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let raw_items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("items") {
            Some(Value::Array(items)) => items,
            other => {
                warn!(what, ?other, "Response has no item list, treating as empty");
                return Page::new(Vec::new(), has_more);
            }
        },
        other => {
            warn!(what, ?other, "Unexpected response shape, treating as empty");
            return Page::empty();
        }
    };

    let items = raw_items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!(what, "Dropping undecodable item: {e}");
                None
            }
        })
        .collect();

    Page::new(items, has_more)
}
