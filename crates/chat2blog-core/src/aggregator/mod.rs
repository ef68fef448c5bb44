//! Media aggregation over paginated chat history.
//!
//! The remote API has no "messages with media" filter, so every message is
//! fetched and inspected here. One call walks backwards through at most
//! [`AggregatorConfig::max_batches`] pages and stops as soon as a batch
//! yields any media; callers page further with the returned cursor.
//!
//! # Example
//!
//! ```ignore
//! use chat2blog_core::{AggregatorConfig, MediaAggregator};
//!
//! let aggregator = MediaAggregator::new(AggregatorConfig::default());
//! let page = aggregator.media_page(&client, "chat-id", None).await?;
//! for item in &page.items {
//!     println!("{} from {}", item.media_handle, item.sender);
//! }
//! if page.has_more {
//!     let older = aggregator
//!         .media_page(&client, "chat-id", page.next_cursor.as_deref())
//!         .await?;
//! }
//! ```

mod model;

pub use model::{AggregateStats, MediaItem, MediaPage, SKIPPED_EMPTY, SKIPPED_TEXT};

use tracing::{debug, warn};

use crate::error::Result;
use crate::source::MessageSource;

/// Default ceiling on remote calls per aggregation.
pub const DEFAULT_MAX_BATCHES: usize = 5;

/// Aggregation bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregatorConfig {
    /// Maximum remote calls per aggregation call. Values below 1 act as 1.
    pub max_batches: usize,
    /// Messages requested per batch; `None` uses the remote's page size.
    pub batch_size: Option<u32>,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            max_batches: DEFAULT_MAX_BATCHES,
            batch_size: None,
        }
    }
}

impl AggregatorConfig {
    /// Sets the batch ceiling.
    #[must_use]
    pub const fn with_max_batches(mut self, max_batches: usize) -> Self {
        self.max_batches = max_batches;
        self
    }

    /// Sets the per-batch message limit.
    #[must_use]
    pub const fn with_batch_size(mut self, batch_size: Option<u32>) -> Self {
        self.batch_size = batch_size;
        self
    }
}

/// Collects image and video attachments from a chat's history.
#[derive(Debug, Clone, Default)]
pub struct MediaAggregator {
    config: AggregatorConfig,
}

impl MediaAggregator {
    /// Creates an aggregator.
    #[must_use]
    pub const fn new(config: AggregatorConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Fetches the next page of media older than `cursor`.
    ///
    /// Batches are fetched strictly one after another. The loop ends when
    /// the remote reports no more history, the batch ceiling is reached, a
    /// batch comes back empty, or any media has been collected.
    ///
    /// # Errors
    ///
    /// Returns the first remote failure. Items gathered by earlier batches
    /// of the same call are discarded.
    pub async fn media_page<S: MessageSource + Sync>(
        &self,
        source: &S,
        chat_id: &str,
        cursor: Option<&str>,
    ) -> Result<MediaPage> {
        let max_batches = self.config.max_batches.max(1);
        let mut cursor = cursor.map(str::to_string);
        let mut items = Vec::new();
        let mut stats = AggregateStats::default();
        let mut has_more = true;
        let mut batches = 0;

        while has_more && batches < max_batches {
            batches += 1;
            let page = source
                .older_messages(chat_id, self.config.batch_size, cursor.as_deref())
                .await?;

            stats.total_messages += page.items.len();
            model::collect_media(&page.items, &mut items, &mut stats);
            has_more = page.has_more;

            debug!(
                chat_id,
                batch = batches,
                messages = page.items.len(),
                media = items.len(),
                has_more,
                cursor = cursor.as_deref(),
                "Fetched message batch"
            );

            let Some(last) = page.items.last() else {
                break;
            };
            match &last.sort_key {
                Some(sort_key) => cursor = Some(sort_key.clone()),
                None => {
                    warn!(chat_id, "Last message has no sort key, cannot page further");
                    has_more = false;
                    break;
                }
            }

            if !items.is_empty() {
                break;
            }
        }

        stats.media_count = items.len();
        Ok(MediaPage {
            items,
            has_more,
            next_cursor: cursor,
            stats,
            batches,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::future::{Future, ready};
    use std::sync::Mutex;

    use chat2blog_beeper::{Attachment, AttachmentKind, Error as RemoteError, Message, Page};
    use proptest::prelude::*;

    use super::*;
    use crate::error::Error;

    /// Serves scripted pages in order and records every cursor it was asked for.
    struct ScriptedSource {
        pages: Mutex<Vec<chat2blog_beeper::Result<Page<Message>>>>,
        cursors: Mutex<Vec<Option<String>>>,
    }

    impl ScriptedSource {
        fn new(pages: Vec<Page<Message>>) -> Self {
            Self::with_results(pages.into_iter().map(Ok).collect())
        }

        fn with_results(mut pages: Vec<chat2blog_beeper::Result<Page<Message>>>) -> Self {
            pages.reverse();
            Self {
                pages: Mutex::new(pages),
                cursors: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.cursors.lock().unwrap().len()
        }

        fn cursors(&self) -> Vec<Option<String>> {
            self.cursors.lock().unwrap().clone()
        }
    }

    impl MessageSource for ScriptedSource {
        fn older_messages(
            &self,
            _chat_id: &str,
            _limit: Option<u32>,
            cursor: Option<&str>,
        ) -> impl Future<Output = chat2blog_beeper::Result<Page<Message>>> + Send {
            self.cursors
                .lock()
                .unwrap()
                .push(cursor.map(str::to_string));
            let next = self.pages.lock().unwrap().pop().unwrap_or_else(|| Ok(Page::empty()));
            ready(next)
        }
    }

    #[derive(Debug, Clone, Copy)]
    enum Shape {
        Text,
        Empty,
        Image,
        Video,
        Audio,
    }

    fn message(key: usize, shape: Shape) -> Message {
        let attachment = |kind: AttachmentKind| Attachment {
            id: format!("mxc://test/{key}"),
            kind,
            ..Attachment::default()
        };
        let (text, attachments) = match shape {
            Shape::Text => (Some(format!("message {key}")), Vec::new()),
            Shape::Empty => (None, Vec::new()),
            Shape::Image => (None, vec![attachment(AttachmentKind::Image)]),
            Shape::Video => (Some("clip".to_string()), vec![attachment(AttachmentKind::Video)]),
            Shape::Audio => (None, vec![attachment(AttachmentKind::Other("audio".into()))]),
        };
        Message {
            id: Some(format!("m{key}")),
            sort_key: Some(key.to_string()),
            text,
            attachments,
            ..Message::default()
        }
    }

    /// Builds a page whose sort keys continue from `start`, descending.
    fn page(start: usize, shapes: &[Shape], has_more: bool) -> Page<Message> {
        let items = shapes
            .iter()
            .enumerate()
            .map(|(i, shape)| message(start - i, *shape))
            .collect();
        Page::new(items, has_more)
    }

    fn text_page(start: usize, len: usize) -> Page<Message> {
        page(start, &vec![Shape::Text; len], true)
    }

    #[tokio::test]
    async fn test_media_in_fourth_batch() {
        let mut fourth = vec![Shape::Text; 10];
        fourth[2] = Shape::Image;
        let source = ScriptedSource::new(vec![
            text_page(1000, 50),
            text_page(950, 50),
            text_page(900, 50),
            page(850, &fourth, true),
            text_page(840, 50),
        ]);

        let result = MediaAggregator::default()
            .media_page(&source, "chat", None)
            .await
            .unwrap();

        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].media_handle, "mxc://test/848");
        assert_eq!(result.stats.total_messages, 160);
        assert_eq!(result.stats.media_count, 1);
        assert_eq!(result.stats.skipped(SKIPPED_TEXT), 159);
        assert_eq!(result.batches, 4);
        assert_eq!(source.calls(), 4);
        assert_eq!(result.next_cursor.as_deref(), Some("841"));
        assert!(result.has_more);
    }

    #[tokio::test]
    async fn test_first_batch_with_media_returns_immediately() {
        let source = ScriptedSource::new(vec![
            page(100, &[Shape::Text, Shape::Image, Shape::Image, Shape::Empty], true),
            text_page(96, 50),
        ]);

        let result = MediaAggregator::default()
            .media_page(&source, "chat", None)
            .await
            .unwrap();

        assert_eq!(result.items.len(), 2);
        assert_eq!(result.next_cursor.as_deref(), Some("97"));
        assert!(result.has_more);
        assert_eq!(source.calls(), 1);
        assert_eq!(result.stats.skipped(SKIPPED_TEXT), 1);
        assert_eq!(result.stats.skipped(SKIPPED_EMPTY), 1);
    }

    #[tokio::test]
    async fn test_all_text_history_hits_batch_ceiling() {
        let pages = (0..10).map(|i| text_page(10_000 - i * 50, 50)).collect();
        let source = ScriptedSource::new(pages);

        let result = MediaAggregator::default()
            .media_page(&source, "chat", Some("10001"))
            .await
            .unwrap();

        assert!(result.items.is_empty());
        assert!(result.has_more);
        assert_eq!(source.calls(), DEFAULT_MAX_BATCHES);
        assert_eq!(result.stats.total_messages, 250);
        assert_eq!(result.next_cursor.as_deref(), Some("9751"));
    }

    #[tokio::test]
    async fn test_cursor_advances_to_last_sort_key() {
        let source = ScriptedSource::new(vec![
            page(30, &[Shape::Text, Shape::Text], true),
            page(28, &[Shape::Empty], true),
            page(27, &[Shape::Video], false),
        ]);

        let result = MediaAggregator::default()
            .media_page(&source, "chat", Some("31"))
            .await
            .unwrap();

        assert_eq!(
            source.cursors(),
            [Some("31".to_string()), Some("29".to_string()), Some("28".to_string())]
        );
        assert_eq!(result.next_cursor.as_deref(), Some("27"));
        assert!(!result.has_more);
        assert_eq!(result.items[0].kind, AttachmentKind::Video);
        assert_eq!(result.items[0].text, "clip");
    }

    #[tokio::test]
    async fn test_empty_page_stops_and_keeps_cursor() {
        // A remote that claims more history but returns nothing.
        let source = ScriptedSource::new(vec![
            text_page(10, 2),
            Page::new(Vec::new(), true),
            text_page(8, 2),
        ]);

        let result = MediaAggregator::default()
            .media_page(&source, "chat", None)
            .await
            .unwrap();

        assert_eq!(source.calls(), 2);
        assert_eq!(result.next_cursor.as_deref(), Some("9"));
        assert!(result.has_more);
    }

    #[tokio::test]
    async fn test_missing_sort_key_ends_history() {
        let mut last = message(5, Shape::Text);
        last.sort_key = None;
        let source = ScriptedSource::new(vec![Page::new(vec![message(6, Shape::Text), last], true)]);

        let result = MediaAggregator::default()
            .media_page(&source, "chat", Some("7"))
            .await
            .unwrap();

        assert_eq!(source.calls(), 1);
        assert!(!result.has_more);
        assert_eq!(result.next_cursor.as_deref(), Some("7"));
    }

    #[tokio::test]
    async fn test_failure_discards_partial_results() {
        let source = ScriptedSource::with_results(vec![
            Ok(text_page(100, 5)),
            Err(RemoteError::api(503, None)),
            Ok(page(90, &[Shape::Image], false)),
        ]);

        let err = MediaAggregator::default()
            .media_page(&source, "chat", None)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Remote(RemoteError::Api { status: 503, .. })));
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_unknown_kinds_are_counted() {
        let source = ScriptedSource::new(vec![page(
            3,
            &[Shape::Audio, Shape::Audio, Shape::Text],
            false,
        )]);

        let result = MediaAggregator::default()
            .media_page(&source, "chat", None)
            .await
            .unwrap();

        assert!(result.items.is_empty());
        assert_eq!(result.stats.skipped("audio"), 2);
        assert!(!result.has_more);
    }

    #[tokio::test]
    async fn test_zero_max_batches_still_fetches_once() {
        let source = ScriptedSource::new(vec![text_page(10, 3), text_page(7, 3)]);
        let aggregator = MediaAggregator::new(AggregatorConfig::default().with_max_batches(0));

        let result = aggregator.media_page(&source, "chat", None).await.unwrap();

        assert_eq!(result.batches, 1);
        assert_eq!(source.calls(), 1);
    }

    fn shape_strategy() -> impl Strategy<Value = Shape> {
        prop_oneof![
            6 => Just(Shape::Text),
            1 => Just(Shape::Empty),
            1 => Just(Shape::Image),
            1 => Just(Shape::Video),
            1 => Just(Shape::Audio),
        ]
    }

    /// Non-empty batches; the final one reports the end of history.
    fn history_strategy() -> impl Strategy<Value = Vec<Page<Message>>> {
        prop::collection::vec(prop::collection::vec(shape_strategy(), 1..20), 1..9).prop_map(
            |batches| {
                let count = batches.len();
                let mut next_key = 10_000;
                batches
                    .iter()
                    .enumerate()
                    .map(|(i, shapes)| {
                        let page = page(next_key, shapes, i + 1 < count);
                        next_key -= shapes.len();
                        page
                    })
                    .collect()
            },
        )
    }

    fn has_media(page: &Page<Message>) -> bool {
        page.items
            .iter()
            .any(|m| m.attachments.iter().any(|a| a.kind.is_media()))
    }

    proptest! {
        #[test]
        fn prop_aggregation_bounds(history in history_strategy()) {
            let source = ScriptedSource::new(history.clone());
            let result = tokio_test::block_on(
                MediaAggregator::default().media_page(&source, "chat", None),
            )
            .unwrap();
            let calls = source.calls();

            // Batch ceiling.
            prop_assert!(calls <= DEFAULT_MAX_BATCHES);

            // Early exit: stop right after the first batch with media.
            let expected_calls = history
                .iter()
                .position(has_media)
                .map_or(history.len(), |i| i + 1)
                .min(DEFAULT_MAX_BATCHES);
            prop_assert_eq!(calls, expected_calls);

            // Stats additivity.
            let fetched: usize = history[..calls].iter().map(|p| p.items.len()).sum();
            prop_assert_eq!(result.stats.total_messages, fetched);
            prop_assert_eq!(result.stats.media_count, result.items.len());

            // End of history is reported once the final page was fetched.
            if calls == history.len() {
                prop_assert!(!result.has_more);
            }

            for item in &result.items {
                prop_assert_eq!(&item.id, &item.media_handle);
            }
        }
    }
}
