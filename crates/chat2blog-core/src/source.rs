//! Seams between the core logic and the remote chat API.
//!
//! The aggregator, cache and importer only need these two capabilities, so
//! tests can drive them with scripted sources instead of an HTTP server.

use std::future::Future;

use chat2blog_beeper::{BeeperClient, Direction, MediaBlob, Message, Page};

/// Something that can page through a chat's history, newest first.
pub trait MessageSource {
    /// Fetches the page of messages older than `cursor` (or the newest page).
    fn older_messages(
        &self,
        chat_id: &str,
        limit: Option<u32>,
        cursor: Option<&str>,
    ) -> impl Future<Output = chat2blog_beeper::Result<Page<Message>>> + Send;
}

/// Something that can download media by handle.
pub trait MediaSource {
    /// Downloads the media behind `handle`.
    fn fetch_media(
        &self,
        handle: &str,
    ) -> impl Future<Output = chat2blog_beeper::Result<MediaBlob>> + Send;
}

impl MessageSource for BeeperClient {
    fn older_messages(
        &self,
        chat_id: &str,
        limit: Option<u32>,
        cursor: Option<&str>,
    ) -> impl Future<Output = chat2blog_beeper::Result<Page<Message>>> + Send {
        self.get_chat_messages(chat_id, limit, cursor, Direction::Before)
    }
}

impl MediaSource for BeeperClient {
    fn fetch_media(
        &self,
        handle: &str,
    ) -> impl Future<Output = chat2blog_beeper::Result<MediaBlob>> + Send {
        self.download_media(handle)
    }
}
