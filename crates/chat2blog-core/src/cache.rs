//! In-memory media cache.
//!
//! Downloaded media is memoized per media handle for the lifetime of the
//! cache object. Entries are never evicted; drop the cache or call
//! [`MediaCache::clear`] to release memory. Failed downloads are not cached,
//! and two concurrent misses for the same handle both hit the remote.

use std::collections::HashMap;
use std::future::Future;

use chat2blog_beeper::MediaBlob;
use tokio::sync::RwLock;
use tracing::debug;

use crate::data_url;
use crate::source::MediaSource;

/// Process-lifetime cache of downloaded media, keyed by media handle.
#[derive(Debug, Default)]
pub struct MediaCache {
    entries: RwLock<HashMap<String, MediaBlob>>,
}

impl MediaCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the media for `handle`, downloading it on a miss.
    ///
    /// # Errors
    ///
    /// Returns the download error; nothing is cached in that case.
    pub async fn fetch<S: MediaSource + Sync>(
        &self,
        source: &S,
        handle: &str,
    ) -> chat2blog_beeper::Result<MediaBlob> {
        if let Some(blob) = self.entries.read().await.get(handle) {
            debug!(handle, "Media cache hit");
            return Ok(blob.clone());
        }

        let blob = source.fetch_media(handle).await?;
        debug!(handle, bytes = blob.len(), "Media cached");
        self.entries
            .write()
            .await
            .insert(handle.to_string(), blob.clone());
        Ok(blob)
    }

    /// Returns the media for `handle` as a base64 `data:` URL.
    ///
    /// # Errors
    ///
    /// Returns the download error.
    pub async fn fetch_data_url<S: MediaSource + Sync>(
        &self,
        source: &S,
        handle: &str,
    ) -> chat2blog_beeper::Result<String> {
        let blob = self.fetch(source, handle).await?;
        Ok(data_url::encode(&blob))
    }

    /// Wraps `source` so that every download goes through this cache.
    #[must_use]
    pub const fn through<'a, S>(&'a self, source: &'a S) -> CachedSource<'a, S> {
        CachedSource {
            cache: self,
            source,
        }
    }

    /// Whether `handle` is cached.
    pub async fn contains(&self, handle: &str) -> bool {
        self.entries.read().await.contains_key(handle)
    }

    /// Number of cached entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Drops every cached entry.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

/// A media source whose downloads are memoized in a [`MediaCache`].
#[derive(Debug)]
pub struct CachedSource<'a, S> {
    cache: &'a MediaCache,
    source: &'a S,
}

impl<S: MediaSource + Sync> MediaSource for CachedSource<'_, S> {
    fn fetch_media(
        &self,
        handle: &str,
    ) -> impl Future<Output = chat2blog_beeper::Result<MediaBlob>> + Send {
        self.cache.fetch(self.source, handle)
    }
}
