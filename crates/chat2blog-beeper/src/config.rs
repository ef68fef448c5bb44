//! Client configuration.

use std::time::Duration;

use url::Url;

use crate::error::Result;

/// Default base URL of the Beeper Desktop API.
pub const DEFAULT_API_BASE: &str = "http://localhost:23373/v1";

/// Default timeout for JSON requests.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default timeout for media downloads.
pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration for [`BeeperClient`](crate::BeeperClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the API, including the version prefix.
    pub api_base: Url,
    /// Timeout applied to JSON requests.
    pub request_timeout: Duration,
    /// Timeout applied to media downloads.
    pub download_timeout: Duration,
    /// Local media server that serves `localmxc://` files by id.
    ///
    /// When set, assets that Beeper resolves to a local path are fetched
    /// through this server instead of being read from disk.
    pub local_media_server: Option<Url>,
}

impl ClientConfig {
    /// Creates a configuration for the given API base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn new(api_base: impl AsRef<str>) -> Result<Self> {
        Ok(Self {
            api_base: Url::parse(api_base.as_ref())?,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            download_timeout: DEFAULT_DOWNLOAD_TIMEOUT,
            local_media_server: None,
        })
    }

    /// Configuration for Beeper Desktop on this machine.
    ///
    /// # Errors
    ///
    /// Returns an error if URL parsing fails.
    pub fn local() -> Result<Self> {
        Self::new(DEFAULT_API_BASE)
    }

    /// Sets the JSON request timeout.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the media download timeout.
    #[must_use]
    pub const fn with_download_timeout(mut self, timeout: Duration) -> Self {
        self.download_timeout = timeout;
        self
    }

    /// Routes local assets through a media server.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn with_local_media_server(mut self, url: impl AsRef<str>) -> Result<Self> {
        self.local_media_server = Some(Url::parse(url.as_ref())?);
        Ok(self)
    }
}
