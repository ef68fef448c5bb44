//! HTTP client for the Beeper Desktop API.

use std::path::{Path, PathBuf};

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::media::{HandleScheme, MediaBlob, OCTET_STREAM, mime_for_path};
use crate::types::{
    Account, Chat, ChatFilter, ConnectionInfo, Direction, Message, Page, page_from_value,
    sort_by_last_activity,
};

/// Content type assumed for asset bodies that do not declare one.
const DEFAULT_ASSET_CONTENT_TYPE: &str = "image/jpeg";

/// Response of `POST /assets/download` when Beeper has the file on disk.
#[derive(Debug, Deserialize)]
struct AssetLocation {
    #[serde(rename = "srcURL", default)]
    src_url: Option<String>,
}

/// Client for the Beeper Desktop REST API.
///
/// All requests carry the access token as a bearer credential. Without a
/// token every operation fails with [`Error::NotConfigured`] before any
/// request is sent.
#[derive(Debug, Clone)]
pub struct BeeperClient {
    config: ClientConfig,
    token: Option<String>,
    http_client: Client,
}

impl BeeperClient {
    /// Creates a client without an access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("chat2blog/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::InvalidConfig(format!("HTTP client: {e}")))?;

        Ok(Self {
            config,
            token: None,
            http_client,
        })
    }

    /// Sets the access token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.set_token(Some(token.into()));
        self
    }

    /// Replaces the access token; surrounding whitespace is trimmed and an
    /// empty token clears it.
    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
    }

    /// Returns the access token, if any.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Whether an access token is present.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.token.is_some()
    }

    /// Returns the client configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Lists connected accounts.
    ///
    /// # Errors
    ///
    /// Returns an error if no token is configured, the remote is unreachable
    /// or it answers with a non-2xx status.
    pub async fn get_accounts(&self) -> Result<Vec<Account>> {
        let url = self.endpoint(&["accounts"])?;
        let Some(value) = lenient(self.get_json(url).await)? else {
            return Ok(Vec::new());
        };
        Ok(page_from_value(value, "accounts").items)
    }

    /// Checks that the token is accepted and summarizes connected accounts.
    ///
    /// # Errors
    ///
    /// Same as [`BeeperClient::get_accounts`].
    pub async fn test_connection(&self) -> Result<ConnectionInfo> {
        let accounts = self.get_accounts().await?;
        let info = ConnectionInfo::from_accounts(&accounts);
        debug!(accounts = info.accounts, networks = ?info.networks, "Connection OK");
        Ok(info)
    }

    /// Lists chats, newest activity first.
    ///
    /// The ordering is a string comparison of `lastActivity`, see
    /// [`sort_by_last_activity`].
    ///
    /// # Errors
    ///
    /// Same as [`BeeperClient::get_accounts`].
    pub async fn list_chats(&self, limit: u32) -> Result<Page<Chat>> {
        let mut url = self.endpoint(&["chats"])?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string());

        let Some(value) = lenient(self.get_json(url).await)? else {
            return Ok(Page::empty());
        };
        let mut page: Page<Chat> = page_from_value(value, "chats");
        sort_by_last_activity(&mut page.items);
        Ok(page)
    }

    /// Lists chats matching `filter`, newest activity first.
    ///
    /// # Errors
    ///
    /// Same as [`BeeperClient::list_chats`].
    pub async fn list_chats_filtered(&self, limit: u32, filter: ChatFilter) -> Result<Page<Chat>> {
        let mut page = self.list_chats(limit).await?;
        page.items.retain(|chat| filter.matches(chat));
        Ok(page)
    }

    /// Fetches a single chat.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedResponse`] if the body is not a chat object,
    /// otherwise the same errors as [`BeeperClient::get_accounts`].
    pub async fn get_chat(&self, chat_id: &str) -> Result<Chat> {
        let url = self.endpoint(&["chats", chat_id])?;
        let value = self.get_json(url).await?;
        serde_json::from_value(value).map_err(|e| Error::MalformedResponse(e.to_string()))
    }

    /// Fetches one page of messages in a chat.
    ///
    /// `cursor` and `direction` are only sent when a cursor is given; the
    /// first call returns the newest messages.
    ///
    /// # Errors
    ///
    /// Same as [`BeeperClient::get_accounts`].
    pub async fn get_chat_messages(
        &self,
        chat_id: &str,
        limit: Option<u32>,
        cursor: Option<&str>,
        direction: Direction,
    ) -> Result<Page<Message>> {
        let mut url = self.endpoint(&["chats", chat_id, "messages"])?;
        if limit.is_some() || cursor.is_some() {
            let mut query = url.query_pairs_mut();
            if let Some(limit) = limit {
                query.append_pair("limit", &limit.to_string());
            }
            if let Some(cursor) = cursor {
                query
                    .append_pair("cursor", cursor)
                    .append_pair("direction", direction.as_str());
            }
        }

        let Some(value) = lenient(self.get_json(url).await)? else {
            return Ok(Page::empty());
        };
        Ok(page_from_value(value, "messages"))
    }

    /// Downloads the media behind a handle.
    ///
    /// - `mxc://` and `localmxc://` handles go through `POST /assets/download`;
    ///   when Beeper answers with a local `srcURL` the file is read from disk,
    ///   or fetched from the local media server if one is configured.
    /// - `file://` URLs and existing absolute paths are read from disk.
    /// - `http(s)://` URLs are fetched with the bearer token; anything else is
    ///   resolved against the API base.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConfigured`] without a token,
    /// [`Error::InvalidMediaHandle`] for an empty handle, and transport, API or
    /// I/O errors from the download itself.
    pub async fn download_media(&self, handle: &str) -> Result<MediaBlob> {
        let token = self.require_token()?;
        if handle.is_empty() {
            return Err(Error::InvalidMediaHandle("No media URL provided".to_string()));
        }

        let scheme = HandleScheme::of(handle);
        if scheme == HandleScheme::AbsolutePath
            && tokio::fs::try_exists(handle).await.unwrap_or(false)
        {
            return read_local_file(Path::new(handle)).await;
        }

        match scheme {
            HandleScheme::Mxc | HandleScheme::LocalMxc => self.download_asset(handle).await,
            HandleScheme::File => read_local_file(&file_url_to_path(handle)?).await,
            _ => {
                let url = if scheme == HandleScheme::Http {
                    Url::parse(handle)?
                } else {
                    self.resolve_relative(handle)?
                };
                let request = self.http_client.get(url).bearer_auth(token);
                self.download(request, "Failed to download media", OCTET_STREAM)
                    .await
            }
        }
    }

    /// Resolves a handle that is neither a URL nor a local file against the API base.
    fn resolve_relative(&self, handle: &str) -> Result<Url> {
        let base = self.config.api_base.as_str().trim_end_matches('/');
        let path = handle.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    async fn download_asset(&self, handle: &str) -> Result<MediaBlob> {
        let token = self.require_token()?;
        let url = self.endpoint(&["assets", "download"])?;
        debug!(handle, "Downloading asset");

        let request = self
            .http_client
            .post(url)
            .bearer_auth(token)
            .json(&serde_json::json!({ "url": handle }));
        let blob = self
            .download(request, "Failed to download asset", DEFAULT_ASSET_CONTENT_TYPE)
            .await?;

        if !blob.content_type.contains("application/json") {
            return Ok(blob);
        }

        let location: AssetLocation = serde_json::from_slice(&blob.bytes)
            .map_err(|e| Error::MalformedResponse(format!("asset location: {e}")))?;
        let src_url = location
            .src_url
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::MalformedResponse("asset response has no srcURL".to_string()))?;

        if let Some(server) = &self.config.local_media_server {
            return self.fetch_from_local_server(server, handle, token).await;
        }

        let path = if src_url.starts_with("file://") {
            file_url_to_path(&src_url)?
        } else {
            PathBuf::from(src_url)
        };
        read_local_file(&path).await
    }

    async fn fetch_from_local_server(
        &self,
        server: &Url,
        handle: &str,
        token: &str,
    ) -> Result<MediaBlob> {
        let mut url = server.clone();
        url.query_pairs_mut()
            .append_pair("id", handle)
            .append_pair("token", token);
        debug!(server = %server, handle, "Fetching asset from local media server");

        self.download(self.http_client.get(url), "Local media server error", OCTET_STREAM)
            .await
    }

    /// Sends a download request and collects the body.
    async fn download(
        &self,
        request: RequestBuilder,
        failure: &str,
        default_content_type: &str,
    ) -> Result<MediaBlob> {
        let response = request
            .timeout(self.config.download_timeout)
            .send()
            .await
            .map_err(Error::RemoteUnavailable)?;

        let status = response.status();
        if !status.is_success() {
            let message = error_message(response).await;
            return Err(Error::api(
                status.as_u16(),
                Some(message.unwrap_or_else(|| failure.to_string())),
            ));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .unwrap_or(default_content_type)
            .to_string();
        let bytes = response.bytes().await.map_err(Error::RemoteUnavailable)?;

        Ok(MediaBlob::new(bytes, content_type))
    }

    /// Performs an authenticated GET and decodes the JSON body.
    async fn get_json(&self, url: Url) -> Result<Value> {
        let token = self.require_token()?;
        debug!(%url, "GET");

        let response = self
            .http_client
            .get(url)
            .bearer_auth(token)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(Error::RemoteUnavailable)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::api(status.as_u16(), error_message(response).await));
        }

        let body = response.bytes().await.map_err(Error::RemoteUnavailable)?;
        serde_json::from_slice(&body).map_err(|e| Error::MalformedResponse(e.to_string()))
    }

    fn require_token(&self) -> Result<&str> {
        self.token.as_deref().ok_or(Error::NotConfigured)
    }

    /// Builds an endpoint URL below the API base, encoding each segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.config.api_base.clone();
        url.path_segments_mut()
            .map_err(|()| {
                Error::InvalidConfig(format!(
                    "API base {} cannot carry a path",
                    self.config.api_base
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

/// Turns a malformed body into an absent value; other errors pass through.
fn lenient(result: Result<Value>) -> Result<Option<Value>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(Error::MalformedResponse(reason)) => {
            warn!("Ignoring malformed response: {reason}");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Extracts the `message` field of an error body, if any.
async fn error_message(response: Response) -> Option<String> {
    let body = response.bytes().await.ok()?;
    let value: Value = serde_json::from_slice(&body).ok()?;
    value
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn file_url_to_path(file_url: &str) -> Result<PathBuf> {
    Url::parse(file_url)?
        .to_file_path()
        .map_err(|()| Error::InvalidMediaHandle(format!("not a local file: {file_url}")))
}

async fn read_local_file(path: &Path) -> Result<MediaBlob> {
    debug!(path = %path.display(), "Reading local media file");
    let bytes = tokio::fs::read(path).await?;
    Ok(MediaBlob::new(bytes, mime_for_path(path)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> BeeperClient {
        BeeperClient::new(ClientConfig::new(base).unwrap()).unwrap()
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let client = client("http://localhost:23373/v1");
        let url = client.endpoint(&["chats", "a/b c", "messages"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:23373/v1/chats/a%2Fb%20c/messages"
        );
    }

    #[test]
    fn test_endpoint_with_trailing_slash_base() {
        let client = client("http://localhost:23373/v1/");
        let url = client.endpoint(&["accounts"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:23373/v1/accounts");
    }

    #[test]
    fn test_relative_handles_resolve_against_base() {
        let client = client("http://localhost:23373/v1/");
        assert_eq!(
            client.resolve_relative("media/abc.jpg").unwrap().as_str(),
            "http://localhost:23373/v1/media/abc.jpg"
        );
        assert_eq!(
            client.resolve_relative("/media/abc.jpg").unwrap().as_str(),
            "http://localhost:23373/v1/media/abc.jpg"
        );
    }

    #[test]
    fn test_empty_token_is_not_configured() {
        let mut client = client("http://localhost:23373/v1").with_token("secret");
        assert!(client.is_configured());
        assert_eq!(client.token(), Some("secret"));

        client.set_token(Some(" secret\n".to_string()));
        assert_eq!(client.token(), Some("secret"));

        client.set_token(Some(String::new()));
        assert!(!client.is_configured());
        client.set_token(Some("  ".to_string()));
        assert!(!client.is_configured());
    }

    #[tokio::test]
    async fn test_operations_fail_without_token() {
        // Port 1 is never listening; NotConfigured must win before any I/O.
        let client = client("http://127.0.0.1:1/v1");
        assert!(matches!(client.list_chats(10).await, Err(Error::NotConfigured)));
        assert!(matches!(
            client
                .get_chat_messages("c", None, None, Direction::Before)
                .await,
            Err(Error::NotConfigured)
        ));
        assert!(matches!(client.test_connection().await, Err(Error::NotConfigured)));
        assert!(matches!(
            client.download_media("mxc://x/y").await,
            Err(Error::NotConfigured)
        ));
    }

    #[tokio::test]
    async fn test_unreachable_remote() {
        let client = client("http://127.0.0.1:1/v1").with_token("t");
        let result = client.list_chats(10).await;
        assert!(matches!(result, Err(Error::RemoteUnavailable(_))));
    }
}
