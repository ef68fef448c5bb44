//! Application settings.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chat2blog_beeper::{ClientConfig, DEFAULT_API_BASE};
use chat2blog_core::AggregatorConfig;
use chat2blog_core::admin::DEFAULT_CHAT_LIMIT;
use chat2blog_core::aggregator::DEFAULT_MAX_BATCHES;
use chat2blog_core::credentials::{self, DEFAULT_PROFILE};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Directory name under the platform config and data directories.
const APP_DIR: &str = "chat2blog";

/// Environment variable consulted for the access token.
pub const TOKEN_ENV: &str = "CHAT2BLOG_TOKEN";

/// Settings stored in `settings.json`. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Beeper Desktop API base URL.
    pub api_base: String,
    /// Timeout for JSON requests, in seconds.
    pub request_timeout_secs: u64,
    /// Timeout for media downloads, in seconds.
    pub download_timeout_secs: u64,
    /// Local media server for `localmxc://` assets.
    pub local_media_server: String,
    /// Whether to route local assets through the local media server.
    pub use_local_media_server: bool,
    /// Remote calls per aggregated media page.
    pub max_batches: usize,
    /// Messages per batch; the remote default when unset.
    pub batch_size: Option<u32>,
    /// Chats requested for the chat list.
    pub chat_limit: u32,
    /// Where imported media is written.
    pub library_dir: Option<PathBuf>,
    /// Public URL under which the library directory is served.
    pub library_base_url: Option<String>,
    /// Keyring profile holding the access token.
    pub profile: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout_secs: 30,
            download_timeout_secs: 60,
            local_media_server: "http://localhost:8787".to_string(),
            use_local_media_server: false,
            max_batches: DEFAULT_MAX_BATCHES,
            batch_size: None,
            chat_limit: DEFAULT_CHAT_LIMIT,
            library_dir: None,
            library_base_url: None,
            profile: DEFAULT_PROFILE.to_string(),
        }
    }
}

impl Settings {
    /// Default settings file location.
    pub fn default_path() -> PathBuf {
        config_dir().join("settings.json")
    }

    /// Loads settings, falling back to defaults when the file is missing.
    pub async fn load(path: &Path) -> Result<Self> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&contents).with_context(|| format!("Invalid settings in {}", path.display()))
    }

    /// Writes settings as pretty-printed JSON.
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, contents).await?;
        tracing::info!("Settings saved to {:?}", path);
        Ok(())
    }

    /// Client configuration for the Beeper API.
    pub fn client_config(&self) -> Result<ClientConfig> {
        let mut config = ClientConfig::new(&self.api_base)
            .with_context(|| format!("Invalid API base URL: {}", self.api_base))?
            .with_request_timeout(Duration::from_secs(self.request_timeout_secs))
            .with_download_timeout(Duration::from_secs(self.download_timeout_secs));

        if self.use_local_media_server {
            config = config
                .with_local_media_server(&self.local_media_server)
                .with_context(|| format!("Invalid local media server URL: {}", self.local_media_server))?;
        }
        Ok(config)
    }

    /// Aggregation bounds.
    pub const fn aggregator_config(&self) -> AggregatorConfig {
        AggregatorConfig {
            max_batches: self.max_batches,
            batch_size: self.batch_size,
        }
    }

    /// Directory for imported media.
    pub fn library_dir(&self) -> PathBuf {
        self.library_dir
            .clone()
            .unwrap_or_else(|| data_dir().join("media"))
    }
}

/// Platform config directory for the application.
fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Platform data directory for the application.
pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Import database location.
pub fn database_path() -> PathBuf {
    data_dir().join("chat2blog.db")
}

/// Picks the access token: explicit flag, then environment, then keyring.
///
/// Keyring failures are logged and treated as "no token".
pub fn resolve_token(flag: Option<String>, env: Option<String>, profile: &str) -> Option<String> {
    if let Some(token) = flag.or(env).filter(|t| !t.trim().is_empty()) {
        return Some(token.trim().to_string());
    }

    match credentials::get_token(profile) {
        Ok(token) => token,
        Err(e) => {
            warn!("Could not read token from keyring: {e}");
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_settings_use_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"api_base": "http://10.0.0.2:23373/v1", "max_batches": 8}"#)
                .unwrap();
        assert_eq!(settings.api_base, "http://10.0.0.2:23373/v1");
        assert_eq!(settings.max_batches, 8);
        assert_eq!(settings.chat_limit, 200);
        assert_eq!(settings.profile, "default");
        assert!(!settings.use_local_media_server);
    }

    #[test]
    fn test_client_config() {
        let settings = Settings {
            request_timeout_secs: 5,
            use_local_media_server: true,
            ..Settings::default()
        };
        let config = settings.client_config().unwrap();
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(
            config.local_media_server.unwrap().as_str(),
            "http://localhost:8787/"
        );

        let bad = Settings {
            api_base: "nope".to_string(),
            ..Settings::default()
        };
        assert!(bad.client_config().is_err());
    }

    #[test]
    fn test_flag_token_wins() {
        assert_eq!(
            resolve_token(Some(" from-flag ".into()), Some("from-env".into()), "unused"),
            Some("from-flag".to_string())
        );
        assert_eq!(
            resolve_token(None, Some("from-env".into()), "unused"),
            Some("from-env".to_string())
        );
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        assert_eq!(Settings::load(&path).await.unwrap(), Settings::default());

        let settings = Settings {
            batch_size: Some(100),
            library_base_url: Some("https://blog.example/uploads".into()),
            ..Settings::default()
        };
        settings.save(&path).await.unwrap();
        assert_eq!(Settings::load(&path).await.unwrap(), settings);
    }
}
