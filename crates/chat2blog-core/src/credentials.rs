//! Secure storage for the Beeper access token.
//!
//! The token lives in the platform's credential store:
//! - Linux: Secret Service (GNOME Keyring, `KWallet`)
//! - macOS: Keychain
//! - Windows: Credential Manager

use keyring::Entry;
use tracing::{debug, warn};

/// Service name used for keyring entries.
const SERVICE_NAME: &str = "chat2blog";

/// Credential type identifier for the Beeper API token.
const BEEPER_TOKEN_CREDENTIAL: &str = "beeper_token";

/// Profile used when none is configured.
pub const DEFAULT_PROFILE: &str = "default";

/// Error type for credential operations.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// Failed to access keyring.
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    /// The token to store was empty.
    #[error("Access token must not be empty")]
    EmptyToken,
}

/// Result type for credential operations.
pub type CredentialResult<T> = std::result::Result<T, CredentialError>;

/// Generates the keyring entry key for a profile's token.
fn credential_key(profile: &str) -> String {
    format!("{SERVICE_NAME}_{BEEPER_TOKEN_CREDENTIAL}_{profile}")
}

/// Stores the access token for `profile`.
///
/// Surrounding whitespace is trimmed before storing.
///
/// # Errors
///
/// Returns an error if the token is empty or the keyring operation fails.
pub fn store_token(profile: &str, token: &str) -> CredentialResult<()> {
    let token = token.trim();
    if token.is_empty() {
        return Err(CredentialError::EmptyToken);
    }
    let entry = Entry::new(SERVICE_NAME, &credential_key(profile))?;
    entry.set_password(token)?;
    debug!("Stored Beeper token for profile {profile}");
    Ok(())
}

/// Retrieves the access token for `profile`.
///
/// # Errors
///
/// Returns an error if the keyring operation fails.
pub fn get_token(profile: &str) -> CredentialResult<Option<String>> {
    let entry = Entry::new(SERVICE_NAME, &credential_key(profile))?;
    match entry.get_password() {
        Ok(token) => Ok(Some(token)),
        Err(keyring::Error::NoEntry) => {
            debug!("No Beeper token found for profile {profile}");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Deletes the access token for `profile`. A missing token is not an error.
///
/// # Errors
///
/// Returns an error if the keyring operation fails (except for missing entries).
pub fn delete_token(profile: &str) -> CredentialResult<()> {
    let entry = Entry::new(SERVICE_NAME, &credential_key(profile))?;
    match entry.delete_credential() {
        Ok(()) => {
            debug!("Deleted Beeper token for profile {profile}");
            Ok(())
        }
        Err(keyring::Error::NoEntry) => {
            debug!("No Beeper token to delete for profile {profile}");
            Ok(())
        }
        Err(e) => {
            warn!("Failed to delete Beeper token: {e}");
            Err(e.into())
        }
    }
}
