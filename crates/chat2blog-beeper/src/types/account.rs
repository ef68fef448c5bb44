//! Connected account types.

use serde::{Deserialize, Serialize};

use super::de;

/// A messaging account connected to Beeper (`GET /accounts`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Account identifier.
    #[serde(
        default,
        rename = "accountID",
        deserialize_with = "de::string_or_number"
    )]
    pub account_id: Option<String>,
    /// Network name (e.g. `WhatsApp`, `Signal`).
    #[serde(default, deserialize_with = "de::non_empty_string")]
    pub network: Option<String>,
}

/// Result of a connection check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionInfo {
    /// Number of connected accounts.
    pub accounts: usize,
    /// Distinct network names, in first-seen order.
    pub networks: Vec<String>,
}

impl ConnectionInfo {
    /// Summarizes a list of accounts.
    #[must_use]
    pub fn from_accounts(accounts: &[Account]) -> Self {
        let mut networks: Vec<String> = Vec::new();
        for network in accounts.iter().filter_map(|a| a.network.as_deref()) {
            if !networks.iter().any(|n| n == network) {
                networks.push(network.to_string());
            }
        }

        Self {
            accounts: accounts.len(),
            networks,
        }
    }
}
