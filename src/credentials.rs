//! Local account store: names mapped to addresses and signing keys.
//!
//! The store is read-only input to the rest of the tool. Accounts may carry
//! no signing key at all, in which case their legs of a trade are persisted
//! unsigned instead of submitted.

use crate::core::error::EtfError;
use crate::core::txn::SigningCredentials;
use anyhow::{Context, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AccountRecord {
    pub name: String,
    pub address: String,
    /// Base64-encoded 32-byte ed25519 seed; absent for watch-only accounts.
    #[serde(default)]
    pub signing_key: Option<String>,
}

/// A resolved account, ready to act as one side of a trade.
#[derive(Debug, Clone)]
pub struct Account {
    pub name: String,
    pub address: String,
    pub credentials: Option<SigningCredentials>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct CredentialStore {
    #[serde(default)]
    pub accounts: Vec<AccountRecord>,
}

impl CredentialStore {
    pub fn default_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("in", "codito", "algoetf")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("credentials.yaml"))
    }

    /// Loads the store; a missing file is an empty store, not an error.
    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        if !path.as_ref().exists() {
            debug!(
                "No credentials file at {}, starting empty",
                path.as_ref().display()
            );
            return Ok(CredentialStore::default());
        }

        let content = fs::read_to_string(path.as_ref()).with_context(|| {
            format!(
                "Failed to read credentials file: {}",
                path.as_ref().display()
            )
        })?;
        let store: Self = serde_yaml::from_str(&content).with_context(|| {
            format!(
                "Failed to parse credentials file: {}",
                path.as_ref().display()
            )
        })?;
        Ok(store)
    }

    /// Resolve an account name to its address and signing credentials. The
    /// stored signing key, when present, must derive the stored address.
    pub fn resolve(&self, name: &str) -> Result<Account, EtfError> {
        let record = self
            .accounts
            .iter()
            .find(|a| a.name == name)
            .ok_or_else(|| EtfError::AccountName(name.to_string()))?;

        let credentials = match &record.signing_key {
            Some(encoded) => Some(decode_signing_key(&record.address, encoded)?),
            None => None,
        };

        Ok(Account {
            name: record.name.clone(),
            address: record.address.clone(),
            credentials,
        })
    }
}

fn decode_signing_key(address: &str, encoded: &str) -> Result<SigningCredentials, EtfError> {
    let bytes = BASE64.decode(encoded).map_err(|e| EtfError::Address {
        address: address.to_string(),
        reason: format!("signing key is not valid base64: {e}"),
    })?;
    let seed: [u8; 32] = bytes.as_slice().try_into().map_err(|_| EtfError::Address {
        address: address.to_string(),
        reason: format!("signing key must be 32 bytes, got {}", bytes.len()),
    })?;

    let credentials = SigningCredentials::new(seed);
    if credentials.address().encode() != address {
        return Err(EtfError::Address {
            address: address.to_string(),
            reason: "signing key does not control this address".to_string(),
        });
    }
    Ok(credentials)
}
