//! Configuration loading for the CRM integration
//!
//! Supports loading OAuth client credentials from (in order of priority):
//! 1. Compile-time embedded credentials (for production builds)
//! 2. JSON file in the service config directory
//! 3. Runtime environment variables (fallback)

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Credentials filename in the service config directory
const CREDENTIALS_FILE: &str = "hubspot-credentials.json";

/// OAuth client credentials for the CRM API
#[derive(Debug, Clone)]
pub struct CrmCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Credential file format
#[derive(Deserialize)]
struct CredentialFile {
    client_id: String,
    client_secret: String,
}

impl CrmCredentials {
    /// Load credentials using the following priority:
    /// 1. Compile-time embedded credentials (for production builds)
    /// 2. JSON file (~/.config/crm-sync/hubspot-credentials.json)
    /// 3. Runtime environment variables
    pub fn load() -> Result<Self> {
        // Try compile-time embedded credentials first (production builds)
        if let Some(creds) = Self::from_compile_time() {
            return Ok(creds);
        }

        // Try the default config file
        if config::config_exists(CREDENTIALS_FILE) {
            let file: CredentialFile = config::load_json(CREDENTIALS_FILE)?;
            return Ok(Self::from_credential_file(file));
        }

        // Fall back to runtime environment variables
        Self::from_env()
    }

    /// Load credentials embedded at compile time via environment variables.
    /// Build with: HUBSPOT_CLIENT_ID=xxx HUBSPOT_CLIENT_SECRET=yyy cargo build --release
    pub fn from_compile_time() -> Option<Self> {
        let client_id = option_env!("HUBSPOT_CLIENT_ID")?;
        let client_secret = option_env!("HUBSPOT_CLIENT_SECRET")?;

        // Only return if both are non-empty
        if client_id.is_empty() || client_secret.is_empty() {
            return None;
        }

        Some(Self {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        })
    }

    /// Load credentials from a specific JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let file: CredentialFile = config::load_json_file(path)?;
        Ok(Self::from_credential_file(file))
    }

    /// Parse credentials from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let file: CredentialFile =
            serde_json::from_str(json).context("Failed to parse credentials JSON")?;
        Ok(Self::from_credential_file(file))
    }

    fn from_credential_file(file: CredentialFile) -> Self {
        Self {
            client_id: file.client_id,
            client_secret: file.client_secret,
        }
    }

    /// Load credentials from environment variables
    pub fn from_env() -> Result<Self> {
        let client_id = std::env::var("HUBSPOT_CLIENT_ID")
            .context("HUBSPOT_CLIENT_ID environment variable not set")?;
        let client_secret = std::env::var("HUBSPOT_CLIENT_SECRET")
            .context("HUBSPOT_CLIENT_SECRET environment variable not set")?;

        Ok(Self {
            client_id,
            client_secret,
        })
    }

    /// Get the default credentials file path
    pub fn default_credentials_path() -> Option<PathBuf> {
        config::config_path(CREDENTIALS_FILE)
    }

    /// Check if credentials are available (compile-time, file, or env vars)
    pub fn is_available() -> bool {
        if Self::from_compile_time().is_some() {
            return true;
        }
        if config::config_exists(CREDENTIALS_FILE) {
            return true;
        }
        std::env::var("HUBSPOT_CLIENT_ID").is_ok()
            && std::env::var("HUBSPOT_CLIENT_SECRET").is_ok()
    }
}
