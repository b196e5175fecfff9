//! OAuth token management for connected CRM accounts
//!
//! Exchanges a stored refresh token for a fresh access token through
//! the [`CrmApi`] boundary. Does not retry: retry composition around
//! token expiry lives in the sync retry executor.

use anyhow::Result;
use chrono::{Duration, Utc};
use std::sync::Arc;

use super::client::CrmApi;
use crate::models::Account;

/// A refresh-token exchange against the OAuth endpoint failed
#[derive(Debug, thiserror::Error)]
#[error("failed to refresh access token for account {hub_id}")]
pub struct CredentialRefreshError {
    pub hub_id: String,
    #[source]
    pub source: anyhow::Error,
}

/// Holds and refreshes access tokens, per account
pub struct TokenManager {
    api: Arc<dyn CrmApi>,
}

impl TokenManager {
    pub fn new(api: Arc<dyn CrmApi>) -> Self {
        Self { api }
    }

    /// Refresh the account's access token if it is absent or expired
    pub fn ensure_fresh(&self, account: &mut Account) -> Result<()> {
        if account.needs_token_refresh() {
            self.refresh_now(account)?;
        }
        Ok(())
    }

    /// Unconditionally exchange the refresh token for a new access token.
    ///
    /// Updates the in-memory account; the caller is responsible for
    /// persisting it.
    pub fn refresh_now(&self, account: &mut Account) -> Result<()> {
        let grant = self
            .api
            .refresh_token(&account.refresh_token)
            .map_err(|source| CredentialRefreshError {
                hub_id: account.hub_id.clone(),
                source,
            })?;

        account.access_token = Some(grant.access_token);
        account.token_expires_at = Some(Utc::now() + Duration::seconds(grant.expires_in as i64));

        // The token endpoint may rotate the refresh token; otherwise keep
        // the stored one.
        if let Some(rotated) = grant.refresh_token {
            account.refresh_token = rotated;
        }

        Ok(())
    }
}
