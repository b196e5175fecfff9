//! Account model representing one connected CRM tenant

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::EntityKind;

/// A connected CRM account
///
/// Token fields are mutated by the token manager during a sync pass;
/// watermarks are advanced by the walker. Both are persisted through
/// the [`DomainStore`](crate::storage::DomainStore) after each entity
/// pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Stable CRM tenant identifier
    pub hub_id: String,
    /// Tenant portal domain, if known
    pub hub_domain: Option<String>,
    /// Current OAuth access token (absent until the first refresh)
    pub access_token: Option<String>,
    /// Long-lived OAuth refresh token
    pub refresh_token: String,
    /// Instant the current access token expires
    pub token_expires_at: Option<DateTime<Utc>>,
    /// Upper bound of previously-synced modification times, per entity kind
    #[serde(default)]
    pub watermarks: Watermarks,
}

impl Account {
    /// Create a new account with only a refresh token stored
    pub fn new(hub_id: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            hub_id: hub_id.into(),
            hub_domain: None,
            access_token: None,
            refresh_token: refresh_token.into(),
            token_expires_at: None,
            watermarks: Watermarks::default(),
        }
    }

    /// Set the portal domain
    pub fn with_hub_domain(mut self, domain: impl Into<String>) -> Self {
        self.hub_domain = Some(domain.into());
        self
    }

    /// Set an access token and its expiry
    pub fn with_access_token(
        mut self,
        token: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        self.access_token = Some(token.into());
        self.token_expires_at = Some(expires_at);
        self
    }

    /// Whether the wall clock has passed the access token's expiry.
    ///
    /// An unknown expiry counts as expired.
    pub fn token_expired(&self) -> bool {
        match self.token_expires_at {
            Some(expires_at) => Utc::now() >= expires_at,
            None => true,
        }
    }

    /// Whether the account needs a token refresh before it can make calls
    pub fn needs_token_refresh(&self) -> bool {
        self.access_token.is_none() || self.token_expired()
    }
}

/// Last-synced-through instants, one per entity kind
///
/// A watermark is read at pass start and written only when the entity's
/// pass completes successfully, so it never moves backwards and never
/// advances partially through a failed pagination.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Watermarks {
    pub contacts: Option<DateTime<Utc>>,
    pub companies: Option<DateTime<Utc>>,
    pub meetings: Option<DateTime<Utc>>,
}

impl Watermarks {
    pub fn get(&self, kind: EntityKind) -> Option<DateTime<Utc>> {
        match kind {
            EntityKind::Contacts => self.contacts,
            EntityKind::Companies => self.companies,
            EntityKind::Meetings => self.meetings,
        }
    }

    pub fn set(&mut self, kind: EntityKind, instant: DateTime<Utc>) {
        let slot = match kind {
            EntityKind::Contacts => &mut self.contacts,
            EntityKind::Companies => &mut self.companies,
            EntityKind::Meetings => &mut self.meetings,
        };
        *slot = Some(instant);
    }
}
