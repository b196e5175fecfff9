//! HubSpot API HTTP client
//!
//! Implements the [`CrmApi`] boundary over the CRM search and OAuth
//! token endpoints. Uses synchronous HTTP (ureq) to be executor-agnostic.

use anyhow::{Context, Result};

use super::api::{SearchRequest, SearchResponse, TokenGrant};
use crate::config::CrmCredentials;
use crate::models::EntityKind;

/// Boundary to the remote CRM service.
///
/// Covers the two endpoints the sync engine touches: cursor-paginated
/// entity search and the OAuth refresh-token exchange. Implemented by
/// [`HubspotApi`] for production and by
/// [`MockCrmApi`](super::mock::MockCrmApi) for tests.
pub trait CrmApi: Send + Sync {
    /// Execute one page of a filtered, sorted entity search
    fn search(
        &self,
        entity: EntityKind,
        request: &SearchRequest,
        access_token: &str,
    ) -> Result<SearchResponse>;

    /// Exchange a refresh token for a fresh access token
    fn refresh_token(&self, refresh_token: &str) -> Result<TokenGrant>;
}

/// HubSpot implementation of [`CrmApi`]
pub struct HubspotApi {
    credentials: CrmCredentials,
}

impl HubspotApi {
    /// CRM API base URL
    const BASE_URL: &'static str = "https://api.hubapi.com";

    /// OAuth token endpoint
    const TOKEN_URL: &'static str = "https://api.hubapi.com/oauth/v1/token";

    /// Create a new client using the given OAuth client credentials
    pub fn new(credentials: CrmCredentials) -> Self {
        Self { credentials }
    }
}

impl CrmApi for HubspotApi {
    fn search(
        &self,
        entity: EntityKind,
        request: &SearchRequest,
        access_token: &str,
    ) -> Result<SearchResponse> {
        let url = format!(
            "{}/crm/v3/objects/{}/search",
            Self::BASE_URL,
            entity.object_type()
        );

        let mut response = ureq::post(&url)
            .header("Authorization", &format!("Bearer {}", access_token))
            .send_json(request)
            .with_context(|| format!("Failed to send {} search request", entity))?;

        let page: SearchResponse = response
            .body_mut()
            .read_json()
            .with_context(|| format!("Failed to parse {} search response", entity))?;

        Ok(page)
    }

    fn refresh_token(&self, refresh_token: &str) -> Result<TokenGrant> {
        let mut response = ureq::post(Self::TOKEN_URL)
            .send_form([
                ("grant_type", "refresh_token"),
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("refresh_token", refresh_token),
            ])
            .context("Failed to call OAuth token endpoint")?;

        let grant: TokenGrant = response
            .body_mut()
            .read_json()
            .context("Failed to parse token response")?;

        Ok(grant)
    }
}
