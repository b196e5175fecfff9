//! HubSpot CRM integration
//!
//! This module provides:
//! - OAuth token management for connected accounts
//! - The search API client behind the [`CrmApi`] boundary
//! - Record normalization into analytics actions

mod auth;
mod client;
pub mod mock;
mod normalize;

pub use auth::{CredentialRefreshError, TokenManager};
pub use client::{CrmApi, HubspotApi};
pub use normalize::{company_action, contact_action, meeting_action};

/// CRM API wire types
pub mod api {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};
    use serde_json::Value;
    use std::collections::BTreeMap;

    /// A filtered, sorted, cursor-paginated search request
    #[derive(Debug, Clone, PartialEq, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SearchRequest {
        pub filter_groups: Vec<FilterGroup>,
        pub sorts: Vec<SortSpec>,
        pub properties: Vec<String>,
        pub limit: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub after: Option<u64>,
    }

    /// Conjunction of filters
    #[derive(Debug, Clone, PartialEq, Serialize)]
    pub struct FilterGroup {
        pub filters: Vec<Filter>,
    }

    /// A single property filter
    ///
    /// Date values go over the wire as epoch-millisecond strings.
    #[derive(Debug, Clone, PartialEq, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Filter {
        pub property_name: String,
        pub operator: String,
        pub value: String,
    }

    impl Filter {
        pub fn gte(property: &str, instant: DateTime<Utc>) -> Self {
            Self {
                property_name: property.to_string(),
                operator: "GTE".to_string(),
                value: instant.timestamp_millis().to_string(),
            }
        }

        pub fn lte(property: &str, instant: DateTime<Utc>) -> Self {
            Self {
                property_name: property.to_string(),
                operator: "LTE".to_string(),
                value: instant.timestamp_millis().to_string(),
            }
        }
    }

    /// Sort order for search results
    #[derive(Debug, Clone, PartialEq, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SortSpec {
        pub property_name: String,
        pub direction: String,
    }

    impl SortSpec {
        pub fn ascending(property: &str) -> Self {
            Self {
                property_name: property.to_string(),
                direction: "ASCENDING".to_string(),
            }
        }
    }

    /// One page of search results
    #[derive(Debug, Clone, Default, Deserialize)]
    pub struct SearchResponse {
        pub total: Option<u64>,
        #[serde(default)]
        pub results: Vec<RawRecord>,
        pub paging: Option<Paging>,
    }

    impl SearchResponse {
        /// The next-page cursor, if the response carries a usable one.
        ///
        /// The API sends the cursor as a string; an absent or unparsable
        /// cursor means pagination ends.
        pub fn next_after(&self) -> Option<u64> {
            self.paging
                .as_ref()
                .and_then(|p| p.next.as_ref())
                .and_then(|n| n.after.parse().ok())
        }
    }

    /// Pagination envelope
    #[derive(Debug, Clone, Default, Deserialize)]
    pub struct Paging {
        pub next: Option<PagingNext>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct PagingNext {
        pub after: String,
    }

    /// A raw entity record as returned by the search API
    #[derive(Debug, Clone, Default, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RawRecord {
        pub id: String,
        pub created_at: Option<DateTime<Utc>>,
        pub updated_at: Option<DateTime<Utc>>,
        pub properties: Option<BTreeMap<String, Value>>,
    }

    impl RawRecord {
        /// A non-null string property value
        pub fn prop_str(&self, name: &str) -> Option<&str> {
            self.properties.as_ref()?.get(name)?.as_str()
        }

        /// A property value parsed as an RFC 3339 instant
        pub fn prop_instant(&self, name: &str) -> Option<DateTime<Utc>> {
            self.prop_str(name)?
                .parse::<DateTime<Utc>>()
                .ok()
        }

        /// The record's modification instant: the envelope timestamp,
        /// falling back to the given modification-time property.
        pub fn modified_at(&self, modified_property: &str) -> Option<DateTime<Utc>> {
            self.updated_at
                .or_else(|| self.prop_instant(modified_property))
        }
    }

    /// Response from the OAuth token endpoint
    #[derive(Debug, Clone, Deserialize)]
    pub struct TokenGrant {
        pub access_token: String,
        pub refresh_token: Option<String>,
        pub expires_in: u64,
    }

}
