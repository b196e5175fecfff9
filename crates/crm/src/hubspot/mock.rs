//! Scripted CRM API implementation
//!
//! Stands in for the real HTTP client in tests and offline development:
//! queued responses are served in order and every call is recorded for
//! later inspection. Once a queue is exhausted, searches return an
//! empty final page and token refreshes return a default grant.

use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Mutex;

use super::api::{Paging, PagingNext, RawRecord, SearchRequest, SearchResponse, TokenGrant};
use super::client::CrmApi;
use crate::models::EntityKind;

/// A search call observed by the mock
#[derive(Debug, Clone)]
pub struct RecordedSearch {
    pub entity: EntityKind,
    pub request: SearchRequest,
    pub access_token: String,
}

#[derive(Default)]
struct MockState {
    responses: HashMap<EntityKind, VecDeque<Result<SearchResponse>>>,
    grants: VecDeque<Result<TokenGrant>>,
    searches: Vec<RecordedSearch>,
    refresh_calls: Vec<String>,
}

/// Scripted [`CrmApi`] implementation
#[derive(Default)]
pub struct MockCrmApi {
    state: Mutex<MockState>,
}

impl MockCrmApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful search page for an entity kind
    pub fn push_page(&self, entity: EntityKind, response: SearchResponse) {
        let mut state = self.state.lock().unwrap();
        state.responses.entry(entity).or_default().push_back(Ok(response));
    }

    /// Queue a failed search call for an entity kind
    pub fn push_search_error(&self, entity: EntityKind, message: &str) {
        let mut state = self.state.lock().unwrap();
        state
            .responses
            .entry(entity)
            .or_default()
            .push_back(Err(anyhow!("{message}")));
    }

    /// Queue a successful token grant
    pub fn push_grant(&self, grant: TokenGrant) {
        self.state.lock().unwrap().grants.push_back(Ok(grant));
    }

    /// Queue a failed token refresh
    pub fn push_grant_error(&self, message: &str) {
        self.state
            .lock()
            .unwrap()
            .grants
            .push_back(Err(anyhow!("{message}")));
    }

    /// All search calls made so far
    pub fn searches(&self) -> Vec<RecordedSearch> {
        self.state.lock().unwrap().searches.clone()
    }

    /// Refresh tokens seen by the token endpoint, in call order
    pub fn refresh_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().refresh_calls.clone()
    }
}

impl CrmApi for MockCrmApi {
    fn search(
        &self,
        entity: EntityKind,
        request: &SearchRequest,
        access_token: &str,
    ) -> Result<SearchResponse> {
        let mut state = self.state.lock().unwrap();
        state.searches.push(RecordedSearch {
            entity,
            request: request.clone(),
            access_token: access_token.to_string(),
        });
        match state.responses.get_mut(&entity).and_then(|queue| queue.pop_front()) {
            Some(result) => result,
            None => Ok(SearchResponse::default()),
        }
    }

    fn refresh_token(&self, refresh_token: &str) -> Result<TokenGrant> {
        let mut state = self.state.lock().unwrap();
        state.refresh_calls.push(refresh_token.to_string());
        match state.grants.pop_front() {
            Some(result) => result,
            None => Ok(grant("mock-access-token", 3600)),
        }
    }
}

/// Build a search page with an optional next-page cursor
pub fn page(results: Vec<RawRecord>, next_after: Option<u64>) -> SearchResponse {
    SearchResponse {
        total: None,
        results,
        paging: next_after.map(|after| Paging {
            next: Some(PagingNext {
                after: after.to_string(),
            }),
        }),
    }
}

/// Build a raw record with envelope timestamps and string properties
pub fn record(
    id: &str,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    properties: &[(&str, &str)],
) -> RawRecord {
    RawRecord {
        id: id.to_string(),
        created_at: Some(created_at),
        updated_at: Some(updated_at),
        properties: Some(
            properties
                .iter()
                .map(|(k, v)| (k.to_string(), serde_json::Value::from(*v)))
                .collect::<BTreeMap<_, _>>(),
        ),
    }
}

/// Build a token grant
pub fn grant(access_token: &str, expires_in: u64) -> TokenGrant {
    TokenGrant {
        access_token: access_token.to_string(),
        refresh_token: None,
        expires_in,
    }
}
