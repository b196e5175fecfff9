//! Generic paginated entity walker
//!
//! One cursor-pagination algorithm drives all entity kinds; the
//! per-entity differences (property list, modification-time property,
//! normalizer) live in an [`EntityConfig`] descriptor.

use anyhow::Result;
use chrono::{DateTime, Utc};

use super::queue::ActionQueue;
use super::retry::{self, RetryPolicy};
use crate::hubspot::api::{Filter, FilterGroup, RawRecord, SearchRequest, SortSpec};
use crate::hubspot::{CrmApi, TokenManager, company_action, contact_action, meeting_action};
use crate::models::{Account, Action, EntityKind};

/// Records requested per page
pub const PAGE_SIZE: usize = 100;

/// Deepest offset cursor the search API will serve; beyond it the
/// window must be re-anchored.
pub const MAX_OFFSET: u64 = 9900;

/// Per-entity search parameters for the walker
pub struct EntityConfig {
    pub kind: EntityKind,
    /// Properties requested from the search API
    pub properties: &'static [&'static str],
    /// Modification-time property used for filtering and sorting
    pub modified_property: &'static str,
    pub page_size: usize,
    pub max_offset: u64,
    /// Maps a raw record to an action; `None` skips the record
    pub normalize: fn(&RawRecord, Option<DateTime<Utc>>) -> Option<Action>,
}

/// Entity configurations, in processing order
pub const ENTITY_CONFIGS: [EntityConfig; 3] = [
    EntityConfig {
        kind: EntityKind::Contacts,
        properties: &[
            "firstname",
            "lastname",
            "jobtitle",
            "email",
            "hubspotscore",
            "hs_lead_status",
            "hs_analytics_source",
            "hs_latest_source",
        ],
        modified_property: "lastmodifieddate",
        page_size: PAGE_SIZE,
        max_offset: MAX_OFFSET,
        normalize: contact_action,
    },
    EntityConfig {
        kind: EntityKind::Companies,
        properties: &[
            "name",
            "domain",
            "country",
            "industry",
            "description",
            "annualrevenue",
            "numberofemployees",
            "hs_lead_status",
        ],
        modified_property: "hs_lastmodifieddate",
        page_size: PAGE_SIZE,
        max_offset: MAX_OFFSET,
        normalize: company_action,
    },
    EntityConfig {
        kind: EntityKind::Meetings,
        properties: &["hs_meeting_title", "hs_createdate", "hs_lastmodifieddate"],
        modified_property: "hs_lastmodifieddate",
        page_size: PAGE_SIZE,
        max_offset: MAX_OFFSET,
        normalize: meeting_action,
    },
];

/// Transient pagination state for one entity pass.
///
/// The offset only grows within a window; advancing the lower bound
/// (re-anchoring) always resets it.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    pub lower_bound: Option<DateTime<Utc>>,
    pub offset: Option<u64>,
}

impl Window {
    pub fn new(lower_bound: Option<DateTime<Utc>>) -> Self {
        Self {
            lower_bound,
            offset: None,
        }
    }

    /// Move the cursor forward within the current window
    pub fn advance(&mut self, after: u64) {
        self.offset = Some(after);
    }

    /// Advance the lower bound and restart the cursor
    pub fn reanchor(&mut self, lower_bound: DateTime<Utc>) {
        self.lower_bound = Some(lower_bound);
        self.offset = None;
    }
}

/// Counters from one entity pass
#[derive(Debug, Default, Clone)]
pub struct EntityStats {
    /// Pages fetched
    pub pages: usize,
    /// Records returned by the API
    pub records: usize,
    /// Actions enqueued
    pub actions: usize,
    /// Records skipped for missing required fields
    pub skipped: usize,
}

/// Walk one entity type's modified-record window and enqueue the
/// resulting actions.
///
/// The watermark advances to the pass-start instant only when the walk
/// completes; any error leaves it untouched so the next pass re-covers
/// the same window.
pub fn sync_entity(
    api: &dyn CrmApi,
    tokens: &TokenManager,
    policy: &RetryPolicy,
    account: &mut Account,
    config: &EntityConfig,
    queue: &mut ActionQueue,
) -> Result<EntityStats> {
    let watermark = account.watermarks.get(config.kind);
    let pass_started = Utc::now();
    let mut window = Window::new(watermark);
    let mut stats = EntityStats::default();

    loop {
        let request = build_request(config, &window, pass_started);
        let page = retry::execute(policy, tokens, account, config.kind, |acct| {
            api.search(
                config.kind,
                &request,
                acct.access_token.as_deref().unwrap_or_default(),
            )
        })?;

        stats.pages += 1;
        stats.records += page.results.len();

        for record in &page.results {
            match (config.normalize)(record, watermark) {
                Some(action) => {
                    queue.push(action);
                    stats.actions += 1;
                }
                None => stats.skipped += 1,
            }
        }

        match page.next_after() {
            None => break,
            Some(after) if after >= config.max_offset => {
                // The API rejects cursors past its depth ceiling, so slide
                // the window past the last record seen instead. The boundary
                // record repeats once; classification keeps the repeat
                // idempotent downstream.
                let anchor = page
                    .results
                    .last()
                    .and_then(|r| r.modified_at(config.modified_property));
                match anchor {
                    Some(anchor) => window.reanchor(anchor),
                    None => break,
                }
            }
            Some(after) => window.advance(after),
        }
    }

    account.watermarks.set(config.kind, pass_started);
    log::info!(
        "synced {} for account {}: {} pages, {} actions, {} records skipped",
        config.kind,
        account.hub_id,
        stats.pages,
        stats.actions,
        stats.skipped
    );
    Ok(stats)
}

fn build_request(
    config: &EntityConfig,
    window: &Window,
    upper_bound: DateTime<Utc>,
) -> SearchRequest {
    let mut filters = Vec::new();
    if let Some(lower) = window.lower_bound {
        filters.push(Filter::gte(config.modified_property, lower));
    }
    filters.push(Filter::lte(config.modified_property, upper_bound));

    SearchRequest {
        filter_groups: vec![FilterGroup { filters }],
        sorts: vec![SortSpec::ascending(config.modified_property)],
        properties: config.properties.iter().map(|p| p.to_string()).collect(),
        limit: config.page_size,
        after: window.offset,
    }
}
