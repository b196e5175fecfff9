//! Sync pass orchestration
//!
//! Drives one full pass: per account, refresh credentials, walk each
//! entity type in fixed order, drain the batch queue, and persist the
//! account. Failures are contained at the smallest scope that makes
//! sense — an entity type, then an account — and never end the pass.

use anyhow::Result;
use std::sync::Arc;
use std::time::Instant;

use super::queue::ActionQueue;
use super::retry::RetryPolicy;
use super::walker::{self, ENTITY_CONFIGS};
use crate::hubspot::{CrmApi, TokenManager};
use crate::models::Account;
use crate::storage::{ActionSink, DomainStore};

/// Statistics from one full sync pass
#[derive(Debug, Default, Clone)]
pub struct PassStats {
    /// Accounts processed
    pub accounts: usize,
    /// Entity passes that completed
    pub entities_synced: usize,
    /// Entity passes aborted after exhausting their retry budget
    pub entities_failed: usize,
    /// Actions handed to the batch queue
    pub actions_enqueued: usize,
    /// Duration of the pass
    pub duration_ms: u64,
}

/// Drives sync passes over every connected account
pub struct SyncEngine {
    api: Arc<dyn CrmApi>,
    store: Arc<dyn DomainStore>,
    sink: Arc<dyn ActionSink>,
    tokens: TokenManager,
    retry: RetryPolicy,
}

impl SyncEngine {
    pub fn new(
        api: Arc<dyn CrmApi>,
        store: Arc<dyn DomainStore>,
        sink: Arc<dyn ActionSink>,
    ) -> Self {
        Self {
            tokens: TokenManager::new(api.clone()),
            api,
            store,
            sink,
            retry: RetryPolicy::default(),
        }
    }

    /// Override the retry schedule
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Run one full pass over every account due for sync
    pub fn run_pass(&self) -> Result<PassStats> {
        let started = Instant::now();
        let mut stats = PassStats::default();

        let accounts = self.store.find_accounts_for_sync()?;
        log::info!("starting sync pass over {} accounts", accounts.len());

        for mut account in accounts {
            self.sync_account(&mut account, &mut stats);
            stats.accounts += 1;
        }

        stats.duration_ms = started.elapsed().as_millis() as u64;
        log::info!(
            "sync pass finished: {} accounts, {} entity passes ({} failed), {} actions",
            stats.accounts,
            stats.entities_synced,
            stats.entities_failed,
            stats.actions_enqueued
        );
        Ok(stats)
    }

    fn sync_account(&self, account: &mut Account, stats: &mut PassStats) {
        log::info!("processing account {}", account.hub_id);

        if let Err(err) = self.tokens.ensure_fresh(account) {
            // Keep going: an unusable token is refreshed again inside
            // the fetch retry loop.
            log::warn!(
                "credential refresh failed for account {}: {err:#}",
                account.hub_id
            );
        }

        let mut queue = ActionQueue::new(self.sink.clone());

        for config in &ENTITY_CONFIGS {
            match walker::sync_entity(
                self.api.as_ref(),
                &self.tokens,
                &self.retry,
                account,
                config,
                &mut queue,
            ) {
                Ok(_) => {
                    stats.entities_synced += 1;
                    // Persist the advanced watermark right away
                    if let Err(err) = self.store.save_account(account) {
                        log::error!(
                            "failed to persist account {}: {err:#}",
                            account.hub_id
                        );
                    }
                }
                Err(err) => {
                    stats.entities_failed += 1;
                    log::error!(
                        "failed to sync {} for account {}: {err:#}",
                        config.kind,
                        account.hub_id
                    );
                }
            }
        }

        queue.drain();
        stats.actions_enqueued += queue.pushed();

        if let Err(err) = self.store.save_account(account) {
            log::error!("failed to persist account {}: {err:#}", account.hub_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hubspot::mock::{MockCrmApi, grant, page, record};
    use crate::models::{CompanyProfile, Domain, EntityKind};
    use crate::storage::{CollectingSink, InMemoryDomainStore};
    use chrono::Utc;
    use std::time::Duration;

    fn instant_retry() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 4,
            base_delay: Duration::ZERO,
        }
    }

    fn store_with_accounts(accounts: Vec<Account>) -> Arc<InMemoryDomainStore> {
        let mut domain = Domain::new(
            "key",
            CompanyProfile {
                name: "Acme".to_string(),
                website: "https://acme.example.com".to_string(),
            },
        );
        domain.accounts = accounts;
        Arc::new(InMemoryDomainStore::new(domain))
    }

    fn engine(
        api: Arc<MockCrmApi>,
        store: Arc<InMemoryDomainStore>,
        sink: Arc<CollectingSink>,
    ) -> SyncEngine {
        SyncEngine::new(api, store, sink).with_retry_policy(instant_retry())
    }

    #[test]
    fn test_pass_advances_all_watermarks_and_delivers_actions() {
        let api = Arc::new(MockCrmApi::new());
        api.push_grant(grant("fresh", 3600));
        let now = Utc::now();
        api.push_page(
            EntityKind::Contacts,
            page(
                vec![record("1", now, now, &[("email", "a@example.com")])],
                None,
            ),
        );
        api.push_page(
            EntityKind::Companies,
            page(vec![record("2", now, now, &[("domain", "acme.io")])], None),
        );

        let store = store_with_accounts(vec![Account::new("111", "rt")]);
        let sink = Arc::new(CollectingSink::new());
        let stats = engine(api.clone(), store.clone(), sink.clone())
            .run_pass()
            .unwrap();

        assert_eq!(stats.accounts, 1);
        assert_eq!(stats.entities_synced, 3);
        assert_eq!(stats.entities_failed, 0);
        assert_eq!(stats.actions_enqueued, 2);
        assert_eq!(sink.total_actions(), 2);

        let stored = store.account("111").unwrap();
        for kind in EntityKind::ALL {
            assert!(stored.watermarks.get(kind).is_some(), "{kind} watermark");
        }
        // Refreshed token was persisted too
        assert_eq!(stored.access_token.as_deref(), Some("fresh"));
    }

    #[test]
    fn test_entity_failure_does_not_stop_later_entities() {
        let api = Arc::new(MockCrmApi::new());
        api.push_grant(grant("fresh", 3600));
        for _ in 0..4 {
            api.push_search_error(EntityKind::Contacts, "rate limited");
        }

        let store = store_with_accounts(vec![Account::new("111", "rt")]);
        let sink = Arc::new(CollectingSink::new());
        let stats = engine(api.clone(), store.clone(), sink).run_pass().unwrap();

        assert_eq!(stats.entities_failed, 1);
        assert_eq!(stats.entities_synced, 2);

        let stored = store.account("111").unwrap();
        assert!(stored.watermarks.get(EntityKind::Contacts).is_none());
        assert!(stored.watermarks.get(EntityKind::Companies).is_some());
        assert!(stored.watermarks.get(EntityKind::Meetings).is_some());
    }

    #[test]
    fn test_account_failures_do_not_stop_later_accounts() {
        let api = Arc::new(MockCrmApi::new());
        // First account: the upfront refresh fails, then the contacts
        // fetch fails and its in-fetch refresh fails too
        api.push_grant_error("revoked");
        api.push_grant_error("revoked");
        api.push_search_error(EntityKind::Contacts, "unauthorized");

        let store = store_with_accounts(vec![
            Account::new("111", "rt-1"),
            Account::new("222", "rt-2"),
        ]);
        let sink = Arc::new(CollectingSink::new());
        let stats = engine(api.clone(), store.clone(), sink).run_pass().unwrap();

        assert_eq!(stats.accounts, 2);
        assert_eq!(stats.entities_failed, 1);

        let first = store.account("111").unwrap();
        assert!(first.watermarks.get(EntityKind::Contacts).is_none());

        // The second account still completed all three entity kinds
        let second = store.account("222").unwrap();
        for kind in EntityKind::ALL {
            assert!(second.watermarks.get(kind).is_some());
        }
    }

    #[test]
    fn test_watermark_persisted_after_each_entity_pass() {
        let api = Arc::new(MockCrmApi::new());
        api.push_grant(grant("fresh", 3600));

        let store = store_with_accounts(vec![Account::new("111", "rt")]);
        let sink = Arc::new(CollectingSink::new());
        engine(api, store.clone(), sink).run_pass().unwrap();

        // One save per entity pass plus the final save after drain
        assert_eq!(store.save_count(), EntityKind::ALL.len() + 1);
    }
}
