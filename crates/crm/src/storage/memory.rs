//! In-memory storage implementations
//!
//! Used for testing and as a stub before a real tenant store
//! integration is wired in.

use anyhow::{Result, anyhow};
use std::sync::{Mutex, RwLock};

use super::{ActionSink, DomainStore};
use crate::models::{Account, Action, Domain};

/// In-memory implementation of [`DomainStore`] wrapping one tenant
pub struct InMemoryDomainStore {
    domain: RwLock<Domain>,
    saves: Mutex<usize>,
}

impl InMemoryDomainStore {
    pub fn new(domain: Domain) -> Self {
        Self {
            domain: RwLock::new(domain),
            saves: Mutex::new(0),
        }
    }

    /// Snapshot of the stored tenant
    pub fn domain(&self) -> Domain {
        self.domain.read().unwrap().clone()
    }

    /// Snapshot of one stored account
    pub fn account(&self, hub_id: &str) -> Option<Account> {
        self.domain.read().unwrap().account(hub_id).cloned()
    }

    /// Number of `save_account` calls observed
    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap()
    }
}

impl DomainStore for InMemoryDomainStore {
    fn find_accounts_for_sync(&self) -> Result<Vec<Account>> {
        Ok(self.domain.read().unwrap().accounts.clone())
    }

    fn save_account(&self, account: &Account) -> Result<()> {
        let mut domain = self.domain.write().unwrap();
        let stored = domain
            .account_mut(&account.hub_id)
            .ok_or_else(|| anyhow!("unknown account {}", account.hub_id))?;

        // Only the fields the sync core owns
        stored.access_token = account.access_token.clone();
        stored.refresh_token = account.refresh_token.clone();
        stored.token_expires_at = account.token_expires_at;
        stored.watermarks = account.watermarks.clone();

        *self.saves.lock().unwrap() += 1;
        Ok(())
    }
}

/// Sink that records every delivered batch, for tests
#[derive(Default)]
pub struct CollectingSink {
    batches: Mutex<Vec<Vec<Action>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Batches delivered so far, in arrival order
    pub fn batches(&self) -> Vec<Vec<Action>> {
        self.batches.lock().unwrap().clone()
    }

    /// Total actions delivered across all batches
    pub fn total_actions(&self) -> usize {
        self.batches.lock().unwrap().iter().map(|b| b.len()).sum()
    }
}

impl ActionSink for CollectingSink {
    fn accept(&self, actions: &[Action]) -> Result<()> {
        self.batches.lock().unwrap().push(actions.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CompanyProfile, EntityKind};
    use chrono::Utc;

    fn make_store() -> InMemoryDomainStore {
        let domain = Domain::new(
            "key",
            CompanyProfile {
                name: "Acme".to_string(),
                website: "https://acme.example.com".to_string(),
            },
        )
        .with_account(Account::new("111", "rt-111"));
        InMemoryDomainStore::new(domain)
    }

    #[test]
    fn test_find_accounts() {
        let store = make_store();
        let accounts = store.find_accounts_for_sync().unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].hub_id, "111");
    }

    #[test]
    fn test_save_account_updates_sync_fields() {
        let store = make_store();
        let mut account = store.account("111").unwrap();
        account.access_token = Some("at".to_string());
        account.watermarks.set(EntityKind::Contacts, Utc::now());

        store.save_account(&account).unwrap();

        let stored = store.account("111").unwrap();
        assert_eq!(stored.access_token.as_deref(), Some("at"));
        assert!(stored.watermarks.get(EntityKind::Contacts).is_some());
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn test_save_unknown_account_fails() {
        let store = make_store();
        let account = Account::new("999", "rt");
        assert!(store.save_account(&account).is_err());
    }

    #[test]
    fn test_collecting_sink_records_batches() {
        let sink = CollectingSink::new();
        let action = Action::new("Contact Created", Utc::now());
        sink.accept(&[action.clone(), action.clone()]).unwrap();
        sink.accept(&[action]).unwrap();

        assert_eq!(sink.batches().len(), 2);
        assert_eq!(sink.total_actions(), 3);
    }
}
