//! Domain model: the tenant configuration aggregate

use serde::{Deserialize, Serialize};

use super::Account;

/// Company metadata attached to a tenant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub name: String,
    pub website: String,
}

/// One tenant of the platform, owning zero or more connected CRM accounts.
///
/// The tenant store holds more than this (mail preferences, access
/// levels); the sync core only reads the account collection and writes
/// back token and watermark fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub api_key: String,
    pub company: CompanyProfile,
    pub accounts: Vec<Account>,
}

impl Domain {
    pub fn new(api_key: impl Into<String>, company: CompanyProfile) -> Self {
        Self {
            api_key: api_key.into(),
            company,
            accounts: Vec::new(),
        }
    }

    pub fn with_account(mut self, account: Account) -> Self {
        self.accounts.push(account);
        self
    }

    pub fn account(&self, hub_id: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.hub_id == hub_id)
    }

    pub fn account_mut(&mut self, hub_id: &str) -> Option<&mut Account> {
        self.accounts.iter_mut().find(|a| a.hub_id == hub_id)
    }
}
