//! CRM sync crate - incremental entity synchronization
//!
//! This crate pulls contact, company, and meeting records from a remote
//! CRM into a normalized action stream for downstream analytics. It
//! provides:
//! - Domain models (Account, Domain, Action, per-entity watermarks)
//! - The CRM API client and OAuth token management
//! - A generic paginated walker over the CRM's depth-bounded search API
//! - Record normalization with creation/update classification
//! - A bounded batch queue feeding the downstream action sink
//! - The pass orchestrator tying it all together
//!
//! Storage (the tenant store and the action sink) is abstracted behind
//! traits; this crate has no opinion about where either lives.

pub mod config;
pub mod hubspot;
pub mod models;
pub mod storage;
pub mod sync;

pub use config::CrmCredentials;
pub use hubspot::{CredentialRefreshError, CrmApi, HubspotApi, TokenManager};
pub use models::{Account, Action, CompanyProfile, Domain, EntityKind, Watermarks};
pub use storage::{ActionSink, CollectingSink, DomainStore, InMemoryDomainStore};
pub use sync::{
    // Pass orchestration
    PassStats, SyncEngine,
    // Walker internals (for embedding and tests)
    ENTITY_CONFIGS, EntityConfig, EntityStats, Window, sync_entity,
    // Batching and retries
    ActionQueue, FLUSH_THRESHOLD, FetchExhaustedError, RetryPolicy,
};
