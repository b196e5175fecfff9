//! Storage trait definitions

use anyhow::Result;

use crate::models::{Account, Action};

/// Boundary to the persistent tenant store.
///
/// Implementations must persist only the fields this core owns — tokens
/// and watermarks — without clobbering tenant fields maintained
/// elsewhere (mail preferences, access levels).
pub trait DomainStore: Send + Sync {
    /// All connected accounts due for a sync pass
    fn find_accounts_for_sync(&self) -> Result<Vec<Account>>;

    /// Persist an account's token and watermark fields
    fn save_account(&self, account: &Account) -> Result<()>;
}

/// Downstream sink receiving batches of normalized actions.
///
/// Best-effort from the engine's perspective: delivery failures are
/// logged by the batch queue and never retried here.
pub trait ActionSink: Send + Sync {
    fn accept(&self, actions: &[Action]) -> Result<()>;
}
