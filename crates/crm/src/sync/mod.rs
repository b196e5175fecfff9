//! Incremental sync engine
//!
//! One pass walks every connected account's modified records per entity
//! kind, normalizes them into actions, and batches them towards the
//! downstream sink.

mod pass;
pub mod queue;
pub mod retry;
pub mod walker;

pub use pass::{PassStats, SyncEngine};
pub use queue::{ActionQueue, FLUSH_THRESHOLD};
pub use retry::{FetchExhaustedError, RetryPolicy};
pub use walker::{
    ENTITY_CONFIGS, EntityConfig, EntityStats, MAX_OFFSET, PAGE_SIZE, Window, sync_entity,
};
