//! Storage boundaries: the tenant store and the downstream action sink

mod memory;
mod traits;

pub use memory::{CollectingSink, InMemoryDomainStore};
pub use traits::{ActionSink, DomainStore};
