//! Normalized change events emitted towards the analytics sink

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A normalized, timestamped change event for one CRM record.
///
/// Immutable once built: the normalizer produces it, the batch queue
/// hands it to the sink, nothing mutates it in between.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Classification plus entity label, e.g. "Contact Created"
    pub name: String,
    /// Creation instant for creations, modification instant for updates
    pub occurred_at: DateTime<Utc>,
    /// Identity the event belongs to (contact email), when the entity has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
    /// Entity-specific properties, already scrubbed of placeholder values
    pub properties: BTreeMap<String, Value>,
}

impl Action {
    pub fn new(name: impl Into<String>, occurred_at: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            occurred_at,
            identity: None,
            properties: BTreeMap::new(),
        }
    }

    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    pub fn with_properties(mut self, properties: BTreeMap<String, Value>) -> Self {
        self.properties = properties;
        self
    }
}
