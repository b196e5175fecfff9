//! Entity kinds pulled from the CRM

use serde::{Deserialize, Serialize};
use std::fmt;

/// The CRM object types this engine synchronizes.
///
/// Processing order within a pass is fixed: contacts, then companies,
/// then meetings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Contacts,
    Companies,
    Meetings,
}

impl EntityKind {
    /// All kinds, in processing order
    pub const ALL: [EntityKind; 3] = [
        EntityKind::Contacts,
        EntityKind::Companies,
        EntityKind::Meetings,
    ];

    /// Object type segment used in CRM API paths
    pub fn object_type(&self) -> &'static str {
        match self {
            EntityKind::Contacts => "contacts",
            EntityKind::Companies => "companies",
            EntityKind::Meetings => "meetings",
        }
    }

    /// Singular label used in action names ("Contact Created", ...)
    pub fn action_label(&self) -> &'static str {
        match self {
            EntityKind::Contacts => "Contact",
            EntityKind::Companies => "Company",
            EntityKind::Meetings => "Meeting",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.object_type())
    }
}
