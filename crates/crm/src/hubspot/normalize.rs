//! Record normalization
//!
//! Converts raw CRM records into analytics actions, classifying each
//! record as a creation or an update against the entity's watermark and
//! scrubbing placeholder values out of the property bag. Records missing
//! required fields normalize to `None` and are skipped upstream;
//! malformed data from the CRM is not an error.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;

use super::api::RawRecord;
use crate::models::{Action, EntityKind};

/// Values that carry no information and are dropped from property bags.
/// Compared case-insensitively against string values.
const DISALLOWED_VALUES: &[&str] = &[
    "[not provided]",
    "placeholder",
    "[[unknown]]",
    "not set",
    "not provided",
    "unknown",
    "undefined",
    "n/a",
];

fn is_placeholder(value: &str) -> bool {
    let lowered = value.to_lowercase();
    DISALLOWED_VALUES.contains(&lowered.as_str())
}

/// Drop null, empty-string, and placeholder entries from a property bag
fn scrub_properties(properties: BTreeMap<String, Value>) -> BTreeMap<String, Value> {
    properties
        .into_iter()
        .filter(|(_, value)| match value {
            Value::Null => false,
            Value::String(s) => !s.is_empty() && !is_placeholder(s),
            _ => true,
        })
        .collect()
}

/// A record is a creation when it appeared after the watermark, or when
/// no watermark existed yet.
fn is_created(created_at: Option<DateTime<Utc>>, watermark: Option<DateTime<Utc>>) -> bool {
    match (created_at, watermark) {
        (_, None) => true,
        (Some(created), Some(mark)) => created > mark,
        (None, Some(_)) => false,
    }
}

fn action_name(kind: EntityKind, created: bool) -> String {
    let verb = if created { "Created" } else { "Updated" };
    format!("{} {}", kind.action_label(), verb)
}

fn insert_prop(bag: &mut BTreeMap<String, Value>, key: &str, value: Option<&Value>) {
    if let Some(value) = value {
        bag.insert(key.to_string(), value.clone());
    }
}

/// Normalize a contact record.
///
/// Requires a property bag and a non-empty email, which becomes the
/// action's identity.
pub fn contact_action(record: &RawRecord, watermark: Option<DateTime<Utc>>) -> Option<Action> {
    let properties = record.properties.as_ref()?;
    let email = record.prop_str("email").filter(|e| !e.is_empty())?;

    let created = is_created(record.created_at, watermark);
    let occurred_at = if created {
        record.created_at?
    } else {
        record.updated_at?
    };

    let first = record.prop_str("firstname").unwrap_or_default();
    let last = record.prop_str("lastname").unwrap_or_default();
    let name = format!("{first} {last}").trim().to_string();

    let mut bag = BTreeMap::new();
    bag.insert("contact_name".to_string(), Value::from(name));
    insert_prop(&mut bag, "contact_title", properties.get("jobtitle"));

    // Unparsable scores fall back to zero; a placeholder score is no
    // score at all.
    match record.prop_str("hubspotscore") {
        Some(raw) if is_placeholder(raw) => {}
        Some(raw) => {
            let score = raw.parse::<i64>().unwrap_or(0);
            bag.insert("contact_score".to_string(), Value::from(score));
        }
        None => {
            bag.insert("contact_score".to_string(), Value::from(0));
        }
    }

    Some(
        Action::new(action_name(EntityKind::Contacts, created), occurred_at)
            .with_identity(email)
            .with_properties(scrub_properties(bag)),
    )
}

/// Normalize a company record
pub fn company_action(record: &RawRecord, watermark: Option<DateTime<Utc>>) -> Option<Action> {
    let properties = record.properties.as_ref()?;

    let created = is_created(record.created_at, watermark);
    let occurred_at = if created {
        record.created_at?
    } else {
        record.updated_at?
    };

    let mut bag = BTreeMap::new();
    bag.insert("company_id".to_string(), Value::from(record.id.clone()));
    insert_prop(&mut bag, "company_domain", properties.get("domain"));
    insert_prop(&mut bag, "company_industry", properties.get("industry"));

    Some(
        Action::new(action_name(EntityKind::Companies, created), occurred_at)
            .with_properties(scrub_properties(bag)),
    )
}

/// Normalize a meeting record.
///
/// Meetings carry their lifecycle instants in the property bag rather
/// than the record envelope.
pub fn meeting_action(record: &RawRecord, watermark: Option<DateTime<Utc>>) -> Option<Action> {
    let properties = record.properties.as_ref()?;

    let created_at = record.prop_instant("hs_createdate");
    let created = is_created(created_at, watermark);
    let occurred_at = if created {
        created_at?
    } else {
        record.prop_instant("hs_lastmodifieddate")?
    };

    let mut bag = BTreeMap::new();
    bag.insert("meeting_id".to_string(), Value::from(record.id.clone()));
    insert_prop(&mut bag, "meeting_title", properties.get("hs_meeting_title"));

    Some(
        Action::new(action_name(EntityKind::Meetings, created), occurred_at)
            .with_properties(scrub_properties(bag)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hubspot::mock::record;
    use chrono::{Duration, TimeZone};

    fn instant(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_scrub_drops_placeholders_and_nulls() {
        let mut bag = BTreeMap::new();
        bag.insert("kept".to_string(), Value::from("useful"));
        bag.insert("empty".to_string(), Value::from(""));
        bag.insert("null".to_string(), Value::Null);
        bag.insert("unknown".to_string(), Value::from("Unknown"));
        bag.insert("na".to_string(), Value::from("N/A"));
        bag.insert("bracketed".to_string(), Value::from("[Not Provided]"));
        bag.insert("score".to_string(), Value::from(0));

        let scrubbed = scrub_properties(bag);
        assert_eq!(scrubbed.len(), 2);
        assert!(scrubbed.contains_key("kept"));
        assert!(scrubbed.contains_key("score"));
    }

    #[test]
    fn test_contact_created_after_watermark() {
        let contact = record(
            "1",
            instant(10),
            instant(12),
            &[("email", "ada@example.com"), ("firstname", "Ada"), ("lastname", "Lovelace")],
        );

        let action = contact_action(&contact, Some(instant(5))).unwrap();
        assert_eq!(action.name, "Contact Created");
        assert_eq!(action.occurred_at, instant(10));
        assert_eq!(action.identity.as_deref(), Some("ada@example.com"));
        assert_eq!(
            action.properties.get("contact_name"),
            Some(&Value::from("Ada Lovelace"))
        );
    }

    #[test]
    fn test_contact_update_classification_is_idempotent() {
        // Created before the watermark, modified after it: always an
        // update, no matter how many passes see it.
        let contact = record(
            "1",
            instant(3),
            instant(12),
            &[("email", "ada@example.com")],
        );

        for _ in 0..3 {
            let action = contact_action(&contact, Some(instant(5))).unwrap();
            assert_eq!(action.name, "Contact Updated");
            assert_eq!(action.occurred_at, instant(12));
        }
    }

    #[test]
    fn test_no_watermark_classifies_as_creation() {
        let contact = record("1", instant(3), instant(12), &[("email", "a@b.c")]);
        let action = contact_action(&contact, None).unwrap();
        assert_eq!(action.name, "Contact Created");
    }

    #[test]
    fn test_contact_without_email_is_skipped() {
        let contact = record("1", instant(3), instant(12), &[("firstname", "Ada")]);
        assert!(contact_action(&contact, None).is_none());

        let mut no_properties = record("1", instant(3), instant(12), &[]);
        no_properties.properties = None;
        assert!(contact_action(&no_properties, None).is_none());
    }

    #[test]
    fn test_placeholder_title_and_score_are_omitted() {
        let contact = record(
            "1",
            instant(3),
            instant(12),
            &[
                ("email", "ada@example.com"),
                ("jobtitle", "Unknown"),
                ("hubspotscore", "N/A"),
            ],
        );

        let action = contact_action(&contact, None).unwrap();
        assert!(!action.properties.contains_key("contact_title"));
        assert!(!action.properties.contains_key("contact_score"));
    }

    #[test]
    fn test_contact_score_parsing() {
        let scored = record(
            "1",
            instant(3),
            instant(12),
            &[("email", "a@b.c"), ("hubspotscore", "87")],
        );
        let action = contact_action(&scored, None).unwrap();
        assert_eq!(action.properties.get("contact_score"), Some(&Value::from(87)));

        let unscored = record("1", instant(3), instant(12), &[("email", "a@b.c")]);
        let action = contact_action(&unscored, None).unwrap();
        assert_eq!(action.properties.get("contact_score"), Some(&Value::from(0)));
    }

    #[test]
    fn test_company_update_uses_modification_instant() {
        let company = record(
            "77",
            instant(2),
            instant(20),
            &[("domain", "acme.example.com"), ("industry", "Manufacturing")],
        );

        let action = company_action(&company, Some(instant(10))).unwrap();
        assert_eq!(action.name, "Company Updated");
        assert_eq!(action.occurred_at, instant(20));
        assert!(action.identity.is_none());
        assert_eq!(action.properties.get("company_id"), Some(&Value::from("77")));
        assert_eq!(
            action.properties.get("company_domain"),
            Some(&Value::from("acme.example.com"))
        );
    }

    #[test]
    fn test_meeting_instants_come_from_properties() {
        let created = instant(8);
        let modified = instant(9);
        let meeting = record(
            "m-1",
            instant(1), // envelope timestamps are ignored for meetings
            instant(1),
            &[
                ("hs_meeting_title", "Quarterly review"),
                ("hs_createdate", &created.to_rfc3339()),
                ("hs_lastmodifieddate", &modified.to_rfc3339()),
            ],
        );

        let action = meeting_action(&meeting, Some(created - Duration::days(1))).unwrap();
        assert_eq!(action.name, "Meeting Created");
        assert_eq!(action.occurred_at, created);

        let action = meeting_action(&meeting, Some(created + Duration::hours(1))).unwrap();
        assert_eq!(action.name, "Meeting Updated");
        assert_eq!(action.occurred_at, modified);
    }

    #[test]
    fn test_meeting_without_instants_is_skipped() {
        let meeting = record("m-1", instant(1), instant(1), &[("hs_meeting_title", "X")]);
        assert!(meeting_action(&meeting, None).is_none());
    }
}
