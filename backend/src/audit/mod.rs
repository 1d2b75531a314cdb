//! Append-only audit trail of user journey and API events.
//!
//! Event types come from the closed [`EventType`] list. Every stored event
//! carries the MD5 of its payload so a later reader can check that the data
//! was not altered and spot duplicates.

use crate::store::{NewAuditEvent, Store, StoreError};
use chrono::Utc;
use common::model::audit_event::{AuditEvent, EventType, UnknownEventType};
use log::error;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error(transparent)]
    UnknownEventType(#[from] UnknownEventType),

    #[error("audit events need a subtype")]
    MissingSubtype,

    #[error("could not encode event data: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("could not store audit event: {0}")]
    Store(#[from] StoreError),
}

/// Everything about an event except its type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventEntry {
    pub subtype: String,
    pub trace: Option<String>,
    pub data: BTreeMap<String, String>,
    pub case: Option<i64>,
}

impl EventEntry {
    pub fn new(subtype: &str) -> Self {
        EventEntry {
            subtype: subtype.to_string(),
            ..EventEntry::default()
        }
    }

    pub fn trace(mut self, trace: impl Into<String>) -> Self {
        self.trace = Some(trace.into());
        self
    }

    pub fn data(mut self, key: &str, value: impl Into<String>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }

    pub fn case(mut self, case: Option<i64>) -> Self {
        self.case = case;
        self
    }
}

/// Hex MD5 of the payload encoded as JSON. Keys are sorted, so insertion
/// order never changes the hash.
pub fn payload_hash(data: &BTreeMap<String, String>) -> Result<String, serde_json::Error> {
    let encoded = serde_json::to_vec(data)?;
    Ok(format!("{:x}", md5::compute(encoded)))
}

/// Recomputes the payload hash of a stored event.
pub fn verify(event: &AuditEvent) -> bool {
    match payload_hash(&event.event_data) {
        Ok(hash) => hash == event.extra_data_hash,
        Err(_) => false,
    }
}

pub struct AuditLogger<'a> {
    store: &'a Store,
}

impl<'a> AuditLogger<'a> {
    pub fn new(store: &'a Store) -> Self {
        AuditLogger { store }
    }

    /// Appends one event. A blank subtype writes nothing.
    pub fn log(&self, event_type: EventType, entry: EventEntry) -> Result<AuditEvent, AuditError> {
        if entry.subtype.trim().is_empty() {
            error!("refusing {} audit event without a subtype", event_type);
            return Err(AuditError::MissingSubtype);
        }
        let extra_data_hash = payload_hash(&entry.data)?;
        let event = self.store.insert_audit_event(&NewAuditEvent {
            event_type,
            event_subtype: entry.subtype,
            event_trace: entry.trace,
            event_data: entry.data,
            case: entry.case,
            extra_data_hash,
            event_datetime: Utc::now(),
        })?;
        Ok(event)
    }

    /// Like [`AuditLogger::log`] for event types arriving as text. An unknown
    /// type writes nothing.
    pub fn log_raw(&self, event_type: &str, entry: EventEntry) -> Result<AuditEvent, AuditError> {
        let event_type = event_type.parse::<EventType>().map_err(|e| {
            error!("refusing audit event ({}): {}", entry.subtype, e);
            e
        })?;
        self.log(event_type, entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::{memory_store, new_case};
    use common::model::audit_event::subtype;

    #[test]
    fn writes_one_row_with_hash() {
        let store = memory_store();
        let case = store.insert_case(&new_case("06/AA/1234567/16")).unwrap();
        let logger = AuditLogger::new(&store);

        let event = logger
            .log(
                EventType::CaseApi,
                EventEntry::new(subtype::SUCCESS)
                    .data("urn", "06/AA/1234567/16")
                    .case(Some(case.id)),
            )
            .unwrap();

        assert_eq!(store.count_audit_events().unwrap(), 1);
        assert_eq!(event.extra_data_hash.len(), 32);
        assert!(verify(&event));

        let stored = &store.audit_events().unwrap()[0];
        assert_eq!(stored, &event);
        assert_eq!(stored.case, Some(case.id));
    }

    #[test]
    fn unknown_event_type_writes_nothing() {
        let store = memory_store();
        let logger = AuditLogger::new(&store);

        let err = logger
            .log_raw("user_journey", EventEntry::new(subtype::NOT_SET))
            .unwrap_err();
        assert!(matches!(err, AuditError::UnknownEventType(_)));
        assert_eq!(store.count_audit_events().unwrap(), 0);
    }

    #[test]
    fn blank_subtype_writes_nothing() {
        let store = memory_store();
        let logger = AuditLogger::new(&store);

        for blank in ["", " \t "] {
            let err = logger
                .log(EventType::CaseApi, EventEntry::new(blank))
                .unwrap_err();
            assert!(matches!(err, AuditError::MissingSubtype));
        }
        assert_eq!(store.count_audit_events().unwrap(), 0);
    }

    #[test]
    fn raw_event_types_are_parsed() {
        let store = memory_store();
        let logger = AuditLogger::new(&store);

        let event = logger
            .log_raw(
                "urn_validator",
                EventEntry::new(subtype::CASE_INVALID_INVALID_URN).trace("bad region"),
            )
            .unwrap();
        assert_eq!(event.event_type, EventType::UrnValidator);
        assert_eq!(event.event_trace.as_deref(), Some("bad region"));
    }

    #[test]
    fn hash_ignores_insertion_order() {
        let mut a = BTreeMap::new();
        a.insert("urn".to_string(), "06AA123456716".to_string());
        a.insert("court".to_string(), "B06AA".to_string());
        let mut b = BTreeMap::new();
        b.insert("court".to_string(), "B06AA".to_string());
        b.insert("urn".to_string(), "06AA123456716".to_string());

        assert_eq!(payload_hash(&a).unwrap(), payload_hash(&b).unwrap());
        // md5("{}")
        assert_eq!(
            payload_hash(&BTreeMap::new()).unwrap(),
            "99914b932bd37a50b983c5e7c90ae93b"
        );
    }

    #[test]
    fn tampered_payload_fails_verification() {
        let store = memory_store();
        let logger = AuditLogger::new(&store);
        let mut event = logger
            .log(EventType::CaseForm, EventEntry::new(subtype::SUCCESS).data("k", "v"))
            .unwrap();
        event.event_data.insert("k".into(), "changed".into());
        assert!(!verify(&event));
    }
}
