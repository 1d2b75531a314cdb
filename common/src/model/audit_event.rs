use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Identifies the area of the application an audit event happened in.
///
/// This is the single closed list of event types. Older database rows stored
/// the type as a small integer; [`EventType::from_legacy_code`] maps those
/// codes into this enumeration and the store rewrites them on upgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    #[default]
    NotSet,
    CaseModel,
    CaseForm,
    CaseApi,
    UrnValidator,
    ResultApi,
    #[serde(rename = "auditevent_api")]
    AuditEventApi,
}

impl EventType {
    pub const ALL: [EventType; 7] = [
        EventType::NotSet,
        EventType::CaseModel,
        EventType::CaseForm,
        EventType::CaseApi,
        EventType::UrnValidator,
        EventType::ResultApi,
        EventType::AuditEventApi,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::NotSet => "not_set",
            EventType::CaseModel => "case_model",
            EventType::CaseForm => "case_form",
            EventType::CaseApi => "case_api",
            EventType::UrnValidator => "urn_validator",
            EventType::ResultApi => "result_api",
            EventType::AuditEventApi => "auditevent_api",
        }
    }

    /// Maps the integer codes of schema version 1 onto the enumeration.
    ///
    /// Version 1 predates `urn_validator` and `result_api`, so codes 0..=4 are
    /// the only ones that ever existed.
    pub fn from_legacy_code(code: i64) -> Option<EventType> {
        match code {
            0 => Some(EventType::NotSet),
            1 => Some(EventType::CaseModel),
            2 => Some(EventType::CaseForm),
            3 => Some(EventType::CaseApi),
            4 => Some(EventType::AuditEventApi),
            _ => None,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown audit event type: {0:?}")]
pub struct UnknownEventType(pub String);

impl FromStr for EventType {
    type Err = UnknownEventType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventType::ALL
            .iter()
            .find(|t| t.as_str() == s)
            .copied()
            .ok_or_else(|| UnknownEventType(s.to_string()))
    }
}

/// Subtypes the application itself emits. The column is free text, so API
/// clients may send others.
pub mod subtype {
    pub const NOT_SET: &str = "not_set";
    pub const SUCCESS: &str = "success";
    pub const CASE_INVALID_INVALID_URN: &str = "case_invalid_invalid_urn";
    pub const CASE_INVALID_DUPLICATE_URN_USED: &str = "case_invalid_duplicate_urn_used";
    pub const CASE_INVALID_MISSING_URN: &str = "case_invalid_missing_urn";
}

/// A stored audit event. Never updated once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: i64,
    pub event_type: EventType,
    pub event_subtype: String,
    /// Free text useful to developers debugging an import.
    pub event_trace: Option<String>,
    pub event_data: BTreeMap<String, String>,
    pub case: Option<i64>,
    /// Hex MD5 of `event_data`.
    pub extra_data_hash: String,
    pub event_datetime: DateTime<Utc>,
}
