use crate::store::{Store, StoreError};
use chrono::{DateTime, Utc};
use common::model::audit_event::{AuditEvent, EventType};
use rusqlite::types::Type;
use rusqlite::{params, Row};
use std::collections::BTreeMap;

/// An audit event about to be written. The hash is computed by the logger.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAuditEvent {
    pub event_type: EventType,
    pub event_subtype: String,
    pub event_trace: Option<String>,
    pub event_data: BTreeMap<String, String>,
    pub case: Option<i64>,
    pub extra_data_hash: String,
    pub event_datetime: DateTime<Utc>,
}

fn audit_event_from_row(row: &Row<'_>) -> rusqlite::Result<AuditEvent> {
    let event_type: String = row.get(1)?;
    let event_type = event_type
        .parse::<EventType>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;
    let event_data: String = row.get(4)?;
    let event_data = serde_json::from_str(&event_data)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;

    Ok(AuditEvent {
        id: row.get(0)?,
        event_type,
        event_subtype: row.get(2)?,
        event_trace: row.get(3)?,
        event_data,
        case: row.get(5)?,
        extra_data_hash: row.get(6)?,
        event_datetime: row.get(7)?,
    })
}

impl Store {
    pub fn insert_audit_event(&self, event: &NewAuditEvent) -> Result<AuditEvent, StoreError> {
        let event_data = serde_json::to_string(&event.event_data)?;
        self.conn.execute(
            "INSERT INTO audit_events (event_type, event_subtype, event_trace, event_data,
                                       case_id, extra_data_hash, event_datetime)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                event.event_type.as_str(),
                event.event_subtype,
                event.event_trace,
                event_data,
                event.case,
                event.extra_data_hash,
                event.event_datetime,
            ],
        )?;

        Ok(AuditEvent {
            id: self.conn.last_insert_rowid(),
            event_type: event.event_type,
            event_subtype: event.event_subtype.clone(),
            event_trace: event.event_trace.clone(),
            event_data: event.event_data.clone(),
            case: event.case,
            extra_data_hash: event.extra_data_hash.clone(),
            event_datetime: event.event_datetime,
        })
    }

    /// Every audit event, oldest first.
    pub fn audit_events(&self) -> Result<Vec<AuditEvent>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, event_type, event_subtype, event_trace, event_data, case_id,
                    extra_data_hash, event_datetime
             FROM audit_events ORDER BY id",
        )?;
        let rows = stmt
            .query_map([], audit_event_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn count_audit_events(&self) -> Result<usize, StoreError> {
        self.count_table("audit_events")
    }
}
