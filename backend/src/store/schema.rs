//! Table definitions and schema upgrades.
//!
//! The schema version lives in `PRAGMA user_version`. Version 1 stored
//! `audit_events.event_type` as a small integer code; version 2 stores the
//! event type name so the column maps one to one onto `EventType`. Version 3
//! adds the court registry.

use crate::store::StoreError;
use common::model::audit_event::EventType;
use log::{info, warn};
use rusqlite::{params, Connection};

pub const SCHEMA_VERSION: u32 = 3;

const CASES: &str = "
    CREATE TABLE IF NOT EXISTS cases (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        urn TEXT NOT NULL,
        case_number TEXT,
        court_reference TEXT,
        hearing_date TEXT,
        forenames TEXT,
        surname TEXT,
        date_of_birth TEXT,
        postcode TEXT,
        postcode_key TEXT,
        email TEXT,
        sent INTEGER NOT NULL DEFAULT 0,
        imported INTEGER NOT NULL DEFAULT 1,
        extra_data TEXT NOT NULL DEFAULT '{}',
        created TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS cases_urn ON cases (urn);
    CREATE INDEX IF NOT EXISTS cases_postcode_key ON cases (postcode_key);
    CREATE INDEX IF NOT EXISTS cases_date_of_birth ON cases (date_of_birth);
    CREATE INDEX IF NOT EXISTS cases_created ON cases (created);
";

const DATA_VALIDATIONS: &str = "
    CREATE TABLE IF NOT EXISTS data_validations (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        date_entered TEXT NOT NULL,
        urn_entered TEXT NOT NULL,
        urn_standardised TEXT NOT NULL,
        urn_formatted TEXT,
        case_match_count INTEGER NOT NULL DEFAULT 0,
        case_match INTEGER REFERENCES cases (id) ON DELETE CASCADE
    );
    CREATE INDEX IF NOT EXISTS data_validations_date_entered ON data_validations (date_entered);
";

const AUDIT_EVENTS: &str = "
    CREATE TABLE IF NOT EXISTS audit_events (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        event_type TEXT NOT NULL DEFAULT 'not_set',
        event_subtype TEXT NOT NULL DEFAULT 'not_set',
        event_trace TEXT,
        event_data TEXT NOT NULL DEFAULT '{}',
        case_id INTEGER REFERENCES cases (id) ON DELETE CASCADE,
        extra_data_hash TEXT NOT NULL DEFAULT '',
        event_datetime TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS audit_events_event_datetime ON audit_events (event_datetime);
";

const COURTS: &str = "
    CREATE TABLE IF NOT EXISTS courts (
        region_code TEXT PRIMARY KEY,
        court_code TEXT,
        court_name TEXT NOT NULL,
        enabled INTEGER NOT NULL DEFAULT 1,
        validate_urn INTEGER NOT NULL DEFAULT 0
    );
";

/// Brings the database up to [`SCHEMA_VERSION`] and returns the version found
/// before the upgrade.
pub fn migrate(conn: &mut Connection) -> Result<u32, StoreError> {
    let found: u32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if found > SCHEMA_VERSION {
        return Err(StoreError::UnsupportedSchema(found));
    }
    if found == SCHEMA_VERSION {
        return Ok(found);
    }

    let tx = conn.transaction()?;
    if found == 1 {
        upgrade_event_type_codes(&tx)?;
    }
    tx.execute_batch(CASES)?;
    tx.execute_batch(DATA_VALIDATIONS)?;
    tx.execute_batch(AUDIT_EVENTS)?;
    tx.execute_batch(COURTS)?;
    tx.execute_batch(&format!("PRAGMA user_version = {}", SCHEMA_VERSION))?;
    tx.commit()?;

    info!("database schema upgraded from version {} to {}", found, SCHEMA_VERSION);
    Ok(found)
}

/// Rebuilds `audit_events` with a text `event_type` column, translating the
/// version 1 integer codes into event type names.
fn upgrade_event_type_codes(tx: &rusqlite::Transaction<'_>) -> Result<(), StoreError> {
    tx.execute_batch("ALTER TABLE audit_events RENAME TO audit_events_v1")?;
    tx.execute_batch(AUDIT_EVENTS)?;
    tx.execute_batch(
        "INSERT INTO audit_events (id, event_type, event_subtype, event_trace, event_data,
                                   case_id, extra_data_hash, event_datetime)
         SELECT id, CAST(event_type AS TEXT), event_subtype, event_trace, event_data,
                case_id, extra_data_hash, event_datetime
         FROM audit_events_v1",
    )?;

    let codes: Vec<i64> = tx
        .prepare("SELECT DISTINCT event_type FROM audit_events_v1")?
        .query_map([], |row| row.get(0))?
        .collect::<Result<_, _>>()?;

    for code in codes {
        let name = match EventType::from_legacy_code(code) {
            Some(event_type) => event_type.as_str(),
            None => {
                warn!("audit events with unknown legacy type code {} set to not_set", code);
                EventType::NotSet.as_str()
            }
        };
        tx.execute(
            "UPDATE audit_events SET event_type = ?1 WHERE event_type = ?2",
            params![name, code.to_string()],
        )?;
    }

    tx.execute_batch("DROP TABLE audit_events_v1")?;
    Ok(())
}
