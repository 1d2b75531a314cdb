//! SQLite persistence for cases, URN entry attempts and audit events.
//!
//! Every request opens its own [`Store`]; nothing is shared between requests
//! beyond the database file. `data_validations` and `audit_events` are
//! append-only: the only statement that removes rows is the retention purge.

mod audit;
mod cases;
mod courts;
mod error;
pub mod schema;
mod validations;

pub use audit::NewAuditEvent;
pub use cases::postcode_key;
pub use error::StoreError;
pub use validations::NewDataValidation;

use chrono::{DateTime, Utc};
use log::info;
use rusqlite::{params, Connection};
use std::path::Path;
use std::time::Duration;

/// Rows removed by [`Store::purge_before`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PurgeCounts {
    pub cases: usize,
    pub data_validations: usize,
    pub audit_events: usize,
}

pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open or create the database file at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Self::configure(Connection::open(path)?)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::configure(Connection::open_in_memory()?)
    }

    fn configure(conn: Connection) -> Result<Self, StoreError> {
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        Ok(Self { conn })
    }

    /// Create or upgrade the tables. Returns the schema version found on disk.
    pub fn migrate(&mut self) -> Result<u32, StoreError> {
        schema::migrate(&mut self.conn)
    }

    pub fn schema_version(&self) -> Result<u32, StoreError> {
        Ok(self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))?)
    }

    /// Delete cases, entry attempts and audit events created before `cutoff`.
    ///
    /// Rows referencing a purged case go with it, whatever their own age.
    pub fn purge_before(&mut self, cutoff: DateTime<Utc>) -> Result<PurgeCounts, StoreError> {
        let tx = self.conn.transaction()?;
        let audit_events = tx.execute(
            "DELETE FROM audit_events WHERE event_datetime < ?1",
            params![cutoff],
        )?;
        let data_validations = tx.execute(
            "DELETE FROM data_validations WHERE date_entered < ?1",
            params![cutoff],
        )?;
        let cases = tx.execute("DELETE FROM cases WHERE created < ?1", params![cutoff])?;
        tx.commit()?;

        let counts = PurgeCounts {
            cases,
            data_validations,
            audit_events,
        };
        info!("purged rows older than {}: {:?}", cutoff, counts);
        Ok(counts)
    }

    fn count_table(&self, table: &str) -> Result<usize, StoreError> {
        let sql = format!("SELECT count(*) FROM {table}");
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
