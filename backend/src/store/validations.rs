use crate::store::{Store, StoreError};
use chrono::{DateTime, Utc};
use common::model::data_validation::DataValidation;
use rusqlite::{params, Row};

/// A URN entry attempt about to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDataValidation {
    pub date_entered: DateTime<Utc>,
    pub urn_entered: String,
    pub urn_standardised: String,
    pub urn_formatted: Option<String>,
    pub case_match_count: u32,
    pub case_match: Option<i64>,
}

fn data_validation_from_row(row: &Row<'_>) -> rusqlite::Result<DataValidation> {
    Ok(DataValidation {
        id: row.get(0)?,
        date_entered: row.get(1)?,
        urn_entered: row.get(2)?,
        urn_standardised: row.get(3)?,
        urn_formatted: row.get(4)?,
        case_match_count: row.get(5)?,
        case_match: row.get(6)?,
    })
}

impl Store {
    pub fn insert_data_validation(&self, dv: &NewDataValidation) -> Result<i64, StoreError> {
        self.conn.execute(
            "INSERT INTO data_validations (date_entered, urn_entered, urn_standardised,
                                           urn_formatted, case_match_count, case_match)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                dv.date_entered,
                dv.urn_entered,
                dv.urn_standardised,
                dv.urn_formatted,
                dv.case_match_count,
                dv.case_match,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Every recorded attempt, oldest first.
    pub fn data_validations(&self) -> Result<Vec<DataValidation>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date_entered, urn_entered, urn_standardised, urn_formatted,
                    case_match_count, case_match
             FROM data_validations ORDER BY id",
        )?;
        let rows = stmt
            .query_map([], data_validation_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn count_data_validations(&self) -> Result<usize, StoreError> {
        self.count_table("data_validations")
    }
}
