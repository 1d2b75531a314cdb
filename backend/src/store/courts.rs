use crate::store::{Store, StoreError};
use common::model::court::Court;
use rusqlite::{params, OptionalExtension, Row};

const COURT_COLUMNS: &str = "region_code, court_code, court_name, enabled, validate_urn";

fn court_from_row(row: &Row<'_>) -> rusqlite::Result<Court> {
    Ok(Court {
        region_code: row.get(0)?,
        court_code: row.get(1)?,
        court_name: row.get(2)?,
        enabled: row.get(3)?,
        validate_urn: row.get(4)?,
    })
}

impl Store {
    /// Registers a court, replacing any court already serving its region.
    pub fn save_court(&self, court: &Court) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO courts (region_code, court_code, court_name, enabled, validate_urn)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (region_code) DO UPDATE SET
                 court_code = excluded.court_code,
                 court_name = excluded.court_name,
                 enabled = excluded.enabled,
                 validate_urn = excluded.validate_urn",
            params![
                court.region_code,
                court.court_code,
                court.court_name,
                court.enabled,
                court.validate_urn,
            ],
        )?;
        Ok(())
    }

    /// The enabled court for a region, if any.
    pub fn court_for_region(&self, region_code: &str) -> Result<Option<Court>, StoreError> {
        let sql = format!("SELECT {COURT_COLUMNS} FROM courts WHERE region_code = ?1 AND enabled = 1");
        Ok(self
            .conn
            .query_row(&sql, params![region_code], court_from_row)
            .optional()?)
    }

    pub fn courts(&self) -> Result<Vec<Court>, StoreError> {
        let sql = format!("SELECT {COURT_COLUMNS} FROM courts ORDER BY region_code");
        let mut stmt = self.conn.prepare(&sql)?;
        let courts = stmt
            .query_map([], court_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(courts)
    }
}

#[cfg(test)]
mod tests {
    use crate::store::tests::{court, execute_sql, memory_store};
    use crate::store::Store;

    #[test]
    fn disabled_courts_are_not_found() {
        let store = memory_store();
        store.save_court(&court("06")).unwrap();
        let mut closed = court("51");
        closed.enabled = false;
        store.save_court(&closed).unwrap();

        assert_eq!(store.court_for_region("06").unwrap(), Some(court("06")));
        assert_eq!(store.court_for_region("51").unwrap(), None);
        assert_eq!(store.court_for_region("07").unwrap(), None);
        assert_eq!(store.courts().unwrap().len(), 2);
    }

    #[test]
    fn saving_a_region_again_replaces_its_court() {
        let store = memory_store();
        store.save_court(&court("06")).unwrap();
        let mut strict = court("06");
        strict.court_name = "Lavender Hill".to_string();
        strict.validate_urn = true;
        store.save_court(&strict).unwrap();

        assert_eq!(store.courts().unwrap(), vec![strict]);
    }

    #[test]
    fn version_two_database_gains_the_court_table() {
        let mut store = Store::open_in_memory().unwrap();
        store.migrate().unwrap();
        execute_sql(&store, "DROP TABLE courts; PRAGMA user_version = 2;");

        assert_eq!(store.migrate().unwrap(), 2);
        store.save_court(&court("06")).unwrap();
        assert_eq!(store.courts().unwrap().len(), 1);
    }
}
