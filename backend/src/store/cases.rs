use crate::store::{Store, StoreError};
use crate::urn;
use chrono::{DateTime, NaiveDate, Utc};
use common::model::case::{Case, NewCase};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row};
use std::collections::BTreeMap;

const CASE_COLUMNS: &str = "id, urn, case_number, court_reference, hearing_date, forenames, \
     surname, date_of_birth, postcode, email, sent, imported, extra_data, created";

/// Postcodes are compared without spaces or punctuation, uppercased.
pub fn postcode_key(postcode: &str) -> String {
    urn::standardise(postcode).unwrap_or_default()
}

fn case_from_row(row: &Row<'_>) -> rusqlite::Result<Case> {
    let extra_data: String = row.get(12)?;
    let extra_data: BTreeMap<String, String> = serde_json::from_str(&extra_data)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(12, Type::Text, Box::new(e)))?;

    Ok(Case {
        id: row.get(0)?,
        urn: row.get(1)?,
        case_number: row.get(2)?,
        court_reference: row.get(3)?,
        hearing_date: row.get(4)?,
        forenames: row.get(5)?,
        surname: row.get(6)?,
        date_of_birth: row.get(7)?,
        postcode: row.get(8)?,
        email: row.get(9)?,
        sent: row.get(10)?,
        imported: row.get(11)?,
        extra_data,
        created: row.get(13)?,
    })
}

impl Store {
    pub fn insert_case(&self, case: &NewCase) -> Result<Case, StoreError> {
        self.insert_case_at(case, Utc::now())
    }

    /// Insert with an explicit creation time. The matcher breaks ties on
    /// `created`, so imports replaying old data keep their original order.
    pub fn insert_case_at(
        &self,
        case: &NewCase,
        created: DateTime<Utc>,
    ) -> Result<Case, StoreError> {
        let extra_data = serde_json::to_string(&case.extra_data)?;
        let key = case.postcode.as_deref().map(postcode_key);

        self.conn.execute(
            "INSERT INTO cases (urn, case_number, court_reference, hearing_date, forenames,
                                surname, date_of_birth, postcode, postcode_key, email, sent,
                                imported, extra_data, created)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                case.urn,
                case.case_number,
                case.court_reference,
                case.hearing_date,
                case.forenames,
                case.surname,
                case.date_of_birth,
                case.postcode,
                key,
                case.email,
                case.sent,
                case.imported,
                extra_data,
                created,
            ],
        )?;

        Ok(Case {
            id: self.conn.last_insert_rowid(),
            urn: case.urn.clone(),
            case_number: case.case_number.clone(),
            court_reference: case.court_reference.clone(),
            hearing_date: case.hearing_date,
            forenames: case.forenames.clone(),
            surname: case.surname.clone(),
            date_of_birth: case.date_of_birth,
            postcode: case.postcode.clone(),
            email: case.email.clone(),
            sent: case.sent,
            imported: case.imported,
            extra_data: case.extra_data.clone(),
            created,
        })
    }

    pub fn get_case(&self, id: i64) -> Result<Case, StoreError> {
        let sql = format!("SELECT {CASE_COLUMNS} FROM cases WHERE id = ?1");
        self.conn
            .query_row(&sql, params![id], case_from_row)
            .optional()?
            .ok_or(StoreError::NotFound("case", id))
    }

    /// Replaces the data of an existing case, keeping its id, creation time
    /// and sent flag. The case counts as imported from then on.
    pub fn update_case(&self, id: i64, case: &NewCase) -> Result<Case, StoreError> {
        let extra_data = serde_json::to_string(&case.extra_data)?;
        let key = case.postcode.as_deref().map(postcode_key);

        let changed = self.conn.execute(
            "UPDATE cases SET urn = ?2, case_number = ?3, court_reference = ?4,
                              hearing_date = ?5, forenames = ?6, surname = ?7,
                              date_of_birth = ?8, postcode = ?9, postcode_key = ?10,
                              email = ?11, imported = 1, extra_data = ?12
             WHERE id = ?1",
            params![
                id,
                case.urn,
                case.case_number,
                case.court_reference,
                case.hearing_date,
                case.forenames,
                case.surname,
                case.date_of_birth,
                case.postcode,
                key,
                case.email,
                extra_data,
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound("case", id));
        }
        self.get_case(id)
    }

    /// The earliest unsent case with this URN and case number. A missing
    /// case number only matches cases stored without one.
    pub fn open_case(
        &self,
        urn: &str,
        case_number: Option<&str>,
    ) -> Result<Option<Case>, StoreError> {
        let sql = format!(
            "SELECT {CASE_COLUMNS} FROM cases
             WHERE urn = ?1 AND case_number IS ?2 AND sent = 0
             ORDER BY created, id
             LIMIT 1"
        );
        Ok(self
            .conn
            .query_row(&sql, params![urn, case_number], case_from_row)
            .optional()?)
    }

    /// Whether any case with this URN is still waiting for a plea.
    pub fn has_open_case(&self, urn: &str) -> Result<bool, StoreError> {
        let open: bool = self.conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM cases WHERE urn = ?1 AND sent = 0)",
            params![urn],
            |row| row.get(0),
        )?;
        Ok(open)
    }

    /// Imported cases stored under exactly this canonical URN, earliest
    /// created first.
    pub fn cases_by_urn(&self, urn: &str) -> Result<Vec<Case>, StoreError> {
        let sql = format!(
            "SELECT {CASE_COLUMNS} FROM cases
             WHERE urn = ?1 AND imported = 1
             ORDER BY created, id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let cases = stmt
            .query_map(params![urn], case_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(cases)
    }

    /// Whether a plea has already been sent for a case with this URN.
    pub fn urn_already_sent(&self, urn: &str) -> Result<bool, StoreError> {
        let sent: bool = self.conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM cases WHERE urn = ?1 AND sent = 1)",
            params![urn],
            |row| row.get(0),
        )?;
        Ok(sent)
    }

    /// Like [`Store::urn_already_sent`], narrowed to one case number.
    pub fn case_already_sent(
        &self,
        urn: &str,
        case_number: Option<&str>,
    ) -> Result<bool, StoreError> {
        let sent: bool = self.conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM cases WHERE urn = ?1 AND case_number IS ?2 AND sent = 1)",
            params![urn, case_number],
            |row| row.get(0),
        )?;
        Ok(sent)
    }

    /// Imported cases in `region` sharing the postcode or the date of birth, at most
    /// `limit` of them, earliest created first.
    pub fn fuzzy_candidates(
        &self,
        region: &str,
        postcode: Option<&str>,
        date_of_birth: Option<NaiveDate>,
        limit: usize,
    ) -> Result<Vec<Case>, StoreError> {
        if postcode.is_none() && date_of_birth.is_none() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT {CASE_COLUMNS} FROM cases
             WHERE urn LIKE ?1 || '/%'
               AND imported = 1
               AND ((?2 IS NOT NULL AND postcode_key = ?2)
                    OR (?3 IS NOT NULL AND date_of_birth = ?3))
             ORDER BY created, id
             LIMIT ?4"
        );
        let key = postcode.map(postcode_key);
        let mut stmt = self.conn.prepare(&sql)?;
        let cases = stmt
            .query_map(
                params![region, key, date_of_birth, limit as i64],
                case_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(cases)
    }

    pub fn count_cases(&self) -> Result<usize, StoreError> {
        self.count_table("cases")
    }
}

#[cfg(test)]
mod tests {
    use crate::store::tests::{memory_store, new_case};
    use crate::store::StoreError;
    use chrono::{Duration, NaiveDate, Utc};

    use super::postcode_key;

    #[test]
    fn postcode_keys_ignore_spacing_and_case() {
        assert_eq!(postcode_key("m60 1pr"), "M601PR");
        assert_eq!(postcode_key(" M6-0 1PR "), "M601PR");
    }

    #[test]
    fn cases_by_urn_orders_by_creation() {
        let store = memory_store();
        let now = Utc::now();
        let later = store
            .insert_case_at(&new_case("06/AA/1234567/16"), now)
            .unwrap();
        let earlier = store
            .insert_case_at(&new_case("06/AA/1234567/16"), now - Duration::hours(1))
            .unwrap();
        store.insert_case(&new_case("06/AA/7654321/16")).unwrap();

        let ids: Vec<i64> = store
            .cases_by_urn("06/AA/1234567/16")
            .unwrap()
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![earlier.id, later.id]);
        assert_eq!(store.count_cases().unwrap(), 3);
    }

    #[test]
    fn cases_by_urn_skips_cases_not_imported() {
        let store = memory_store();
        let imported = store.insert_case(&new_case("06/AA/1234567/16")).unwrap();
        let mut manual = new_case("06/AA/1234567/16");
        manual.imported = false;
        store.insert_case(&manual).unwrap();

        let found = store.cases_by_urn("06/AA/1234567/16").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, imported.id);
    }

    #[test]
    fn open_case_is_keyed_on_urn_and_case_number() {
        let store = memory_store();
        let mut first = new_case("06/AA/1234567/16");
        first.case_number = Some("A1".into());
        let first = store.insert_case(&first).unwrap();
        let mut sent = new_case("06/AA/1234567/16");
        sent.case_number = Some("B2".into());
        sent.sent = true;
        store.insert_case(&sent).unwrap();
        let unnumbered = store.insert_case(&new_case("06/AA/1234567/16")).unwrap();

        let open = |n: Option<&str>| store.open_case("06/AA/1234567/16", n).unwrap();
        assert_eq!(open(Some("A1")).map(|c| c.id), Some(first.id));
        assert_eq!(open(Some("B2")), None);
        assert_eq!(open(None).map(|c| c.id), Some(unnumbered.id));

        assert!(store.case_already_sent("06/AA/1234567/16", Some("B2")).unwrap());
        assert!(!store.case_already_sent("06/AA/1234567/16", Some("A1")).unwrap());
        assert!(store.has_open_case("06/AA/1234567/16").unwrap());
        assert!(!store.has_open_case("06/AA/7654321/16").unwrap());
    }

    #[test]
    fn update_case_keeps_identity_and_sets_imported() {
        let store = memory_store();
        let created = Utc::now() - Duration::days(2);
        let mut original = new_case("06/AA/1234567/16");
        original.imported = false;
        original.postcode = Some("M60 1PR".into());
        let stored = store.insert_case_at(&original, created).unwrap();

        let mut update = new_case("06/AA/1234567/16");
        update.surname = Some("Smith".into());
        update.postcode = Some("m1 1aa".into());
        update.extra_data.insert("plea".into(), "guilty".into());
        let updated = store.update_case(stored.id, &update).unwrap();

        assert_eq!(updated.id, stored.id);
        assert_eq!(updated.created, stored.created);
        assert!(updated.imported);
        assert_eq!(updated.surname.as_deref(), Some("Smith"));
        assert_eq!(updated.extra_data.get("plea").map(String::as_str), Some("guilty"));
        assert_eq!(store.count_cases().unwrap(), 1);
        assert_eq!(
            store.fuzzy_candidates("06", Some("M1 1AA"), None, 10).unwrap().len(),
            1
        );

        assert!(matches!(
            store.update_case(stored.id + 1, &update),
            Err(StoreError::NotFound("case", _))
        ));
    }

    #[test]
    fn urn_already_sent_only_counts_sent_cases() {
        let store = memory_store();
        store.insert_case(&new_case("06/AA/1234567/16")).unwrap();
        assert!(!store.urn_already_sent("06/AA/1234567/16").unwrap());

        let mut sent = new_case("06/AA/1234567/16");
        sent.sent = true;
        store.insert_case(&sent).unwrap();
        assert!(store.urn_already_sent("06/AA/1234567/16").unwrap());
    }

    #[test]
    fn fuzzy_candidates_stay_in_region() {
        let store = memory_store();
        let mut same_region = new_case("06/AA/1234567/16");
        same_region.postcode = Some("M60 1PR".into());
        let mut other_region = new_case("07/AA/1234567/16");
        other_region.postcode = Some("M60 1PR".into());
        let mut by_dob = new_case("06/BB/7654321/16");
        by_dob.date_of_birth = NaiveDate::from_ymd_opt(1980, 1, 1);

        let a = store.insert_case(&same_region).unwrap();
        store.insert_case(&other_region).unwrap();
        let b = store.insert_case(&by_dob).unwrap();

        let found = store
            .fuzzy_candidates("06", Some("m601pr"), NaiveDate::from_ymd_opt(1980, 1, 1), 10)
            .unwrap();
        let ids: Vec<i64> = found.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![a.id, b.id]);

        let limited = store
            .fuzzy_candidates("06", Some("M60 1PR"), NaiveDate::from_ymd_opt(1980, 1, 1), 1)
            .unwrap();
        assert_eq!(limited.len(), 1);

        assert!(store.fuzzy_candidates("06", None, None, 10).unwrap().is_empty());
    }
}
