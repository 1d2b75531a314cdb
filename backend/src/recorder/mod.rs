//! Records every URN entry attempt for later reporting.
//!
//! Recording is best effort: a failed write is logged and forgotten so that
//! an audit problem never stops a defendant from making a plea.

use crate::matcher::{CaseMatcher, MatchOutcome};
use crate::store::{NewDataValidation, Store, StoreError};
use crate::urn::{self, Urn, UrnRules};
use chrono::Utc;
use log::{error, info};

/// What became of an entered URN.
pub enum Attempt<'a> {
    /// The URN did not parse.
    Invalid,
    Checked {
        urn: &'a Urn,
        outcome: &'a MatchOutcome,
    },
}

pub struct Recorder<'a> {
    store: &'a Store,
}

impl<'a> Recorder<'a> {
    pub fn new(store: &'a Store) -> Self {
        Recorder { store }
    }

    /// Appends one row for this attempt and returns its id, or `None` if the
    /// write failed.
    pub fn record(&self, entered: &str, attempt: Attempt<'_>) -> Option<i64> {
        let row = match attempt {
            Attempt::Invalid => NewDataValidation {
                date_entered: Utc::now(),
                urn_entered: entered.to_string(),
                urn_standardised: urn::standardise(entered).unwrap_or_default(),
                urn_formatted: None,
                case_match_count: 0,
                case_match: None,
            },
            Attempt::Checked { urn, outcome } => NewDataValidation {
                date_entered: Utc::now(),
                urn_entered: entered.to_string(),
                urn_standardised: urn.standardised(),
                urn_formatted: Some(urn.display()),
                case_match_count: outcome.match_count(),
                case_match: outcome.matched_case_id(),
            },
        };

        match self.store.insert_data_validation(&row) {
            Ok(id) => Some(id),
            Err(e) => {
                error!("could not record URN entry {:?}: {}", entered, e);
                None
            }
        }
    }
}

/// How the recorded attempts would fare against today's case data.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplayReport {
    pub replayed: usize,
    /// Attempts whose entry does not parse under the current rules.
    pub unparseable: usize,
    /// Attempts whose match count differs from the recorded one.
    pub changed: usize,
    /// Attempts that found nothing at the time and would match now.
    pub newly_matched: usize,
}

/// Re-runs the exact lookup for every recorded attempt. Read only; the
/// recorded rows are left as they were.
pub fn replay(
    store: &Store,
    matcher: &CaseMatcher<'_>,
    rules: &UrnRules,
) -> Result<ReplayReport, StoreError> {
    let mut report = ReplayReport::default();

    for dv in store.data_validations()? {
        report.replayed += 1;
        let urn = match Urn::parse(&dv.urn_entered, rules) {
            Ok(urn) => urn,
            Err(_) => {
                report.unparseable += 1;
                continue;
            }
        };

        let count = matcher.find(&urn, None)?.match_count();
        if count != dv.case_match_count {
            report.changed += 1;
            if dv.case_match_count == 0 {
                report.newly_matched += 1;
            }
        }
    }

    info!("replayed URN entries: {:?}", report);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::FuzzyConfig;
    use crate::store::tests::{memory_store, new_case};

    fn parse(raw: &str) -> Urn {
        Urn::parse(raw, &UrnRules::default()).unwrap()
    }

    #[test]
    fn records_a_matched_attempt() {
        let store = memory_store();
        let case = store.insert_case(&new_case("51/AA/0000000/00")).unwrap();
        let matcher = CaseMatcher::new(&store, FuzzyConfig::default());
        let urn = parse("51/aa/0000000/00");
        let outcome = matcher.find(&urn, None).unwrap();

        let id = Recorder::new(&store)
            .record(
                "51/aa/0000000/00",
                Attempt::Checked {
                    urn: &urn,
                    outcome: &outcome,
                },
            )
            .unwrap();

        let rows = store.data_validations().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, id);
        assert_eq!(rows[0].urn_entered, "51/aa/0000000/00");
        assert_eq!(rows[0].urn_standardised, "51AA000000000");
        assert_eq!(rows[0].urn_formatted.as_deref(), Some("51/AA/0000000/00"));
        assert_eq!(rows[0].case_match_count, 1);
        assert_eq!(rows[0].case_match, Some(case.id));
    }

    #[test]
    fn ambiguous_attempt_records_count_without_case() {
        let store = memory_store();
        store.insert_case(&new_case("51/AA/0000000/00")).unwrap();
        store.insert_case(&new_case("51/AA/0000000/00")).unwrap();
        let matcher = CaseMatcher::new(&store, FuzzyConfig::default());
        let urn = parse("51/AA/0000000/00");
        let outcome = matcher.find(&urn, None).unwrap();

        Recorder::new(&store).record(
            "51/AA/0000000/00",
            Attempt::Checked {
                urn: &urn,
                outcome: &outcome,
            },
        );

        let row = &store.data_validations().unwrap()[0];
        assert_eq!(row.case_match_count, 2);
        assert_eq!(row.case_match, None);
    }

    #[test]
    fn every_attempt_gets_exactly_one_row() {
        let store = memory_store();
        store.insert_case(&new_case("06/AA/1234567/16")).unwrap();
        let matcher = CaseMatcher::new(&store, FuzzyConfig::default());
        let recorder = Recorder::new(&store);

        let entries = ["06/AA/1234567/16", "123", "06/AA/7654321/16", "", "AA/bb/0000000/00"];
        for entry in entries {
            match Urn::parse(entry, &UrnRules::default()) {
                Ok(urn) => {
                    let outcome = matcher.find(&urn, None).unwrap();
                    recorder.record(
                        entry,
                        Attempt::Checked {
                            urn: &urn,
                            outcome: &outcome,
                        },
                    );
                }
                Err(_) => {
                    recorder.record(entry, Attempt::Invalid);
                }
            }
        }

        assert_eq!(store.count_data_validations().unwrap(), entries.len());
        let invalid = &store.data_validations().unwrap()[1];
        assert_eq!(invalid.urn_standardised, "123");
        assert_eq!(invalid.urn_formatted, None);
        assert_eq!(invalid.case_match_count, 0);
    }

    #[test]
    fn write_failures_are_swallowed() {
        // Never migrated, so the table does not exist.
        let store = Store::open_in_memory().unwrap();
        assert_eq!(Recorder::new(&store).record("123", Attempt::Invalid), None);
    }

    #[test]
    fn replay_reports_new_matches_without_touching_rows() {
        let store = memory_store();
        let matcher = CaseMatcher::new(&store, FuzzyConfig::default());
        let recorder = Recorder::new(&store);

        let urn = parse("06/AA/1234567/16");
        recorder.record(
            "06/AA/1234567/16",
            Attempt::Checked {
                urn: &urn,
                outcome: &MatchOutcome::NotFound,
            },
        );
        recorder.record("not a urn", Attempt::Invalid);

        store.insert_case(&new_case("06/AA/1234567/16")).unwrap();

        let report = replay(&store, &matcher, &UrnRules::default()).unwrap();
        assert_eq!(
            report,
            ReplayReport {
                replayed: 2,
                unparseable: 1,
                changed: 1,
                newly_matched: 1,
            }
        );
        assert_eq!(store.data_validations().unwrap()[0].case_match_count, 0);
    }
}
