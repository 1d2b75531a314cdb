use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recorded URN entry attempt.
///
/// Rows are append-only. A failed parse still produces a row, with
/// `urn_formatted` left empty and a zero match count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataValidation {
    pub id: i64,
    pub date_entered: DateTime<Utc>,
    /// The URN exactly as the user typed it.
    pub urn_entered: String,
    /// Alphanumeric-only, uppercase version of `urn_entered`.
    pub urn_standardised: String,
    /// Display form, present only when the URN parsed.
    pub urn_formatted: Option<String>,
    pub case_match_count: u32,
    /// Set only when exactly one case matched.
    pub case_match: Option<i64>,
}
