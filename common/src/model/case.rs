use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A court case as imported from the court's data exchange.
///
/// `urn` always holds the canonical form (`06/AA/1234567/16`) so that exact
/// lookups never need to normalise stored data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub id: i64,
    pub urn: String,
    pub case_number: Option<String>,
    /// Organisation unit code of the court dealing with the case.
    pub court_reference: Option<String>,
    pub hearing_date: Option<NaiveDate>,
    pub forenames: Option<String>,
    pub surname: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub postcode: Option<String>,
    pub email: Option<String>,
    /// Set once a plea for this case has been submitted to the court.
    pub sent: bool,
    pub imported: bool,
    pub extra_data: BTreeMap<String, String>,
    pub created: DateTime<Utc>,
}

impl Case {
    /// Full name as it would be printed on a notice.
    pub fn display_name(&self) -> Option<String> {
        match (self.forenames.as_deref(), self.surname.as_deref()) {
            (Some(f), Some(s)) => Some(format!("{} {}", f, s)),
            (None, Some(s)) => Some(s.to_string()),
            (Some(f), None) => Some(f.to_string()),
            (None, None) => self.extra_data.get("OrganisationName").cloned(),
        }
    }
}

/// The fields needed to insert a case. The store assigns `id` and `created`.
///
/// Cases arrive through the import API, so `imported` defaults to true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCase {
    pub urn: String,
    #[serde(default)]
    pub case_number: Option<String>,
    #[serde(default)]
    pub court_reference: Option<String>,
    #[serde(default)]
    pub hearing_date: Option<NaiveDate>,
    #[serde(default)]
    pub forenames: Option<String>,
    #[serde(default)]
    pub surname: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub postcode: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub sent: bool,
    #[serde(default = "default_imported")]
    pub imported: bool,
    #[serde(default)]
    pub extra_data: BTreeMap<String, String>,
}

fn default_imported() -> bool {
    true
}

impl Default for NewCase {
    fn default() -> Self {
        NewCase {
            urn: String::new(),
            case_number: None,
            court_reference: None,
            hearing_date: None,
            forenames: None,
            surname: None,
            date_of_birth: None,
            postcode: None,
            email: None,
            sent: false,
            imported: default_imported(),
            extra_data: BTreeMap::new(),
        }
    }
}
