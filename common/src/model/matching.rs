use crate::model::case::Case;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The three renderings of a validated URN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrnForms {
    /// Uppercase, slash separated; the key cases are stored under.
    pub canonical: String,
    /// Alphanumeric only.
    pub standardised: String,
    pub display: String,
}

/// The fields a caller needs to tell candidate cases apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseSummary {
    pub id: i64,
    pub urn: String,
    pub name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub postcode: Option<String>,
    pub hearing_date: Option<NaiveDate>,
    /// Similarity score, only present for fuzzy candidates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl CaseSummary {
    pub fn from_case(case: &Case, score: Option<f64>) -> Self {
        CaseSummary {
            id: case.id,
            urn: case.urn.clone(),
            name: case.display_name(),
            date_of_birth: case.date_of_birth,
            postcode: case.postcode.clone(),
            hearing_date: case.hearing_date,
            score,
        }
    }
}

/// Result of looking a URN up, as reported to API clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MatchSummary {
    NotFound,
    Matched { case: CaseSummary },
    /// Candidates are ranked; the first one is the preferred suggestion.
    Ambiguous { candidates: Vec<CaseSummary> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidateUrnResponse {
    pub urn: UrnForms,
    pub outcome: MatchSummary,
    /// False when a case with this URN has already been sent to the court.
    pub can_use_urn: bool,
}

/// Body of a 4xx response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_is_tagged_by_status() {
        let json = serde_json::to_value(MatchSummary::NotFound).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "not_found" }));
    }
}
