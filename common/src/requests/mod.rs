use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Deserialize)]
/// Request payload for the URN entry endpoint.
/// The defendant fields are only used when fuzzy matching is enabled.
pub struct ValidateUrnRequest {
    pub urn: String,
    #[serde(default)]
    pub forenames: Option<String>,
    #[serde(default)]
    pub surname: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub postcode: Option<String>,
}

#[derive(Deserialize)]
/// Request payload for the audit event API.
/// `event_type` stays a string here so unknown types can be reported.
pub struct CreateAuditEventRequest {
    pub event_type: String,
    pub event_subtype: String,
    #[serde(default)]
    pub event_trace: Option<String>,
    #[serde(default)]
    pub event_data: BTreeMap<String, String>,
    #[serde(default)]
    pub case: Option<i64>,
}
