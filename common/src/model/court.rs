use serde::{Deserialize, Serialize};

/// A magistrates' court taking online pleas for one police region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Court {
    /// The two digit region code URNs from this court start with.
    pub region_code: String,
    #[serde(default)]
    pub court_code: Option<String>,
    pub court_name: String,
    /// Disabled courts are treated as absent.
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    /// Only accept URNs for which an unsent case has been imported.
    #[serde(default)]
    pub validate_urn: bool,
}

fn enabled_by_default() -> bool {
    true
}
