//! # Court registry checks
//!
//! A URN is only accepted for an online plea when its police region is
//! served by an enabled court. Courts flagged `validate_urn` go further and
//! only take URNs for which an unsent case has already been imported.
//!
//! Both rejections read the same to the defendant so that the answer does not
//! reveal which URNs exist.

use crate::store::{Store, StoreError};
use crate::urn::Urn;
use common::model::court::Court;
use log::debug;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CourtError {
    #[error("the URN is not valid")]
    NoCourt { region: String },

    #[error("the URN is not valid")]
    NoOpenCase { urn: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CourtError {
    /// Detail for logs and audit traces, never shown to the defendant.
    pub fn reason(&self) -> String {
        match self {
            CourtError::NoCourt { region } => format!("no enabled court for region {}", region),
            CourtError::NoOpenCase { urn } => {
                format!("no unsent case for {} at a validating court", urn)
            }
            CourtError::Store(e) => e.to_string(),
        }
    }
}

/// The court that will hear a plea for `urn`.
pub fn court_for(store: &Store, urn: &Urn) -> Result<Court, CourtError> {
    let court = store
        .court_for_region(urn.region())?
        .ok_or_else(|| CourtError::NoCourt {
            region: urn.region().to_string(),
        })?;

    if court.validate_urn {
        let canonical = urn.canonical();
        if !store.has_open_case(&canonical)? {
            return Err(CourtError::NoOpenCase { urn: canonical });
        }
    }

    debug!("{} is heard by {}", urn, court.court_name);
    Ok(court)
}
