//! # URN Validation Service
//!
//! Backend of `POST /api/urn/validate`, the first step of the plea journey.
//!
//! ## Workflow
//!
//! 1.  **Parse**: the entered text is checked against the URN format. A bad
//!     entry is recorded, logged as a `urn_validator` audit event and answered
//!     with `400 Bad Request` naming the segment at fault.
//! 2.  **Court**: the URN's region must be served by an enabled court, and a
//!     court that validates URNs must hold an unsent case for it. A rejection
//!     is audited like a bad entry and answered with the same generic `400`.
//! 3.  **Match**: the canonical URN is looked up, falling back to defendant
//!     details when fuzzy matching is configured.
//! 4.  **Record**: every attempt leaves one data validation row, even when
//!     the database could not be read after a good parse. Recording failures
//!     are logged and never change the response.
//! 5.  **Respond**: `200 OK` with the URN forms, the match outcome and whether
//!     the URN is still free for a plea.

use crate::audit::EventEntry;
use crate::config::Config;
use crate::courts::{self, CourtError};
use crate::matcher::{CaseMatcher, DefendantDetails, MatchOutcome};
use crate::recorder::{Attempt, Recorder};
use crate::services::{audit_quietly, bad_request, open_store, unavailable};
use crate::store::StoreError;
use crate::urn::{Urn, UrnError};
use actix_web::{web, HttpResponse, Responder};
use common::model::audit_event::{subtype, EventType};
use common::model::matching::ValidateUrnResponse;
use common::requests::ValidateUrnRequest;
use log::warn;
use thiserror::Error;

#[derive(Debug, Error)]
enum ValidateError {
    #[error(transparent)]
    Format(#[from] UrnError),

    #[error(transparent)]
    Court(CourtError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub async fn process(
    config: web::Data<Config>,
    payload: web::Json<ValidateUrnRequest>,
) -> impl Responder {
    let config = config.get_ref().clone();
    let request = payload.into_inner();

    match tokio::task::spawn_blocking(move || validate_urn(&config, request)).await {
        Ok(Ok(response)) => HttpResponse::Ok().json(response),
        Ok(Err(ValidateError::Format(e))) => bad_request(&e, e.segment().map(|s| s.as_str())),
        Ok(Err(ValidateError::Court(e))) => bad_request(e, None),
        Ok(Err(ValidateError::Store(e))) => unavailable(e),
        Err(e) => unavailable(e),
    }
}

fn validate_urn(
    config: &Config,
    request: ValidateUrnRequest,
) -> Result<ValidateUrnResponse, ValidateError> {
    let store = open_store(config)?;
    let recorder = Recorder::new(&store);

    let urn = match Urn::parse(&request.urn, &config.urn_rules()) {
        Ok(urn) => urn,
        Err(e) => {
            warn!("rejected URN entry {:?}: {}", request.urn, e);
            recorder.record(&request.urn, Attempt::Invalid);
            audit_quietly(
                &store,
                EventType::UrnValidator,
                EventEntry::new(subtype::CASE_INVALID_INVALID_URN)
                    .trace(e.to_string())
                    .data("urn", request.urn.as_str()),
            );
            return Err(e.into());
        }
    };

    let not_found = Attempt::Checked {
        urn: &urn,
        outcome: &MatchOutcome::NotFound,
    };
    match courts::court_for(&store, &urn) {
        Ok(_) => {}
        Err(CourtError::Store(e)) => {
            recorder.record(&request.urn, not_found);
            return Err(e.into());
        }
        Err(e) => {
            warn!("rejected URN entry {:?}: {}", request.urn, e.reason());
            recorder.record(&request.urn, not_found);
            audit_quietly(
                &store,
                EventType::UrnValidator,
                EventEntry::new(subtype::CASE_INVALID_INVALID_URN)
                    .trace(e.reason())
                    .data("urn", request.urn.as_str()),
            );
            return Err(ValidateError::Court(e));
        }
    }

    let details = DefendantDetails {
        forenames: request.forenames,
        surname: request.surname,
        date_of_birth: request.date_of_birth,
        postcode: request.postcode,
    };
    let matcher = CaseMatcher::new(&store, config.fuzzy());
    let outcome = match matcher.find(&urn, Some(&details)) {
        Ok(outcome) => outcome,
        Err(e) => {
            recorder.record(&request.urn, not_found);
            return Err(e.into());
        }
    };
    recorder.record(
        &request.urn,
        Attempt::Checked {
            urn: &urn,
            outcome: &outcome,
        },
    );

    Ok(ValidateUrnResponse {
        urn: urn.forms(),
        outcome: outcome.summary(),
        can_use_urn: matcher.can_use_urn(&urn)?,
    })
}
