//! # Case Import Service
//!
//! Backend of `POST /api/cases`. Every outcome of an import leaves a
//! `case_api` audit event: the URN was missing, malformed or already used for
//! a sent case, or the case was stored.
//!
//! Imports are keyed on the URN and case number. Posting a case that is
//! already stored and not yet sent updates that case in place (`200 OK`);
//! anything else creates a new one (`201 Created`).

use crate::audit::EventEntry;
use crate::config::Config;
use crate::services::{audit_quietly, bad_request, open_store, unavailable};
use crate::store::StoreError;
use crate::urn::{Urn, UrnError};
use actix_web::{web, HttpResponse, Responder};
use common::model::audit_event::{subtype, EventType};
use common::model::case::{Case, NewCase};
use common::model::matching::ErrorResponse;
use log::{info, warn};
use thiserror::Error;

enum Imported {
    Created(Case),
    Updated(Case),
}

#[derive(Debug, Error)]
enum CreateCaseError {
    #[error(transparent)]
    InvalidUrn(UrnError),

    #[error("a plea has already been sent for URN {0}")]
    DuplicateUrn(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub async fn process(config: web::Data<Config>, payload: web::Json<NewCase>) -> impl Responder {
    let config = config.get_ref().clone();
    let case = payload.into_inner();

    match tokio::task::spawn_blocking(move || create_case(&config, case)).await {
        Ok(Ok(Imported::Created(case))) => HttpResponse::Created().json(case),
        Ok(Ok(Imported::Updated(case))) => HttpResponse::Ok().json(case),
        Ok(Err(CreateCaseError::InvalidUrn(e))) => {
            bad_request(&e, e.segment().map(|s| s.as_str()))
        }
        Ok(Err(e @ CreateCaseError::DuplicateUrn(_))) => {
            HttpResponse::Conflict().json(ErrorResponse {
                error: e.to_string(),
                segment: None,
            })
        }
        Ok(Err(CreateCaseError::Store(e))) => unavailable(e),
        Err(e) => unavailable(e),
    }
}

fn create_case(config: &Config, mut case: NewCase) -> Result<Imported, CreateCaseError> {
    let store = open_store(config)?;

    let urn = match Urn::parse(&case.urn, &config.urn_rules()) {
        Ok(urn) => urn,
        Err(e) => {
            warn!("case import rejected, URN {:?}: {}", case.urn, e);
            let kind = match &e {
                UrnError::Empty => subtype::CASE_INVALID_MISSING_URN,
                _ => subtype::CASE_INVALID_INVALID_URN,
            };
            audit_quietly(
                &store,
                EventType::CaseApi,
                EventEntry::new(kind)
                    .trace(e.to_string())
                    .data("urn", case.urn.as_str()),
            );
            return Err(CreateCaseError::InvalidUrn(e));
        }
    };

    let canonical = urn.canonical();
    let case_number = case.case_number.as_deref();
    if store.case_already_sent(&canonical, case_number)? {
        warn!("case import rejected, URN {} already sent", canonical);
        audit_quietly(
            &store,
            EventType::CaseApi,
            EventEntry::new(subtype::CASE_INVALID_DUPLICATE_URN_USED)
                .data("urn", canonical.as_str()),
        );
        return Err(CreateCaseError::DuplicateUrn(canonical));
    }

    let imported = match store.open_case(&canonical, case_number)? {
        Some(open) => {
            case.urn = canonical;
            let updated = store.update_case(open.id, &case)?;
            info!("updated case {} for URN {}", updated.id, updated.urn);
            Imported::Updated(updated)
        }
        None => {
            case.urn = canonical;
            case.imported = true;
            let created = store.insert_case(&case)?;
            info!("imported case {} for URN {}", created.id, created.urn);
            Imported::Created(created)
        }
    };

    let stored = match &imported {
        Imported::Created(case) | Imported::Updated(case) => case,
    };
    audit_quietly(
        &store,
        EventType::CaseApi,
        EventEntry::new(subtype::SUCCESS)
            .data("urn", stored.urn.as_str())
            .case(Some(stored.id)),
    );
    Ok(imported)
}
