//! # HTTP services
//!
//! Each sub-module owns one area of the API and exposes a
//! `configure_routes()` returning its actix `Scope`:
//!
//! - `urn`: URN entry from the defendant journey.
//! - `cases`: case import and lookup for court systems.
//! - `audit_events`: audit events submitted by other services.
//!
//! Handlers never share a connection. Each request opens the database named
//! in the [`Config`] on a blocking thread, does its work and drops it.

pub mod audit_events;
pub mod cases;
pub mod urn;

use crate::audit::{AuditLogger, EventEntry};
use crate::config::Config;
use crate::store::{Store, StoreError};
use actix_web::HttpResponse;
use common::model::audit_event::EventType;
use common::model::matching::ErrorResponse;
use log::error;

pub(crate) fn open_store(config: &Config) -> Result<Store, StoreError> {
    Store::open(&config.database)
}

/// Writes an audit event on behalf of a handler. Failures are logged only;
/// the request carries on.
pub(crate) fn audit_quietly(store: &Store, event_type: EventType, entry: EventEntry) {
    if let Err(e) = AuditLogger::new(store).log(event_type, entry) {
        error!("could not write {} audit event: {}", event_type, e);
    }
}

pub(crate) fn bad_request(error: impl ToString, segment: Option<&str>) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: error.to_string(),
        segment: segment.map(str::to_string),
    })
}

pub(crate) fn unavailable(error: impl std::fmt::Display) -> HttpResponse {
    error!("request failed: {}", error);
    HttpResponse::ServiceUnavailable().body(format!("Service unavailable: {}", error))
}
