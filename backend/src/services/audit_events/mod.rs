//! Audit event API for services that log on the plea journey's behalf.

mod create;

use actix_web::web::{post, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/audit_events";

/// Configures the Actix `Scope` for audit event routes.
///
/// *   **`POST /`**: stores an event. `201 Created` with the stored event,
///     `400 Bad Request` for an unknown event type or case.
pub fn configure_routes() -> Scope {
    scope(API_PATH).route("", post().to(create::process))
}
