//! Case API used by court systems to import cases and read them back.

mod create;
mod get;

use actix_web::web::{get, post, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/cases";

/// Configures the Actix `Scope` for case routes.
///
/// *   **`POST /`**: imports a case. `201 Created` with the stored case,
///     `400 Bad Request` for a malformed URN, `409 Conflict` when a plea has
///     already been sent under that URN.
/// *   **`GET /{case_id}`**: `200 OK` with the case or `404 Not Found`.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", post().to(create::process))
        .route("/{case_id}", get().to(get::process))
}
