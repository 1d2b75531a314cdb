//! URN entry endpoint used at the start of the plea journey.

mod validate;

use actix_web::web::{post, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/urn";

/// Configures the Actix `Scope` for URN routes.
///
/// *   **`POST /validate`**: parses the entered URN, looks up matching cases
///     and records the attempt. Responds `200 OK` with the URN forms and the
///     match outcome, or `400 Bad Request` naming the faulty segment.
pub fn configure_routes() -> Scope {
    scope(API_PATH).route("/validate", post().to(validate::process))
}
