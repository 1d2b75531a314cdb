use crate::config::Config;
use crate::services::{open_store, unavailable};
use crate::store::StoreError;
use actix_web::{web, HttpResponse, Responder};
use common::model::case::Case;

/// Actix web handler for `GET /api/cases/{case_id}`.
///
/// # Returns
/// - `200 OK` with the `Case` as JSON.
/// - `404 Not Found` when no case has this id.
/// - `503 Service Unavailable` if the database cannot be read.
pub async fn process(config: web::Data<Config>, case_id: web::Path<i64>) -> impl Responder {
    let config = config.get_ref().clone();
    let case_id = case_id.into_inner();

    match tokio::task::spawn_blocking(move || get_case(&config, case_id)).await {
        Ok(Ok(case)) => HttpResponse::Ok().json(case),
        Ok(Err(e @ StoreError::NotFound(..))) => HttpResponse::NotFound().body(e.to_string()),
        Ok(Err(e)) => unavailable(e),
        Err(e) => unavailable(e),
    }
}

fn get_case(config: &Config, case_id: i64) -> Result<Case, StoreError> {
    open_store(config)?.get_case(case_id)
}

#[cfg(test)]
mod tests {
    use crate::services::cases::configure_routes;
    use crate::services::tests::test_config;
    use crate::store::Store;
    use actix_web::{http::StatusCode, test, web, App};
    use common::model::case::{Case, NewCase};

    #[actix_web::test]
    async fn returns_the_case_or_404() {
        let (_dir, config) = test_config();
        let stored = Store::open(&config.database)
            .unwrap()
            .insert_case(&NewCase {
                urn: "51/AA/0000000/00".to_string(),
                forenames: Some("Ann".to_string()),
                ..NewCase::default()
            })
            .unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(config))
                .service(configure_routes()),
        )
        .await;

        let req = test::TestRequest::get()
            .uri(&format!("/api/cases/{}", stored.id))
            .to_request();
        let case: Case = test::call_and_read_body_json(&app, req).await;
        assert_eq!(case.urn, stored.urn);
        assert_eq!(case.forenames.as_deref(), Some("Ann"));

        let req = test::TestRequest::get()
            .uri(&format!("/api/cases/{}", stored.id + 1))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
