//! # Audit Event Service
//!
//! Backend of `POST /api/audit_events`. The event type arrives as text and is
//! checked against the known types and the subtype must not be blank before
//! anything is written. A rejected event leaves no row.

use crate::audit::{AuditError, AuditLogger, EventEntry};
use crate::config::Config;
use crate::services::{bad_request, open_store, unavailable};
use crate::store::StoreError;
use actix_web::{web, HttpResponse, Responder};
use common::model::audit_event::AuditEvent;
use common::requests::CreateAuditEventRequest;

pub async fn process(
    config: web::Data<Config>,
    payload: web::Json<CreateAuditEventRequest>,
) -> impl Responder {
    let config = config.get_ref().clone();
    let request = payload.into_inner();

    match tokio::task::spawn_blocking(move || create_event(&config, request)).await {
        Ok(Ok(event)) => HttpResponse::Created().json(event),
        Ok(Err(e @ (AuditError::UnknownEventType(_) | AuditError::MissingSubtype))) => {
            bad_request(e, None)
        }
        Ok(Err(AuditError::Store(e @ StoreError::NotFound(..)))) => bad_request(e, None),
        Ok(Err(e)) => unavailable(e),
        Err(e) => unavailable(e),
    }
}

fn create_event(
    config: &Config,
    request: CreateAuditEventRequest,
) -> Result<AuditEvent, AuditError> {
    let store = open_store(config)?;
    if let Some(case) = request.case {
        store.get_case(case)?;
    }

    let entry = EventEntry {
        subtype: request.event_subtype,
        trace: request.event_trace,
        data: request.event_data,
        case: request.case,
    };
    AuditLogger::new(&store).log_raw(&request.event_type, entry)
}

#[cfg(test)]
mod tests {
    use crate::audit::verify;
    use crate::services::audit_events::configure_routes;
    use crate::services::tests::test_config;
    use crate::store::Store;
    use actix_web::{http::StatusCode, test, web, App};
    use common::model::audit_event::{AuditEvent, EventType};
    use common::model::case::NewCase;
    use serde_json::json;

    #[actix_web::test]
    async fn stores_a_known_event() {
        let (_dir, config) = test_config();
        let case = Store::open(&config.database)
            .unwrap()
            .insert_case(&NewCase {
                urn: "06/AA/1234567/16".to_string(),
                ..NewCase::default()
            })
            .unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(config))
                .service(configure_routes()),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/audit_events")
            .set_json(json!({
                "event_type": "case_form",
                "event_subtype": "success",
                "event_data": { "step": "plea" },
                "case": case.id
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let event: AuditEvent = test::read_body_json(resp).await;
        assert_eq!(event.event_type, EventType::CaseForm);
        assert_eq!(event.case, Some(case.id));
        assert!(verify(&event));
    }

    #[actix_web::test]
    async fn unknown_type_case_or_blank_subtype_writes_nothing() {
        let (_dir, config) = test_config();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(config.clone()))
                .service(configure_routes()),
        )
        .await;

        for body in [
            json!({ "event_type": "user_journey", "event_subtype": "success" }),
            json!({ "event_type": "case_api", "event_subtype": "success", "case": 42 }),
            json!({ "event_type": "case_api", "event_subtype": "" }),
            json!({ "event_type": "case_api", "event_subtype": "   " }),
        ] {
            let req = test::TestRequest::post()
                .uri("/api/audit_events")
                .set_json(body)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        }

        let store = Store::open(&config.database).unwrap();
        assert_eq!(store.count_audit_events().unwrap(), 0);
    }
}
