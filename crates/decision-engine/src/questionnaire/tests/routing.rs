use super::common::*;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, Method, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::questionnaire::router::{
    result_handler, start_handler, AnswerRequest, StartRequest,
};
use crate::questionnaire::store::tests::ManualClock;
use crate::questionnaire::{DecisionService, QuestionCatalog, QuestionId, ScoringPolicy};

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).expect("serializes")))
        .expect("request builds")
}

fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request builds")
}

async fn start_session(router: &axum::Router, title: &str) -> String {
    let response = router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/decisions",
            json!({ "title": title }),
        ))
        .await
        .expect("route executes");
    assert_status(&response, StatusCode::CREATED);
    let payload = read_json_body(response).await;
    payload["sessionId"]
        .as_str()
        .expect("session id present")
        .to_string()
}

#[tokio::test]
async fn questions_route_lists_catalog() {
    let (service, _, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(empty_request(Method::GET, "/api/v1/questions"))
        .await
        .expect("route executes");

    assert_status(&response, StatusCode::OK);
    let payload = read_json_body(response).await;
    let questions = payload["questions"].as_array().expect("questions array");
    assert_eq!(questions.len(), 10);
    assert_eq!(questions[0]["type"], "scale");
    assert!(questions[1]["options"].is_array());
}

#[tokio::test]
async fn start_route_returns_session_and_questions() {
    let (service, _, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(json_request(
            Method::POST,
            "/api/v1/decisions",
            json!({ "title": "Expand to a second city" }),
        ))
        .await
        .expect("route executes");

    assert_status(&response, StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["decisionTitle"], "Expand to a second city");
    assert_eq!(payload["totalQuestions"], 10);
    assert!(payload["startedAt"].is_string());
    assert_eq!(payload["questions"].as_array().map(Vec::len), Some(10));
}

#[tokio::test]
async fn start_route_rejects_invalid_titles() {
    let (service, _, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(json_request(
            Method::POST,
            "/api/v1/decisions",
            json!({ "title": "x" }),
        ))
        .await
        .expect("route executes");

    assert_status(&response, StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .unwrap_or_default()
        .contains("title"));
}

#[tokio::test]
async fn answer_route_reports_progress_and_next_question() {
    let (service, _, _) = build_service();
    let router = router_with_service(service);
    let session_id = start_session(&router, "Hire a contractor").await;

    let response = router
        .clone()
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/decisions/{session_id}/answers"),
            json!({ "questionId": "feasibility-capability", "value": 7 }),
        ))
        .await
        .expect("route executes");

    assert_status(&response, StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["sessionId"], session_id.as_str());
    assert_eq!(payload["progress"]["answered"], 1);
    assert_eq!(payload["progress"]["total"], 10);
    assert_eq!(payload["progress"]["percentComplete"], 10);
    assert_eq!(payload["isComplete"], false);
    assert_eq!(payload["nextQuestion"]["id"], "feasibility-dependencies");
}

#[tokio::test]
async fn answer_route_maps_failures_to_status_codes() {
    let (service, _, _) = build_service();
    let router = router_with_service(service);
    let session_id = start_session(&router, "Hire a contractor").await;

    let unknown_session = router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/decisions/nope/answers",
            json!({ "questionId": "impact-value", "value": 5 }),
        ))
        .await
        .expect("route executes");
    assert_status(&unknown_session, StatusCode::NOT_FOUND);

    let out_of_range = router
        .clone()
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/decisions/{session_id}/answers"),
            json!({ "questionId": "impact-value", "value": 42 }),
        ))
        .await
        .expect("route executes");
    assert_status(&out_of_range, StatusCode::UNPROCESSABLE_ENTITY);

    let unknown_question = router
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/decisions/{session_id}/answers"),
            json!({ "questionId": "made-up", "value": 5 }),
        ))
        .await
        .expect("route executes");
    assert_status(&unknown_question, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn result_route_conflicts_before_any_answer() {
    let (service, _, _) = build_service();
    let router = router_with_service(service);
    let session_id = start_session(&router, "Move to quarterly planning").await;

    let response = router
        .oneshot(empty_request(
            Method::GET,
            &format!("/api/v1/decisions/{session_id}/result"),
        ))
        .await
        .expect("route executes");

    assert_status(&response, StatusCode::CONFLICT);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .unwrap_or_default()
        .contains("no answers"));
}

#[tokio::test]
async fn result_route_caches_completed_sessions() {
    let (service, _, _) = build_service_with(compact_catalog());
    let router = router_with_service(service);
    let session_id = start_session(&router, "Buy the delivery van").await;

    for question_id in ["impact", "feasibility", "resources", "risk"] {
        let response = router
            .clone()
            .oneshot(json_request(
                Method::POST,
                &format!("/api/v1/decisions/{session_id}/answers"),
                json!({ "questionId": question_id, "value": 8 }),
            ))
            .await
            .expect("route executes");
        assert_status(&response, StatusCode::OK);
    }

    let uri = format!("/api/v1/decisions/{session_id}/result");
    let first = read_json_body(
        router
            .clone()
            .oneshot(empty_request(Method::GET, &uri))
            .await
            .expect("route executes"),
    )
    .await;
    let second = read_json_body(
        router
            .clone()
            .oneshot(empty_request(Method::GET, &uri))
            .await
            .expect("route executes"),
    )
    .await;

    assert_eq!(first["cached"], false);
    assert_eq!(second["cached"], true);
    assert_eq!(first["result"], second["result"]);
    assert_eq!(second["result"]["recommendation"]["decision"], "PROCEED");
    assert_eq!(second["result"]["risk"]["severity"], "LOW");

    let view = read_json_body(
        router
            .oneshot(empty_request(
                Method::GET,
                &format!("/api/v1/decisions/{session_id}"),
            ))
            .await
            .expect("route executes"),
    )
    .await;
    assert_eq!(view["status"], "COMPLETE");
    assert_eq!(view["hasResult"], true);
}

#[tokio::test]
async fn delete_route_evicts_sessions() {
    let (service, _, _) = build_service();
    let router = router_with_service(service);
    let session_id = start_session(&router, "Retire the legacy API").await;
    let uri = format!("/api/v1/decisions/{session_id}");

    let deleted = router
        .clone()
        .oneshot(empty_request(Method::DELETE, &uri))
        .await
        .expect("route executes");
    assert_status(&deleted, StatusCode::OK);

    let lookup = router
        .oneshot(empty_request(Method::GET, &uri))
        .await
        .expect("route executes");
    assert_status(&lookup, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn handlers_return_internal_error_when_store_is_unavailable() {
    let clock = Arc::new(ManualClock::starting_at(epoch()));
    let service = Arc::new(DecisionService::new(
        Arc::new(UnavailableStore),
        QuestionCatalog::standard(),
        ScoringPolicy::standard(),
        clock,
    ));

    let response = start_handler::<UnavailableStore>(
        State(service.clone()),
        Ok(axum::Json(StartRequest {
            title: "Any decision".to_string(),
        })),
    )
    .await;
    assert_status(&response, StatusCode::INTERNAL_SERVER_ERROR);

    let response =
        result_handler::<UnavailableStore>(State(service), Path("s-1".to_string())).await;
    assert_status(&response, StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn answer_request_uses_camel_case_fields() {
    let request: AnswerRequest =
        serde_json::from_value(json!({ "questionId": "risk-downside", "value": 4 }))
            .expect("parses");
    assert_eq!(request.question_id, QuestionId::new("risk-downside"));
    assert_eq!(request.value, 4);
}

#[tokio::test]
async fn malformed_bodies_return_json_validation_errors() {
    let (service, _, _) = build_service();
    let router = router_with_service(service);
    let session_id = start_session(&router, "Switch payroll provider").await;

    let fractional = router
        .clone()
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/decisions/{session_id}/answers"),
            json!({ "questionId": "impact-value", "value": 5.5 }),
        ))
        .await
        .expect("route executes");
    assert_status(&fractional, StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(fractional).await;
    assert!(payload["error"]
        .as_str()
        .unwrap_or_default()
        .starts_with("malformed request body"));

    let missing_title = router
        .clone()
        .oneshot(json_request(Method::POST, "/api/v1/decisions", json!({})))
        .await
        .expect("route executes");
    assert_status(&missing_title, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(read_json_body(missing_title).await["error"].is_string());

    let no_content_type = router
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/v1/decisions")
                .body(Body::from(r#"{"title":"Plain body"}"#))
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_status(&no_content_type, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(read_json_body(no_content_type).await["error"].is_string());
}

#[tokio::test]
async fn choice_rejection_names_the_accepted_options() {
    let (service, _, _) = build_service();
    let router = router_with_service(service);
    let session_id = start_session(&router, "Outsource support").await;

    let response = router
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/decisions/{session_id}/answers"),
            json!({ "questionId": "risk-downside", "value": 5 }),
        ))
        .await
        .expect("route executes");

    assert_status(&response, StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert_eq!(
        payload["error"],
        "value 5 is not accepted for question 'risk-downside' (expected one of 1, 4, 7, 10)"
    );
}
