use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use super::domain::{QuestionId, SessionId};
use super::service::{DecisionService, DecisionServiceError, ValidationError};
use super::session::SessionError;
use super::store::SessionStore;

#[derive(Debug, Deserialize)]
pub struct StartRequest {
    pub title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRequest {
    pub question_id: QuestionId,
    pub value: i64,
}

/// Router builder exposing the questionnaire lifecycle over HTTP.
pub fn decision_router<S>(service: Arc<DecisionService<S>>) -> Router
where
    S: SessionStore + 'static,
{
    Router::new()
        .route("/api/v1/questions", get(questions_handler::<S>))
        .route("/api/v1/decisions", post(start_handler::<S>))
        .route(
            "/api/v1/decisions/:session_id",
            get(session_handler::<S>).delete(evict_handler::<S>),
        )
        .route(
            "/api/v1/decisions/:session_id/answers",
            post(answer_handler::<S>),
        )
        .route(
            "/api/v1/decisions/:session_id/result",
            get(result_handler::<S>),
        )
        .with_state(service)
}

/// HTTP status for each service failure class.
pub fn status_for(error: &DecisionServiceError) -> StatusCode {
    match error {
        DecisionServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        DecisionServiceError::Session(SessionError::NotFound(_))
        | DecisionServiceError::Session(SessionError::Expired(_)) => StatusCode::NOT_FOUND,
        DecisionServiceError::NoAnswers(_)
        | DecisionServiceError::Session(SessionError::Conflict(_))
        | DecisionServiceError::Session(SessionError::CapacityExceeded { .. })
        | DecisionServiceError::Session(SessionError::ResultLocked { .. }) => StatusCode::CONFLICT,
        DecisionServiceError::Session(SessionError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

pub(crate) fn error_response(error: DecisionServiceError) -> Response {
    let status = status_for(&error);
    if status.is_server_error() {
        warn!(error = %error, "decision request failed");
    }
    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}

/// Unwrap a JSON body, turning axum's rejection into a validation error.
fn json_body<T>(body: Result<axum::Json<T>, JsonRejection>) -> Result<T, DecisionServiceError> {
    body.map(|axum::Json(value)| value)
        .map_err(|rejection| ValidationError::MalformedBody(rejection.body_text()).into())
}

pub(crate) async fn questions_handler<S>(
    State(service): State<Arc<DecisionService<S>>>,
) -> Response
where
    S: SessionStore + 'static,
{
    let payload = json!({
        "questions": service.questions(),
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

pub(crate) async fn start_handler<S>(
    State(service): State<Arc<DecisionService<S>>>,
    body: Result<axum::Json<StartRequest>, JsonRejection>,
) -> Response
where
    S: SessionStore + 'static,
{
    let request = match json_body(body) {
        Ok(request) => request,
        Err(error) => return error_response(error),
    };
    match service.start(&request.title) {
        Ok(started) => (StatusCode::CREATED, axum::Json(started)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn session_handler<S>(
    State(service): State<Arc<DecisionService<S>>>,
    Path(session_id): Path<String>,
) -> Response
where
    S: SessionStore + 'static,
{
    match service.session(&SessionId(session_id)) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn evict_handler<S>(
    State(service): State<Arc<DecisionService<S>>>,
    Path(session_id): Path<String>,
) -> Response
where
    S: SessionStore + 'static,
{
    match service.evict(&SessionId(session_id)) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn answer_handler<S>(
    State(service): State<Arc<DecisionService<S>>>,
    Path(session_id): Path<String>,
    body: Result<axum::Json<AnswerRequest>, JsonRejection>,
) -> Response
where
    S: SessionStore + 'static,
{
    let request = match json_body(body) {
        Ok(request) => request,
        Err(error) => return error_response(error),
    };
    let session_id = SessionId(session_id);
    match service.submit_answer(&session_id, &request.question_id, request.value) {
        Ok(receipt) => (StatusCode::OK, axum::Json(receipt)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn result_handler<S>(
    State(service): State<Arc<DecisionService<S>>>,
    Path(session_id): Path<String>,
) -> Response
where
    S: SessionStore + 'static,
{
    match service.result(&SessionId(session_id)) {
        Ok(envelope) => (StatusCode::OK, axum::Json(envelope)).into_response(),
        Err(error) => error_response(error),
    }
}
