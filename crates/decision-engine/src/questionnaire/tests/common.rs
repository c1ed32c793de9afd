use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::questionnaire::domain::{Category, Question, QuestionId, SessionId, ValueDomain};
use crate::questionnaire::scoring::ScoringPolicy;
use crate::questionnaire::session::{Session, SessionError};
use crate::questionnaire::store::tests::ManualClock;
use crate::questionnaire::store::{InMemorySessionStore, SessionStore};
use crate::questionnaire::{
    decision_router, Answer, DecisionService, Progress, QuestionCatalog, ScoredResult,
};

pub(super) type TestService = DecisionService<InMemorySessionStore>;

pub(super) fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, 20, 14, 0, 0)
        .single()
        .expect("valid timestamp")
}

fn scale(id: &str, category: Category, weight: f64) -> Question {
    Question {
        id: QuestionId::new(id),
        text: format!("{id}?"),
        category,
        weight,
        domain: ValueDomain::Scale { min: 1, max: 10 },
        hint: None,
    }
}

/// Four-question catalog covering the categories that feed the opportunity blend.
pub(super) fn compact_catalog() -> QuestionCatalog {
    QuestionCatalog::from_questions(vec![
        scale("impact", Category::Impact, 1.0),
        scale("feasibility", Category::Feasibility, 1.0),
        scale("resources", Category::Resources, 1.0),
        scale("risk", Category::Risk, 1.0),
    ])
    .expect("compact catalog is valid")
}

pub(super) fn build_service() -> (TestService, Arc<InMemorySessionStore>, Arc<ManualClock>) {
    build_service_with(QuestionCatalog::standard())
}

pub(super) fn build_service_with(
    catalog: QuestionCatalog,
) -> (TestService, Arc<InMemorySessionStore>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::starting_at(epoch()));
    let store = Arc::new(InMemorySessionStore::new(clock.clone(), Duration::hours(2)));
    let service = DecisionService::new(
        store.clone(),
        catalog,
        ScoringPolicy::standard(),
        clock.clone(),
    );
    (service, store, clock)
}

/// Answer every catalog question with `value`, snapping choice questions to the nearest option.
pub(super) fn answer_all(service: &TestService, session_id: &SessionId, value: i64) {
    let answers: Vec<(QuestionId, i64)> = service
        .questions()
        .iter()
        .map(|question| (question.id.clone(), nearest_accepted(question, value)))
        .collect();
    for (id, value) in answers {
        service
            .submit_answer(session_id, &id, value)
            .expect("answer accepted");
    }
}

fn nearest_accepted(question: &Question, value: i64) -> i64 {
    match &question.domain {
        ValueDomain::Choice { options } => options
            .iter()
            .map(|option| i64::from(option.value))
            .min_by_key(|candidate| (candidate - value).abs())
            .unwrap_or(value),
        ValueDomain::Scale { .. } => value,
    }
}

pub(super) fn router_with_service(service: TestService) -> axum::Router {
    decision_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body reads");
    serde_json::from_slice(&bytes).expect("body is json")
}

pub(super) fn assert_status(response: &Response, expected: StatusCode) {
    assert_eq!(response.status(), expected, "unexpected response status");
}

/// Store whose lock is never available, for exercising internal-error paths.
pub(super) struct UnavailableStore;

impl UnavailableStore {
    fn failure() -> SessionError {
        SessionError::Unavailable("store offline".to_string())
    }
}

impl SessionStore for UnavailableStore {
    fn create(&self, _: SessionId, _: String, _: usize) -> Result<Session, SessionError> {
        Err(Self::failure())
    }

    fn get(&self, _: &SessionId) -> Result<Session, SessionError> {
        Err(Self::failure())
    }

    fn add_answer(&self, _: &SessionId, _: Answer) -> Result<Session, SessionError> {
        Err(Self::failure())
    }

    fn attach_result(
        &self,
        _: &SessionId,
        _: ScoredResult,
    ) -> Result<(Session, bool), SessionError> {
        Err(Self::failure())
    }

    fn progress(&self, _: &SessionId) -> Result<Progress, SessionError> {
        Err(Self::failure())
    }

    fn evict(&self, _: &SessionId) -> Result<Session, SessionError> {
        Err(Self::failure())
    }

    fn purge_expired(&self) -> Result<usize, SessionError> {
        Err(Self::failure())
    }
}
