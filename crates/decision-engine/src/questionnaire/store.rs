use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use super::domain::{Answer, SessionId};
use super::scoring::ScoredResult;
use super::session::{Progress, Session, SessionError, SessionStatus};

/// Source of the current time so expiry can be exercised deterministically.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock backed by `chrono::Utc::now`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Keyed session state machine.
///
/// Each mutation is a read-modify-write on one record and implementations must serialise
/// them per session id. Expiry is applied lazily on every lookup.
pub trait SessionStore: Send + Sync {
    fn create(
        &self,
        id: SessionId,
        title: String,
        total_question_count: usize,
    ) -> Result<Session, SessionError>;
    fn get(&self, id: &SessionId) -> Result<Session, SessionError>;
    fn add_answer(&self, id: &SessionId, answer: Answer) -> Result<Session, SessionError>;
    /// Attach `result` unless one is already present. The flag reports whether this call
    /// stored it.
    fn attach_result(
        &self,
        id: &SessionId,
        result: ScoredResult,
    ) -> Result<(Session, bool), SessionError>;
    fn progress(&self, id: &SessionId) -> Result<Progress, SessionError>;
    fn evict(&self, id: &SessionId) -> Result<Session, SessionError>;
    /// Drop every session whose time-to-live has elapsed, returning how many were removed.
    fn purge_expired(&self) -> Result<usize, SessionError>;
}

/// Process-scoped store keeping sessions in a mutex-guarded map.
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<SessionId, Session>>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl InMemorySessionStore {
    pub const DEFAULT_TTL_MINUTES: i64 = 120;

    pub fn new(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            clock,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn len(&self) -> usize {
        self.lock().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<SessionId, Session>>, SessionError> {
        self.sessions
            .lock()
            .map_err(|_| SessionError::Unavailable("session store lock poisoned".to_string()))
    }

    /// Run `mutate` against a live session while holding the store lock.
    fn with_live_session<T>(
        &self,
        id: &SessionId,
        mutate: impl FnOnce(&mut Session, DateTime<Utc>) -> Result<T, SessionError>,
    ) -> Result<T, SessionError> {
        let now = self.clock.now();
        let mut guard = self.lock()?;
        let session = guard
            .get_mut(id)
            .ok_or_else(|| SessionError::NotFound(id.clone()))?;

        if session.expire_if_due(now) {
            info!(session_id = %id, "session expired before completion");
        }
        if session.status == SessionStatus::Expired {
            return Err(SessionError::Expired(id.clone()));
        }

        mutate(session, now)
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new(
            Arc::new(SystemClock),
            Duration::minutes(Self::DEFAULT_TTL_MINUTES),
        )
    }
}

impl SessionStore for InMemorySessionStore {
    fn create(
        &self,
        id: SessionId,
        title: String,
        total_question_count: usize,
    ) -> Result<Session, SessionError> {
        let now = self.clock.now();
        let mut guard = self.lock()?;
        if guard.contains_key(&id) {
            return Err(SessionError::Conflict(id));
        }

        let session = Session::new(id.clone(), title, total_question_count, now, self.ttl);
        guard.insert(id.clone(), session.clone());
        info!(session_id = %id, total_question_count, expires_at = %session.expires_at, "session created");
        Ok(session)
    }

    fn get(&self, id: &SessionId) -> Result<Session, SessionError> {
        self.with_live_session(id, |session, _| Ok(session.clone()))
    }

    fn add_answer(&self, id: &SessionId, answer: Answer) -> Result<Session, SessionError> {
        self.with_live_session(id, |session, now| {
            let was_complete = session.status == SessionStatus::Complete;
            let question_id = answer.question_id.clone();
            session.upsert_answer(answer, now)?;

            debug!(
                session_id = %id,
                question_id = %question_id,
                answered = session.answers.len(),
                total = session.total_question_count,
                "answer recorded"
            );
            if !was_complete && session.status == SessionStatus::Complete {
                info!(session_id = %id, "session complete");
            }
            Ok(session.clone())
        })
    }

    fn attach_result(
        &self,
        id: &SessionId,
        result: ScoredResult,
    ) -> Result<(Session, bool), SessionError> {
        self.with_live_session(id, |session, now| {
            let stored = session.attach_result(result, now)?;
            if stored {
                info!(session_id = %id, "result attached");
            } else {
                debug!(session_id = %id, "result already attached; keeping cached copy");
            }
            Ok((session.clone(), stored))
        })
    }

    fn progress(&self, id: &SessionId) -> Result<Progress, SessionError> {
        self.with_live_session(id, |session, _| Ok(session.progress()))
    }

    fn evict(&self, id: &SessionId) -> Result<Session, SessionError> {
        let mut guard = self.lock()?;
        let session = guard
            .remove(id)
            .ok_or_else(|| SessionError::NotFound(id.clone()))?;
        info!(session_id = %id, status = session.status.label(), "session evicted");
        Ok(session)
    }

    fn purge_expired(&self) -> Result<usize, SessionError> {
        let now = self.clock.now();
        let mut guard = self.lock()?;
        let before = guard.len();
        guard.retain(|_, session| now < session.expires_at);
        let removed = before - guard.len();
        if removed > 0 {
            info!(removed, remaining = guard.len(), "purged expired sessions");
        }
        Ok(removed)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::questionnaire::domain::{Category, QuestionId};
    use crate::questionnaire::scoring::{score, ScoringContext, ScoringPolicy};
    use chrono::TimeZone;

    /// Clock that only moves when told to.
    pub(crate) struct ManualClock {
        now: Mutex<DateTime<Utc>>,
    }

    impl ManualClock {
        pub(crate) fn starting_at(now: DateTime<Utc>) -> Self {
            Self {
                now: Mutex::new(now),
            }
        }

        pub(crate) fn advance(&self, by: Duration) {
            let mut guard = self.now.lock().expect("clock mutex poisoned");
            *guard += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().expect("clock mutex poisoned")
        }
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 10, 8, 30, 0)
            .single()
            .expect("valid timestamp")
    }

    fn store() -> (InMemorySessionStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::starting_at(start()));
        let store = InMemorySessionStore::new(clock.clone(), Duration::hours(2));
        (store, clock)
    }

    fn answer(question: &str, value: u8) -> Answer {
        Answer {
            question_id: QuestionId::new(question),
            value,
            category: Some(Category::Feasibility),
            weight: Some(1.0),
        }
    }

    fn id(raw: &str) -> SessionId {
        SessionId(raw.to_string())
    }

    #[test]
    fn get_reports_missing_sessions() {
        let (store, _) = store();
        assert_eq!(
            store.get(&id("missing")),
            Err(SessionError::NotFound(id("missing")))
        );
    }

    #[test]
    fn create_rejects_duplicate_ids() {
        let (store, _) = store();
        store.create(id("s"), "Title".to_string(), 2).expect("create");
        assert_eq!(
            store.create(id("s"), "Again".to_string(), 2),
            Err(SessionError::Conflict(id("s")))
        );
    }

    #[test]
    fn resubmitting_an_answer_does_not_inflate_progress() {
        let (store, _) = store();
        store.create(id("s"), "Title".to_string(), 3).expect("create");

        store.add_answer(&id("s"), answer("q1", 5)).expect("first");
        store.add_answer(&id("s"), answer("q1", 5)).expect("retry");
        let progress = store.progress(&id("s")).expect("progress");
        assert_eq!(
            progress,
            Progress {
                answered: 1,
                total: 3
            }
        );

        let session = store.add_answer(&id("s"), answer("q1", 8)).expect("replace");
        assert_eq!(session.answers.len(), 1);
        assert_eq!(session.answers[0].value, 8);
    }

    #[test]
    fn unanswered_session_expires_after_ttl() {
        let (store, clock) = store();
        store.create(id("s"), "Title".to_string(), 2).expect("create");

        clock.advance(Duration::hours(2));

        assert_eq!(store.get(&id("s")), Err(SessionError::Expired(id("s"))));
        assert_eq!(
            store.add_answer(&id("s"), answer("q1", 4)),
            Err(SessionError::Expired(id("s")))
        );
        assert_eq!(
            store.progress(&id("s")),
            Err(SessionError::Expired(id("s")))
        );
    }

    #[test]
    fn completed_session_survives_ttl() {
        let (store, clock) = store();
        store.create(id("s"), "Title".to_string(), 1).expect("create");
        store.add_answer(&id("s"), answer("q1", 4)).expect("answer");

        clock.advance(Duration::hours(3));

        let session = store.get(&id("s")).expect("still readable");
        assert_eq!(session.status, SessionStatus::Complete);
    }

    #[test]
    fn evict_removes_the_session() {
        let (store, _) = store();
        store.create(id("s"), "Title".to_string(), 1).expect("create");
        store.evict(&id("s")).expect("evict");
        assert_eq!(store.get(&id("s")), Err(SessionError::NotFound(id("s"))));
        assert_eq!(
            store.evict(&id("s")).map(|_| ()),
            Err(SessionError::NotFound(id("s")))
        );
    }

    #[test]
    fn purge_drops_sessions_past_their_deadline() {
        let (store, clock) = store();
        store.create(id("old"), "Old".to_string(), 1).expect("create");
        clock.advance(Duration::minutes(90));
        store.create(id("new"), "New".to_string(), 1).expect("create");
        clock.advance(Duration::minutes(31));

        assert_eq!(store.purge_expired(), Ok(1));
        assert_eq!(store.len(), 1);
        assert!(store.get(&id("new")).is_ok());
        assert_eq!(store.get(&id("old")), Err(SessionError::NotFound(id("old"))));
    }

    #[test]
    fn attach_result_reports_which_call_stored_it() {
        let (store, clock) = store();
        store.create(id("s"), "Title".to_string(), 1).expect("create");
        let session = store.add_answer(&id("s"), answer("q1", 6)).expect("answer");

        let scored = |title: &str| {
            score(
                &session.answers,
                ScoringContext {
                    session_id: id("s"),
                    decision_title: title.to_string(),
                    scored_at: clock.now(),
                },
                &ScoringPolicy::standard(),
            )
        };

        let (first, stored) = store
            .attach_result(&id("s"), scored("first"))
            .expect("attach");
        assert!(stored);
        let (second, stored_again) = store
            .attach_result(&id("s"), scored("second"))
            .expect("reattach");
        assert!(!stored_again);
        assert_eq!(second.result, first.result);
        assert_eq!(
            second.result.map(|result| result.decision_title),
            Some("first".to_string())
        );
    }
}
