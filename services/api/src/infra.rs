use decision_engine::error::AppError;
use decision_engine::questionnaire::{QuestionCatalog, SessionStore};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Load the catalog from `path` when configured, otherwise fall back to the built-in one.
pub(crate) fn build_catalog(path: Option<&Path>) -> Result<QuestionCatalog, AppError> {
    match path {
        Some(path) => {
            let catalog = QuestionCatalog::from_json_path(path)?;
            info!(path = %path.display(), questions = catalog.len(), "loaded question catalog");
            Ok(catalog)
        }
        None => Ok(QuestionCatalog::standard()),
    }
}

/// Periodically drop sessions whose time-to-live has elapsed.
pub(crate) fn spawn_expiry_sweeper<S>(store: Arc<S>, every: Duration) -> JoinHandle<()>
where
    S: SessionStore + 'static,
{
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if let Err(err) = store.purge_expired() {
                warn!(error = %err, "expired session sweep failed");
            }
        }
    })
}
