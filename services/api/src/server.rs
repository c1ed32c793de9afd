use crate::cli::ServeArgs;
use crate::infra::{build_catalog, spawn_expiry_sweeper, AppState};
use crate::routes::with_decision_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use decision_engine::config::AppConfig;
use decision_engine::error::AppError;
use decision_engine::questionnaire::{
    DecisionService, InMemorySessionStore, ScoringPolicy, SystemClock,
};
use decision_engine::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let catalog = build_catalog(config.catalog_path.as_deref())?;
    let clock = Arc::new(SystemClock);
    let store = Arc::new(InMemorySessionStore::new(
        clock.clone(),
        config.sessions.ttl(),
    ));
    let decision_service = Arc::new(DecisionService::new(
        store.clone(),
        catalog,
        ScoringPolicy::standard(),
        clock,
    ));
    let sweeper = spawn_expiry_sweeper(store, config.sessions.sweep_interval());

    let app = with_decision_routes(decision_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        session_ttl_minutes = config.sessions.ttl_minutes,
        "decision engine ready"
    );

    let served = axum::serve(listener, app).await;
    sweeper.abort();
    served?;
    Ok(())
}
