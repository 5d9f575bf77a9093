use axum::{
    extract::State,
    routing::{get, post, put},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::routes::{devices, health, lock_events};
use crate::services::FleetService;

#[derive(Clone)]
pub struct AppState {
    pub fleet: FleetService,
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub prometheus: Option<PrometheusHandle>,
}

pub fn create_app(
    config: Config,
    pool: PgPool,
    fleet: FleetService,
    prometheus: Option<PrometheusHandle>,
) -> Router {
    let config = Arc::new(config);
    let request_timeout = Duration::from_secs(config.server.request_timeout_secs);

    let state = AppState {
        fleet,
        pool,
        config,
        prometheus,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/api/v1/devices/register", post(devices::register_device))
        .route("/api/v1/devices", get(devices::list_devices))
        .route(
            "/api/v1/devices/:id",
            get(devices::get_device).delete(devices::delete_device),
        )
        .route(
            "/api/v1/devices/by-token/:token",
            get(devices::get_device_by_token),
        )
        .route(
            "/api/v1/devices/by-token/:token/heartbeat",
            post(devices::heartbeat),
        )
        .route("/api/v1/devices/:id/lock", post(devices::lock_device))
        .route("/api/v1/devices/:id/unlock", post(devices::unlock_device))
        .route("/api/v1/devices/:id/enabled", put(devices::set_enabled))
        .route(
            "/api/v1/devices/:id/lock-events",
            get(lock_events::list_device_lock_events),
        );

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(cors)
        .with_state(state)
}

/// Render the Prometheus exposition text, or nothing when no recorder was
/// installed (tests).
async fn metrics_handler(State(state): State<AppState>) -> String {
    state
        .prometheus
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default()
}
