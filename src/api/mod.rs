pub mod equilibrium;
pub mod health;

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::engine::EquilibriumEngine;

/// Shared handler state. The engine holds no per-call state, so a single
/// instance serves every request concurrently.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<EquilibriumEngine>,
}

impl AppState {
    pub fn new(engine: EquilibriumEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }
}

pub fn router(state: AppState, cfg: &Config) -> Router {
    let mut router = Router::new()
        .route(
            "/calculate-equilibrium",
            post(equilibrium::calculate_equilibrium),
        )
        .route("/health", get(health::health_check))
        .with_state(state);

    if cfg.server.enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        router = router.layer(cors);
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(axum::extract::DefaultBodyLimit::max(1024 * 1024))
                .layer(TimeoutLayer::new(Duration::from_secs(
                    cfg.server.request_timeout_secs,
                ))),
        )
        .layer(TraceLayer::new_for_http())
}
