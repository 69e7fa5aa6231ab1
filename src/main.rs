use anyhow::Result;
use axum::Router;
use tracing::{info, warn};

use wardrop_engine::{api, config::Config, engine::EquilibriumEngine, telemetry};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init_tracing();

    let cfg = Config::load()?;

    let engine = EquilibriumEngine::with_options(cfg.solver.options());
    let state = api::AppState::new(engine);
    let app: Router = api::router(state, &cfg);

    let addr = cfg.server.socket_addr()?;
    info!(%addr, "starting wardrop equilibrium engine");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(telemetry::shutdown_signal())
        .await?;

    warn!("shutdown complete");
    Ok(())
}
