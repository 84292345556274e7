use std::net::SocketAddr;

use axum::Router;
use common::utils::logging::init_logging;
use configs::AppConfig;
use migration::MigratorTrait;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::errors::StartupError;
use crate::routes;
use crate::state::AppState;
use service::{imaging, runtime};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("bind address {}:{}: {e}", cfg.server.host, cfg.server.port)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for ctrl-c; shutting down");
    }
    info!("shutdown signal received");
}

/// Public entry: connect, migrate, build the router and serve until Ctrl+C.
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    init_logging(cfg.server.log_format);
    crate::metrics::init();

    runtime::ensure_env(&cfg.export.path)
        .await
        .map_err(|e| StartupError::Runtime(e.to_string()))?;

    let db = models::db::connect_with_config(&cfg.database).await?;
    migration::Migrator::up(&db, None).await?;
    info!(sqlite = cfg.database.is_sqlite(), "database ready");

    let images = imaging::host_from_config(&cfg.image);
    let state = AppState::new(db.clone(), images, imaging::ImageOptions::from(&cfg.image), &cfg.export.path);

    let app: Router = routes::build_router(state, build_cors(), cfg.server.body_limit_bytes);

    let addr = bind_addr(&cfg)?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, export_path = %cfg.export.path, "contact book listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await?;
    info!("server stopped");
    Ok(())
}
