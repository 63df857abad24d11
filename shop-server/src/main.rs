//! shop-server binary
//!
//! Loads `.env`, opens the database, starts the notification workers and
//! serves HTTP until Ctrl-C / SIGTERM, then drains the workers.

use anyhow::Context;
use shop_server::api;
use shop_server::logger::init_logger_with_file;
use shop_server::notify::spawn_workers;
use shop_server::{AppState, BackgroundTasks, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;
    init_logger_with_file(
        &config.log_level,
        !config.is_development(),
        config.log_dir.as_deref(),
    )?;

    tracing::info!(
        environment = %config.environment,
        version = env!("CARGO_PKG_VERSION"),
        "Starting shop-server"
    );

    let state = AppState::new(&config)
        .await
        .map_err(|e| anyhow::anyhow!(e))
        .context("failed to initialize application state")?;
    state.ensure_bootstrap_admin(&config).await?;

    let mut tasks = BackgroundTasks::new();
    spawn_workers(
        &mut tasks,
        &state.events,
        state.rooms.clone(),
        state.mailer.clone(),
    );
    tasks.log_summary();

    let app = api::build_app(state, config.cors_origin.as_deref());
    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("shop-server HTTP listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tasks.shutdown().await;
    tracing::info!("shop-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
