//! Fruitris binary entrypoint wiring the game loop, the terminal UI and the controller server.

use std::{net::SocketAddr, time::Duration};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use fruitris::{
    config::AppConfig,
    dao::score_store,
    routes,
    services::{game_service, gravity},
    state::{AppState, SharedState},
    tui,
};

/// How long the server gets to close its connections after shutdown.
const SERVER_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (config, origin) = AppConfig::load();
    let _log_guard = init_tracing(&config)?;
    origin.log();
    info!(
        board_height = config.game.board_height,
        start_level = config.game.start_level,
        button_scheme = ?config.button_scheme,
        headless = config.headless,
        "configuration ready"
    );

    let (store, persistent) = score_store::from_save_path(config.save_path.as_deref());
    let app_state = AppState::new(config, store, persistent);

    if let Err(err) = game_service::load_saved_high_score(&app_state).await {
        warn!(error = %err, "could not load saved high score");
    }

    let gravity_task = tokio::spawn(gravity::run(app_state.clone()));
    let server_task = app_state
        .config()
        .server
        .enabled
        .then(|| tokio::spawn(serve(app_state.clone())));
    tokio::spawn(forward_shutdown_signal(app_state.clone()));

    let frontend = if app_state.config().headless {
        info!("running headless; press Ctrl+C to stop");
        app_state.wait_for_shutdown().await;
        Ok(())
    } else {
        let result = tui::run(app_state.clone()).await;
        app_state.request_shutdown();
        result
    };

    let _ = gravity_task.await;
    if let Some(server_task) = server_task {
        match tokio::time::timeout(SERVER_SHUTDOWN_GRACE, server_task).await {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(err))) => error!(error = %err, "server stopped with an error"),
            Ok(Err(err)) => error!(error = %err, "server task panicked"),
            Err(_) => warn!("server did not stop in time"),
        }
    }

    info!("bye");
    frontend
}

/// Serve the controller, spectator and REST endpoints until shutdown.
async fn serve(state: SharedState) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], state.config().server.port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = build_router(state.clone()).into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(async move { state.wait_for_shutdown().await })
        .await
        .context("serving axum")
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers.
///
/// While the terminal UI owns the screen, logs go to a daily file in `log_dir`.
fn init_tracing(config: &AppConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(env_filter);

    if config.headless {
        registry.with(tracing_subscriber::fmt::layer()).init();
        return Ok(None);
    }

    std::fs::create_dir_all(&config.log_dir)
        .with_context(|| format!("creating log directory {}", config.log_dir.display()))?;
    let appender = tracing_appender::rolling::daily(&config.log_dir, "fruitris.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    registry
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer),
        )
        .init();
    Ok(Some(guard))
}

/// Turn Ctrl+C or SIGTERM into an application shutdown.
async fn forward_shutdown_signal(state: SharedState) {
    tokio::select! {
        _ = shutdown_signal() => {
            info!("shutdown signal received");
            state.request_shutdown();
        }
        _ = state.wait_for_shutdown() => {}
    }
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
