//! The session-authority binary: serves the issue endpoint, consumes
//! keep-alives, and runs the stale-session reaper alongside both.

use std::net::SocketAddr;

use alas_bus::Bus;
use alas_db::Database;
use orcrist::{build_router, AppState};
use tokio_util::sync::CancellationToken;

const TOPICS: &[&str] = &["orc-tokens", "keep-alive"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = orcrist::config::init()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "orcrist=info,tower_http=info".into()),
        )
        .init();

    tracing::info!("starting orcrist");

    let db = Database::connect(&config.postgres_host, &config.redis_host).await?;
    db.migrate().await?;

    let bus = Bus::connect(&config.kafka_host, config.kafka_sync, TOPICS).await?;

    let cancel = CancellationToken::new();
    let keep_alive_handle = orcrist::consumers::keep_alive::spawn(
        bus.clone(),
        &config.kafka_host,
        db.clone(),
        config.token_secret,
        cancel.clone(),
    );
    let reaper_handle = tokio::spawn(orcrist::reaper::run(db.pg.clone(), cancel.clone()));

    let state = AppState { db, bus, config };
    let router = build_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(%addr, "listening");

    let server = axum::serve(listener, router).with_graceful_shutdown(shutdown_signal());
    server.await?;

    tracing::info!("shutting down");
    cancel.cancel();
    let _ = keep_alive_handle.await;
    let _ = reaper_handle.await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
