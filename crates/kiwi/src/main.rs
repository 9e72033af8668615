//! The ingestor binary: serves the track endpoint and runs the
//! token-pack consumer that keeps the local Redis cache fed.

use std::net::SocketAddr;

use alas_bus::Bus;
use kiwi::{build_router, AppState};
use redis::aio::ConnectionManager;
use tokio_util::sync::CancellationToken;

const TOPICS: &[&str] = &["kiwi-events", "keep-alive", "orc-tokens"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = kiwi::config::init()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kiwi=info,tower_http=info".into()),
        )
        .init();

    tracing::info!("starting kiwi");

    let redis_client = redis::Client::open(alas_db::redis_url(&config.redis_host))?;
    let redis = ConnectionManager::new(redis_client).await?;

    let bus = Bus::connect(&config.kafka_host, config.kafka_sync, TOPICS).await?;

    let cancel = CancellationToken::new();
    let consumer_handle = kiwi::consumers::orc_tokens::spawn(
        &bus,
        &config.kafka_host,
        redis.clone(),
        cancel.clone(),
    );

    let state = AppState { redis, bus, config };
    let router = build_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(%addr, "listening");

    let server = axum::serve(listener, router).with_graceful_shutdown(shutdown_signal());
    server.await?;

    tracing::info!("shutting down");
    cancel.cancel();
    let _ = consumer_handle.await;

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
