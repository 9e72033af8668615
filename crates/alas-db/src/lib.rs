//! # alas-db
//!
//! The two infrastructure-backed stores behind the token/session
//! lifecycle: the Postgres session store (C3) and the Redis token cache
//! (C2), held behind one `Database` handle the way the teacher's
//! `nexus-db::Database` bundles a SQL pool and a Redis connection manager.

pub mod postgres;
pub mod repository;
pub mod token_cache;

use anyhow::Result;
use redis::aio::ConnectionManager;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Normalize a config-supplied Redis host into a URL `redis::Client`
/// accepts. The config default (`"localhost"`) is a bare hostname, not
/// a URL, so both binaries that connect to Redis route through this
/// instead of each growing their own `format!("redis://{host}")`.
pub fn redis_url(host: &str) -> String {
    if host.contains("://") {
        host.to_string()
    } else {
        format!("redis://{host}")
    }
}

#[derive(Clone)]
pub struct Database {
    pub pg: PgPool,
    pub redis: ConnectionManager,
}

impl Database {
    pub async fn connect(postgres_host: &str, redis_host: &str) -> Result<Self> {
        tracing::info!(host = postgres_host, "connecting to Postgres");
        let pg = PgPoolOptions::new()
            .max_connections(10)
            .connect(postgres_host)
            .await?;

        tracing::info!(host = redis_host, "connecting to Redis");
        let client = redis::Client::open(redis_url(redis_host))?;
        let redis = ConnectionManager::new(client).await?;

        Ok(Self { pg, redis })
    }

    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("running database migrations");
        sqlx::migrate!("./migrations").run(&self.pg).await?;
        tracing::info!("migrations complete");
        Ok(())
    }
}
