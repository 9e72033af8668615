//! # kiwi
//!
//! The ingestor: validates signed mobile events (C8), rotates the
//! session's token from the cache, and forwards events onto the bus.
//! Also runs the token-pack consumer (C5) that keeps that cache fed.

pub mod config;
pub mod consumers;
pub mod routes;

use std::sync::Arc;

use alas_bus::Bus;
use axum::Router;
use redis::aio::ConnectionManager;

use crate::config::KiwiConfig;

/// Shared state reachable from every route handler.
#[derive(Clone)]
pub struct AppState {
    pub redis: ConnectionManager,
    pub bus: Bus,
    pub config: &'static KiwiConfig,
}

pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new().merge(routes::track::router());

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}
