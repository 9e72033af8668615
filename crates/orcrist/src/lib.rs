//! # orcrist
//!
//! The session authority: issues the first token for a session (C7),
//! prolongs sessions and refills the token pool as keep-alives arrive
//! (C6 + C4), and reaps sessions nobody has touched in days (C3's
//! stale-session job).

pub mod config;
pub mod consumers;
pub mod future_tokens;
pub mod reaper;
pub mod routes;

use std::sync::Arc;

use alas_bus::Bus;
use alas_db::Database;
use axum::Router;

use crate::config::OrcristConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub bus: Bus,
    pub config: &'static OrcristConfig,
}

pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new().merge(routes::get_token::router());

    Router::new()
        .nest("/api/v1", api_routes)
        .merge(routes::health::router())
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}
