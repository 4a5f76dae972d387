//! Taxi Server - HTTP service for the taxi fleet
//!
//! Login-gated CRUD over manufacturers, cars and drivers, plus the
//! assign-me toggle on a car. Pages are JSON documents naming the template
//! to render and its context.

pub mod config;
pub mod error;
pub mod routes;
pub mod session;
pub mod state;

use axum::Router;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::state::AppState;

/// Create the Axum router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .merge(routes::health::routes())
        // Login / logout
        .merge(routes::accounts::routes())
        // Fleet pages
        .merge(routes::index::routes())
        .merge(routes::manufacturers::routes())
        .merge(routes::cars::routes())
        .merge(routes::drivers::routes())
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
