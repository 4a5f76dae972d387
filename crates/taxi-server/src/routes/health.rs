use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::error::Result;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

async fn health_check(State(state): State<AppState>) -> Result<Json<Value>> {
    let stats = state.store.stats()?;

    Ok(Json(json!({
        "status": "healthy",
        "service": "taxi-server",
        "version": env!("CARGO_PKG_VERSION"),
        "sessions": {
            "active": state.sessions.session_count(),
            "timeout_secs": state.sessions.timeout().as_secs(),
        },
        "fleet": stats,
    })))
}
