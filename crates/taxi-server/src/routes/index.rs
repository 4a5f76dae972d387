use axum::{extract::State, routing::get, Router};
use serde_json::json;

use crate::error::Result;
use crate::routes::views::Page;
use crate::session::CurrentDriver;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(index))
}

/// Fleet counts and how many times this session has opened the page.
async fn index(State(state): State<AppState>, user: CurrentDriver) -> Result<Page> {
    let stats = state.store.stats()?;
    let num_visits = user.session.record_visit();

    Ok(Page::new(
        "taxi/index.html",
        json!({
            "num_drivers": stats.num_drivers,
            "num_cars": stats.num_cars,
            "num_manufacturers": stats.num_manufacturers,
            "num_visits": num_visits,
        }),
    )
    .with_user(&user))
}
