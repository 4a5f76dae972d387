use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::get,
    Router,
};
use axum_extra::extract::Form;
use serde::Deserialize;
use serde_json::json;

use taxi_core::{Driver, DriverCreationForm, DriverLicenseUpdateForm, SearchFilter};

use crate::error::Result;
use crate::routes::views::{
    confirm_delete_page, detail_page, form_page, found, list_page, list_url, submitted, template,
    Page,
};
use crate::session::CurrentDriver;
use crate::state::AppState;

/// Shown by the driver list when nothing matches.
pub const EMPTY_LIST_MESSAGE: &str = "There are no drivers in the service.";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/drivers/", get(list))
        .route("/drivers/create/", get(create_page).post(create))
        .route("/drivers/:id/", get(detail))
        .route("/drivers/:id/update/", get(update_page).post(update))
        .route("/drivers/:id/delete/", get(delete_page).post(delete))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DriverSearch {
    username: Option<String>,
}

async fn list(
    State(state): State<AppState>,
    user: CurrentDriver,
    Query(search): Query<DriverSearch>,
) -> Result<Page> {
    let drivers = state
        .store
        .list::<Driver>(&SearchFilter::new(search.username.as_deref()))?;
    let mut page = list_page(&drivers, search.username.as_deref(), &user);
    if drivers.is_empty() {
        page.insert("empty_message", json!(EMPTY_LIST_MESSAGE));
    }
    Ok(page)
}

async fn detail(
    State(state): State<AppState>,
    user: CurrentDriver,
    Path(id): Path<u64>,
) -> Result<Page> {
    detail_page::<Driver>(
        &state,
        id,
        |driver| {
            let cars = state.store.cars_for_driver(driver.id)?;
            Ok(vec![
                ("cars", json!(cars)),
                ("full_name", json!(driver.full_name())),
            ])
        },
        &user,
    )
}

async fn create_page(user: CurrentDriver) -> Page {
    form_page::<Driver, _>(&DriverCreationForm::default(), None, &user)
}

/// Register a new driver account.
async fn create(
    State(state): State<AppState>,
    user: CurrentDriver,
    Form(form): Form<DriverCreationForm>,
) -> Result<Response> {
    submitted(
        form.save(&state.store),
        template::<Driver>("form"),
        &form,
        &user,
        Driver::absolute_url,
    )
}

async fn update_page(
    State(state): State<AppState>,
    user: CurrentDriver,
    Path(id): Path<u64>,
) -> Result<Page> {
    let driver: Driver = state.store.get(id)?;
    let form = DriverLicenseUpdateForm::from_instance(&driver);
    Ok(form_page(&form, Some(&driver), &user))
}

/// Change only the license number.
async fn update(
    State(state): State<AppState>,
    user: CurrentDriver,
    Path(id): Path<u64>,
    Form(form): Form<DriverLicenseUpdateForm>,
) -> Result<Response> {
    submitted(
        form.save(&state.store, id),
        template::<Driver>("form"),
        &form,
        &user,
        |_| list_url::<Driver>(),
    )
}

async fn delete_page(
    State(state): State<AppState>,
    user: CurrentDriver,
    Path(id): Path<u64>,
) -> Result<Page> {
    confirm_delete_page::<Driver>(&state, id, &user)
}

async fn delete(
    State(state): State<AppState>,
    user: CurrentDriver,
    Path(id): Path<u64>,
) -> Result<Response> {
    state.store.delete_driver(id)?;
    let sessions = state.sessions.delete_driver_sessions(id);
    tracing::info!(id, sessions, by = %user.actor.username, "driver deleted via web");
    Ok(found(&list_url::<Driver>()))
}
