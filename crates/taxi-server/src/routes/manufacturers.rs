use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::get,
    Router,
};
use axum_extra::extract::Form;
use serde::Deserialize;

use taxi_core::{Manufacturer, ManufacturerForm, SearchFilter};

use crate::error::Result;
use crate::routes::views::{
    confirm_delete_page, form_page, found, list_page, list_url, submitted, template, Page,
};
use crate::session::CurrentDriver;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/manufacturers/", get(list))
        .route("/manufacturers/create/", get(create_page).post(create))
        .route("/manufacturers/:id/update/", get(update_page).post(update))
        .route("/manufacturers/:id/delete/", get(delete_page).post(delete))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ManufacturerSearch {
    name: Option<String>,
}

async fn list(
    State(state): State<AppState>,
    user: CurrentDriver,
    Query(search): Query<ManufacturerSearch>,
) -> Result<Page> {
    let manufacturers = state
        .store
        .list::<Manufacturer>(&SearchFilter::new(search.name.as_deref()))?;
    Ok(list_page(&manufacturers, search.name.as_deref(), &user))
}

async fn create_page(user: CurrentDriver) -> Page {
    form_page::<Manufacturer, _>(&ManufacturerForm::default(), None, &user)
}

async fn create(
    State(state): State<AppState>,
    user: CurrentDriver,
    Form(form): Form<ManufacturerForm>,
) -> Result<Response> {
    submitted(
        form.create(&state.store),
        template::<Manufacturer>("form"),
        &form,
        &user,
        |_| list_url::<Manufacturer>(),
    )
}

async fn update_page(
    State(state): State<AppState>,
    user: CurrentDriver,
    Path(id): Path<u64>,
) -> Result<Page> {
    let manufacturer: Manufacturer = state.store.get(id)?;
    let form = ManufacturerForm::from_instance(&manufacturer);
    Ok(form_page(&form, Some(&manufacturer), &user))
}

async fn update(
    State(state): State<AppState>,
    user: CurrentDriver,
    Path(id): Path<u64>,
    Form(form): Form<ManufacturerForm>,
) -> Result<Response> {
    submitted(
        form.update(&state.store, id),
        template::<Manufacturer>("form"),
        &form,
        &user,
        |_| list_url::<Manufacturer>(),
    )
}

async fn delete_page(
    State(state): State<AppState>,
    user: CurrentDriver,
    Path(id): Path<u64>,
) -> Result<Page> {
    confirm_delete_page::<Manufacturer>(&state, id, &user)
}

/// Deleting a manufacturer also deletes its cars.
async fn delete(
    State(state): State<AppState>,
    user: CurrentDriver,
    Path(id): Path<u64>,
) -> Result<Response> {
    let cars_removed = state.store.delete_manufacturer(id)?;
    tracing::info!(id, cars_removed, by = %user.actor.username, "manufacturer deleted via web");
    Ok(found(&list_url::<Manufacturer>()))
}
