use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use axum_extra::extract::Form;
use serde::Deserialize;
use serde_json::json;

use taxi_core::{Car, CarFilter, CarForm, Driver, Manufacturer, SearchFilter};

use crate::error::{Result, ServerError};
use crate::routes::views::{
    confirm_delete_page, detail_page, form_page, found, list_page, list_url, submitted, template,
    Page,
};
use crate::session::CurrentDriver;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/cars/", get(list))
        .route("/cars/create/", get(create_page).post(create))
        .route("/cars/:id/", get(detail))
        .route("/cars/:id/update/", get(update_page).post(update))
        .route("/cars/:id/delete/", get(delete_page).post(delete))
        .route("/cars/:id/toggle-assign/", get(toggle_assign).post(toggle_assign))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CarSearch {
    model: Option<String>,
    manufacturer: Option<String>,
}

impl CarSearch {
    fn filter(&self) -> Result<CarFilter> {
        let manufacturer_id = match self.manufacturer.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(raw.parse::<u64>().map_err(|_| {
                ServerError::InvalidRequest(format!("invalid manufacturer id: {raw}"))
            })?),
        };
        Ok(CarFilter::new(self.model.as_deref(), manufacturer_id))
    }
}

async fn list(
    State(state): State<AppState>,
    user: CurrentDriver,
    Query(search): Query<CarSearch>,
) -> Result<Page> {
    let cars = state.store.list_cars(&search.filter()?)?;
    let mut page = list_page(&cars, search.model.as_deref(), &user);
    page.insert(
        "manufacturer_list",
        json!(state.store.list::<Manufacturer>(&SearchFilter::all())?),
    );
    Ok(page)
}

async fn detail(
    State(state): State<AppState>,
    user: CurrentDriver,
    Path(id): Path<u64>,
) -> Result<Page> {
    let driver_id = user.actor.driver_id;
    detail_page::<Car>(
        &state,
        id,
        |car| {
            let manufacturer = state.store.find::<Manufacturer>(car.manufacturer_id)?;
            let drivers = state.store.drivers_for_car(car.id)?;
            let is_assigned = drivers.iter().any(|d| d.id == driver_id);
            Ok(vec![
                ("manufacturer", json!(manufacturer)),
                ("drivers", json!(drivers)),
                ("is_assigned", json!(is_assigned)),
            ])
        },
        &user,
    )
}

/// Adds the manufacturer and driver choices a car form renders.
fn with_choices(mut page: Page, state: &AppState) -> Result<Page> {
    page.insert(
        "manufacturer_choices",
        json!(state.store.list::<Manufacturer>(&SearchFilter::all())?),
    );
    page.insert(
        "driver_choices",
        json!(state.store.list::<Driver>(&SearchFilter::all())?),
    );
    Ok(page)
}

/// Like [`submitted`], but a rejected form is re-rendered with its choices.
fn car_submitted(
    state: &AppState,
    result: taxi_core::Result<Car>,
    form: &CarForm,
    user: &CurrentDriver,
) -> Result<Response> {
    match result {
        Err(taxi_core::Error::Invalid(errors)) => {
            tracing::debug!(%errors, "car form rejected");
            let page = Page::invalid_form(template::<Car>("form"), json!(form), &errors);
            Ok(with_choices(page.with_user(user), state)?.into_response())
        }
        other => submitted(other, template::<Car>("form"), form, user, |_| {
            list_url::<Car>()
        }),
    }
}

async fn create_page(State(state): State<AppState>, user: CurrentDriver) -> Result<Page> {
    with_choices(
        form_page::<Car, _>(&CarForm::default(), None, &user),
        &state,
    )
}

async fn create(
    State(state): State<AppState>,
    user: CurrentDriver,
    Form(form): Form<CarForm>,
) -> Result<Response> {
    car_submitted(&state, form.create(&state.store), &form, &user)
}

async fn update_page(
    State(state): State<AppState>,
    user: CurrentDriver,
    Path(id): Path<u64>,
) -> Result<Page> {
    let car: Car = state.store.get(id)?;
    let driver_ids: Vec<u64> = state
        .store
        .drivers_for_car(id)?
        .iter()
        .map(|d| d.id)
        .collect();
    let form = CarForm::from_instance(&car, &driver_ids);
    with_choices(form_page(&form, Some(&car), &user), &state)
}

async fn update(
    State(state): State<AppState>,
    user: CurrentDriver,
    Path(id): Path<u64>,
    Form(form): Form<CarForm>,
) -> Result<Response> {
    car_submitted(&state, form.update(&state.store, id), &form, &user)
}

async fn delete_page(
    State(state): State<AppState>,
    user: CurrentDriver,
    Path(id): Path<u64>,
) -> Result<Page> {
    confirm_delete_page::<Car>(&state, id, &user)
}

async fn delete(
    State(state): State<AppState>,
    _user: CurrentDriver,
    Path(id): Path<u64>,
) -> Result<Response> {
    state.store.delete_car(id)?;
    Ok(found(&list_url::<Car>()))
}

/// Add or remove the logged-in driver from the car's drivers.
async fn toggle_assign(
    State(state): State<AppState>,
    user: CurrentDriver,
    Path(id): Path<u64>,
) -> Result<Response> {
    let car: Car = state.store.get(id)?;
    state.store.toggle_assignment(&user.actor, car.id)?;
    Ok(found(&car.absolute_url()))
}
