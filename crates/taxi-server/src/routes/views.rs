//! Response envelope and generic entity views.
//!
//! Every page is a JSON document naming the template a front-end renders
//! and the context it renders it with. List, detail and delete-confirmation
//! pages are the same for every entity apart from names, so they are
//! written once against [`Entity`].

use axum::{
    http::{header::LOCATION, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Map, Value};

use taxi_core::{Entity, FormErrors};
use url::{form_urlencoded, Url};

use crate::error::Result;
use crate::session::CurrentDriver;
use crate::state::AppState;

/// Login page path.
pub const LOGIN_URL: &str = "/accounts/login/";

/// Stand-in origin that relative `next` targets are resolved against.
const LOCAL_ORIGIN: &str = "http://localhost/";

/// A rendered page.
#[derive(Debug, Serialize)]
pub struct Page {
    pub success: bool,
    pub template: String,
    pub context: Value,
}

impl Page {
    pub fn new(template: impl Into<String>, context: Value) -> Self {
        Self {
            success: true,
            template: template.into(),
            context,
        }
    }

    /// Add the logged-in user to the context.
    pub fn with_user(mut self, user: &CurrentDriver) -> Self {
        self.insert("user", json!(user.actor));
        self
    }

    /// Re-render a form with its submitted values and errors.
    pub fn invalid_form(template: impl Into<String>, form: Value, errors: &FormErrors) -> Self {
        let mut page = Self::new(template, json!({ "form": form }));
        page.success = false;
        page.insert("errors", json!(errors));
        page
    }

    pub fn insert(&mut self, key: &str, value: Value) {
        if let Value::Object(map) = &mut self.context {
            map.insert(key.to_string(), value);
        } else {
            let mut map = Map::new();
            map.insert(key.to_string(), value);
            self.context = Value::Object(map);
        }
    }
}

impl IntoResponse for Page {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// `302 Found` to `location`.
pub fn found(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => (StatusCode::FOUND, [(LOCATION, value)]).into_response(),
        Err(_) => {
            tracing::warn!(location, "unencodable redirect target");
            (StatusCode::FOUND, [(LOCATION, HeaderValue::from_static("/"))]).into_response()
        }
    }
}

/// Login URL carrying the page to come back to.
pub fn login_redirect(next: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("next", next)
        .finish();
    format!("{LOGIN_URL}?{query}")
}

/// Where to send a driver after login. Only targets that stay on this
/// origin are followed; anything else falls back to `/`.
pub fn safe_next(next: Option<&str>) -> String {
    next.and_then(local_target).unwrap_or_else(|| "/".to_string())
}

fn local_target(next: &str) -> Option<String> {
    let base = Url::parse(LOCAL_ORIGIN).ok()?;
    let target = base.join(next).ok()?;
    if target.origin() != base.origin() {
        tracing::warn!(next, "ignoring off-site login redirect");
        return None;
    }
    Some(match target.query() {
        Some(query) => format!("{}?{}", target.path(), query),
        None => target.path().to_string(),
    })
}

/// `taxi/<entity>_<suffix>.html`
pub fn template<E: Entity>(suffix: &str) -> String {
    format!("taxi/{}_{}.html", E::NAME, suffix)
}

/// List route prefix, `/<entity>s/`.
pub fn list_url<E: Entity>() -> String {
    format!("/{}s/", E::NAME)
}

// ========== Generic pages ==========

/// Filtered list page. The list is under `<entity>_list` and the echoed
/// search value under `search_form`.
pub fn list_page<E: Entity + Serialize>(
    items: &[E],
    search: Option<&str>,
    user: &CurrentDriver,
) -> Page {
    let mut search_form = Map::new();
    search_form.insert(
        E::SEARCH_FIELD.to_string(),
        json!(search.unwrap_or_default()),
    );

    let mut page = Page::new(template::<E>("list"), json!({ "is_paginated": false }));
    page.insert(&format!("{}_list", E::NAME), json!(items));
    page.insert("object_list", json!(items));
    page.insert("search_form", Value::Object(search_form));
    page.with_user(user)
}

/// Detail page with the entity under its own name plus any `extra` keys.
pub fn detail_page<E: Entity + Serialize>(
    state: &AppState,
    id: u64,
    extra: impl FnOnce(&E) -> Result<Vec<(&'static str, Value)>>,
    user: &CurrentDriver,
) -> Result<Page> {
    let entity: E = state.store.get(id)?;
    let mut page = Page::new(template::<E>("detail"), json!({ "object": &entity }));
    page.insert(E::NAME, json!(&entity));
    for (key, value) in extra(&entity)? {
        page.insert(key, value);
    }
    Ok(page.with_user(user))
}

/// Delete confirmation page.
pub fn confirm_delete_page<E: Entity + Serialize>(
    state: &AppState,
    id: u64,
    user: &CurrentDriver,
) -> Result<Page> {
    let entity: E = state.store.get(id)?;
    let mut page = Page::new(template::<E>("confirm_delete"), json!({ "object": &entity }));
    page.insert(E::NAME, json!(&entity));
    Ok(page.with_user(user))
}

/// Form page, blank or pre-filled.
pub fn form_page<E: Entity + Serialize, F: Serialize>(
    form: &F,
    object: Option<&E>,
    user: &CurrentDriver,
) -> Page {
    Page::new(
        template::<E>("form"),
        json!({ "form": form, "object": object }),
    )
    .with_user(user)
}

/// Outcome of a form submission: redirect on success, re-render the form
/// with its errors when invalid, propagate anything else.
pub fn submitted<T>(
    result: taxi_core::Result<T>,
    template: String,
    form: &impl Serialize,
    user: &CurrentDriver,
    redirect: impl FnOnce(&T) -> String,
) -> Result<Response> {
    match result {
        Ok(saved) => Ok(found(&redirect(&saved))),
        Err(taxi_core::Error::Invalid(errors)) => {
            tracing::debug!(%template, %errors, "form rejected");
            Ok(Page::invalid_form(template, json!(form), &errors)
                .with_user(user)
                .into_response())
        }
        Err(err) => Err(err.into()),
    }
}
