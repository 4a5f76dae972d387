use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use axum_extra::extract::{
    cookie::{Cookie, CookieJar, SameSite},
    Form,
};
use serde::Deserialize;
use serde_json::json;

use taxi_core::{Error, LoginForm};

use crate::error::Result;
use crate::routes::views::{found, safe_next, Page, LOGIN_URL};
use crate::session::SESSION_COOKIE;
use crate::state::AppState;

const LOGIN_TEMPLATE: &str = "registration/login.html";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/accounts/login/", get(login_page).post(login))
        .route("/accounts/logout/", post(logout))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NextQuery {
    next: Option<String>,
}

/// Login form body. `next` may ride along as a hidden field.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LoginBody {
    username: String,
    password: String,
    next: Option<String>,
}

async fn login_page(Query(query): Query<NextQuery>) -> Page {
    Page::new(
        LOGIN_TEMPLATE,
        json!({
            "form": LoginForm::default(),
            "next": query.next.unwrap_or_default(),
        }),
    )
}

async fn login(
    State(state): State<AppState>,
    Query(query): Query<NextQuery>,
    jar: CookieJar,
    Form(body): Form<LoginBody>,
) -> Result<Response> {
    let next = body.next.or(query.next);
    let form = LoginForm {
        username: body.username,
        password: body.password,
    };

    let driver = match form.authenticate(&state.store) {
        Ok(driver) => driver,
        Err(Error::Invalid(errors)) => {
            let mut page = Page::invalid_form(LOGIN_TEMPLATE, json!(form), &errors);
            page.insert("next", json!(next.unwrap_or_default()));
            return Ok(page.into_response());
        }
        Err(err) => return Err(err.into()),
    };

    // A fresh login replaces whatever session the browser had.
    if let Some(old) = jar.get(SESSION_COOKIE) {
        state.sessions.delete_session(old.value());
    }
    let session = state.sessions.create_session(&driver);
    tracing::info!(driver_id = driver.id, username = %driver.username, "logged in");

    let cookie = Cookie::build((SESSION_COOKIE, session.id.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);

    Ok((jar.add(cookie), found(&safe_next(next.as_deref()))).into_response())
}

async fn logout(State(state): State<AppState>, jar: CookieJar) -> Response {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if state.sessions.delete_session(cookie.value()) {
            tracing::info!("logged out");
        }
    }

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, found(LOGIN_URL)).into_response()
}
