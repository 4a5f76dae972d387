use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;

use taxi_core::{Actor, Driver};

use super::Session;
use crate::error::ServerError;
use crate::state::AppState;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "sessionid";

/// The authenticated driver behind a request.
///
/// Extraction fails with [`ServerError::Unauthenticated`] when there is no
/// live session, or its driver has since been deleted; that error renders
/// as a redirect to the login page.
pub struct CurrentDriver {
    pub actor: Actor,
    pub driver: Driver,
    pub session: Arc<Session>,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentDriver {
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let unauthenticated = || ServerError::Unauthenticated {
            next: parts
                .uri
                .path_and_query()
                .map(|pq| pq.as_str().to_string())
                .unwrap_or_else(|| "/".to_string()),
        };

        let jar = CookieJar::from_headers(&parts.headers);
        let session = jar
            .get(SESSION_COOKIE)
            .and_then(|cookie| state.sessions.get_session(cookie.value()))
            .ok_or_else(unauthenticated)?;

        let Some(driver) = state.store.find::<Driver>(session.driver_id)? else {
            state.sessions.delete_session(&session.id);
            return Err(unauthenticated());
        };

        Ok(Self {
            actor: Actor::from(&driver),
            driver,
            session,
        })
    }
}
