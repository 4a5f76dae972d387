//! Shared harness for HTTP tests: drives the router in-process and keeps
//! the session cookie between requests like a browser would.

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body, Bytes},
    http::{
        header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
        HeaderMap, Method, Request, StatusCode,
    },
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use taxi_core::{Driver, FleetStore, Manufacturer, NewDriver, NewManufacturer, StoreConfig};
use taxi_server::{config::ServerConfig, create_router, state::AppState};

pub const PASSWORD: &str = "password";

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn location(&self) -> &str {
        self.headers
            .get(LOCATION)
            .map(|v| v.to_str().unwrap())
            .unwrap_or_default()
    }

    pub fn template(&self) -> String {
        self.json()["template"].as_str().unwrap().to_string()
    }

    pub fn assert_redirect(&self, to: &str) {
        assert_eq!(self.status, StatusCode::FOUND, "body: {:?}", self.body);
        assert_eq!(self.location(), to);
    }

    pub fn assert_page(&self, template: &str) -> Value {
        assert_eq!(self.status, StatusCode::OK, "body: {:?}", self.body);
        let json = self.json();
        assert_eq!(json["template"], template);
        json
    }
}

pub struct TestApp {
    pub state: AppState,
    router: Router,
    cookie: Option<String>,
}

impl TestApp {
    pub fn new() -> Self {
        let store =
            FleetStore::open(StoreConfig::temporary().with_password_iterations(1_000)).unwrap();
        let state = AppState::with_store(ServerConfig::default(), store);
        Self {
            router: create_router(state.clone()),
            state,
            cookie: None,
        }
    }

    /// A fresh app with a logged-in driver.
    pub async fn logged_in() -> (Self, Driver) {
        let mut app = Self::new();
        let driver = app.driver("testuser");
        app.login("testuser", PASSWORD).await.assert_redirect("/");
        (app, driver)
    }

    pub fn store(&self) -> &FleetStore {
        &self.state.store
    }

    pub fn driver(&self, username: &str) -> Driver {
        self.store()
            .create_driver(NewDriver::new(username, PASSWORD))
            .unwrap()
    }

    pub fn manufacturer(&self, name: &str, country: &str) -> Manufacturer {
        self.store()
            .create_manufacturer(NewManufacturer::new(name, country))
            .unwrap()
    }

    pub async fn login(&mut self, username: &str, password: &str) -> TestResponse {
        let body = format!("username={username}&password={password}");
        let response = self.post_form("/accounts/login/", &body).await;
        if let Some(cookie) = response.headers.get(SET_COOKIE) {
            let cookie = cookie.to_str().unwrap();
            let pair = cookie.split(';').next().unwrap_or_default();
            self.cookie = Some(pair.to_string());
        }
        response
    }

    pub fn logout_locally(&mut self) {
        self.cookie = None;
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None).await
    }

    /// GET with an explicit cookie header instead of the stored one.
    pub async fn get_with_cookie(&self, uri: &str, cookie: &str) -> TestResponse {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header(COOKIE, cookie)
            .body(Body::empty())
            .unwrap();
        self.dispatch(request).await
    }

    pub async fn post_form(&self, uri: &str, body: &str) -> TestResponse {
        self.send(Method::POST, uri, Some(body.to_string())).await
    }

    async fn send(&self, method: Method, uri: &str, body: Option<String>) -> TestResponse {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(cookie) = &self.cookie {
            request = request.header(COOKIE, cookie);
        }
        let request = match body {
            Some(body) => request
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body)),
            None => request.body(Body::empty()),
        }
        .unwrap();

        self.dispatch(request).await
    }

    async fn dispatch(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        TestResponse {
            status,
            headers,
            body,
        }
    }
}
