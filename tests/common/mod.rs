#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, HeaderValue, Method, Request},
    response::Response,
    Router,
};
use http_body_util::BodyExt;
use ielts_practice::{
    app::build_app,
    auth::password::hash_password,
    config::{AppConfig, EvaluatorConfig, SessionConfig, StoreBackend},
    state::{AppState, SessionBackend},
    store::{MemoryStore, NewAccount, Store},
};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_PASSWORD: &str = "secret-pass";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
}

impl TestApp {
    /// App without a scoring key configured.
    pub fn new() -> Self {
        Self::with_evaluator(EvaluatorConfig::default())
    }

    pub fn with_evaluator(evaluator: EvaluatorConfig) -> Self {
        let config = AppConfig {
            store: StoreBackend::Memory,
            database_url: None,
            session: SessionConfig {
                ttl_minutes: 30,
                cookie_secure: false,
            },
            evaluator,
        };
        let store = Arc::new(MemoryStore::new());
        let dyn_store: Arc<dyn Store> = store.clone();
        let sessions = SessionBackend::Memory(tower_sessions::MemoryStore::default());
        let state =
            AppState::from_parts(dyn_store, sessions, Arc::new(config)).expect("state builds");
        Self {
            router: build_app(state.clone()),
            state,
            store,
        }
    }

    pub async fn send(&self, req: Request<Body>) -> Response {
        self.router.clone().oneshot(req).await.expect("infallible router")
    }

    /// Creates an account straight in the store, logs in through `POST /`
    /// and returns the `Cookie` value of the resulting session.
    pub async fn signed_in(&self, username: &str) -> (Uuid, String) {
        let account = self
            .store
            .create_account(NewAccount {
                username: username.into(),
                password_hash: hash_password(TEST_PASSWORD).await.expect("hash"),
                first_name: "Test".into(),
                last_name: "User".into(),
            })
            .await
            .expect("create account");
        let resp = self
            .send(form(
                "/",
                &format!("username={username}&password={TEST_PASSWORD}"),
            ))
            .await;
        let cookie = cookie_pair(set_cookie(&resp).expect("login sets a session cookie"));
        (account.id, cookie)
    }
}

pub fn form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn json_request(method: Method, uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn json_body(resp: Response) -> Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}

pub fn location(resp: &Response) -> Option<&str> {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

pub fn set_cookie(resp: &Response) -> Option<&str> {
    resp.headers()
        .get(header::SET_COOKIE)
        .and_then(|v: &HeaderValue| v.to_str().ok())
}

/// `name=value` part of a `Set-Cookie` header, usable as a `Cookie` header.
pub fn cookie_pair(set_cookie: &str) -> String {
    set_cookie.split(';').next().unwrap_or_default().to_string()
}
