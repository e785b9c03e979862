/// Common test utilities for HTTP tests
///
/// The router runs over the in-memory store with a cheap hashing cost, so
/// these tests need neither PostgreSQL nor a network socket.

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use taskdesk_api::app::{build_router, AppState};
use taskdesk_api::config::Config;
use taskdesk_shared::auth::password::HashingCost;
use taskdesk_shared::store::memory::MemoryStore;
use tower::Service as _;

pub const PASSWORD: &str = "correct horse battery";

/// Registered employee with a live token pair
#[allow(dead_code)]
pub struct Session {
    pub employee_id: String,
    pub email: String,
    pub access_token: String,
    pub refresh_token: String,
}

/// Test context containing the router and its backing store
#[allow(dead_code)]
pub struct TestContext {
    pub app: axum::Router,
    pub store: MemoryStore,
    pub config: Config,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_vars(&[])
    }

    /// Context whose configuration also sees `vars`
    pub fn with_vars(vars: &[(&str, &str)]) -> Self {
        let config = Config::from_lookup(|key| match key {
            "DATABASE_URL" => Some("postgresql://unused/taskdesk".to_string()),
            "JWT_SECRET" => Some("http-test-secret-that-is-32-bytes-long".to_string()),
            _ => vars
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| value.to_string()),
        })
        .expect("test config");

        let store = MemoryStore::new();
        let state = AppState::with_backend(
            Arc::new(store.clone()),
            config.clone(),
            HashingCost::new(8, 1, 1),
        )
        .expect("app state");

        Self {
            app: build_router(state),
            store,
            config,
        }
    }

    /// Sends a request and returns the status and JSON body (`Null` if empty)
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        bearer: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut headers = Vec::new();
        let authorization = bearer.map(|token| format!("Bearer {}", token));
        if let Some(value) = &authorization {
            headers.push(("authorization", value.as_str()));
        }
        let body = body.map(|json| json.to_string());
        if body.is_some() {
            headers.push(("content-type", "application/json"));
        }

        let (status, _, value) = self.send_raw(method, uri, &headers, body).await;
        (status, value)
    }

    /// Sends a request with explicit headers and a raw body, returning the
    /// response headers as well
    pub async fn send_raw(
        &self,
        method: &str,
        uri: &str,
        headers: &[(&str, &str)],
        body: Option<String>,
    ) -> (StatusCode, HeaderMap, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let body = body.map(Body::from).unwrap_or_else(Body::empty);

        let response = self
            .app
            .clone()
            .call(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let response_headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                panic!("non-JSON body: {}", String::from_utf8_lossy(&bytes))
            })
        };
        (status, response_headers, value)
    }

    /// Registers an employee and returns their first session
    pub async fn register(&self, email: &str) -> Session {
        let (status, body) = self
            .send(
                "POST",
                "/v1/auth/register",
                None,
                Some(json!({
                    "name": "Test Employee",
                    "email": email,
                    "password": PASSWORD,
                    "department": "Engineering",
                    "position": "Developer"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
        session_from(&body)
    }

    pub async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.send(
            "POST",
            "/v1/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }
}

pub fn session_from(body: &Value) -> Session {
    Session {
        employee_id: body["employee"]["id"].as_str().unwrap().to_string(),
        email: body["employee"]["email"].as_str().unwrap().to_string(),
        access_token: body["access_token"].as_str().unwrap().to_string(),
        refresh_token: body["refresh_token"].as_str().unwrap().to_string(),
    }
}

/// The single `Set-Cookie` value of a response
#[allow(dead_code)]
pub fn set_cookie(headers: &HeaderMap) -> String {
    let values: Vec<_> = headers.get_all("set-cookie").iter().collect();
    assert_eq!(values.len(), 1, "expected one Set-Cookie header");
    values[0].to_str().unwrap().to_string()
}

/// `name=value` pair of a `Set-Cookie` value, ready for a `Cookie` header
#[allow(dead_code)]
pub fn cookie_pair(set_cookie: &str) -> String {
    set_cookie.split(';').next().unwrap().to_string()
}
