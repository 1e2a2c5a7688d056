//! Shared harness: the full router over the in-memory backend.
#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use supabase_client::memory::MemoryBackend;
use tower::ServiceExt;
use uuid::Uuid;

use property_admin_api::config::Config;
use property_admin_api::{build_router, AppState};

pub const JWT_SECRET: &str = "integration-test-secret";
pub const PASSWORD: &str = "correct-horse-battery";

pub struct TestApp {
    pub backend: MemoryBackend,
    pub state: AppState,
    pub router: Router,
}

pub struct Response {
    pub status: StatusCode,
    pub body: Value,
}

impl TestApp {
    pub fn new() -> Self {
        let backend = MemoryBackend::new(JWT_SECRET).with_cascade("backoffice_users");
        let state = AppState::new(
            Config::for_tests(JWT_SECRET),
            Arc::new(backend.clone()),
            Arc::new(backend.clone()),
        );
        state
            .contexts
            .watch_sessions(&state.sessions, state.pages.clone());
        let router = build_router(state.clone());

        Self {
            backend,
            state,
            router,
        }
    }

    /// An auth identity with no backoffice profile.
    pub fn add_user(&self, email: &str) -> Uuid {
        self.backend.add_identity(email, PASSWORD).id
    }

    pub fn add_operator(&self, name: &str, email: &str, role: &str, status: &str) -> Uuid {
        let id = self.add_user(email);
        self.backend.seed(
            "backoffice_users",
            vec![json!({
                "id": id,
                "email": email,
                "name": name,
                "role": role,
                "status": status,
                "created_at": Utc::now().to_rfc3339(),
            })],
        );
        id
    }

    pub fn add_property(&self, name: &str, owner: Uuid) -> Uuid {
        let id = Uuid::new_v4();
        self.backend.seed(
            "properties",
            vec![json!({ "id": id, "name": name, "city": "Bandung", "owner_id": owner, "created_at": Utc::now().to_rfc3339() })],
        );
        id
    }

    pub async fn login(&self, email: &str) -> String {
        let res = self
            .call(
                Method::POST,
                "/api/v1/auth/login",
                None,
                Some(json!({ "email": email, "password": PASSWORD })),
            )
            .await;
        assert_eq!(res.status, StatusCode::OK, "login failed: {}", res.body);
        res.body["access_token"]
            .as_str()
            .expect("access token")
            .to_string()
    }

    pub async fn select_property(&self, token: &str, property_id: Uuid) {
        let res = self
            .call(
                Method::PUT,
                "/api/v1/context/property",
                Some(token),
                Some(json!({ "property_id": property_id })),
            )
            .await;
        assert_eq!(res.status, StatusCode::OK, "select failed: {}", res.body);
    }

    pub fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
        };
        Response { status, body }
    }

    pub async fn call(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Response {
        self.send(Self::request(method, uri, token, body)).await
    }

    pub async fn get(&self, uri: &str, token: &str) -> Response {
        self.call(Method::GET, uri, Some(token), None).await
    }

    pub fn rows_where(&self, table: &str, column: &str, value: &str) -> Vec<Value> {
        self.backend
            .rows(table)
            .into_iter()
            .filter(|r| r[column] == json!(value))
            .collect()
    }
}

/// Poll `check` until it holds or a second has passed.
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..100 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
