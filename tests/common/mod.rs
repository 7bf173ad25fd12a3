#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    response::Response,
    Router,
};
use powerloom_api::{
    auth::AuthService,
    config::AppConfig,
    db,
    services::seed::ensure_admin,
    AppState,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "k7Qp2vXz9LmN4rTy8WbE3hJd6FgS1cVa0uIoPqRs5tYwZxCvBnMlKjHgFdSaQwEr";
pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "loom-master-7";

/// Application harness backed by a throwaway SQLite file.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    token: String,
    _dir: TempDir,
}

impl TestApp {
    /// Fresh migrated database, no seed data, and a token for `admin`.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    pub async fn with_config(adjust: impl FnOnce(&mut AppConfig)) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("powerloom_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", path.display()),
            TEST_SECRET.to_string(),
            3600,
            "127.0.0.1".to_string(),
            18_080,
            "development".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.seed_defaults = false;
        adjust(&mut cfg);

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::new(Arc::new(pool), cfg);
        let token = state
            .auth_service()
            .issue_token(ADMIN_USERNAME)
            .expect("issue test token")
            .access_token;
        let router = powerloom_api::app_router(state.clone());

        Self {
            router,
            state,
            token,
            _dir: dir,
        }
    }

    /// Same as [`TestApp::new`] plus a stored admin account that can log in.
    pub async fn with_admin() -> Self {
        let app = Self::new().await;
        ensure_admin(&*app.state.db, ADMIN_USERNAME, ADMIN_PASSWORD, None)
            .await
            .expect("create admin");
        app
    }

    pub fn auth_service(&self) -> Arc<AuthService> {
        self.state.auth_service()
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn request_authenticated(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> Response {
        self.request(method, uri, body, Some(self.token())).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let response = self.request_authenticated(Method::GET, uri, None).await;
        split(response).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = self.request_authenticated(Method::POST, uri, Some(body)).await;
        split(response).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = self.request_authenticated(Method::PUT, uri, Some(body)).await;
        split(response).await
    }

    pub async fn delete(&self, uri: &str) -> StatusCode {
        self.request_authenticated(Method::DELETE, uri, None)
            .await
            .status()
    }

    pub async fn create_workshop(&self, name: &str, workshop_type: &str) -> Value {
        let (status, body) = self
            .post(
                "/api/workshops",
                json!({
                    "name": name,
                    "location": "Komarapalayam",
                    "machine_count": 4,
                    "workshop_type": workshop_type,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create workshop: {body}");
        body
    }

    pub async fn create_machine(&self, workshop_id: &str, number: i32, fabric: &str) -> Value {
        let (status, body) = self
            .post(
                "/api/machines",
                json!({
                    "workshop_id": workshop_id,
                    "machine_number": number,
                    "fabric_type": fabric,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create machine: {body}");
        body
    }

    pub async fn create_customer(&self, name: &str) -> Value {
        let (status, body) = self.post("/api/customers", json!({ "name": name })).await;
        assert_eq!(status, StatusCode::CREATED, "create customer: {body}");
        body
    }

    pub async fn start_beam(&self, body: Value) -> (StatusCode, Value) {
        self.post("/api/beams/start", body).await
    }

    pub async fn record_delivery(&self, body: Value) -> (StatusCode, Value) {
        self.post("/api/deliveries", body).await
    }

    /// Workshop W1 (veshti) with machine #1 and customer C1.
    pub async fn loom_fixture(&self) -> LoomFixture {
        let workshop = self.create_workshop("W1", "veshti").await;
        let workshop_id = id_of(&workshop);
        let machine = self.create_machine(&workshop_id, 1, "veshti").await;
        let customer = self.create_customer("C1").await;
        LoomFixture {
            workshop_id,
            machine_id: id_of(&machine),
            customer_id: id_of(&customer),
        }
    }

    /// Starts a 1000 m / 4 m-per-piece beam on the fixture machine.
    pub async fn start_fixture_beam(&self, fixture: &LoomFixture, beam_number: &str) -> Value {
        let (status, body) = self
            .start_beam(json!({
                "beam_number": beam_number,
                "machine_id": fixture.machine_id,
                "customer_id": fixture.customer_id,
                "total_beam_meters": "1000",
                "meters_per_piece": "4",
                "start_date": "2024-01-01",
            }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "start beam: {body}");
        body
    }
}

pub struct LoomFixture {
    pub workshop_id: String,
    pub machine_id: String,
    pub customer_id: String,
}

pub async fn split(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("response body is json")
    };
    (status, value)
}

pub fn id_of(value: &Value) -> String {
    value["id"].as_str().expect("id field").to_string()
}

/// Decimal fields serialize as strings; compare them numerically.
pub fn decimal(value: &Value) -> rust_decimal::Decimal {
    match value {
        Value::String(s) => s.parse().expect("decimal string"),
        Value::Number(n) => n.to_string().parse().expect("decimal number"),
        other => panic!("not a decimal: {other}"),
    }
}
