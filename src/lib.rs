//! Powerloom API library
//!
//! Production backend for a powerloom weaving unit. The core is the beam
//! ledger: beams loaded on machines, and the deliveries of finished pieces
//! that draw down each beam's meters.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod dto;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod health;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::{Json, Response},
    routing::{get, post},
    Router,
};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::auth::{AuthRouterExt, AuthService};
use crate::services::AppServices;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub services: AppServices,
}

impl AppState {
    /// Wires the auth service and every domain service onto one pool.
    pub fn new(db: Arc<DatabaseConnection>, config: config::AppConfig) -> Self {
        let auth = Arc::new(AuthService::new(
            auth::AuthConfig::from(&config),
            db.clone(),
        ));
        let services = AppServices::new(db.clone(), auth, &config);
        Self {
            db,
            config,
            services,
        }
    }

    pub fn auth_service(&self) -> Arc<AuthService> {
        self.services.auth.clone()
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub git: &'static str,
    pub build_time: &'static str,
    pub environment: String,
    pub timestamp: String,
}

/// Routes mounted under `/api`.
///
/// Everything except login and status goes through [`auth::auth_middleware`].
pub fn api_routes() -> Router<AppState> {
    let protected = Router::new()
        .route(
            "/auth/reset-password",
            post(handlers::auth::reset_password),
        )
        .nest("/beams", handlers::beams::beam_routes())
        .nest("/deliveries", handlers::deliveries::delivery_routes())
        .nest("/workshops", handlers::workshops::workshop_routes())
        .nest("/machines", handlers::machines::machine_routes())
        .nest("/customers", handlers::customers::customer_routes())
        .nest("/design-presets", handlers::design_presets::design_preset_routes())
        .nest("/dashboard", handlers::dashboard::dashboard_routes())
        .nest("/analytics", handlers::analytics::analytics_routes())
        .nest("/reports", handlers::reports::report_routes())
        .nest("/admin", handlers::admin::admin_routes())
        .with_auth();

    Router::new()
        .route("/status", get(api_status))
        .route("/auth/login", post(handlers::auth::login))
        .merge(protected)
}

/// Full application router without the config-driven outer layers
/// (CORS, compression, timeout), which `main` adds.
pub fn app_router(state: AppState) -> Router {
    let auth_service = state.auth_service();
    let db = state.db.clone();

    Router::new()
        .nest("/api", api_routes())
        .with_state(state)
        .nest("/health", health::health_routes(db))
        .merge(openapi::swagger_ui())
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(tracing::configure_http_tracing())
        // Inject AuthService into request extensions for auth middleware
        .layer(middleware::from_fn_with_state(
            auth_service,
            inject_auth_service,
        ))
        .layer(middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
}

async fn inject_auth_service(
    State(auth): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Response {
    request.extensions_mut().insert(auth);
    next.run(request).await
}

async fn api_status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok",
        service: "powerloom-api",
        version: env!("CARGO_PKG_VERSION"),
        git: option_env!("GIT_HASH").unwrap_or("unknown"),
        build_time: option_env!("BUILD_TIME").unwrap_or("unknown"),
        environment: state.config.environment.clone(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

// Request logging middleware
async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    let response = next.run(request).await;

    ::tracing::info!(
        method = %method,
        uri = %uri,
        status = response.status().as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "request completed"
    );

    response
}

pub mod prelude {
    pub use crate::auth::{AuthService, AuthUser};
    pub use crate::config::AppConfig;
    pub use crate::db::*;
    pub use crate::entities::{BeamStatus, FabricType, WorkshopType};
    pub use crate::errors::*;
    pub use crate::services::AppServices;
    pub use crate::{app_router, AppState};
}
