/*!
 * # Health Checks
 *
 * - `/health` answers as long as the process is serving requests.
 * - `/health/ready` pings the database and returns 503 when it is unreachable.
 */

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Up,
    Down,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HealthDetail {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HealthInfo {
    pub status: HealthStatus,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub uptime_seconds: u64,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, HealthDetail>,
}

#[derive(Clone)]
pub struct HealthState {
    db: Arc<DatabaseConnection>,
    started: Instant,
}

impl HealthState {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            db,
            started: Instant::now(),
        }
    }

    pub fn uptime(&self) -> u64 {
        self.started.elapsed().as_secs()
    }

    fn info(&self, status: HealthStatus, details: BTreeMap<String, HealthDetail>) -> HealthInfo {
        HealthInfo {
            status,
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
            uptime_seconds: self.uptime(),
            details,
        }
    }

    /// Pings the database and reports the overall status.
    pub async fn check(&self) -> HealthInfo {
        let database = match crate::db::check_connection(&self.db).await {
            Ok(latency) => HealthDetail {
                status: HealthStatus::Up,
                message: Some(format!("ping {} ms", latency.as_millis())),
            },
            Err(e) => {
                error!(error = %e, "database health check failed");
                HealthDetail {
                    status: HealthStatus::Down,
                    message: Some("database unreachable".to_string()),
                }
            }
        };
        let status = database.status;
        let mut details = BTreeMap::new();
        details.insert("database".to_string(), database);
        self.info(status, details)
    }
}

/// Liveness
pub async fn health_check(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    debug!("liveness probe");
    Json(state.info(HealthStatus::Up, BTreeMap::new()))
}

/// Readiness
pub async fn readiness_check(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    let health = state.check().await;
    let code = match health.status {
        HealthStatus::Up => StatusCode::OK,
        HealthStatus::Down => StatusCode::SERVICE_UNAVAILABLE,
    };
    (code, Json(health))
}

pub fn health_routes(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/ready", get(readiness_check))
        .with_state(Arc::new(HealthState::new(db)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    #[tokio::test]
    async fn readiness_fails_without_database() {
        let app = health_routes(Arc::new(DatabaseConnection::Disconnected));
        let response = app
            .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn liveness_ignores_database() {
        let app = health_routes(Arc::new(DatabaseConnection::Disconnected));
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
