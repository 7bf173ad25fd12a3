use axum::{extract::State, response::IntoResponse, routing::post, Extension, Router};
use tracing::warn;

use super::common::{success_response, ApiJson};
use crate::auth::AuthUser;
use crate::dto::auth::{ResetDatabaseRequest, ResetDatabaseResponse};
use crate::errors::ServiceError;
use crate::AppState;

/// Wipe all production and catalogue data
///
/// Admin accounts survive. The caller must repeat their password even though
/// the request already carries a token.
#[utoipa::path(
    post,
    path = "/api/admin/reset-database",
    request_body = ResetDatabaseRequest,
    responses(
        (status = 200, description = "Database reset", body = ResetDatabaseResponse),
        (status = 401, description = "Missing token or wrong admin password", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn reset_database(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(request): ApiJson<ResetDatabaseRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    warn!(username = %user.username, "database reset requested");
    let deleted = state
        .services
        .admin
        .reset_database(&user.username, &request.admin_password)
        .await?;
    Ok(success_response(ResetDatabaseResponse {
        message: "Database reset successfully. All data except admin users has been removed."
            .to_string(),
        deleted,
    }))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/reset-database", post(reset_database))
}
