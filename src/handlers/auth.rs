use axum::{extract::State, response::IntoResponse};

use super::common::{success_response, validate_input, ApiQuery, ValidatedJson};
use crate::dto::auth::{LoginRequest, MessageResponse, ResetPasswordQuery, TokenResponse};
use crate::errors::ServiceError;
use crate::AppState;

/// Exchange admin credentials for a bearer token
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 401, description = "Invalid credentials", body = crate::errors::ErrorResponse),
        (status = 403, description = "Account disabled", body = crate::errors::ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let token = state
        .services
        .auth
        .login(&request.username, &request.password)
        .await?;
    Ok(success_response(token))
}

/// Set a new password for an admin account
#[utoipa::path(
    post,
    path = "/api/auth/reset-password",
    params(ResetPasswordQuery),
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Password too short", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown user", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn reset_password(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ResetPasswordQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&query)?;
    state
        .services
        .admin
        .reset_password(&query.username, &query.new_password)
        .await?;
    Ok(success_response(MessageResponse {
        message: format!("Password reset successfully for user '{}'", query.username),
    }))
}
