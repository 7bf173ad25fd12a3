use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use sea_orm::error::DbErr;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

fn current_request_id() -> Option<String> {
    crate::tracing::current_request_id().map(|rid| rid.as_str().to_string())
}

/// Error body returned by every endpoint.
///
/// Clients branch on `code`; `message` is for humans and may change.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "error": "Conflict",
    "code": "DUPLICATE_BEAM_NUMBER",
    "message": "Beam number 'WB001' already exists",
    "details": null,
    "request_id": "req-abc123xyz",
    "timestamp": "2024-01-05T10:30:00.000Z"
}))]
pub struct ErrorResponse {
    /// HTTP status category (e.g., "Not Found", "Conflict")
    #[schema(example = "Conflict")]
    pub error: String,
    /// Machine-readable error code
    #[schema(example = "DUPLICATE_BEAM_NUMBER")]
    pub code: String,
    /// Human-readable error description
    #[schema(example = "Beam number 'WB001' already exists")]
    pub message: String,
    /// Additional structured context (e.g. remaining meters on a capacity rejection)
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
    /// Unique request identifier for support and debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "req-abc123xyz")]
    pub request_id: Option<String>,
    /// RFC 3339 timestamp when the error occurred
    #[schema(example = "2024-01-05T10:30:00.000Z")]
    pub timestamp: String,
}

#[derive(Debug, thiserror::Error, Serialize)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(
        #[from]
        #[serde(skip)]
        sea_orm::error::DbErr,
    ),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Beam {0} not found")]
    BeamNotFound(Uuid),

    #[error("Beam number '{0}' already exists")]
    DuplicateBeamNumber(String),

    #[error("Machine {machine_number} already has an active beam '{beam_number}'")]
    MachineOccupied {
        machine_number: i32,
        beam_number: String,
    },

    #[error("Beam '{0}' is not active")]
    BeamNotActive(String),

    #[error("Beam '{0}' is already completed")]
    AlreadyCompleted(String),

    #[error("Delivery needs {requested} meters but beam '{beam_number}' has {remaining} remaining")]
    CapacityExceeded {
        beam_number: String,
        requested: Decimal,
        remaining: Decimal,
    },

    #[error("Duplicate: {0}")]
    DuplicateName(String),

    #[error("Referenced: {0}")]
    Referenced(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Hash error: {0}")]
    HashError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    /// Wraps a connection or transaction failure.
    pub fn db_error(error: DbErr) -> Self {
        ServiceError::DatabaseError(error)
    }

    /// True when the underlying database error is a unique-constraint violation.
    pub fn is_unique_violation(err: &DbErr) -> bool {
        matches!(
            err.sql_err(),
            Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
        )
    }

    /// Stable identifier clients can branch on.
    pub fn code(&self) -> &'static str {
        match self {
            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::InvalidQuantity(_) => "INVALID_QUANTITY",
            Self::BeamNotFound(_) => "BEAM_NOT_FOUND",
            Self::DuplicateBeamNumber(_) => "DUPLICATE_BEAM_NUMBER",
            Self::MachineOccupied { .. } => "MACHINE_OCCUPIED",
            Self::BeamNotActive(_) => "BEAM_NOT_ACTIVE",
            Self::AlreadyCompleted(_) => "ALREADY_COMPLETED",
            Self::CapacityExceeded { .. } => "CAPACITY_EXCEEDED",
            Self::DuplicateName(_) => "DUPLICATE_NAME",
            Self::Referenced(_) => "REFERENCED",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::HashError(_) | Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    /// This is the single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) | Self::BeamNotFound(_) => StatusCode::NOT_FOUND,
            Self::ValidationError(_) | Self::InvalidQuantity(_) => StatusCode::BAD_REQUEST,
            Self::DuplicateBeamNumber(_)
            | Self::MachineOccupied { .. }
            | Self::BeamNotActive(_)
            | Self::AlreadyCompleted(_)
            | Self::DuplicateName(_)
            | Self::Referenced(_) => StatusCode::CONFLICT,
            Self::CapacityExceeded { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::HashError(_) | Self::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns the error message suitable for HTTP responses.
    /// Internal errors return generic messages to avoid leaking implementation details.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::HashError(_) | Self::InternalError(_) => {
                "Internal server error".to_string()
            }
            Self::Unauthorized(msg) | Self::Forbidden(msg) => msg.clone(),
            _ => self.to_string(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::CapacityExceeded {
                beam_number,
                requested,
                remaining,
            } => Some(json!({
                "beam_number": beam_number,
                "requested_meters": requested,
                "remaining_meters": remaining,
            })),
            Self::MachineOccupied {
                machine_number,
                beam_number,
            } => Some(json!({
                "machine_number": machine_number,
                "active_beam_number": beam_number,
            })),
            _ => None,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, code = self.code(), "request failed");
        }

        let err = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            code: self.code().to_string(),
            message: self.response_message(),
            details: self.details(),
            request_id: current_request_id(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(err)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::to_bytes, http::StatusCode};
    use rust_decimal_macros::dec;
    use test_case::test_case;

    #[tokio::test]
    async fn service_error_response_includes_request_id() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("req-123"), async {
                ServiceError::NotFound("missing".into()).into_response()
            })
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let payload: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(payload.request_id.as_deref(), Some("req-123"));
        assert_eq!(payload.code, "NOT_FOUND");
    }

    #[test_case(ServiceError::ValidationError("x".into()), StatusCode::BAD_REQUEST, "VALIDATION_ERROR")]
    #[test_case(ServiceError::InvalidQuantity("x".into()), StatusCode::BAD_REQUEST, "INVALID_QUANTITY")]
    #[test_case(ServiceError::BeamNotFound(Uuid::nil()), StatusCode::NOT_FOUND, "BEAM_NOT_FOUND")]
    #[test_case(ServiceError::DuplicateBeamNumber("WB001".into()), StatusCode::CONFLICT, "DUPLICATE_BEAM_NUMBER")]
    #[test_case(ServiceError::MachineOccupied { machine_number: 1, beam_number: "WB001".into() }, StatusCode::CONFLICT, "MACHINE_OCCUPIED")]
    #[test_case(ServiceError::BeamNotActive("WB001".into()), StatusCode::CONFLICT, "BEAM_NOT_ACTIVE")]
    #[test_case(ServiceError::AlreadyCompleted("WB001".into()), StatusCode::CONFLICT, "ALREADY_COMPLETED")]
    #[test_case(ServiceError::Referenced("x".into()), StatusCode::CONFLICT, "REFERENCED")]
    #[test_case(ServiceError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED, "UNAUTHORIZED")]
    #[test_case(ServiceError::Forbidden("x".into()), StatusCode::FORBIDDEN, "FORBIDDEN")]
    #[test_case(ServiceError::InternalError("x".into()), StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")]
    fn status_and_code_mapping(err: ServiceError, status: StatusCode, code: &str) {
        assert_eq!(err.status_code(), status);
        assert_eq!(err.code(), code);
    }

    #[test]
    fn capacity_exceeded_is_unprocessable_with_details() {
        let err = ServiceError::CapacityExceeded {
            beam_number: "WB001".into(),
            requested: dec!(400),
            remaining: dec!(200),
        };
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        let details = err.details().unwrap();
        assert_eq!(details["beam_number"], "WB001");
    }

    #[test]
    fn response_message_hides_internal_details() {
        assert_eq!(
            ServiceError::HashError("argon2 params".into()).response_message(),
            "Internal server error"
        );
        assert_eq!(
            ServiceError::db_error(DbErr::Custom("disk I/O error".into())).response_message(),
            "Database error"
        );
        assert_eq!(
            ServiceError::DuplicateBeamNumber("WB001".into()).response_message(),
            "Beam number 'WB001' already exists"
        );
    }
}
