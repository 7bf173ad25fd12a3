use axum::{
    extract::State,
    response::IntoResponse,
    routing::{delete, get, post},
    Router,
};
use uuid::Uuid;

use super::common::{
    created_response, no_content_response, success_response, ApiPath, ApiQuery, ValidatedJson,
};
use crate::dto::deliveries::{DeliveryListQuery, DeliveryListResponse, RecordDeliveryRequest};
use crate::entities::delivery;
use crate::errors::ServiceError;
use crate::AppState;

/// Record finished pieces against an active beam
///
/// `meters_used` and `total_amount` are computed by the server.
#[utoipa::path(
    post,
    path = "/api/deliveries",
    request_body = RecordDeliveryRequest,
    responses(
        (status = 201, description = "Delivery recorded", body = delivery::Model),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Beam not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Beam is not active", body = crate::errors::ErrorResponse),
        (status = 422, description = "Delivery exceeds the beam's remaining meters", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "deliveries"
)]
pub async fn record_delivery(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RecordDeliveryRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let created = state.services.deliveries.record_delivery(request).await?;
    Ok(created_response(created))
}

#[utoipa::path(
    get,
    path = "/api/deliveries",
    params(DeliveryListQuery),
    responses(
        (status = 200, description = "Deliveries, newest first", body = DeliveryListResponse),
        (status = 400, description = "Invalid date window", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "deliveries"
)]
pub async fn list_deliveries(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<DeliveryListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let deliveries = state.services.deliveries.list_deliveries(query).await?;
    Ok(success_response(DeliveryListResponse { deliveries }))
}

/// Remove a mistaken delivery from an active beam
#[utoipa::path(
    delete,
    path = "/api/deliveries/{id}",
    params(("id" = Uuid, Path, description = "Delivery ID")),
    responses(
        (status = 204, description = "Delivery deleted"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Delivery not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Beam is not active", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "deliveries"
)]
pub async fn delete_delivery(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.deliveries.delete_delivery(id).await?;
    Ok(no_content_response())
}

pub fn delivery_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_deliveries).post(record_delivery))
        // Older clients post here.
        .route("/add", post(record_delivery))
        .route("/:id", delete(delete_delivery))
}
