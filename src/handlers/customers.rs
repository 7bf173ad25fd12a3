use axum::{
    extract::State,
    response::IntoResponse,
    routing::{delete, get, put},
    Router,
};
use uuid::Uuid;

use super::common::{
    created_response, no_content_response, success_response, ApiJson, ApiPath, ApiQuery,
    ValidatedJson,
};
use crate::dto::catalog::{
    CreateCustomerRequest, CustomerListQuery, CustomerListResponse, CustomerStatusRequest,
};
use crate::entities::customer;
use crate::errors::ServiceError;
use crate::AppState;

#[utoipa::path(
    get,
    path = "/api/customers",
    params(CustomerListQuery),
    responses(
        (status = 200, description = "Customers by name", body = CustomerListResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "customers"
)]
pub async fn list_customers(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CustomerListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let customers = state
        .services
        .customers
        .list_customers(query.include_inactive)
        .await?;
    Ok(success_response(CustomerListResponse { customers }))
}

#[utoipa::path(
    post,
    path = "/api/customers",
    request_body = CreateCustomerRequest,
    responses(
        (status = 201, description = "Customer created", body = customer::Model),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 409, description = "Customer name taken", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "customers"
)]
pub async fn create_customer(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateCustomerRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let created = state.services.customers.create_customer(request).await?;
    Ok(created_response(created))
}

/// Activate or deactivate a customer
#[utoipa::path(
    put,
    path = "/api/customers/{id}/status",
    params(("id" = Uuid, Path, description = "Customer ID")),
    request_body = CustomerStatusRequest,
    responses(
        (status = 200, description = "Customer updated", body = customer::Model),
        (status = 400, description = "Unknown status", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "customers"
)]
pub async fn set_customer_status(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<CustomerStatusRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let updated = state.services.customers.set_status(id, request.status).await?;
    Ok(success_response(updated))
}

#[utoipa::path(
    delete,
    path = "/api/customers/{id}",
    params(("id" = Uuid, Path, description = "Customer ID")),
    responses(
        (status = 204, description = "Customer deleted"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Beams reference the customer", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "customers"
)]
pub async fn delete_customer(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.customers.delete_customer(id).await?;
    Ok(no_content_response())
}

pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_customers).post(create_customer))
        .route("/:id", delete(delete_customer))
        .route("/:id/status", put(set_customer_status))
}
