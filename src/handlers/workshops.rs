use axum::{
    extract::State,
    response::IntoResponse,
    routing::{delete, get},
    Router,
};
use uuid::Uuid;

use super::common::{created_response, no_content_response, success_response, ApiPath, ValidatedJson};
use crate::dto::catalog::{CreateWorkshopRequest, MachineOccupancyResponse, WorkshopListResponse};
use crate::entities::workshop;
use crate::errors::ServiceError;
use crate::AppState;

#[utoipa::path(
    get,
    path = "/api/workshops",
    responses(
        (status = 200, description = "Active workshops", body = WorkshopListResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "workshops"
)]
pub async fn list_workshops(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let workshops = state.services.workshops.list_workshops().await?;
    Ok(success_response(WorkshopListResponse { workshops }))
}

#[utoipa::path(
    post,
    path = "/api/workshops",
    request_body = CreateWorkshopRequest,
    responses(
        (status = 201, description = "Workshop created", body = workshop::Model),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 409, description = "Workshop name taken", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "workshops"
)]
pub async fn create_workshop(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateWorkshopRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let created = state.services.workshops.create_workshop(request).await?;
    Ok(created_response(created))
}

/// Delete a workshop and its machines
#[utoipa::path(
    delete,
    path = "/api/workshops/{id}",
    params(("id" = Uuid, Path, description = "Workshop ID")),
    responses(
        (status = 204, description = "Workshop deleted"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Workshop not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Beams reference the workshop", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "workshops"
)]
pub async fn delete_workshop(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.workshops.delete_workshop(id).await?;
    Ok(no_content_response())
}

/// Machines of a workshop with the beam currently loaded on each
#[utoipa::path(
    get,
    path = "/api/workshops/{id}/machines",
    params(("id" = Uuid, Path, description = "Workshop ID")),
    responses(
        (status = 200, description = "Machine occupancy", body = MachineOccupancyResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Workshop not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "workshops"
)]
pub async fn workshop_machines(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let machines = state.services.workshops.machine_occupancy(id).await?;
    Ok(success_response(MachineOccupancyResponse { machines }))
}

pub fn workshop_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_workshops).post(create_workshop))
        .route("/:id", delete(delete_workshop))
        .route("/:id/machines", get(workshop_machines))
}
