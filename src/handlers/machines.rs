use axum::{
    extract::State,
    response::IntoResponse,
    routing::{delete, get, post},
    Router,
};
use uuid::Uuid;

use super::common::{created_response, no_content_response, success_response, ApiPath, ValidatedJson};
use crate::dto::catalog::{CreateMachineRequest, MachineListResponse};
use crate::entities::machine;
use crate::errors::ServiceError;
use crate::AppState;

#[utoipa::path(
    post,
    path = "/api/machines",
    request_body = CreateMachineRequest,
    responses(
        (status = 201, description = "Machine created", body = machine::Model),
        (status = 400, description = "Invalid request or fabric unsuited to the workshop", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Workshop not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Machine number taken in this workshop", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "machines"
)]
pub async fn create_machine(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateMachineRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let created = state.services.machines.create_machine(request).await?;
    Ok(created_response(created))
}

#[utoipa::path(
    delete,
    path = "/api/machines/{id}",
    params(("id" = Uuid, Path, description = "Machine ID")),
    responses(
        (status = 204, description = "Machine deleted"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Machine not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Beams reference the machine", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "machines"
)]
pub async fn delete_machine(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.machines.delete_machine(id).await?;
    Ok(no_content_response())
}

/// Every active machine with its workshop name
#[utoipa::path(
    get,
    path = "/api/machines/all",
    responses(
        (status = 200, description = "Machines by workshop and number", body = MachineListResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "machines"
)]
pub async fn list_all_machines(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let machines = state.services.machines.list_all().await?;
    Ok(success_response(MachineListResponse { machines }))
}

pub fn machine_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_machine))
        .route("/all", get(list_all_machines))
        .route("/:id", delete(delete_machine))
}
