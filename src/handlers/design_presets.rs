use axum::{
    extract::State,
    response::IntoResponse,
    routing::{delete, get},
    Router,
};
use uuid::Uuid;

use super::common::{created_response, no_content_response, success_response, ApiPath, ValidatedJson};
use crate::dto::catalog::{CreateDesignPresetRequest, DesignPresetListResponse};
use crate::entities::design_preset;
use crate::errors::ServiceError;
use crate::AppState;

#[utoipa::path(
    get,
    path = "/api/design-presets",
    responses(
        (status = 200, description = "Active presets, cheapest first", body = DesignPresetListResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "design-presets"
)]
pub async fn list_presets(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let presets = state.services.design_presets.list_presets().await?;
    Ok(success_response(DesignPresetListResponse { presets }))
}

#[utoipa::path(
    post,
    path = "/api/design-presets",
    request_body = CreateDesignPresetRequest,
    responses(
        (status = 201, description = "Preset created", body = design_preset::Model),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "design-presets"
)]
pub async fn create_preset(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateDesignPresetRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let created = state.services.design_presets.create_preset(request).await?;
    Ok(created_response(created))
}

#[utoipa::path(
    delete,
    path = "/api/design-presets/{id}",
    params(("id" = Uuid, Path, description = "Preset ID")),
    responses(
        (status = 204, description = "Preset deleted"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Preset not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "design-presets"
)]
pub async fn delete_preset(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.design_presets.delete_preset(id).await?;
    Ok(no_content_response())
}

pub fn design_preset_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_presets).post(create_preset))
        .route("/:id", delete(delete_preset))
}
