use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use uuid::Uuid;

use super::common::{
    created_response, no_content_response, success_response, ApiPath, ApiQuery, ValidatedJson,
};
use crate::dto::beams::{
    BeamDetail, BeamListQuery, BeamListResponse, BeamSummary, CreateBeamRequest,
};
use crate::errors::ServiceError;
use crate::AppState;

/// List beams, active ones by default
#[utoipa::path(
    get,
    path = "/api/beams",
    params(BeamListQuery),
    responses(
        (status = 200, description = "Beams with running totals", body = BeamListResponse),
        (status = 400, description = "Invalid status filter", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "beams"
)]
pub async fn list_beams(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<BeamListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let beams = state.services.beams.list_beams(query.status).await?;
    Ok(success_response(BeamListResponse { beams }))
}

/// Beam with its deliveries and derived totals
#[utoipa::path(
    get,
    path = "/api/beams/{id}",
    params(("id" = Uuid, Path, description = "Beam ID")),
    responses(
        (status = 200, description = "Beam detail", body = BeamDetail),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Beam not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "beams"
)]
pub async fn get_beam(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let detail = state.services.beams.get_beam(id).await?;
    Ok(success_response(detail))
}

/// Load a new beam onto an idle machine
#[utoipa::path(
    post,
    path = "/api/beams/start",
    request_body = CreateBeamRequest,
    responses(
        (status = 201, description = "Beam started", body = BeamSummary),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Machine or customer not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Duplicate beam number or machine occupied", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "beams"
)]
pub async fn start_beam(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateBeamRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let beam = state.services.beams.start_beam(request).await?;
    Ok(created_response(beam))
}

/// Complete an active beam
#[utoipa::path(
    post,
    path = "/api/beams/{id}/end",
    params(("id" = Uuid, Path, description = "Beam ID")),
    responses(
        (status = 200, description = "Beam completed", body = BeamSummary),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Beam not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Beam already completed", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "beams"
)]
pub async fn end_beam(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let beam = state.services.beams.end_beam(id).await?;
    Ok(success_response(beam))
}

/// Delete a beam together with its deliveries
#[utoipa::path(
    delete,
    path = "/api/beams/{id}",
    params(("id" = Uuid, Path, description = "Beam ID")),
    responses(
        (status = 204, description = "Beam deleted"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Beam not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "beams"
)]
pub async fn delete_beam(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.beams.delete_beam(id).await?;
    Ok(no_content_response())
}

pub fn beam_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_beams))
        .route("/start", post(start_beam))
        .route("/:id", get(get_beam).delete(delete_beam))
        .route("/:id/end", post(end_beam))
}
