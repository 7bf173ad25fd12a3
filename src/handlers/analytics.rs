use axum::{extract::State, response::IntoResponse, routing::get, Router};

use super::common::{success_response, ApiQuery};
use crate::dto::analytics::{
    FabricDistribution, FabricFilter, MachineQuality, MachineQualityQuery, ProductionTrend,
    TrendQuery, WorkshopMachineProductionResponse,
};
use crate::errors::ServiceError;
use crate::AppState;

/// Pieces on each machine's current beam, grouped by workshop
#[utoipa::path(
    get,
    path = "/api/analytics/workshop-machine-production",
    params(FabricFilter),
    responses(
        (status = 200, description = "Per-machine production", body = WorkshopMachineProductionResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "analytics"
)]
pub async fn workshop_machine_production(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<FabricFilter>,
) -> Result<impl IntoResponse, ServiceError> {
    let data = state
        .services
        .analytics
        .workshop_machine_production(filter.fabric_type)
        .await?;
    Ok(success_response(WorkshopMachineProductionResponse { data }))
}

/// Daily good pieces per workshop
#[utoipa::path(
    get,
    path = "/api/analytics/production-trend",
    params(TrendQuery),
    responses(
        (status = 200, description = "Chart series", body = ProductionTrend),
        (status = 400, description = "days out of range", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "analytics"
)]
pub async fn production_trend(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<TrendQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let trend = state.services.analytics.production_trend(query).await?;
    Ok(success_response(trend))
}

#[utoipa::path(
    get,
    path = "/api/analytics/fabric-distribution",
    params(FabricFilter),
    responses(
        (status = 200, description = "Good pieces and beams per fabric", body = FabricDistribution),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "analytics"
)]
pub async fn fabric_distribution(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<FabricFilter>,
) -> Result<impl IntoResponse, ServiceError> {
    let data = state
        .services
        .analytics
        .fabric_distribution(filter.fabric_type)
        .await?;
    Ok(success_response(FabricDistribution { data }))
}

#[utoipa::path(
    get,
    path = "/api/analytics/machine-quality",
    params(MachineQualityQuery),
    responses(
        (status = 200, description = "Good and damaged pieces per machine", body = MachineQuality),
        (status = 400, description = "Invalid date window", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "analytics"
)]
pub async fn machine_quality(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<MachineQualityQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let data = state.services.analytics.machine_quality(query).await?;
    Ok(success_response(MachineQuality { data }))
}

pub fn analytics_routes() -> Router<AppState> {
    Router::new()
        .route("/workshop-machine-production", get(workshop_machine_production))
        .route("/production-trend", get(production_trend))
        .route("/fabric-distribution", get(fabric_distribution))
        .route("/machine-quality", get(machine_quality))
}
