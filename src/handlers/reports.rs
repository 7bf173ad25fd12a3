use axum::{extract::State, response::IntoResponse, routing::get, Router};

use super::common::{success_response, ApiQuery};
use crate::dto::reports::{BeamReport, BeamReportQuery, DeliveryReport, DeliveryReportQuery};
use crate::errors::ServiceError;
use crate::AppState;

/// Beams overlapping the window, with per-beam totals
#[utoipa::path(
    get,
    path = "/api/reports/beam-details",
    params(BeamReportQuery),
    responses(
        (status = 200, description = "Beam report rows", body = BeamReport),
        (status = 400, description = "Missing or inverted date window", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn beam_details(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<BeamReportQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let beams = state
        .services
        .reports
        .beam_report(query.start_date, query.end_date)
        .await?;
    Ok(success_response(BeamReport { beams }))
}

/// Deliveries in the window, optionally for one workshop
#[utoipa::path(
    get,
    path = "/api/reports/delivery-details",
    params(DeliveryReportQuery),
    responses(
        (status = 200, description = "Delivery report rows", body = DeliveryReport),
        (status = 400, description = "Missing or inverted date window", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn delivery_details(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<DeliveryReportQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let deliveries = state
        .services
        .reports
        .delivery_report(query.start_date, query.end_date, query.workshop_id)
        .await?;
    Ok(success_response(DeliveryReport { deliveries }))
}

pub fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/beam-details", get(beam_details))
        .route("/delivery-details", get(delivery_details))
}
