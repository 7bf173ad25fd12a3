use axum::{extract::State, response::IntoResponse, routing::get, Router};

use super::common::{success_response, ApiQuery};
use crate::dto::analytics::{DashboardOverview, DashboardQuery};
use crate::errors::ServiceError;
use crate::AppState;

/// Headline production and payment figures
///
/// The window starts on the first of the current month unless `start_date`
/// is given.
#[utoipa::path(
    get,
    path = "/api/dashboard/overview",
    params(DashboardQuery),
    responses(
        (status = 200, description = "Dashboard figures", body = DashboardOverview),
        (status = 400, description = "Invalid filter or date window", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "dashboard"
)]
pub async fn overview(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<DashboardQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let overview = state.services.analytics.overview(query).await?;
    Ok(success_response(overview))
}

pub fn dashboard_routes() -> Router<AppState> {
    Router::new().route("/overview", get(overview))
}
