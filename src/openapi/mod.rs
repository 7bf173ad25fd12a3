use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Powerloom API",
        version = "0.1.0",
        description = r#"
# Powerloom Production API

Backend for a powerloom weaving unit: workshops, machines, beams loaded on
those machines, and the deliveries of finished pieces cut from each beam.

## Beam ledger

A beam holds a fixed length of warp. Every delivery consumes
`(good_pieces + damaged_pieces) * meters_per_piece` meters of it, and a
delivery that would exceed the beam's remaining meters is rejected with
`CAPACITY_EXCEEDED`. `meters_used` and `total_amount` are always computed by
the server.

## Authentication

Every endpoint except `POST /api/auth/login` and the health probes requires a
bearer token:

```
Authorization: Bearer <jwt>
```

## Errors

Errors share one JSON shape. Branch on `code`, not on `message`:

```json
{
  "error": "Unprocessable Entity",
  "code": "CAPACITY_EXCEEDED",
  "message": "Delivery needs 400 meters but beam 'WB001' has 200 remaining",
  "details": {"beam_number": "WB001", "requested_meters": "400", "remaining_meters": "200"},
  "request_id": "9c1f...",
  "timestamp": "2024-01-05T10:30:00+00:00"
}
```
        "#
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "auth", description = "Login and password management"),
        (name = "beams", description = "Beam lifecycle"),
        (name = "deliveries", description = "Deliveries recorded against beams"),
        (name = "workshops", description = "Workshops and machine occupancy"),
        (name = "machines", description = "Looms"),
        (name = "customers", description = "Customers beams are woven for"),
        (name = "design-presets", description = "Design label and price shortcuts"),
        (name = "dashboard", description = "Headline figures"),
        (name = "analytics", description = "Chart data"),
        (name = "reports", description = "Export data"),
        (name = "admin", description = "Destructive maintenance")
    ),
    paths(
        crate::handlers::auth::login,
        crate::handlers::auth::reset_password,

        crate::handlers::beams::list_beams,
        crate::handlers::beams::get_beam,
        crate::handlers::beams::start_beam,
        crate::handlers::beams::end_beam,
        crate::handlers::beams::delete_beam,

        crate::handlers::deliveries::record_delivery,
        crate::handlers::deliveries::list_deliveries,
        crate::handlers::deliveries::delete_delivery,

        crate::handlers::workshops::list_workshops,
        crate::handlers::workshops::create_workshop,
        crate::handlers::workshops::delete_workshop,
        crate::handlers::workshops::workshop_machines,

        crate::handlers::machines::create_machine,
        crate::handlers::machines::delete_machine,
        crate::handlers::machines::list_all_machines,

        crate::handlers::customers::list_customers,
        crate::handlers::customers::create_customer,
        crate::handlers::customers::set_customer_status,
        crate::handlers::customers::delete_customer,

        crate::handlers::design_presets::list_presets,
        crate::handlers::design_presets::create_preset,
        crate::handlers::design_presets::delete_preset,

        crate::handlers::dashboard::overview,

        crate::handlers::analytics::workshop_machine_production,
        crate::handlers::analytics::production_trend,
        crate::handlers::analytics::fabric_distribution,
        crate::handlers::analytics::machine_quality,

        crate::handlers::reports::beam_details,
        crate::handlers::reports::delivery_details,

        crate::handlers::admin::reset_database,
    ),
    components(
        schemas(
            crate::entities::FabricType,
            crate::entities::WorkshopType,
            crate::entities::BeamStatus,
            crate::entities::beam::Model,
            crate::entities::delivery::Model,
            crate::entities::workshop::Model,
            crate::entities::machine::Model,
            crate::entities::customer::Model,
            crate::entities::design_preset::Model,

            crate::dto::auth::LoginRequest,
            crate::dto::auth::TokenResponse,
            crate::dto::auth::ResetDatabaseRequest,
            crate::dto::auth::ResetDatabaseResponse,
            crate::dto::auth::MessageResponse,

            crate::dto::beams::CreateBeamRequest,
            crate::dto::beams::BeamSummary,
            crate::dto::beams::BeamListResponse,
            crate::dto::beams::BeamDetail,
            crate::services::beam_metrics::BeamTotals,

            crate::dto::deliveries::RecordDeliveryRequest,
            crate::dto::deliveries::DeliveryListResponse,

            crate::dto::catalog::CreateWorkshopRequest,
            crate::dto::catalog::WorkshopSummary,
            crate::dto::catalog::WorkshopListResponse,
            crate::dto::catalog::MachineOccupancy,
            crate::dto::catalog::MachineOccupancyResponse,
            crate::dto::catalog::CreateMachineRequest,
            crate::dto::catalog::MachineListing,
            crate::dto::catalog::MachineListResponse,
            crate::dto::catalog::CreateCustomerRequest,
            crate::dto::catalog::CustomerStatus,
            crate::dto::catalog::CustomerStatusRequest,
            crate::dto::catalog::CustomerListResponse,
            crate::dto::catalog::CreateDesignPresetRequest,
            crate::dto::catalog::DesignPresetListResponse,

            crate::dto::analytics::DashboardOverview,
            crate::dto::analytics::WorkshopProduction,
            crate::dto::analytics::CustomerSummary,
            crate::dto::analytics::ProductionTrend,
            crate::dto::analytics::FabricDistribution,
            crate::dto::analytics::FabricDistributionEntry,
            crate::dto::analytics::MachineQuality,
            crate::dto::analytics::MachineQualityEntry,
            crate::dto::analytics::WorkshopMachineProductionResponse,
            crate::dto::analytics::WorkshopMachineProduction,
            crate::dto::analytics::MachineProduction,

            crate::dto::reports::BeamReport,
            crate::dto::reports::BeamReportRow,
            crate::dto::reports::DeliveryReport,
            crate::dto::reports::DeliveryReportRow,

            crate::errors::ErrorResponse
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
