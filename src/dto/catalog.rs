use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::entities::{customer, design_preset, FabricType, WorkshopType};

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateWorkshopRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 255))]
    pub location: String,
    #[validate(range(min = 0, max = 500))]
    pub machine_count: i32,
    pub workshop_type: WorkshopType,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WorkshopSummary {
    pub id: Uuid,
    pub name: String,
    pub location: String,
    pub machine_count: i32,
    /// Machine rows actually registered in the workshop
    pub actual_machine_count: i64,
    pub workshop_type: WorkshopType,
    pub is_active: bool,
}

/// One card in the per-workshop machine view.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MachineOccupancy {
    pub machine_id: Uuid,
    pub machine_number: i32,
    pub fabric_type: FabricType,
    pub is_active: bool,
    pub beam_id: Option<Uuid>,
    pub beam_number: Option<String>,
    pub customer_name: Option<String>,
    pub total_beam_meters: Option<Decimal>,
    pub meters_per_piece: Option<Decimal>,
    pub total_good: i64,
    pub total_damaged: i64,
    pub total_production: i64,
    pub meters_used: Decimal,
    pub remaining_meters: Option<Decimal>,
    pub damage_rate_by_meters: Decimal,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateMachineRequest {
    pub workshop_id: Uuid,
    #[validate(range(min = 1, max = 10000))]
    pub machine_number: i32,
    pub fabric_type: FabricType,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MachineListing {
    pub id: Uuid,
    pub workshop_id: Uuid,
    pub workshop_name: String,
    pub machine_number: i32,
    pub fabric_type: FabricType,
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateCustomerRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 200))]
    #[serde(default)]
    pub contact_person: Option<String>,
    #[validate(length(max = 50))]
    #[serde(default)]
    pub phone: Option<String>,
    #[validate(email)]
    #[serde(default)]
    pub email: Option<String>,
    #[validate(length(max = 1000))]
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CustomerStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CustomerStatusRequest {
    pub status: CustomerStatus,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct CustomerListQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateDesignPresetRequest {
    #[validate(length(min = 1, max = 200))]
    pub label: String,
    pub price: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WorkshopListResponse {
    pub workshops: Vec<WorkshopSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MachineOccupancyResponse {
    pub machines: Vec<MachineOccupancy>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MachineListResponse {
    pub machines: Vec<MachineListing>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerListResponse {
    pub customers: Vec<customer::Model>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DesignPresetListResponse {
    pub presets: Vec<design_preset::Model>,
}
