use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::entities::FabricType;

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct DashboardQuery {
    /// Defaults to the first day of the current month
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub fabric_type: Option<FabricType>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WorkshopProduction {
    pub workshop_name: String,
    pub total_pieces: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CustomerSummary {
    pub customer_name: String,
    pub total_pieces: i64,
    pub total_amount: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardOverview {
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub active_beams: u64,
    pub total_pieces_this_month: i64,
    pub total_damaged_this_month: i64,
    pub pending_amount_this_month: Decimal,
    pub workshop_production: Vec<WorkshopProduction>,
    pub customer_summary: Vec<CustomerSummary>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct TrendQuery {
    /// Number of days to look back (1-365)
    #[param(minimum = 1, maximum = 365)]
    pub days: Option<i64>,
    pub fabric_type: Option<FabricType>,
}

/// Chart-ready series: each point is `{"date": .., "<workshop>": pieces, ..}`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductionTrend {
    #[schema(value_type = Vec<Object>)]
    pub data: Vec<serde_json::Map<String, serde_json::Value>>,
    pub workshops: Vec<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FabricDistributionEntry {
    pub name: FabricType,
    /// Good pieces delivered
    pub value: i64,
    /// Distinct beams that delivered
    pub beams: u64,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct FabricFilter {
    pub fabric_type: Option<FabricType>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct MachineQualityQuery {
    pub fabric_type: Option<FabricType>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MachineQualityEntry {
    pub workshop_name: String,
    pub machine_number: i32,
    pub machine_name: String,
    pub good_pieces: i64,
    pub damaged_pieces: i64,
    pub total_pieces: i64,
    pub damage_rate_by_pieces: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MachineProduction {
    pub machine_number: i32,
    pub production: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WorkshopMachineProduction {
    pub workshop_name: String,
    pub machines: Vec<MachineProduction>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FabricDistribution {
    pub data: Vec<FabricDistributionEntry>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MachineQuality {
    pub data: Vec<MachineQualityEntry>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WorkshopMachineProductionResponse {
    pub data: Vec<WorkshopMachineProduction>,
}
