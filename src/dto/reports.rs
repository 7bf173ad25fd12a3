use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::entities::{BeamStatus, FabricType};

#[derive(Debug, Deserialize, IntoParams)]
pub struct BeamReportQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct DeliveryReportQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub workshop_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BeamReportRow {
    pub beam_number: String,
    pub fabric_type: FabricType,
    pub total_beam_meters: Decimal,
    pub meters_per_piece: Decimal,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub status: BeamStatus,
    pub workshop: String,
    pub customer: String,
    pub machine_number: i32,
    pub total_good: i64,
    pub total_damaged: i64,
    pub total_pieces: i64,
    pub total_meters_used: Decimal,
    pub remaining_meters: Decimal,
    pub total_amount: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BeamReport {
    pub beams: Vec<BeamReportRow>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DeliveryReportRow {
    pub id: Uuid,
    pub delivery_date: NaiveDate,
    pub design_name: String,
    pub price_per_piece: Decimal,
    pub good_pieces: i32,
    pub damaged_pieces: i32,
    pub meters_used: Decimal,
    pub total_amount: Decimal,
    pub notes: Option<String>,
    pub beam_number: String,
    pub fabric_type: FabricType,
    pub workshop: String,
    pub customer: String,
    pub machine_number: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeliveryReport {
    pub deliveries: Vec<DeliveryReportRow>,
}
