use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::entities::delivery;

/// Record a delivery against an active beam.
///
/// `meters_used` and `total_amount` are always computed by the server; any
/// values a client sends for them are ignored.
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct RecordDeliveryRequest {
    pub beam_id: Uuid,
    pub delivery_date: NaiveDate,
    #[validate(length(min = 1, max = 200))]
    pub design_name: String,
    pub price_per_piece: Decimal,
    pub good_pieces: i32,
    #[serde(default)]
    pub damaged_pieces: i32,
    #[validate(length(max = 1000))]
    #[serde(default)]
    pub notes: Option<String>,
    /// Ignored.
    #[serde(default, skip_serializing)]
    pub meters_used: Option<Decimal>,
    /// Ignored.
    #[serde(default, skip_serializing)]
    pub total_amount: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct DeliveryListQuery {
    pub beam_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeliveryListResponse {
    pub deliveries: Vec<delivery::Model>,
}
