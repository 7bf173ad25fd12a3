use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::entities::{beam, delivery, BeamStatus, FabricType};
use crate::services::beam_metrics::BeamTotals;

/// Start a new beam on a machine.
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateBeamRequest {
    #[validate(length(min = 1, max = 100))]
    pub beam_number: String,
    pub machine_id: Uuid,
    /// Defaults to the machine's workshop; must match it when given.
    #[serde(default)]
    pub workshop_id: Option<Uuid>,
    pub customer_id: Uuid,
    /// Defaults to the machine's fabric type; must match it when given.
    #[serde(default)]
    pub fabric_type: Option<FabricType>,
    pub total_beam_meters: Decimal,
    pub meters_per_piece: Decimal,
    /// Defaults to today.
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[validate(length(max = 1000))]
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct BeamListQuery {
    /// `active` (default) or `completed`
    pub status: Option<BeamStatus>,
}

/// Beam row with display names and running totals, as listed on the beams page.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BeamSummary {
    pub id: Uuid,
    pub beam_number: String,
    pub machine_id: Uuid,
    pub workshop_id: Uuid,
    pub customer_id: Uuid,
    pub workshop_name: String,
    pub customer_name: String,
    pub machine_number: i32,
    pub fabric_type: FabricType,
    pub total_beam_meters: Decimal,
    pub meters_per_piece: Decimal,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub status: BeamStatus,
    pub notes: Option<String>,
    pub total_good_pieces: i64,
    pub total_damaged_pieces: i64,
    pub total_meters_used: Decimal,
    pub remaining_meters: Decimal,
}

impl BeamSummary {
    pub fn new(
        beam: beam::Model,
        workshop_name: String,
        customer_name: String,
        machine_number: i32,
        totals: &BeamTotals,
    ) -> Self {
        Self {
            id: beam.id,
            beam_number: beam.beam_number,
            machine_id: beam.machine_id,
            workshop_id: beam.workshop_id,
            customer_id: beam.customer_id,
            workshop_name,
            customer_name,
            machine_number,
            fabric_type: beam.fabric_type,
            total_beam_meters: beam.total_beam_meters,
            meters_per_piece: beam.meters_per_piece,
            start_date: beam.start_date,
            end_date: beam.end_date,
            status: beam.status,
            notes: beam.notes,
            total_good_pieces: totals.total_good,
            total_damaged_pieces: totals.total_damaged,
            total_meters_used: totals.total_meters_used,
            remaining_meters: totals.remaining_meters,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BeamListResponse {
    pub beams: Vec<BeamSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BeamDetail {
    pub beam: BeamSummary,
    /// Newest first
    pub deliveries: Vec<delivery::Model>,
    pub totals: BeamTotals,
}
