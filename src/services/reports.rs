use chrono::NaiveDate;
use sea_orm::{ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use super::beam_metrics::BeamTotals;
use super::beams::sums_by_beam;
use super::Lookups;
use crate::dto::ensure_window;
use crate::dto::reports::{BeamReportRow, DeliveryReportRow};
use crate::entities::{beam, delivery, BeamStatus};
use crate::errors::ServiceError;

/// Row data behind the CSV/PDF exports.
#[derive(Clone)]
pub struct ReportService {
    db: Arc<DatabaseConnection>,
}

/// Beams overlapping `[start, end]`: started or ended inside it, spanning
/// it, or still running after starting before it.
fn overlaps(start: NaiveDate, end: NaiveDate) -> Condition {
    Condition::any()
        .add(
            Condition::all()
                .add(beam::Column::StartDate.gte(start))
                .add(beam::Column::StartDate.lte(end)),
        )
        .add(
            Condition::all()
                .add(beam::Column::EndDate.gte(start))
                .add(beam::Column::EndDate.lte(end)),
        )
        .add(
            Condition::all()
                .add(beam::Column::StartDate.lte(start))
                .add(beam::Column::EndDate.gte(end)),
        )
        .add(
            Condition::all()
                .add(beam::Column::StartDate.lte(start))
                .add(beam::Column::Status.eq(BeamStatus::Active)),
        )
}

impl ReportService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn beam_report(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<BeamReportRow>, ServiceError> {
        ensure_window(Some(start), Some(end))?;
        let db = &*self.db;

        let beams = beam::Entity::find()
            .filter(overlaps(start, end))
            .order_by_desc(beam::Column::StartDate)
            .order_by_asc(beam::Column::BeamNumber)
            .all(db)
            .await?;
        let sums = sums_by_beam(db, beams.iter().map(|b| b.id).collect()).await?;
        let lookups = Lookups::load(db).await?;

        Ok(beams
            .into_iter()
            .map(|b| {
                let t = BeamTotals::compute(&b, &sums.get(&b.id).copied().unwrap_or_default());
                BeamReportRow {
                    workshop: lookups.workshop_name(b.workshop_id),
                    customer: lookups.customer_name(b.customer_id),
                    machine_number: lookups.machine_number(b.machine_id),
                    beam_number: b.beam_number,
                    fabric_type: b.fabric_type,
                    total_beam_meters: b.total_beam_meters,
                    meters_per_piece: b.meters_per_piece,
                    start_date: b.start_date,
                    end_date: b.end_date,
                    status: b.status,
                    total_good: t.total_good,
                    total_damaged: t.total_damaged,
                    total_pieces: t.total_pieces,
                    total_meters_used: t.total_meters_used,
                    remaining_meters: t.remaining_meters,
                    total_amount: t.total_amount,
                }
            })
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn delivery_report(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        workshop_id: Option<Uuid>,
    ) -> Result<Vec<DeliveryReportRow>, ServiceError> {
        ensure_window(Some(start), Some(end))?;
        let db = &*self.db;

        let deliveries = delivery::Entity::find()
            .filter(delivery::Column::DeliveryDate.gte(start))
            .filter(delivery::Column::DeliveryDate.lte(end))
            .order_by_desc(delivery::Column::DeliveryDate)
            .order_by_desc(delivery::Column::CreatedAt)
            .all(db)
            .await?;

        let beam_ids: Vec<Uuid> = deliveries.iter().map(|d| d.beam_id).collect();
        let beams: HashMap<Uuid, beam::Model> = beam::Entity::find()
            .filter(beam::Column::Id.is_in(beam_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|b| (b.id, b))
            .collect();
        let lookups = Lookups::load(db).await?;

        Ok(deliveries
            .into_iter()
            .filter_map(|d| {
                let b = beams.get(&d.beam_id)?;
                if workshop_id.is_some_and(|w| w != b.workshop_id) {
                    return None;
                }
                Some(DeliveryReportRow {
                    id: d.id,
                    delivery_date: d.delivery_date,
                    design_name: d.design_name,
                    price_per_piece: d.price_per_piece,
                    good_pieces: d.good_pieces,
                    damaged_pieces: d.damaged_pieces,
                    meters_used: d.meters_used,
                    total_amount: d.total_amount,
                    notes: d.notes,
                    beam_number: b.beam_number.clone(),
                    fabric_type: b.fabric_type,
                    workshop: lookups.workshop_name(b.workshop_id),
                    customer: lookups.customer_name(b.customer_id),
                    machine_number: lookups.machine_number(b.machine_id),
                })
            })
            .collect())
    }
}
