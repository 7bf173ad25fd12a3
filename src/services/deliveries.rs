use chrono::Utc;
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseBackend, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::beam_metrics::{self, DeliverySums};
use super::commit;
use crate::dto::deliveries::{DeliveryListQuery, RecordDeliveryRequest};
use crate::dto::ensure_window;
use crate::entities::{beam, delivery, BeamStatus};
use crate::errors::ServiceError;

/// Records deliveries against active beams and enforces beam capacity.
#[derive(Clone)]
pub struct DeliveryService {
    db: Arc<DatabaseConnection>,
    auto_complete: bool,
}

impl DeliveryService {
    pub fn new(db: Arc<DatabaseConnection>, auto_complete: bool) -> Self {
        Self { db, auto_complete }
    }

    /// Records a delivery.
    ///
    /// `meters_used` and `total_amount` are always derived from the counts,
    /// the price and the beam's `meters_per_piece`. The capacity check and the
    /// insert share one transaction; on PostgreSQL the beam row is locked.
    #[instrument(skip(self, request), fields(beam_id = %request.beam_id))]
    pub async fn record_delivery(
        &self,
        request: RecordDeliveryRequest,
    ) -> Result<delivery::Model, ServiceError> {
        if request.meters_used.is_some() || request.total_amount.is_some() {
            warn!("ignoring client-supplied meters_used/total_amount; values are recomputed");
        }
        if request.good_pieces < 0 || request.damaged_pieces < 0 {
            return Err(ServiceError::InvalidQuantity(
                "good_pieces and damaged_pieces must not be negative".to_string(),
            ));
        }
        if request.price_per_piece < Decimal::ZERO {
            return Err(ServiceError::InvalidQuantity(
                "price_per_piece must not be negative".to_string(),
            ));
        }
        let price_per_piece =
            beam_metrics::PRICE.check("price_per_piece", request.price_per_piece)?;
        let total_amount = beam_metrics::total_amount(request.good_pieces, price_per_piece)
            .ok_or_else(|| ServiceError::InvalidQuantity("total_amount overflows".to_string()))
            .and_then(|amount| beam_metrics::AMOUNT.check("total_amount", amount))?;
        let design_name = request.design_name.trim().to_string();
        if design_name.is_empty() {
            return Err(ServiceError::ValidationError(
                "design_name must not be blank".to_string(),
            ));
        }

        let txn = self.db.begin().await.map_err(ServiceError::db_error)?;

        let mut query = beam::Entity::find_by_id(request.beam_id);
        if txn.get_database_backend() == DatabaseBackend::Postgres {
            query = query.lock_exclusive();
        }
        let target = query
            .one(&txn)
            .await?
            .ok_or(ServiceError::BeamNotFound(request.beam_id))?;

        if !target.is_active() {
            return Err(ServiceError::BeamNotActive(target.beam_number));
        }

        let existing = delivery::Entity::find()
            .filter(delivery::Column::BeamId.eq(target.id))
            .all(&txn)
            .await?;
        let used: DeliverySums = existing.iter().collect();

        let meters_used = beam_metrics::meters_used(
            request.good_pieces,
            request.damaged_pieces,
            target.meters_per_piece,
        )
        .ok_or_else(|| ServiceError::InvalidQuantity("meters_used overflows".to_string()))?;
        let left_after = match beam_metrics::check_capacity(
            target.total_beam_meters,
            used.meters_used,
            meters_used,
        ) {
            Ok(left) => left,
            Err(remaining) => {
                counter!("powerloom.deliveries.rejected_capacity", 1);
                warn!(
                    beam_number = %target.beam_number,
                    requested = %meters_used,
                    remaining = %remaining,
                    "delivery exceeds beam capacity"
                );
                return Err(ServiceError::CapacityExceeded {
                    beam_number: target.beam_number,
                    requested: meters_used,
                    remaining,
                });
            }
        };

        let now = Utc::now();
        let created = delivery::ActiveModel {
            id: Set(Uuid::new_v4()),
            beam_id: Set(target.id),
            delivery_date: Set(request.delivery_date),
            design_name: Set(design_name),
            price_per_piece: Set(price_per_piece),
            good_pieces: Set(request.good_pieces),
            damaged_pieces: Set(request.damaged_pieces),
            meters_used: Set(meters_used),
            total_amount: Set(total_amount),
            notes: Set(request.notes.filter(|n| !n.trim().is_empty())),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        if self.auto_complete && left_after.is_zero() {
            let beam_number = target.beam_number.clone();
            let mut active: beam::ActiveModel = target.into();
            active.status = Set(BeamStatus::Completed);
            active.end_date = Set(Some(now.date_naive()));
            active.updated_at = Set(now);
            active.update(&txn).await?;
            counter!("powerloom.beams.ended", 1);
            info!(%beam_number, "beam fully consumed; marked completed");
        }

        commit(txn).await?;

        counter!("powerloom.deliveries.recorded", 1);
        info!(delivery_id = %created.id, meters_used = %created.meters_used, "delivery recorded");
        Ok(created)
    }

    /// Removes a mistaken delivery from a beam that is still active.
    #[instrument(skip(self))]
    pub async fn delete_delivery(&self, id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await.map_err(ServiceError::db_error)?;

        let existing = delivery::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Delivery {} not found", id)))?;

        let parent = beam::Entity::find_by_id(existing.beam_id)
            .one(&txn)
            .await?
            .ok_or(ServiceError::BeamNotFound(existing.beam_id))?;
        if !parent.is_active() {
            return Err(ServiceError::BeamNotActive(parent.beam_number));
        }

        delivery::Entity::delete_by_id(id).exec(&txn).await?;
        commit(txn).await?;

        info!(beam_number = %parent.beam_number, "delivery deleted");
        Ok(())
    }

    /// Deliveries filtered by beam and date window, newest first.
    #[instrument(skip(self))]
    pub async fn list_deliveries(
        &self,
        query: DeliveryListQuery,
    ) -> Result<Vec<delivery::Model>, ServiceError> {
        ensure_window(query.start_date, query.end_date)?;

        let mut select = delivery::Entity::find();
        if let Some(beam_id) = query.beam_id {
            select = select.filter(delivery::Column::BeamId.eq(beam_id));
        }
        if let Some(start) = query.start_date {
            select = select.filter(delivery::Column::DeliveryDate.gte(start));
        }
        if let Some(end) = query.end_date {
            select = select.filter(delivery::Column::DeliveryDate.lte(end));
        }

        Ok(select
            .order_by_desc(delivery::Column::DeliveryDate)
            .order_by_desc(delivery::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }
}
