use chrono::Utc;
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::beam_metrics::{self, BeamTotals, DeliverySums};
use super::{commit, Lookups};
use crate::dto::beams::{BeamDetail, BeamSummary, CreateBeamRequest};
use crate::entities::{beam, customer, delivery, machine, workshop, BeamStatus};
use crate::errors::ServiceError;

/// Beam lifecycle: start, end, delete and the list/detail views.
#[derive(Clone)]
pub struct BeamService {
    db: Arc<DatabaseConnection>,
}

impl BeamService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Loads a new beam onto a machine.
    ///
    /// The machine must be free and the beam number unused. Both are checked
    /// inside the insert transaction, and the unique indexes catch any race.
    #[instrument(skip(self, request), fields(beam_number = %request.beam_number))]
    pub async fn start_beam(&self, request: CreateBeamRequest) -> Result<BeamSummary, ServiceError> {
        let beam_number = request.beam_number.trim().to_string();
        if beam_number.is_empty() {
            return Err(ServiceError::ValidationError(
                "beam_number must not be blank".to_string(),
            ));
        }
        if request.total_beam_meters <= Decimal::ZERO {
            return Err(ServiceError::InvalidQuantity(
                "total_beam_meters must be greater than zero".to_string(),
            ));
        }
        if request.meters_per_piece <= Decimal::ZERO {
            return Err(ServiceError::InvalidQuantity(
                "meters_per_piece must be greater than zero".to_string(),
            ));
        }
        let total_beam_meters =
            beam_metrics::BEAM_METERS.check("total_beam_meters", request.total_beam_meters)?;
        let meters_per_piece =
            beam_metrics::METERS_PER_PIECE.check("meters_per_piece", request.meters_per_piece)?;

        let txn = self.db.begin().await.map_err(ServiceError::db_error)?;

        let machine = machine::Entity::find_by_id(request.machine_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Machine {} not found", request.machine_id))
            })?;

        if let Some(workshop_id) = request.workshop_id {
            if workshop_id != machine.workshop_id {
                return Err(ServiceError::ValidationError(format!(
                    "Machine {} does not belong to workshop {}",
                    machine.machine_number, workshop_id
                )));
            }
        }
        if let Some(fabric) = request.fabric_type {
            if fabric != machine.fabric_type {
                return Err(ServiceError::ValidationError(format!(
                    "Machine {} weaves {}, not {}",
                    machine.machine_number, machine.fabric_type, fabric
                )));
            }
        }

        let workshop = workshop::Entity::find_by_id(machine.workshop_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Workshop {} not found", machine.workshop_id))
            })?;

        let customer = customer::Entity::find_by_id(request.customer_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Customer {} not found", request.customer_id))
            })?;

        if beam_number_taken(&txn, &beam_number).await? {
            return Err(ServiceError::DuplicateBeamNumber(beam_number));
        }

        if let Some(active) = active_beam_on(&txn, machine.id).await? {
            return Err(ServiceError::MachineOccupied {
                machine_number: machine.machine_number,
                beam_number: active.beam_number,
            });
        }

        let now = Utc::now();
        let new_beam = beam::ActiveModel {
            id: Set(Uuid::new_v4()),
            beam_number: Set(beam_number.clone()),
            machine_id: Set(machine.id),
            workshop_id: Set(machine.workshop_id),
            customer_id: Set(customer.id),
            fabric_type: Set(machine.fabric_type),
            total_beam_meters: Set(total_beam_meters),
            meters_per_piece: Set(meters_per_piece),
            start_date: Set(request.start_date.unwrap_or_else(|| now.date_naive())),
            end_date: Set(None),
            status: Set(BeamStatus::Active),
            notes: Set(request.notes.filter(|n| !n.trim().is_empty())),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = match new_beam.insert(&txn).await {
            Ok(model) => model,
            Err(err) if ServiceError::is_unique_violation(&err) => {
                drop(txn);
                return Err(self.classify_conflict(&beam_number, &machine).await);
            }
            Err(err) => return Err(ServiceError::db_error(err)),
        };

        commit(txn).await?;

        counter!("powerloom.beams.started", 1);
        info!(beam_id = %created.id, machine = machine.machine_number, "beam started");

        let totals = BeamTotals::compute(&created, &DeliverySums::default());
        Ok(BeamSummary::new(
            created,
            workshop.name,
            customer.name,
            machine.machine_number,
            &totals,
        ))
    }

    /// Works out which unique index a concurrent insert tripped over.
    async fn classify_conflict(&self, beam_number: &str, machine: &machine::Model) -> ServiceError {
        let db = &*self.db;
        match beam_number_taken(db, beam_number).await {
            Ok(true) => return ServiceError::DuplicateBeamNumber(beam_number.to_string()),
            Ok(false) => {}
            Err(err) => return err,
        }
        match active_beam_on(db, machine.id).await {
            Ok(Some(active)) => ServiceError::MachineOccupied {
                machine_number: machine.machine_number,
                beam_number: active.beam_number,
            },
            Ok(None) => ServiceError::DuplicateBeamNumber(beam_number.to_string()),
            Err(err) => err,
        }
    }

    /// Closes an active beam with today's server date.
    #[instrument(skip(self))]
    pub async fn end_beam(&self, id: Uuid) -> Result<BeamSummary, ServiceError> {
        let txn = self.db.begin().await.map_err(ServiceError::db_error)?;

        let existing = beam::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(ServiceError::BeamNotFound(id))?;

        if !existing.is_active() {
            return Err(ServiceError::AlreadyCompleted(existing.beam_number));
        }

        let now = Utc::now();
        let mut active: beam::ActiveModel = existing.into();
        active.status = Set(BeamStatus::Completed);
        active.end_date = Set(Some(now.date_naive()));
        active.updated_at = Set(now);
        let updated = active.update(&txn).await?;

        let summary = summarize(&txn, updated).await?;
        commit(txn).await?;

        counter!("powerloom.beams.ended", 1);
        info!(beam_number = %summary.beam_number, "beam completed");
        Ok(summary)
    }

    /// Deletes a beam together with its deliveries.
    #[instrument(skip(self))]
    pub async fn delete_beam(&self, id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await.map_err(ServiceError::db_error)?;

        let existing = beam::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(ServiceError::BeamNotFound(id))?;

        let removed = delivery::Entity::delete_many()
            .filter(delivery::Column::BeamId.eq(id))
            .exec(&txn)
            .await?;
        beam::Entity::delete_by_id(id).exec(&txn).await?;

        commit(txn).await?;

        counter!("powerloom.beams.deleted", 1);
        info!(
            beam_number = %existing.beam_number,
            deliveries_removed = removed.rows_affected,
            "beam deleted"
        );
        Ok(())
    }

    /// Beams with the given status (active when absent), newest start first.
    #[instrument(skip(self))]
    pub async fn list_beams(&self, status: Option<BeamStatus>) -> Result<Vec<BeamSummary>, ServiceError> {
        let db = &*self.db;
        let status = status.unwrap_or(BeamStatus::Active);

        let beams = beam::Entity::find()
            .filter(beam::Column::Status.eq(status))
            .order_by_desc(beam::Column::StartDate)
            .order_by_desc(beam::Column::CreatedAt)
            .all(db)
            .await?;

        if beams.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = beams.iter().map(|b| b.id).collect();
        let sums = sums_by_beam(db, ids).await?;
        let lookups = Lookups::load(db).await?;

        Ok(beams
            .into_iter()
            .map(|b| {
                let totals = BeamTotals::compute(&b, &sums.get(&b.id).copied().unwrap_or_default());
                let workshop_name = lookups.workshop_name(b.workshop_id);
                let customer_name = lookups.customer_name(b.customer_id);
                let machine_number = lookups.machine_number(b.machine_id);
                BeamSummary::new(b, workshop_name, customer_name, machine_number, &totals)
            })
            .collect())
    }

    /// One beam with its deliveries (newest first) and derived totals.
    #[instrument(skip(self))]
    pub async fn get_beam(&self, id: Uuid) -> Result<BeamDetail, ServiceError> {
        let db = &*self.db;
        let found = beam::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or(ServiceError::BeamNotFound(id))?;

        let deliveries = delivery::Entity::find()
            .filter(delivery::Column::BeamId.eq(id))
            .order_by_desc(delivery::Column::DeliveryDate)
            .order_by_desc(delivery::Column::CreatedAt)
            .all(db)
            .await?;

        let totals = BeamTotals::for_deliveries(&found, &deliveries);
        let (workshop_name, customer_name, machine_number) = names_for(db, &found).await?;

        Ok(BeamDetail {
            beam: BeamSummary::new(found, workshop_name, customer_name, machine_number, &totals),
            deliveries,
            totals,
        })
    }
}

async fn beam_number_taken<C: ConnectionTrait>(db: &C, beam_number: &str) -> Result<bool, ServiceError> {
    Ok(beam::Entity::find()
        .filter(beam::Column::BeamNumber.eq(beam_number))
        .one(db)
        .await?
        .is_some())
}

async fn active_beam_on<C: ConnectionTrait>(
    db: &C,
    machine_id: Uuid,
) -> Result<Option<beam::Model>, ServiceError> {
    let found = beam::Entity::find()
        .filter(beam::Column::MachineId.eq(machine_id))
        .filter(beam::Column::Status.eq(BeamStatus::Active))
        .all(db)
        .await?;
    if found.len() > 1 {
        warn!(%machine_id, count = found.len(), "machine has more than one active beam");
    }
    Ok(found.into_iter().next())
}

/// Delivery sums keyed by beam id.
pub(crate) async fn sums_by_beam<C: ConnectionTrait>(
    db: &C,
    beam_ids: Vec<Uuid>,
) -> Result<HashMap<Uuid, DeliverySums>, ServiceError> {
    let rows = delivery::Entity::find()
        .filter(delivery::Column::BeamId.is_in(beam_ids))
        .all(db)
        .await?;

    let mut sums: HashMap<Uuid, DeliverySums> = HashMap::new();
    for row in &rows {
        sums.entry(row.beam_id).or_default().add(row);
    }
    Ok(sums)
}

async fn names_for<C: ConnectionTrait>(
    db: &C,
    b: &beam::Model,
) -> Result<(String, String, i32), ServiceError> {
    let workshop_name = workshop::Entity::find_by_id(b.workshop_id)
        .one(db)
        .await?
        .map(|w| w.name)
        .unwrap_or_else(|| "N/A".to_string());
    let customer_name = customer::Entity::find_by_id(b.customer_id)
        .one(db)
        .await?
        .map(|c| c.name)
        .unwrap_or_else(|| "N/A".to_string());
    let machine_number = machine::Entity::find_by_id(b.machine_id)
        .one(db)
        .await?
        .map(|m| m.machine_number)
        .unwrap_or(0);
    Ok((workshop_name, customer_name, machine_number))
}

async fn summarize<C: ConnectionTrait>(db: &C, b: beam::Model) -> Result<BeamSummary, ServiceError> {
    let deliveries = delivery::Entity::find()
        .filter(delivery::Column::BeamId.eq(b.id))
        .all(db)
        .await?;
    let totals = BeamTotals::for_deliveries(&b, &deliveries);
    let (workshop_name, customer_name, machine_number) = names_for(db, &b).await?;
    Ok(BeamSummary::new(b, workshop_name, customer_name, machine_number, &totals))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{establish_connection_with_config, run_migrations, DbConfig};
    use crate::services::seed::seed_defaults;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    async fn seeded() -> (BeamService, Vec<machine::Model>, customer::Model) {
        let db = establish_connection_with_config(&DbConfig {
            url: "sqlite::memory:".into(),
            max_connections: 1,
            ..Default::default()
        })
        .await
        .unwrap();
        run_migrations(&db).await.unwrap();
        seed_defaults(&db, false).await.unwrap();

        let machines = machine::Entity::find()
            .order_by_asc(machine::Column::MachineNumber)
            .all(&db)
            .await
            .unwrap();
        let customer = customer::Entity::find().one(&db).await.unwrap().unwrap();
        (BeamService::new(Arc::new(db)), machines, customer)
    }

    fn request(
        beam_number: &str,
        machine: &machine::Model,
        customer: &customer::Model,
    ) -> CreateBeamRequest {
        CreateBeamRequest {
            beam_number: beam_number.into(),
            machine_id: machine.id,
            workshop_id: None,
            customer_id: customer.id,
            fabric_type: None,
            total_beam_meters: dec!(1000),
            meters_per_piece: dec!(4),
            start_date: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn index_conflicts_are_reported_as_ledger_errors() {
        let (svc, machines, customer) = seeded().await;
        let busy = &machines[0];
        let free = &machines[1];
        svc.start_beam(request("WB001", busy, &customer)).await.unwrap();

        assert_matches!(
            svc.classify_conflict("WB001", free).await,
            ServiceError::DuplicateBeamNumber(n) if n == "WB001"
        );
        assert_matches!(
            svc.classify_conflict("WB002", busy).await,
            ServiceError::MachineOccupied { beam_number, .. } if beam_number == "WB001"
        );
    }

    #[tokio::test]
    async fn quantities_beyond_column_range_are_rejected() {
        let (svc, machines, customer) = seeded().await;

        let mut oversized = request("WB001", &machines[0], &customer);
        oversized.total_beam_meters = Decimal::from_scientific("7e28").unwrap();
        oversized.meters_per_piece = Decimal::from_scientific("3e28").unwrap();
        assert_matches!(
            svc.start_beam(oversized).await,
            Err(ServiceError::InvalidQuantity(_))
        );

        let mut too_precise = request("WB001", &machines[0], &customer);
        too_precise.meters_per_piece = dec!(4.0005);
        assert_matches!(
            svc.start_beam(too_precise).await,
            Err(ServiceError::InvalidQuantity(_))
        );
    }
}
