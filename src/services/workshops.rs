use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use super::beams::sums_by_beam;
use super::commit;
use crate::dto::catalog::{CreateWorkshopRequest, MachineOccupancy, WorkshopSummary};
use crate::entities::{beam, customer, machine, workshop, BeamStatus};
use crate::errors::ServiceError;

#[derive(Clone)]
pub struct WorkshopService {
    db: Arc<DatabaseConnection>,
}

impl WorkshopService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Active workshops with the number of machines actually registered.
    #[instrument(skip(self))]
    pub async fn list_workshops(&self) -> Result<Vec<WorkshopSummary>, ServiceError> {
        let db = &*self.db;
        let workshops = workshop::Entity::find()
            .filter(workshop::Column::IsActive.eq(true))
            .order_by_asc(workshop::Column::Name)
            .all(db)
            .await?;

        let mut counts: HashMap<Uuid, i64> = HashMap::new();
        for m in machine::Entity::find().all(db).await? {
            *counts.entry(m.workshop_id).or_default() += 1;
        }

        Ok(workshops
            .into_iter()
            .map(|w| WorkshopSummary {
                actual_machine_count: counts.get(&w.id).copied().unwrap_or(0),
                id: w.id,
                name: w.name,
                location: w.location,
                machine_count: w.machine_count,
                workshop_type: w.workshop_type,
                is_active: w.is_active,
            })
            .collect())
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_workshop(
        &self,
        request: CreateWorkshopRequest,
    ) -> Result<workshop::Model, ServiceError> {
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::ValidationError("name must not be blank".to_string()));
        }

        let db = &*self.db;
        let duplicate = workshop::Entity::find()
            .filter(workshop::Column::Name.eq(name.as_str()))
            .one(db)
            .await?;
        if duplicate.is_some() {
            return Err(ServiceError::DuplicateName(format!(
                "Workshop '{}' already exists",
                name
            )));
        }

        let now = Utc::now();
        let created = workshop::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.clone()),
            location: Set(request.location.trim().to_string()),
            machine_count: Set(request.machine_count),
            workshop_type: Set(request.workshop_type),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
        .map_err(|err| {
            if ServiceError::is_unique_violation(&err) {
                ServiceError::DuplicateName(format!("Workshop '{}' already exists", name))
            } else {
                ServiceError::db_error(err)
            }
        })?;

        info!(workshop_id = %created.id, "workshop created");
        Ok(created)
    }

    /// Deletes a workshop and its machines. Refused while any beam refers to it.
    #[instrument(skip(self))]
    pub async fn delete_workshop(&self, id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await.map_err(ServiceError::db_error)?;

        let existing = workshop::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Workshop {} not found", id)))?;

        let beams = beam::Entity::find()
            .filter(beam::Column::WorkshopId.eq(id))
            .count(&txn)
            .await?;
        if beams > 0 {
            return Err(ServiceError::Referenced(format!(
                "Workshop '{}' has {} beam(s); delete them first",
                existing.name, beams
            )));
        }

        let machines = machine::Entity::delete_many()
            .filter(machine::Column::WorkshopId.eq(id))
            .exec(&txn)
            .await?;
        workshop::Entity::delete_by_id(id).exec(&txn).await?;
        commit(txn).await?;

        info!(
            workshop = %existing.name,
            machines_removed = machines.rows_affected,
            "workshop deleted"
        );
        Ok(())
    }

    /// Active machines of a workshop joined with their active beam, if any.
    #[instrument(skip(self))]
    pub async fn machine_occupancy(&self, id: Uuid) -> Result<Vec<MachineOccupancy>, ServiceError> {
        let db = &*self.db;
        workshop::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Workshop {} not found", id)))?;

        let machines = machine::Entity::find()
            .filter(machine::Column::WorkshopId.eq(id))
            .filter(machine::Column::IsActive.eq(true))
            .order_by_asc(machine::Column::MachineNumber)
            .all(db)
            .await?;

        let machine_ids: Vec<Uuid> = machines.iter().map(|m| m.id).collect();
        let active_beams: HashMap<Uuid, beam::Model> = beam::Entity::find()
            .filter(beam::Column::MachineId.is_in(machine_ids))
            .filter(beam::Column::Status.eq(BeamStatus::Active))
            .all(db)
            .await?
            .into_iter()
            .map(|b| (b.machine_id, b))
            .collect();

        let sums = sums_by_beam(db, active_beams.values().map(|b| b.id).collect()).await?;
        let customers: HashMap<Uuid, String> = customer::Entity::find()
            .all(db)
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();

        Ok(machines
            .into_iter()
            .map(|m| {
                let current = active_beams.get(&m.id);
                let s = current
                    .and_then(|b| sums.get(&b.id).copied())
                    .unwrap_or_default();
                MachineOccupancy {
                    machine_id: m.id,
                    machine_number: m.machine_number,
                    fabric_type: current.map(|b| b.fabric_type).unwrap_or(m.fabric_type),
                    is_active: m.is_active,
                    beam_id: current.map(|b| b.id),
                    beam_number: current.map(|b| b.beam_number.clone()),
                    customer_name: current.and_then(|b| customers.get(&b.customer_id).cloned()),
                    total_beam_meters: current.map(|b| b.total_beam_meters),
                    meters_per_piece: current.map(|b| b.meters_per_piece),
                    total_good: s.good,
                    total_damaged: s.damaged,
                    total_production: s.pieces(),
                    meters_used: s.meters_used,
                    remaining_meters: current.map(|b| b.total_beam_meters - s.meters_used),
                    damage_rate_by_meters: s.damage_rate_by_meters(),
                }
            })
            .collect())
    }
}
