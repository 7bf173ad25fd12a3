use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set, TransactionTrait,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use super::commit;
use crate::dto::catalog::{CreateMachineRequest, MachineListing};
use crate::entities::{beam, machine, workshop};
use crate::errors::ServiceError;

#[derive(Clone)]
pub struct MachineService {
    db: Arc<DatabaseConnection>,
}

impl MachineService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Registers a machine. Its fabric must suit the workshop type and its
    /// number must be free within the workshop.
    #[instrument(skip(self))]
    pub async fn create_machine(
        &self,
        request: CreateMachineRequest,
    ) -> Result<machine::Model, ServiceError> {
        let db = &*self.db;
        let owner = workshop::Entity::find_by_id(request.workshop_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Workshop {} not found", request.workshop_id))
            })?;

        if !owner.workshop_type.accepts(request.fabric_type) {
            return Err(ServiceError::ValidationError(format!(
                "A {} workshop cannot hold a {} machine",
                owner.workshop_type, request.fabric_type
            )));
        }

        let taken = machine::Entity::find()
            .filter(machine::Column::WorkshopId.eq(owner.id))
            .filter(machine::Column::MachineNumber.eq(request.machine_number))
            .one(db)
            .await?;
        if taken.is_some() {
            return Err(duplicate_number(&owner, request.machine_number));
        }

        let now = Utc::now();
        let created = machine::ActiveModel {
            id: Set(Uuid::new_v4()),
            workshop_id: Set(owner.id),
            machine_number: Set(request.machine_number),
            fabric_type: Set(request.fabric_type),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
        .map_err(|err| {
            if ServiceError::is_unique_violation(&err) {
                duplicate_number(&owner, request.machine_number)
            } else {
                ServiceError::db_error(err)
            }
        })?;

        info!(workshop = %owner.name, machine_number = created.machine_number, "machine created");
        Ok(created)
    }

    /// Deletes a machine that no beam, active or completed, refers to.
    #[instrument(skip(self))]
    pub async fn delete_machine(&self, id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await.map_err(ServiceError::db_error)?;

        let existing = machine::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Machine {} not found", id)))?;

        let beams = beam::Entity::find()
            .filter(beam::Column::MachineId.eq(id))
            .count(&txn)
            .await?;
        if beams > 0 {
            return Err(ServiceError::Referenced(format!(
                "Machine {} has {} beam(s); delete them first",
                existing.machine_number, beams
            )));
        }

        machine::Entity::delete_by_id(id).exec(&txn).await?;
        commit(txn).await?;

        info!(machine_number = existing.machine_number, "machine deleted");
        Ok(())
    }

    /// Every active machine with its workshop name, ordered by workshop then number.
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<MachineListing>, ServiceError> {
        let db = &*self.db;
        let names: HashMap<Uuid, String> = workshop::Entity::find()
            .all(db)
            .await?
            .into_iter()
            .map(|w| (w.id, w.name))
            .collect();

        let mut listing: Vec<MachineListing> = machine::Entity::find()
            .filter(machine::Column::IsActive.eq(true))
            .all(db)
            .await?
            .into_iter()
            .map(|m| MachineListing {
                id: m.id,
                workshop_id: m.workshop_id,
                workshop_name: names
                    .get(&m.workshop_id)
                    .cloned()
                    .unwrap_or_else(|| "N/A".to_string()),
                machine_number: m.machine_number,
                fabric_type: m.fabric_type,
                is_active: m.is_active,
            })
            .collect();

        listing.sort_by(|a, b| {
            a.workshop_name
                .cmp(&b.workshop_name)
                .then(a.machine_number.cmp(&b.machine_number))
        });
        Ok(listing)
    }
}

fn duplicate_number(owner: &workshop::Model, machine_number: i32) -> ServiceError {
    ServiceError::DuplicateName(format!(
        "Machine number {} already exists in workshop '{}'",
        machine_number, owner.name
    ))
}
