use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use super::commit;
use crate::dto::catalog::{CreateCustomerRequest, CustomerStatus};
use crate::entities::{beam, customer};
use crate::errors::ServiceError;

#[derive(Clone)]
pub struct CustomerService {
    db: Arc<DatabaseConnection>,
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl CustomerService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn list_customers(
        &self,
        include_inactive: bool,
    ) -> Result<Vec<customer::Model>, ServiceError> {
        let mut query = customer::Entity::find();
        if !include_inactive {
            query = query.filter(customer::Column::IsActive.eq(true));
        }
        Ok(query
            .order_by_asc(customer::Column::Name)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<customer::Model, ServiceError> {
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::ValidationError("name must not be blank".to_string()));
        }

        let db = &*self.db;
        let duplicate = customer::Entity::find()
            .filter(customer::Column::Name.eq(name.as_str()))
            .one(db)
            .await?;
        if duplicate.is_some() {
            return Err(ServiceError::DuplicateName(format!(
                "Customer '{}' already exists",
                name
            )));
        }

        let now = Utc::now();
        let created = customer::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.clone()),
            contact_person: Set(blank_to_none(request.contact_person)),
            phone: Set(blank_to_none(request.phone)),
            email: Set(blank_to_none(request.email)),
            address: Set(blank_to_none(request.address)),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
        .map_err(|err| {
            if ServiceError::is_unique_violation(&err) {
                ServiceError::DuplicateName(format!("Customer '{}' already exists", name))
            } else {
                ServiceError::db_error(err)
            }
        })?;

        info!(customer_id = %created.id, "customer created");
        Ok(created)
    }

    /// Activates or deactivates a customer. Beams keep their reference either way.
    #[instrument(skip(self))]
    pub async fn set_status(
        &self,
        id: Uuid,
        status: CustomerStatus,
    ) -> Result<customer::Model, ServiceError> {
        let db = &*self.db;
        let existing = customer::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Customer {} not found", id)))?;

        let mut active: customer::ActiveModel = existing.into();
        active.is_active = Set(status == CustomerStatus::Active);
        active.updated_at = Set(Utc::now());
        let updated = active.update(db).await?;

        info!(customer = %updated.name, is_active = updated.is_active, "customer status changed");
        Ok(updated)
    }

    /// Hard-deletes a customer that no beam refers to.
    #[instrument(skip(self))]
    pub async fn delete_customer(&self, id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await.map_err(ServiceError::db_error)?;

        let existing = customer::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Customer {} not found", id)))?;

        let beams = beam::Entity::find()
            .filter(beam::Column::CustomerId.eq(id))
            .count(&txn)
            .await?;
        if beams > 0 {
            return Err(ServiceError::Referenced(format!(
                "Customer '{}' has {} beam(s); deactivate the customer instead",
                existing.name, beams
            )));
        }

        customer::Entity::delete_by_id(id).exec(&txn).await?;
        commit(txn).await?;

        info!(customer = %existing.name, "customer deleted");
        Ok(())
    }
}
