use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use super::beam_metrics;
use crate::dto::catalog::CreateDesignPresetRequest;
use crate::entities::design_preset;
use crate::errors::ServiceError;

/// Reusable (label, price) shortcuts for delivery entry.
#[derive(Clone)]
pub struct DesignPresetService {
    db: Arc<DatabaseConnection>,
}

impl DesignPresetService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn list_presets(&self) -> Result<Vec<design_preset::Model>, ServiceError> {
        Ok(design_preset::Entity::find()
            .filter(design_preset::Column::IsActive.eq(true))
            .order_by_asc(design_preset::Column::Price)
            .order_by_asc(design_preset::Column::Label)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn create_preset(
        &self,
        request: CreateDesignPresetRequest,
    ) -> Result<design_preset::Model, ServiceError> {
        let label = request.label.trim().to_string();
        if label.is_empty() {
            return Err(ServiceError::ValidationError("label must not be blank".to_string()));
        }
        if request.price < Decimal::ZERO {
            return Err(ServiceError::InvalidQuantity(
                "price must not be negative".to_string(),
            ));
        }
        let price = beam_metrics::PRICE.check("price", request.price)?;

        let created = design_preset::ActiveModel {
            id: Set(Uuid::new_v4()),
            label: Set(label),
            price: Set(price),
            is_active: Set(true),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db)
        .await?;

        info!(preset_id = %created.id, "design preset created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn delete_preset(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = design_preset::Entity::delete_by_id(id)
            .exec(&*self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Design preset {} not found",
                id
            )));
        }
        Ok(())
    }
}
