use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::commit;
use crate::auth::{hash_password, verify_password};
use crate::entities::{admin_user, beam, customer, delivery, design_preset, machine, workshop};
use crate::errors::ServiceError;

pub const MIN_PASSWORD_LEN: usize = 6;

/// Account maintenance and the destructive database reset.
#[derive(Clone)]
pub struct AdminService {
    db: Arc<DatabaseConnection>,
}

impl AdminService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Replaces the password of `username`.
    #[instrument(skip(self, new_password))]
    pub async fn reset_password(&self, username: &str, new_password: &str) -> Result<(), ServiceError> {
        if new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ServiceError::ValidationError(format!(
                "new_password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let db = &*self.db;
        let user = admin_user::Entity::find()
            .filter(admin_user::Column::Username.eq(username))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Admin user '{}' not found", username)))?;

        let mut active: admin_user::ActiveModel = user.into();
        active.password_hash = Set(hash_password(new_password)?);
        active.reset_token = Set(None);
        active.reset_token_expires = Set(None);
        active.updated_at = Set(Utc::now());
        active.update(db).await?;

        info!("admin password reset");
        Ok(())
    }

    /// Wipes every ledger and catalogue table, keeping admin accounts.
    ///
    /// The calling admin must re-enter their password.
    #[instrument(skip(self, admin_password))]
    pub async fn reset_database(
        &self,
        caller: &str,
        admin_password: &str,
    ) -> Result<BTreeMap<String, u64>, ServiceError> {
        let db = &*self.db;
        let user = admin_user::Entity::find()
            .filter(admin_user::Column::Username.eq(caller))
            .one(db)
            .await?;

        let verified = match &user {
            Some(u) => verify_password(admin_password, &u.password_hash)?,
            None => false,
        };
        if !verified {
            warn!("database reset refused: password check failed");
            return Err(ServiceError::Unauthorized("Invalid admin password".to_string()));
        }

        let txn = db.begin().await.map_err(ServiceError::db_error)?;
        let mut deleted = BTreeMap::new();

        deleted.insert(
            "deliveries".to_string(),
            delivery::Entity::delete_many().exec(&txn).await?.rows_affected,
        );
        deleted.insert(
            "beams".to_string(),
            beam::Entity::delete_many().exec(&txn).await?.rows_affected,
        );
        deleted.insert(
            "design_presets".to_string(),
            design_preset::Entity::delete_many().exec(&txn).await?.rows_affected,
        );
        deleted.insert(
            "machines".to_string(),
            machine::Entity::delete_many().exec(&txn).await?.rows_affected,
        );
        deleted.insert(
            "workshops".to_string(),
            workshop::Entity::delete_many().exec(&txn).await?.rows_affected,
        );
        deleted.insert(
            "customers".to_string(),
            customer::Entity::delete_many().exec(&txn).await?.rows_affected,
        );

        commit(txn).await?;

        warn!(?deleted, "database reset");
        Ok(deleted)
    }
}
