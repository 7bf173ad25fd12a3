//! Default catalogue and admin account for a fresh installation.
//!
//! Seeding is idempotent: rows whose unique key already exists are left as
//! they are, so it is safe to run on every start.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use super::commit;
use crate::auth::hash_password;
use crate::entities::{
    admin_user, customer, design_preset, machine, workshop, FabricType, WorkshopType,
};
use crate::errors::ServiceError;

pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@powerloom.com";

const CUSTOMERS: [(&str, &str, &str); 3] = [
    ("Sri Murugan Textiles", "R. Senthil", "9842012345"),
    ("Lakshmi Silks", "K. Meena", "9865023456"),
    ("Kumaran Traders", "S. Kumaran", "9443034567"),
];

const WORKSHOPS: [(&str, &str, WorkshopType, i32); 3] = [
    ("Main Shed", "Komarapalayam", WorkshopType::Veshti, 10),
    ("Saree Unit", "Erode", WorkshopType::Saree, 8),
    ("North Shed", "Pallipalayam", WorkshopType::Mixed, 12),
];

const PRESETS: [(&str, i64); 5] = [
    ("Plain Border", 45),
    ("Zari Border", 60),
    ("Checked Veshti", 55),
    ("Cotton Saree", 80),
    ("Silk Border Saree", 120),
];

/// Rows inserted by one seeding pass.
#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
pub struct SeedReport {
    pub customers: usize,
    pub workshops: usize,
    pub machines: usize,
    pub design_presets: usize,
    pub admin_created: bool,
}

fn machine_fabric(kind: WorkshopType, number: i32) -> FabricType {
    match kind {
        WorkshopType::Veshti => FabricType::Veshti,
        WorkshopType::Saree => FabricType::Saree,
        WorkshopType::Mixed if number % 2 == 1 => FabricType::Veshti,
        WorkshopType::Mixed => FabricType::Saree,
    }
}

/// Inserts the default catalogue and, unless present, the default admin.
#[instrument(skip(db))]
pub async fn seed_defaults<C>(db: &C, with_admin: bool) -> Result<SeedReport, ServiceError>
where
    C: ConnectionTrait + TransactionTrait,
{
    let mut report = seed_catalog(db).await?;
    if with_admin {
        report.admin_created = ensure_admin(
            db,
            DEFAULT_ADMIN_USERNAME,
            DEFAULT_ADMIN_PASSWORD,
            Some(DEFAULT_ADMIN_EMAIL),
        )
        .await?;
    }
    info!(?report, "seed complete");
    Ok(report)
}

async fn seed_catalog<C>(db: &C) -> Result<SeedReport, ServiceError>
where
    C: ConnectionTrait + TransactionTrait,
{
    let txn = db.begin().await.map_err(ServiceError::db_error)?;
    let mut report = SeedReport::default();
    let now = Utc::now();

    for (name, contact, phone) in CUSTOMERS {
        let exists = customer::Entity::find()
            .filter(customer::Column::Name.eq(name))
            .one(&txn)
            .await?
            .is_some();
        if exists {
            continue;
        }
        customer::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            contact_person: Set(Some(contact.to_string())),
            phone: Set(Some(phone.to_string())),
            email: Set(None),
            address: Set(None),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;
        report.customers += 1;
    }

    for (name, location, kind, count) in WORKSHOPS {
        let existing = workshop::Entity::find()
            .filter(workshop::Column::Name.eq(name))
            .one(&txn)
            .await?;
        let shop = match existing {
            Some(shop) => shop,
            None => {
                report.workshops += 1;
                workshop::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    name: Set(name.to_string()),
                    location: Set(location.to_string()),
                    machine_count: Set(count),
                    workshop_type: Set(kind),
                    is_active: Set(true),
                    created_at: Set(now),
                    updated_at: Set(now),
                }
                .insert(&txn)
                .await?
            }
        };

        let present: Vec<i32> = machine::Entity::find()
            .filter(machine::Column::WorkshopId.eq(shop.id))
            .all(&txn)
            .await?
            .into_iter()
            .map(|m| m.machine_number)
            .collect();

        for number in (1..=count).filter(|n| !present.contains(n)) {
            machine::ActiveModel {
                id: Set(Uuid::new_v4()),
                workshop_id: Set(shop.id),
                machine_number: Set(number),
                fabric_type: Set(machine_fabric(kind, number)),
                is_active: Set(true),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(&txn)
            .await?;
            report.machines += 1;
        }
    }

    for (label, price) in PRESETS {
        let exists = design_preset::Entity::find()
            .filter(design_preset::Column::Label.eq(label))
            .one(&txn)
            .await?
            .is_some();
        if exists {
            continue;
        }
        design_preset::ActiveModel {
            id: Set(Uuid::new_v4()),
            label: Set(label.to_string()),
            price: Set(Decimal::from(price)),
            is_active: Set(true),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;
        report.design_presets += 1;
    }

    commit(txn).await?;
    Ok(report)
}

/// Creates an admin account unless the username is already taken.
///
/// Returns whether a row was inserted.
pub async fn ensure_admin<C: ConnectionTrait>(
    db: &C,
    username: &str,
    password: &str,
    email: Option<&str>,
) -> Result<bool, ServiceError> {
    let exists = admin_user::Entity::find()
        .filter(admin_user::Column::Username.eq(username))
        .one(db)
        .await?
        .is_some();
    if exists {
        return Ok(false);
    }

    let now = Utc::now();
    admin_user::ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(username.to_string()),
        password_hash: Set(hash_password(password)?),
        email: Set(email.map(str::to_string)),
        is_active: Set(true),
        last_login: Set(None),
        reset_token: Set(None),
        reset_token_expires: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;

    info!(%username, "created admin user");
    Ok(true)
}
