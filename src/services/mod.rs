//! Domain services. Handlers stay thin and call into these; every ledger
//! mutation runs inside a single database transaction here.

pub mod admin;
pub mod analytics;
pub mod beam_metrics;
pub mod beams;
pub mod customers;
pub mod deliveries;
pub mod design_presets;
pub mod machines;
pub mod reports;
pub mod seed;
pub mod workshops;

use metrics::counter;
use sea_orm::{ConnectionTrait, DatabaseConnection, DatabaseTransaction, EntityTrait};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::AuthService;
use crate::config::AppConfig;
use crate::entities::{customer, machine, workshop};
use crate::errors::ServiceError;

/// Container for all services, cloned into every request via `AppState`.
#[derive(Clone)]
pub struct AppServices {
    pub beams: beams::BeamService,
    pub deliveries: deliveries::DeliveryService,
    pub workshops: workshops::WorkshopService,
    pub machines: machines::MachineService,
    pub customers: customers::CustomerService,
    pub design_presets: design_presets::DesignPresetService,
    pub analytics: analytics::AnalyticsService,
    pub reports: reports::ReportService,
    pub admin: admin::AdminService,
    pub auth: Arc<AuthService>,
}

impl AppServices {
    pub fn new(db: Arc<DatabaseConnection>, auth: Arc<AuthService>, config: &AppConfig) -> Self {
        Self {
            beams: beams::BeamService::new(db.clone()),
            deliveries: deliveries::DeliveryService::new(db.clone(), config.beam_auto_complete),
            workshops: workshops::WorkshopService::new(db.clone()),
            machines: machines::MachineService::new(db.clone()),
            customers: customers::CustomerService::new(db.clone()),
            design_presets: design_presets::DesignPresetService::new(db.clone()),
            analytics: analytics::AnalyticsService::new(db.clone()),
            reports: reports::ReportService::new(db.clone()),
            admin: admin::AdminService::new(db),
            auth,
        }
    }
}

/// Commits `txn`, counting it under `powerloom.db.transactions`.
pub(crate) async fn commit(txn: DatabaseTransaction) -> Result<(), ServiceError> {
    txn.commit().await.map_err(ServiceError::db_error)?;
    counter!("powerloom.db.transactions", 1);
    Ok(())
}

/// Name lookups used to decorate beam and delivery rows.
///
/// The catalogue tables are small, so they are loaded whole.
pub(crate) struct Lookups {
    pub workshops: HashMap<Uuid, workshop::Model>,
    pub customers: HashMap<Uuid, customer::Model>,
    pub machines: HashMap<Uuid, machine::Model>,
}

impl Lookups {
    pub async fn load<C: ConnectionTrait>(db: &C) -> Result<Self, ServiceError> {
        let workshops = workshop::Entity::find().all(db).await?;
        let customers = customer::Entity::find().all(db).await?;
        let machines = machine::Entity::find().all(db).await?;
        Ok(Self {
            workshops: workshops.into_iter().map(|w| (w.id, w)).collect(),
            customers: customers.into_iter().map(|c| (c.id, c)).collect(),
            machines: machines.into_iter().map(|m| (m.id, m)).collect(),
        })
    }

    pub fn workshop_name(&self, id: Uuid) -> String {
        self.workshops
            .get(&id)
            .map(|w| w.name.clone())
            .unwrap_or_else(|| "N/A".to_string())
    }

    pub fn customer_name(&self, id: Uuid) -> String {
        self.customers
            .get(&id)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| "N/A".to_string())
    }

    pub fn machine_number(&self, id: Uuid) -> i32 {
        self.machines.get(&id).map(|m| m.machine_number).unwrap_or(0)
    }
}
