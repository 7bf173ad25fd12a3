//! Read-only rollups over the beam ledger for the dashboard and charts.
//!
//! Rows are loaded and folded in memory, as the catalogue and delivery
//! volumes of a single weaving unit are small. Every figure is derived from
//! the stored per-delivery `meters_used` and `total_amount`; nothing is cached.

use chrono::{Datelike, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, Select,
};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::beam_metrics::{percentage, DeliverySums};
use super::beams::sums_by_beam;
use super::Lookups;
use crate::dto::analytics::{
    CustomerSummary, DashboardOverview, DashboardQuery, FabricDistributionEntry,
    MachineProduction, MachineQualityEntry, MachineQualityQuery, ProductionTrend, TrendQuery,
    WorkshopMachineProduction, WorkshopProduction,
};
use crate::dto::ensure_window;
use crate::entities::{beam, delivery, BeamStatus, FabricType};
use crate::errors::ServiceError;

pub const DEFAULT_TREND_DAYS: i64 = 30;
pub const MAX_TREND_DAYS: i64 = 365;

#[derive(Clone)]
pub struct AnalyticsService {
    db: Arc<DatabaseConnection>,
}

fn beams_with_fabric(fabric: Option<FabricType>) -> Select<beam::Entity> {
    let query = beam::Entity::find();
    match fabric {
        Some(f) => query.filter(beam::Column::FabricType.eq(f)),
        None => query,
    }
}

fn deliveries_between(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Select<delivery::Entity> {
    let mut query = delivery::Entity::find();
    if let Some(start) = start {
        query = query.filter(delivery::Column::DeliveryDate.gte(start));
    }
    if let Some(end) = end {
        query = query.filter(delivery::Column::DeliveryDate.lte(end));
    }
    query
}

fn first_of_month(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}

impl AnalyticsService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Headline figures for the dashboard.
    ///
    /// Without `start_date` the window opens on the first of the current month.
    #[instrument(skip(self))]
    pub async fn overview(&self, query: DashboardQuery) -> Result<DashboardOverview, ServiceError> {
        ensure_window(query.start_date, query.end_date)?;
        let db = &*self.db;
        let start = query
            .start_date
            .unwrap_or_else(|| first_of_month(Utc::now().date_naive()));

        let active_beams = beams_with_fabric(query.fabric_type)
            .filter(beam::Column::Status.eq(BeamStatus::Active))
            .count(db)
            .await?;

        let beams: HashMap<Uuid, beam::Model> = beams_with_fabric(query.fabric_type)
            .all(db)
            .await?
            .into_iter()
            .map(|b| (b.id, b))
            .collect();
        let deliveries = deliveries_between(Some(start), query.end_date)
            .all(db)
            .await?;
        let lookups = Lookups::load(db).await?;

        let mut totals = DeliverySums::default();
        let mut per_workshop: BTreeMap<String, i64> = BTreeMap::new();
        let mut per_customer: BTreeMap<String, (i64, Decimal)> = BTreeMap::new();

        for d in &deliveries {
            let Some(b) = beams.get(&d.beam_id) else { continue };
            totals.add(d);
            *per_workshop
                .entry(lookups.workshop_name(b.workshop_id))
                .or_default() += i64::from(d.good_pieces);
            let entry = per_customer
                .entry(lookups.customer_name(b.customer_id))
                .or_default();
            entry.0 += i64::from(d.good_pieces);
            entry.1 += d.total_amount;
        }

        debug!(deliveries = deliveries.len(), %start, "dashboard overview computed");

        Ok(DashboardOverview {
            start_date: start,
            end_date: query.end_date,
            active_beams,
            total_pieces_this_month: totals.good,
            total_damaged_this_month: totals.damaged,
            pending_amount_this_month: totals.amount,
            workshop_production: per_workshop
                .into_iter()
                .map(|(workshop_name, total_pieces)| WorkshopProduction {
                    workshop_name,
                    total_pieces,
                })
                .collect(),
            customer_summary: per_customer
                .into_iter()
                .map(|(customer_name, (total_pieces, total_amount))| CustomerSummary {
                    customer_name,
                    total_pieces,
                    total_amount,
                })
                .collect(),
        })
    }

    /// Good pieces per day and workshop over the last `days` days.
    ///
    /// Days without deliveries are omitted; workshops missing on a listed day
    /// are reported as 0.
    #[instrument(skip(self))]
    pub async fn production_trend(&self, query: TrendQuery) -> Result<ProductionTrend, ServiceError> {
        let days = query.days.unwrap_or(DEFAULT_TREND_DAYS);
        if !(1..=MAX_TREND_DAYS).contains(&days) {
            return Err(ServiceError::ValidationError(format!(
                "days must be between 1 and {}",
                MAX_TREND_DAYS
            )));
        }
        let db = &*self.db;
        let from = Utc::now().date_naive() - Duration::days(days);

        let beams: HashMap<Uuid, beam::Model> = beams_with_fabric(query.fabric_type)
            .all(db)
            .await?
            .into_iter()
            .map(|b| (b.id, b))
            .collect();
        let deliveries = deliveries_between(Some(from), None).all(db).await?;
        let lookups = Lookups::load(db).await?;

        let mut by_day: BTreeMap<NaiveDate, BTreeMap<String, i64>> = BTreeMap::new();
        let mut workshops: BTreeSet<String> = BTreeSet::new();
        for d in &deliveries {
            let Some(b) = beams.get(&d.beam_id) else { continue };
            let name = lookups.workshop_name(b.workshop_id);
            workshops.insert(name.clone());
            *by_day.entry(d.delivery_date).or_default().entry(name).or_default() +=
                i64::from(d.good_pieces);
        }

        let data = by_day
            .into_iter()
            .map(|(date, counts)| {
                let mut row = Map::new();
                row.insert("date".to_string(), Value::String(date.to_string()));
                for name in &workshops {
                    let n = counts.get(name).copied().unwrap_or(0);
                    row.insert(name.clone(), Value::from(n));
                }
                row
            })
            .collect();

        Ok(ProductionTrend {
            data,
            workshops: workshops.into_iter().collect(),
        })
    }

    /// Good pieces and beam counts per fabric type.
    #[instrument(skip(self))]
    pub async fn fabric_distribution(
        &self,
        fabric_type: Option<FabricType>,
    ) -> Result<Vec<FabricDistributionEntry>, ServiceError> {
        let db = &*self.db;
        let beams = beams_with_fabric(fabric_type).all(db).await?;
        let sums = sums_by_beam(db, beams.iter().map(|b| b.id).collect()).await?;

        let mut entries = Vec::new();
        for fabric in [FabricType::Veshti, FabricType::Saree] {
            let of_fabric: Vec<&beam::Model> =
                beams.iter().filter(|b| b.fabric_type == fabric).collect();
            if of_fabric.is_empty() {
                continue;
            }
            let value: i64 = of_fabric
                .iter()
                .filter_map(|b| sums.get(&b.id))
                .map(|s| s.good)
                .sum();
            entries.push(FabricDistributionEntry {
                name: fabric,
                value,
                beams: of_fabric.len() as u64,
            });
        }
        Ok(entries)
    }

    /// Per-machine good and damaged pieces, for machines that produced anything.
    #[instrument(skip(self))]
    pub async fn machine_quality(
        &self,
        query: MachineQualityQuery,
    ) -> Result<Vec<MachineQualityEntry>, ServiceError> {
        ensure_window(query.start_date, query.end_date)?;
        let db = &*self.db;

        let beams: HashMap<Uuid, beam::Model> = beams_with_fabric(query.fabric_type)
            .all(db)
            .await?
            .into_iter()
            .map(|b| (b.id, b))
            .collect();
        let deliveries = deliveries_between(query.start_date, query.end_date)
            .all(db)
            .await?;
        let lookups = Lookups::load(db).await?;

        let mut per_machine: HashMap<Uuid, DeliverySums> = HashMap::new();
        for d in &deliveries {
            let Some(b) = beams.get(&d.beam_id) else { continue };
            per_machine.entry(b.machine_id).or_default().add(d);
        }

        let mut rows: Vec<MachineQualityEntry> = per_machine
            .into_iter()
            .filter(|(_, s)| s.pieces() > 0)
            .map(|(machine_id, s)| {
                let machine_number = lookups.machine_number(machine_id);
                let workshop_name = lookups
                    .machines
                    .get(&machine_id)
                    .map(|m| lookups.workshop_name(m.workshop_id))
                    .unwrap_or_else(|| "N/A".to_string());
                MachineQualityEntry {
                    machine_name: format!("{} M{}", workshop_name, machine_number),
                    workshop_name,
                    machine_number,
                    good_pieces: s.good,
                    damaged_pieces: s.damaged,
                    total_pieces: s.pieces(),
                    damage_rate_by_pieces: percentage(
                        Decimal::from(s.damaged),
                        Decimal::from(s.pieces()),
                    ),
                }
            })
            .collect();

        rows.sort_by(|a, b| {
            a.workshop_name
                .cmp(&b.workshop_name)
                .then(a.machine_number.cmp(&b.machine_number))
        });
        Ok(rows)
    }

    /// Pieces (good plus damaged) on each machine's current beam, by workshop.
    #[instrument(skip(self))]
    pub async fn workshop_machine_production(
        &self,
        fabric_type: Option<FabricType>,
    ) -> Result<Vec<WorkshopMachineProduction>, ServiceError> {
        let db = &*self.db;
        let active = beams_with_fabric(fabric_type)
            .filter(beam::Column::Status.eq(BeamStatus::Active))
            .all(db)
            .await?;
        let sums = sums_by_beam(db, active.iter().map(|b| b.id).collect()).await?;
        let lookups = Lookups::load(db).await?;

        let mut grouped: BTreeMap<String, Vec<MachineProduction>> = BTreeMap::new();
        let mut seen: HashSet<Uuid> = HashSet::new();
        for b in &active {
            if !seen.insert(b.machine_id) {
                continue;
            }
            grouped
                .entry(lookups.workshop_name(b.workshop_id))
                .or_default()
                .push(MachineProduction {
                    machine_number: lookups.machine_number(b.machine_id),
                    production: sums.get(&b.id).map(|s| s.pieces()).unwrap_or(0),
                });
        }

        Ok(grouped
            .into_iter()
            .map(|(workshop_name, mut machines)| {
                machines.sort_by_key(|m| m.machine_number);
                WorkshopMachineProduction {
                    workshop_name,
                    machines,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_start() {
        let d = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(first_of_month(d), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
    }
}
