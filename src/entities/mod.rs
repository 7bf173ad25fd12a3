//! SeaORM entities for the powerloom schema.

pub mod admin_user;
pub mod beam;
pub mod customer;
pub mod delivery;
pub mod design_preset;
pub mod machine;
pub mod workshop;

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Fabric woven on a machine and carried by its beams.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    ToSchema,
    strum::Display,
    strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FabricType {
    #[sea_orm(string_value = "veshti")]
    Veshti,
    #[sea_orm(string_value = "saree")]
    Saree,
}

/// What a workshop is set up to produce.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    ToSchema,
    strum::Display,
    strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum WorkshopType {
    #[sea_orm(string_value = "veshti")]
    Veshti,
    #[sea_orm(string_value = "saree")]
    Saree,
    #[sea_orm(string_value = "mixed")]
    Mixed,
}

impl WorkshopType {
    /// Whether machines weaving `fabric` belong in a workshop of this type.
    pub fn accepts(self, fabric: FabricType) -> bool {
        matches!(
            (self, fabric),
            (WorkshopType::Mixed, _)
                | (WorkshopType::Veshti, FabricType::Veshti)
                | (WorkshopType::Saree, FabricType::Saree)
        )
    }
}

/// Beam lifecycle: `active -> completed`, terminal.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    ToSchema,
    strum::Display,
    strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BeamStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "completed")]
    Completed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn enums_round_trip_through_strings() {
        assert_eq!(FabricType::from_str("saree").unwrap(), FabricType::Saree);
        assert_eq!(WorkshopType::Mixed.to_string(), "mixed");
        assert_eq!(
            serde_json::to_value(BeamStatus::Completed).unwrap(),
            "completed"
        );
        assert!(FabricType::from_str("silk").is_err());
    }

    #[test]
    fn mixed_workshops_accept_every_fabric() {
        assert!(WorkshopType::Mixed.accepts(FabricType::Veshti));
        assert!(WorkshopType::Mixed.accepts(FabricType::Saree));
        assert!(WorkshopType::Veshti.accepts(FabricType::Veshti));
        assert!(!WorkshopType::Veshti.accepts(FabricType::Saree));
    }
}
