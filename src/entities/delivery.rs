use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A batch of finished pieces cut from a beam.
///
/// `meters_used` and `total_amount` are computed server-side when the row is
/// written and never change afterwards.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "deliveries")]
#[schema(as = Delivery)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub beam_id: Uuid,
    pub delivery_date: NaiveDate,
    pub design_name: String,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub price_per_piece: Decimal,
    pub good_pieces: i32,
    pub damaged_pieces: i32,
    #[sea_orm(column_type = "Decimal(Some((14, 3)))")]
    pub meters_used: Decimal,
    #[sea_orm(column_type = "Decimal(Some((14, 2)))")]
    pub total_amount: Decimal,
    #[sea_orm(nullable)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::beam::Entity",
        from = "Column::BeamId",
        to = "super::beam::Column::Id",
        on_delete = "Cascade"
    )]
    Beam,
}

impl Related<super::beam::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Beam.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
