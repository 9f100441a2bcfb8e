use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Direction and origin of a stock change. The quantity column is always
/// positive; the type carries the sign.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementType {
    /// Received against a supplier invoice
    #[sea_orm(string_value = "IN_INVOICE")]
    InInvoice,
    /// Consumed by a completed service order
    #[sea_orm(string_value = "OUT_SERVICE_ORDER")]
    OutServiceOrder,
    #[sea_orm(string_value = "ADJUSTMENT_PLUS")]
    AdjustmentPlus,
    #[sea_orm(string_value = "ADJUSTMENT_MINUS")]
    AdjustmentMinus,
    /// Unused part brought back from a service order
    #[sea_orm(string_value = "RETURN_SERVICE_ORDER")]
    ReturnServiceOrder,
}

impl MovementType {
    pub fn is_inbound(&self) -> bool {
        matches!(
            self,
            MovementType::InInvoice | MovementType::AdjustmentPlus | MovementType::ReturnServiceOrder
        )
    }
}

/// Append-only stock ledger. Rows are never updated or deleted.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "stock_movements")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub tenant_id: i32,
    pub part_id: i32,
    pub movement_type: MovementType,
    /// Requested quantity. For service order consumption this can exceed the
    /// stock actually removed, since the balance is clamped at zero.
    pub quantity: Decimal,
    pub date: DateTime<Utc>,
    pub description: String,
    pub reference_id: Option<String>,
    pub actor: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::part::Entity",
        from = "Column::PartId",
        to = "super::part::Column::Id"
    )]
    Part,
}

impl Related<super::part::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Part.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
