use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Lifecycle of a service order.
///
/// `Pending -> Quotation -> Approved -> InProgress -> Completed`, with `Canceled`
/// reachable from any non-terminal state.
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
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum ServiceOrderStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "QUOTATION")]
    Quotation,
    #[sea_orm(string_value = "APPROVED")]
    Approved,
    #[sea_orm(string_value = "IN_PROGRESS")]
    InProgress,
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
    #[sea_orm(string_value = "CANCELED")]
    Canceled,
}

impl ServiceOrderStatus {
    /// Guard for the completion workflow.
    ///
    /// Any state other than `Completed` may be completed, including `Pending` and
    /// `Canceled`. The shop has never required orders to pass through approval
    /// first; tighten this match to enforce a stricter path.
    pub fn can_complete(&self) -> bool {
        !matches!(self, ServiceOrderStatus::Completed)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ServiceOrderStatus::Completed | ServiceOrderStatus::Canceled
        )
    }

    /// Whether items may still be added or removed.
    pub fn accepts_item_changes(&self) -> bool {
        !self.is_terminal()
    }
}

/// The `service_orders` table.
///
/// `total_value` always equals the sum of the order's item totals; it is
/// recomputed by a full re-sum whenever the item set changes.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "service_orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub tenant_id: i32,
    pub boat_id: i32,
    pub engine_id: Option<i32>,
    pub description: String,
    pub diagnosis: Option<String>,
    pub status: ServiceOrderStatus,
    pub total_value: Decimal,
    pub requester: Option<String>,
    pub technician_name: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    /// Estimated duration in hours
    pub estimated_duration: Option<i32>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::boat::Entity",
        from = "Column::BoatId",
        to = "super::boat::Column::Id"
    )]
    Boat,
    #[sea_orm(has_many = "super::service_item::Entity")]
    Items,
    #[sea_orm(has_many = "super::order_note::Entity")]
    Notes,
}

impl Related<super::boat::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Boat.def()
    }
}

impl Related<super::service_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl Related<super::order_note::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notes.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let now = Utc::now();
        if insert && self.created_at.is_not_set() {
            self.created_at = Set(now);
        }
        self.updated_at = Set(now);
        Ok(self)
    }
}
