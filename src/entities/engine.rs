use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "engines")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub tenant_id: i32,
    pub boat_id: i32,
    pub serial_number: String,
    pub motor_number: Option<String>,
    pub model: String,
    pub sale_date: Option<DateTime<Utc>>,
    pub warranty_status: Option<String>,
    pub warranty_validity: Option<DateTime<Utc>>,
    /// Hour meter reading
    pub hours: Decimal,
    pub year: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::boat::Entity",
        from = "Column::BoatId",
        to = "super::boat::Column::Id"
    )]
    Boat,
}

impl Related<super::boat::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Boat.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
