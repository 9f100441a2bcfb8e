use sea_orm::entity::prelude::*;

/// The `boats` table. Engines are owned by their boat and removed with it.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "boats")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub tenant_id: i32,
    pub client_id: i32,
    pub marina_id: Option<i32>,
    pub name: String,
    pub hull_id: String,
    pub usage_type: Option<String>,
    pub model: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::client::Entity",
        from = "Column::ClientId",
        to = "super::client::Column::Id"
    )]
    Client,
    #[sea_orm(
        belongs_to = "super::marina::Entity",
        from = "Column::MarinaId",
        to = "super::marina::Column::Id"
    )]
    Marina,
    #[sea_orm(has_many = "super::engine::Entity")]
    Engines,
    #[sea_orm(has_many = "super::service_order::Entity")]
    ServiceOrders,
}

impl Related<super::client::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Client.def()
    }
}

impl Related<super::marina::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Marina.def()
    }
}

impl Related<super::engine::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Engines.def()
    }
}

impl Related<super::service_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ServiceOrders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
