use sea_orm::entity::prelude::*;

/// Legal identity of the shop used on fiscal documents. One row per tenant.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "company_info")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub tenant_id: i32,
    pub company_name: String,
    pub trade_name: Option<String>,
    pub cnpj: Option<String>,
    /// State registration (Inscrição Estadual)
    pub ie: Option<String>,
    pub street: Option<String>,
    pub number: Option<String>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    /// Tax regime code
    pub crt: Option<String>,
    /// Fiscal environment, "homologation" or "production"
    pub environment: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
