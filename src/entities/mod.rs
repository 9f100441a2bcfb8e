//! Database entities. Every tenant-owned table carries `tenant_id`; service
//! items and order notes are scoped through their order.

pub mod boat;
pub mod client;
pub mod company_info;
pub mod engine;
pub mod financial_transaction;
pub mod invoice;
pub mod manufacturer;
pub mod manufacturer_model;
pub mod marina;
pub mod order_note;
pub mod part;
pub mod service_item;
pub mod service_order;
pub mod stock_movement;
pub mod tenant;
pub mod user;
