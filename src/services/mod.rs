// Service order lifecycle and its arithmetic
pub mod order_totals;
pub mod orders;

// Stock, fleet records and money
pub mod finance;
pub mod fleet;
pub mod inventory;

// Tenants and users
pub mod tenancy;
