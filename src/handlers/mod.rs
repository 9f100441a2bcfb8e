pub mod auth;
pub mod finance;
pub mod fleet;
pub mod health;
pub mod inventory;
pub mod orders;
pub mod users;

use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::{
    finance::FinanceService, fleet::FleetService, inventory::InventoryService,
    orders::OrderService, tenancy::TenancyService,
};
use std::sync::Arc;

pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub orders: Arc<OrderService>,
    pub inventory: Arc<InventoryService>,
    pub finance: Arc<FinanceService>,
    pub fleet: Arc<FleetService>,
    pub tenancy: Arc<TenancyService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, low_stock_alerts: bool) -> Self {
        Self {
            orders: Arc::new(OrderService::new(db_pool.clone(), event_sender.clone())),
            inventory: Arc::new(InventoryService::new(
                db_pool.clone(),
                event_sender.clone(),
                low_stock_alerts,
            )),
            finance: Arc::new(FinanceService::new(db_pool.clone(), event_sender)),
            fleet: Arc::new(FleetService::new(db_pool.clone())),
            tenancy: Arc::new(TenancyService::new(db_pool)),
        }
    }
}
