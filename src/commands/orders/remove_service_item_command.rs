use crate::{
    commands::Command,
    db::{with_transaction, DbPool},
    entities::{service_item, service_order},
    errors::ServiceError,
    events::{Event, EventSender},
    services::orders::{load_order_details, OrderDetails},
};
use sea_orm::{ColumnTrait, DatabaseTransaction, EntityTrait, ModelTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{ensure_items_mutable, lock_order, recompute_order_total};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveServiceItemCommand {
    pub tenant_id: i32,
    pub order_id: i32,
    pub item_id: i32,
}

#[async_trait::async_trait]
impl Command for RemoveServiceItemCommand {
    type Result = OrderDetails;

    #[instrument(skip(self, db_pool, event_sender))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let db = db_pool.as_ref();
        let (tenant_id, order_id, item_id) = (self.tenant_id, self.order_id, self.item_id);

        let order = with_transaction(db, move |txn| {
            Box::pin(async move { remove_item_locked(txn, tenant_id, order_id, item_id).await })
        })
        .await?;

        info!(
            tenant_id,
            order_id,
            item_id,
            total_value = %order.total_value,
            "Service item removed"
        );

        event_sender
            .send_or_log(Event::OrderItemRemoved {
                tenant_id,
                order_id,
                item_id,
                total_value: order.total_value,
            })
            .await;

        load_order_details(db, order).await
    }
}

async fn remove_item_locked(
    txn: &DatabaseTransaction,
    tenant_id: i32,
    order_id: i32,
    item_id: i32,
) -> Result<service_order::Model, ServiceError> {
    let order = lock_order(txn, tenant_id, order_id).await?;
    ensure_items_mutable(&order)?;

    let item = service_item::Entity::find_by_id(item_id)
        .filter(service_item::Column::OrderId.eq(order.id))
        .one(txn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Service item", item_id))?;
    item.delete(txn).await?;

    recompute_order_total(txn, order).await
}
