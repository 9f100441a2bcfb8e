//! Service order mutations that must hold the order row lock: item changes
//! and completion.

pub mod add_service_item_command;
pub mod complete_service_order_command;
pub mod remove_service_item_command;

pub use add_service_item_command::AddServiceItemCommand;
pub use complete_service_order_command::{CompleteServiceOrderCommand, SERVICE_INCOME_CATEGORY};
pub use remove_service_item_command::RemoveServiceItemCommand;

use crate::{
    entities::{service_item, service_order},
    errors::ServiceError,
    services::order_totals,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

/// Loads an order of the tenant with `SELECT ... FOR UPDATE`. Orders of other
/// tenants are reported as missing.
pub(crate) async fn lock_order<C>(
    conn: &C,
    tenant_id: i32,
    order_id: i32,
) -> Result<service_order::Model, ServiceError>
where
    C: ConnectionTrait,
{
    service_order::Entity::find_by_id(order_id)
        .filter(service_order::Column::TenantId.eq(tenant_id))
        .lock_exclusive()
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Service order", order_id))
}

/// Re-sums every item of the order and persists the result as `total_value`.
/// The caller must hold the order lock. A sum outside the `Decimal` range is a
/// validation error, which rolls back the caller's transaction.
pub(crate) async fn recompute_order_total<C>(
    conn: &C,
    order: service_order::Model,
) -> Result<service_order::Model, ServiceError>
where
    C: ConnectionTrait,
{
    let items = service_item::Entity::find()
        .filter(service_item::Column::OrderId.eq(order.id))
        .order_by_asc(service_item::Column::Id)
        .all(conn)
        .await?;

    let total = order_totals::checked_sum(items.iter().map(|item| item.total)).ok_or_else(|| {
        ServiceError::ValidationError(format!(
            "Total of service order {} is too large",
            order.id
        ))
    })?;

    let mut active: service_order::ActiveModel = order.into();
    active.total_value = Set(total);
    Ok(active.update(conn).await?)
}

pub(crate) fn ensure_items_mutable(order: &service_order::Model) -> Result<(), ServiceError> {
    if order.status.accepts_item_changes() {
        Ok(())
    } else {
        Err(ServiceError::InvalidState(format!(
            "Service order {} is {} and its items cannot be changed",
            order.id, order.status
        )))
    }
}
