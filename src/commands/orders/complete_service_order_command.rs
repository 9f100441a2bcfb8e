use crate::{
    commands::Command,
    db::{with_transaction, DbPool},
    entities::{
        financial_transaction::{self, TransactionStatus, TransactionType},
        part, service_item,
        service_item::ServiceItemType,
        service_order::{self, ServiceOrderStatus},
        stock_movement::{self, MovementType},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        order_totals::clamped_balance,
        orders::{load_order_details, OrderDetails},
    },
};
use chrono::Utc;
use metrics::counter;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use super::lock_order;

/// Category recorded on the receivable created by completion.
pub const SERVICE_INCOME_CATEGORY: &str = "Services";

/// Completes a service order: status change, stock consumption with one
/// movement per part line, and a pending receivable for the order total, all in
/// one transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteServiceOrderCommand {
    pub tenant_id: i32,
    pub order_id: i32,
    /// Authenticated caller, recorded on every stock movement
    pub actor: String,
}

/// Everything written by a completion, used to publish events after commit.
#[derive(Debug)]
struct CompletionOutcome {
    order: service_order::Model,
    movements: Vec<stock_movement::Model>,
    receivable: financial_transaction::Model,
    low_stock: Vec<part::Model>,
}

#[async_trait::async_trait]
impl Command for CompleteServiceOrderCommand {
    type Result = OrderDetails;

    #[instrument(skip(self, db_pool, event_sender))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let db = db_pool.as_ref();
        let (tenant_id, order_id, actor) = (self.tenant_id, self.order_id, self.actor.clone());

        let outcome = with_transaction(db, move |txn| {
            Box::pin(async move { complete_locked(txn, tenant_id, order_id, &actor).await })
        })
        .await
        .map_err(|e| {
            counter!("marine_service_orders.completion_failures", 1);
            match &e {
                ServiceError::NotFound(_) | ServiceError::InvalidState(_) => {
                    warn!(tenant_id, order_id, error = %e, "Service order not completable")
                }
                _ => error!(tenant_id, order_id, error = %e, "Service order completion failed"),
            }
            e
        })?;

        counter!("marine_service_orders.completed", 1);
        counter!(
            "marine_service_inventory.stock_movements",
            outcome.movements.len() as u64
        );
        info!(
            tenant_id,
            order_id,
            total_value = %outcome.order.total_value,
            movements = outcome.movements.len(),
            transaction_id = outcome.receivable.id,
            "Service order completed"
        );

        self.publish(&event_sender, &outcome).await;

        load_order_details(db, outcome.order).await
    }
}

impl CompleteServiceOrderCommand {
    async fn publish(&self, event_sender: &EventSender, outcome: &CompletionOutcome) {
        for movement in &outcome.movements {
            event_sender
                .send_or_log(Event::StockMovementRecorded {
                    tenant_id: self.tenant_id,
                    part_id: movement.part_id,
                    movement_id: movement.id,
                    movement_type: movement.movement_type.to_string(),
                    quantity: movement.quantity,
                })
                .await;
        }
        for part in &outcome.low_stock {
            event_sender
                .send_or_log(Event::LowStock {
                    tenant_id: self.tenant_id,
                    part_id: part.id,
                    sku: part.sku.clone(),
                    quantity: part.quantity,
                    min_stock: part.min_stock,
                })
                .await;
        }
        event_sender
            .send_or_log(Event::TransactionCreated {
                tenant_id: self.tenant_id,
                transaction_id: outcome.receivable.id,
                amount: outcome.receivable.amount,
            })
            .await;
        event_sender
            .send_or_log(Event::OrderCompleted {
                tenant_id: self.tenant_id,
                order_id: outcome.order.id,
                total_value: outcome.order.total_value,
                transaction_id: outcome.receivable.id,
                completed_at: outcome.order.completed_at.unwrap_or_else(Utc::now),
            })
            .await;
    }
}

async fn complete_locked(
    txn: &DatabaseTransaction,
    tenant_id: i32,
    order_id: i32,
    actor: &str,
) -> Result<CompletionOutcome, ServiceError> {
    let order = lock_order(txn, tenant_id, order_id).await?;
    if !order.status.can_complete() {
        return Err(ServiceError::InvalidState(format!(
            "Service order {} is already completed",
            order_id
        )));
    }

    let now = Utc::now();
    let mut active: service_order::ActiveModel = order.into();
    active.status = Set(ServiceOrderStatus::Completed);
    active.completed_at = Set(Some(now));
    let order = active.update(txn).await?;

    let part_items = service_item::Entity::find()
        .filter(service_item::Column::OrderId.eq(order.id))
        .filter(service_item::Column::ItemType.eq(ServiceItemType::Part))
        .order_by_asc(service_item::Column::Id)
        .all(txn)
        .await?;

    let mut movements = Vec::with_capacity(part_items.len());
    let mut low_stock = Vec::new();

    for item in part_items {
        let Some(part_id) = item.part_id else {
            continue;
        };
        let Some(part) = part::Entity::find_by_id(part_id)
            .filter(part::Column::TenantId.eq(tenant_id))
            .lock_exclusive()
            .one(txn)
            .await?
        else {
            warn!(order_id, part_id, "Part on service item no longer exists, skipping stock");
            continue;
        };

        let remaining = clamped_balance(part.quantity, item.quantity);
        let mut active_part: part::ActiveModel = part.into();
        active_part.quantity = Set(remaining);
        let part = active_part.update(txn).await?;

        // The ledger keeps the requested quantity even when the balance was clamped.
        let movement = stock_movement::ActiveModel {
            tenant_id: Set(tenant_id),
            part_id: Set(part.id),
            movement_type: Set(MovementType::OutServiceOrder),
            quantity: Set(item.quantity),
            date: Set(now),
            description: Set(format!("Consumed by service order #{}", order.id)),
            reference_id: Set(Some(order.id.to_string())),
            actor: Set(actor.to_string()),
            ..Default::default()
        }
        .insert(txn)
        .await?;
        movements.push(movement);

        if part.is_below_minimum() {
            low_stock.push(part);
        }
    }

    let receivable = financial_transaction::ActiveModel {
        tenant_id: Set(tenant_id),
        transaction_type: Set(TransactionType::Income),
        category: Set(SERVICE_INCOME_CATEGORY.to_string()),
        description: Set(format!("Service order #{}", order.id)),
        amount: Set(order.total_value),
        date: Set(now),
        status: Set(TransactionStatus::Pending),
        order_id: Set(Some(order.id)),
        document_number: Set(None),
        ..Default::default()
    }
    .insert(txn)
    .await?;

    Ok(CompletionOutcome {
        order,
        movements,
        receivable,
        low_stock,
    })
}
