use crate::{
    commands::Command,
    common::{validate_non_negative_decimal, validate_positive_decimal},
    db::{with_transaction, DbPool},
    entities::{part, service_item, service_item::ServiceItemType, service_order},
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        order_totals,
        orders::{load_order_details, OrderDetails},
    },
};
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use validator::{Validate, ValidationError};

use super::{ensure_items_mutable, lock_order, recompute_order_total};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_item_kind"))]
pub struct AddServiceItemCommand {
    pub tenant_id: i32,
    pub order_id: i32,
    pub item_type: ServiceItemType,
    #[validate(length(min = 1, max = 255, message = "Description is required"))]
    pub description: String,
    pub part_id: Option<i32>,
    #[validate(custom = "validate_positive_decimal")]
    pub quantity: Decimal,
    #[validate(custom = "validate_non_negative_decimal")]
    pub unit_price: Decimal,
    /// Defaults to the part's cost for PART items and zero for labor
    #[validate(custom = "validate_non_negative_decimal")]
    pub unit_cost: Option<Decimal>,
}

fn validate_item_kind(cmd: &AddServiceItemCommand) -> Result<(), ValidationError> {
    match (cmd.item_type, cmd.part_id) {
        (ServiceItemType::Part, None) => Err(ValidationError::new("part_item_requires_part_id")),
        (ServiceItemType::Labor, Some(_)) => {
            Err(ValidationError::new("labor_item_cannot_reference_part"))
        }
        _ => Ok(()),
    }
}

#[async_trait::async_trait]
impl Command for AddServiceItemCommand {
    type Result = OrderDetails;

    #[instrument(skip(self, db_pool, event_sender))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate().map_err(|e| {
            warn!(order_id = self.order_id, error = %e, "Rejected service item");
            ServiceError::from(e)
        })?;
        let line_total = order_totals::checked_line_total(self.quantity, self.unit_price)
            .ok_or_else(|| {
                warn!(order_id = self.order_id, "Service item total out of range");
                ServiceError::ValidationError(format!(
                    "Line total of {} x {} is too large",
                    self.quantity, self.unit_price
                ))
            })?;

        let db = db_pool.as_ref();
        let cmd = self.clone();
        let (order, item) = with_transaction(db, move |txn| {
            Box::pin(async move { add_item_locked(txn, cmd, line_total).await })
        })
        .await
        .map_err(|e| {
            if matches!(e, ServiceError::DatabaseError(_)) {
                error!(order_id = self.order_id, error = %e, "Failed to add service item");
            }
            e
        })?;

        counter!("marine_service_orders.items_added", 1);
        info!(
            tenant_id = self.tenant_id,
            order_id = order.id,
            item_id = item.id,
            total_value = %order.total_value,
            "Service item added"
        );

        event_sender
            .send_or_log(Event::OrderItemAdded {
                tenant_id: self.tenant_id,
                order_id: order.id,
                item_id: item.id,
                total_value: order.total_value,
            })
            .await;

        load_order_details(db, order).await
    }
}

async fn add_item_locked(
    txn: &DatabaseTransaction,
    cmd: AddServiceItemCommand,
    line_total: Decimal,
) -> Result<(service_order::Model, service_item::Model), ServiceError> {
    let order = lock_order(txn, cmd.tenant_id, cmd.order_id).await?;
    ensure_items_mutable(&order)?;

    let mut unit_cost = cmd.unit_cost.unwrap_or(Decimal::ZERO);
    if let Some(part_id) = cmd.part_id {
        let part = part::Entity::find_by_id(part_id)
            .filter(part::Column::TenantId.eq(cmd.tenant_id))
            .one(txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Part", part_id))?;
        if cmd.unit_cost.is_none() {
            unit_cost = part.cost;
        }
    }

    let item = service_item::ActiveModel {
        order_id: Set(order.id),
        item_type: Set(cmd.item_type),
        description: Set(cmd.description.trim().to_string()),
        part_id: Set(cmd.part_id),
        quantity: Set(cmd.quantity),
        unit_cost: Set(unit_cost),
        unit_price: Set(cmd.unit_price),
        total: Set(line_total),
        ..Default::default()
    }
    .insert(txn)
    .await?;

    let order = recompute_order_total(txn, order).await?;
    Ok((order, item))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn labor() -> AddServiceItemCommand {
        AddServiceItemCommand {
            tenant_id: 1,
            order_id: 1,
            item_type: ServiceItemType::Labor,
            description: "Engine overhaul".to_string(),
            part_id: None,
            quantity: dec!(1),
            unit_price: dec!(800),
            unit_cost: None,
        }
    }

    #[test]
    fn valid_labor_item_passes() {
        assert!(labor().validate().is_ok());
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let cmd = AddServiceItemCommand {
            quantity: dec!(0),
            ..labor()
        };
        assert!(cmd.validate().is_err());
    }

    #[test]
    fn negative_price_is_rejected_but_zero_is_fine() {
        let negative = AddServiceItemCommand {
            unit_price: dec!(-1),
            ..labor()
        };
        assert!(negative.validate().is_err());
        let free = AddServiceItemCommand {
            unit_price: dec!(0),
            ..labor()
        };
        assert!(free.validate().is_ok());
    }

    #[test]
    fn part_item_needs_part_id_and_labor_must_not_have_one() {
        let part_without_id = AddServiceItemCommand {
            item_type: ServiceItemType::Part,
            ..labor()
        };
        assert!(part_without_id.validate().is_err());

        let labor_with_part = AddServiceItemCommand {
            part_id: Some(4),
            ..labor()
        };
        assert!(labor_with_part.validate().is_err());
    }
}
