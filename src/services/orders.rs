use crate::{
    commands::{
        orders::{AddServiceItemCommand, CompleteServiceOrderCommand, RemoveServiceItemCommand},
        Command,
    },
    db::{with_transaction, DbPool},
    entities::{
        boat, engine, order_note,
        service_item::{self, ServiceItemType},
        service_order::{self, ServiceOrderStatus},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, LoaderTrait,
    ModelTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::commands::orders::lock_order;

/// An order with its lines and notes, the shape every order operation returns.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDetails {
    pub order: service_order::Model,
    pub items: Vec<service_item::Model>,
    pub notes: Vec<order_note::Model>,
}

#[derive(Debug, Clone, Validate)]
pub struct CreateServiceOrderRequest {
    pub boat_id: i32,
    pub engine_id: Option<i32>,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    pub diagnosis: Option<String>,
    pub requester: Option<String>,
    pub technician_name: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    #[validate(range(min = 0, message = "Estimated duration cannot be negative"))]
    pub estimated_duration: Option<i32>,
}

/// Partial update. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Validate)]
pub struct UpdateServiceOrderRequest {
    #[validate(length(min = 1, message = "Description cannot be empty"))]
    pub description: Option<String>,
    pub diagnosis: Option<String>,
    pub requester: Option<String>,
    pub technician_name: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    #[validate(range(min = 0, message = "Estimated duration cannot be negative"))]
    pub estimated_duration: Option<i32>,
    pub status: Option<ServiceOrderStatus>,
}

#[derive(Debug, Clone, Validate)]
pub struct AddNoteRequest {
    #[validate(length(min = 1, message = "Note text is required"))]
    pub text: String,
    pub user_name: Option<String>,
}

/// A new line for an order, without tenant or order scoping.
#[derive(Debug, Clone)]
pub struct NewServiceItem {
    pub item_type: ServiceItemType,
    pub description: String,
    pub part_id: Option<i32>,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub unit_cost: Option<Decimal>,
}

/// Service order lifecycle. Every call is scoped to the caller's tenant; orders
/// of other tenants behave as if they did not exist.
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl OrderService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, request), fields(boat_id = request.boat_id))]
    pub async fn create_order(
        &self,
        tenant_id: i32,
        request: CreateServiceOrderRequest,
    ) -> Result<OrderDetails, ServiceError> {
        request.validate()?;
        let db = &*self.db_pool;

        boat::Entity::find_by_id(request.boat_id)
            .filter(boat::Column::TenantId.eq(tenant_id))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Boat", request.boat_id))?;

        if let Some(engine_id) = request.engine_id {
            let engine = engine::Entity::find_by_id(engine_id)
                .filter(engine::Column::TenantId.eq(tenant_id))
                .one(db)
                .await?
                .ok_or_else(|| ServiceError::not_found("Engine", engine_id))?;
            if engine.boat_id != request.boat_id {
                return Err(ServiceError::ValidationError(format!(
                    "Engine {} is not installed on boat {}",
                    engine_id, request.boat_id
                )));
            }
        }

        let order = service_order::ActiveModel {
            tenant_id: Set(tenant_id),
            boat_id: Set(request.boat_id),
            engine_id: Set(request.engine_id),
            description: Set(request.description.trim().to_string()),
            diagnosis: Set(request.diagnosis),
            status: Set(ServiceOrderStatus::Pending),
            total_value: Set(Decimal::ZERO),
            requester: Set(request.requester),
            technician_name: Set(request.technician_name),
            scheduled_at: Set(request.scheduled_at),
            estimated_duration: Set(request.estimated_duration),
            completed_at: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await?;

        info!(tenant_id, order_id = order.id, "Service order created");
        self.event_sender
            .send_or_log(Event::OrderCreated {
                tenant_id,
                order_id: order.id,
            })
            .await;

        Ok(OrderDetails {
            order,
            items: Vec::new(),
            notes: Vec::new(),
        })
    }

    #[instrument(skip(self))]
    pub async fn get_order(&self, tenant_id: i32, order_id: i32) -> Result<OrderDetails, ServiceError> {
        let db = &*self.db_pool;
        let order = service_order::Entity::find_by_id(order_id)
            .filter(service_order::Column::TenantId.eq(tenant_id))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Service order", order_id))?;

        load_order_details(db, order).await
    }

    /// Orders of the tenant, newest first.
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        tenant_id: i32,
        status: Option<ServiceOrderStatus>,
    ) -> Result<Vec<OrderDetails>, ServiceError> {
        let db = &*self.db_pool;
        let mut query =
            service_order::Entity::find().filter(service_order::Column::TenantId.eq(tenant_id));
        if let Some(status) = status {
            query = query.filter(service_order::Column::Status.eq(status));
        }

        let orders = query
            .order_by_desc(service_order::Column::CreatedAt)
            .order_by_desc(service_order::Column::Id)
            .all(db)
            .await?;

        let items = orders.load_many(service_item::Entity, db).await?;
        let notes = orders.load_many(order_note::Entity, db).await?;

        Ok(orders
            .into_iter()
            .zip(items)
            .zip(notes)
            .map(|((order, mut items), mut notes)| {
                items.sort_by_key(|i| i.id);
                notes.sort_by_key(|n| (n.created_at, n.id));
                OrderDetails {
                    order,
                    items,
                    notes,
                }
            })
            .collect())
    }

    /// Edits order fields. Status is a plain field here, except that only the
    /// completion workflow may set COMPLETED and terminal orders keep their
    /// status.
    #[instrument(skip(self, request))]
    pub async fn update_order(
        &self,
        tenant_id: i32,
        order_id: i32,
        request: UpdateServiceOrderRequest,
    ) -> Result<OrderDetails, ServiceError> {
        request.validate()?;
        let db = &*self.db_pool;

        let (order, previous_status) = with_transaction(db, move |txn| {
            Box::pin(async move { update_locked(txn, tenant_id, order_id, request).await })
        })
        .await?;

        if previous_status != order.status {
            info!(
                tenant_id,
                order_id,
                from = %previous_status,
                to = %order.status,
                "Service order status changed"
            );
            self.event_sender
                .send_or_log(Event::OrderStatusChanged {
                    tenant_id,
                    order_id,
                    old_status: previous_status.to_string(),
                    new_status: order.status.to_string(),
                })
                .await;
        }

        load_order_details(db, order).await
    }

    /// Appends a note. The author defaults to the authenticated caller.
    #[instrument(skip(self, request))]
    pub async fn add_note(
        &self,
        tenant_id: i32,
        actor: &str,
        order_id: i32,
        request: AddNoteRequest,
    ) -> Result<OrderDetails, ServiceError> {
        request.validate()?;
        let db = &*self.db_pool;

        let order = service_order::Entity::find_by_id(order_id)
            .filter(service_order::Column::TenantId.eq(tenant_id))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Service order", order_id))?;

        let user_name = request
            .user_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| actor.to_string());

        order_note::ActiveModel {
            order_id: Set(order.id),
            text: Set(request.text),
            user_name: Set(Some(user_name)),
            ..Default::default()
        }
        .insert(db)
        .await?;

        load_order_details(db, order).await
    }

    pub async fn add_item(
        &self,
        tenant_id: i32,
        order_id: i32,
        item: NewServiceItem,
    ) -> Result<OrderDetails, ServiceError> {
        AddServiceItemCommand {
            tenant_id,
            order_id,
            item_type: item.item_type,
            description: item.description,
            part_id: item.part_id,
            quantity: item.quantity,
            unit_price: item.unit_price,
            unit_cost: item.unit_cost,
        }
        .execute(self.db_pool.clone(), self.event_sender.clone())
        .await
    }

    pub async fn remove_item(
        &self,
        tenant_id: i32,
        order_id: i32,
        item_id: i32,
    ) -> Result<OrderDetails, ServiceError> {
        RemoveServiceItemCommand {
            tenant_id,
            order_id,
            item_id,
        }
        .execute(self.db_pool.clone(), self.event_sender.clone())
        .await
    }

    pub async fn complete_order(
        &self,
        tenant_id: i32,
        actor: &str,
        order_id: i32,
    ) -> Result<OrderDetails, ServiceError> {
        CompleteServiceOrderCommand {
            tenant_id,
            order_id,
            actor: actor.to_string(),
        }
        .execute(self.db_pool.clone(), self.event_sender.clone())
        .await
    }

    /// Deletes an order with its notes and items. Completed orders are kept,
    /// their receivable and stock movements point at them.
    #[instrument(skip(self))]
    pub async fn delete_order(&self, tenant_id: i32, order_id: i32) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        with_transaction(db, move |txn| {
            Box::pin(async move { delete_locked(txn, tenant_id, order_id).await })
        })
        .await?;

        info!(tenant_id, order_id, "Service order deleted");
        self.event_sender
            .send_or_log(Event::OrderDeleted {
                tenant_id,
                order_id,
            })
            .await;
        Ok(())
    }
}

/// Attaches items (by id) and notes (oldest first) to an order.
pub async fn load_order_details<C>(
    conn: &C,
    order: service_order::Model,
) -> Result<OrderDetails, ServiceError>
where
    C: ConnectionTrait,
{
    let items = order
        .find_related(service_item::Entity)
        .order_by_asc(service_item::Column::Id)
        .all(conn)
        .await?;
    let notes = order
        .find_related(order_note::Entity)
        .order_by_asc(order_note::Column::CreatedAt)
        .order_by_asc(order_note::Column::Id)
        .all(conn)
        .await?;

    Ok(OrderDetails {
        order,
        items,
        notes,
    })
}

async fn update_locked(
    txn: &DatabaseTransaction,
    tenant_id: i32,
    order_id: i32,
    request: UpdateServiceOrderRequest,
) -> Result<(service_order::Model, ServiceOrderStatus), ServiceError> {
    let order = lock_order(txn, tenant_id, order_id).await?;
    let previous_status = order.status;

    if let Some(next) = request.status {
        if next != previous_status {
            if next == ServiceOrderStatus::Completed {
                warn!(order_id, "Status edit tried to complete an order");
                return Err(ServiceError::InvalidState(format!(
                    "Service order {} can only be completed through the completion endpoint",
                    order_id
                )));
            }
            if previous_status.is_terminal() {
                return Err(ServiceError::InvalidState(format!(
                    "Service order {} is {} and its status can no longer change",
                    order_id, previous_status
                )));
            }
        }
    }

    let mut active: service_order::ActiveModel = order.into();
    if let Some(description) = request.description {
        active.description = Set(description.trim().to_string());
    }
    if let Some(diagnosis) = request.diagnosis {
        active.diagnosis = Set(Some(diagnosis));
    }
    if let Some(requester) = request.requester {
        active.requester = Set(Some(requester));
    }
    if let Some(technician) = request.technician_name {
        active.technician_name = Set(Some(technician));
    }
    if let Some(scheduled_at) = request.scheduled_at {
        active.scheduled_at = Set(Some(scheduled_at));
    }
    if let Some(duration) = request.estimated_duration {
        active.estimated_duration = Set(Some(duration));
    }
    if let Some(status) = request.status {
        active.status = Set(status);
    }

    let order = active.update(txn).await?;
    Ok((order, previous_status))
}

async fn delete_locked(
    txn: &DatabaseTransaction,
    tenant_id: i32,
    order_id: i32,
) -> Result<(), ServiceError> {
    let order = lock_order(txn, tenant_id, order_id).await?;
    if order.status == ServiceOrderStatus::Completed {
        return Err(ServiceError::InvalidState(format!(
            "Service order {} is completed and cannot be deleted",
            order_id
        )));
    }

    order_note::Entity::delete_many()
        .filter(order_note::Column::OrderId.eq(order.id))
        .exec(txn)
        .await?;
    service_item::Entity::delete_many()
        .filter(service_item::Column::OrderId.eq(order.id))
        .exec(txn)
        .await?;
    order.delete(txn).await?;
    Ok(())
}
