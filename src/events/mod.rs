use chrono::{DateTime, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Domain events emitted after a transaction commits.
///
/// Delivery is best effort: a full or closed channel is logged and never rolls
/// back or fails the operation that produced the event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    OrderCreated {
        tenant_id: i32,
        order_id: i32,
    },
    OrderItemAdded {
        tenant_id: i32,
        order_id: i32,
        item_id: i32,
        total_value: Decimal,
    },
    OrderItemRemoved {
        tenant_id: i32,
        order_id: i32,
        item_id: i32,
        total_value: Decimal,
    },
    OrderStatusChanged {
        tenant_id: i32,
        order_id: i32,
        old_status: String,
        new_status: String,
    },
    OrderCompleted {
        tenant_id: i32,
        order_id: i32,
        total_value: Decimal,
        transaction_id: i32,
        completed_at: DateTime<Utc>,
    },
    OrderDeleted {
        tenant_id: i32,
        order_id: i32,
    },
    StockMovementRecorded {
        tenant_id: i32,
        part_id: i32,
        movement_id: i32,
        movement_type: String,
        quantity: Decimal,
    },
    LowStock {
        tenant_id: i32,
        part_id: i32,
        sku: String,
        quantity: Decimal,
        min_stock: Decimal,
    },
    TransactionCreated {
        tenant_id: i32,
        transaction_id: i32,
        amount: Decimal,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::OrderCreated { .. } => "order_created",
            Event::OrderItemAdded { .. } => "order_item_added",
            Event::OrderItemRemoved { .. } => "order_item_removed",
            Event::OrderStatusChanged { .. } => "order_status_changed",
            Event::OrderCompleted { .. } => "order_completed",
            Event::OrderDeleted { .. } => "order_deleted",
            Event::StockMovementRecorded { .. } => "stock_movement_recorded",
            Event::LowStock { .. } => "low_stock",
            Event::TransactionCreated { .. } => "transaction_created",
        }
    }

    pub fn tenant_id(&self) -> i32 {
        match self {
            Event::OrderCreated { tenant_id, .. }
            | Event::OrderItemAdded { tenant_id, .. }
            | Event::OrderItemRemoved { tenant_id, .. }
            | Event::OrderStatusChanged { tenant_id, .. }
            | Event::OrderCompleted { tenant_id, .. }
            | Event::OrderDeleted { tenant_id, .. }
            | Event::StockMovementRecorded { tenant_id, .. }
            | Event::LowStock { tenant_id, .. }
            | Event::TransactionCreated { tenant_id, .. } => *tenant_id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Creates a sender together with the receiving end of a bounded channel.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }

    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends without failing the caller. Used after a commit, when the change
    /// is already durable.
    pub async fn send_or_log(&self, event: Event) {
        let name = event.name();
        if let Err(e) = self.send(event).await {
            warn!(event = name, error = %e, "Dropping domain event");
            counter!("marine_service_events.dropped", 1);
        }
    }
}

/// Drains the event channel, logging each event. Runs until every sender is
/// dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        counter!("marine_service_events.processed", 1);
        match &event {
            Event::LowStock {
                tenant_id,
                part_id,
                sku,
                quantity,
                min_stock,
            } => {
                warn!(
                    tenant_id,
                    part_id,
                    sku = %sku,
                    quantity = %quantity,
                    min_stock = %min_stock,
                    "Part at or below minimum stock"
                );
            }
            Event::OrderCompleted {
                tenant_id,
                order_id,
                total_value,
                transaction_id,
                ..
            } => {
                info!(
                    tenant_id,
                    order_id,
                    transaction_id,
                    total_value = %total_value,
                    "Service order completed"
                );
            }
            other => {
                info!(
                    tenant_id = other.tenant_id(),
                    event = other.name(),
                    payload = %serde_json::to_string(other).unwrap_or_default(),
                    "Domain event"
                );
            }
        }
    }

    info!("Event processing loop stopped");
}
