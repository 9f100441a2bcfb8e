use crate::{
    common::{non_blank, validate_non_negative_decimal, validate_positive_decimal},
    db::{with_transaction, DbPool},
    entities::{
        invoice, part,
        stock_movement::{self, MovementType},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::order_totals,
};
use chrono::{DateTime, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

#[derive(Debug, Clone, Validate)]
pub struct CreatePartRequest {
    #[validate(length(min = 1, max = 64, message = "SKU is required"))]
    pub sku: String,
    pub barcode: Option<String>,
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    /// Opening balance, recorded as an adjustment movement
    #[validate(custom = "validate_non_negative_decimal")]
    pub quantity: Decimal,
    #[validate(custom = "validate_non_negative_decimal")]
    pub cost: Decimal,
    #[validate(custom = "validate_non_negative_decimal")]
    pub price: Decimal,
    #[validate(custom = "validate_non_negative_decimal")]
    pub min_stock: Decimal,
    pub location: Option<String>,
}

/// Metadata and price changes. Quantity only moves through stock movements.
#[derive(Debug, Clone, Default, Validate)]
pub struct UpdatePartRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    pub barcode: Option<String>,
    #[validate(custom = "validate_non_negative_decimal")]
    pub cost: Option<Decimal>,
    #[validate(custom = "validate_non_negative_decimal")]
    pub price: Option<Decimal>,
    #[validate(custom = "validate_non_negative_decimal")]
    pub min_stock: Option<Decimal>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Validate)]
pub struct RecordMovementRequest {
    pub part_id: i32,
    pub movement_type: MovementType,
    #[validate(custom = "validate_positive_decimal")]
    pub quantity: Decimal,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    pub reference_id: Option<String>,
}

#[derive(Debug, Clone, Validate)]
pub struct InvoiceLine {
    pub part_id: i32,
    #[validate(custom = "validate_positive_decimal")]
    pub quantity: Decimal,
    #[validate(custom = "validate_non_negative_decimal")]
    pub unit_cost: Decimal,
}

/// A supplier invoice whose lines are received into stock.
#[derive(Debug, Clone, Validate)]
pub struct RegisterInvoiceRequest {
    #[validate(length(min = 1, message = "Invoice number is required"))]
    pub number: String,
    #[validate(length(min = 1, message = "Supplier is required"))]
    pub supplier: String,
    pub date: DateTime<Utc>,
    pub xml_key: Option<String>,
    pub lines: Vec<InvoiceLine>,
}

/// Parts catalogue and the stock ledger.
#[derive(Clone)]
pub struct InventoryService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    low_stock_alerts: bool,
}

impl InventoryService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, low_stock_alerts: bool) -> Self {
        Self {
            db_pool,
            event_sender,
            low_stock_alerts,
        }
    }

    /// Creates a part. SKUs are unique within a tenant.
    #[instrument(skip(self, request), fields(sku = %request.sku))]
    pub async fn create_part(
        &self,
        tenant_id: i32,
        actor: &str,
        request: CreatePartRequest,
    ) -> Result<part::Model, ServiceError> {
        request.validate()?;
        let actor = actor.to_string();

        let (part, opening) = with_transaction(&*self.db_pool, move |txn| {
            Box::pin(async move { create_part_tx(txn, tenant_id, &actor, request).await })
        })
        .await?;

        info!(tenant_id, part_id = part.id, "Part created");
        if let Some(movement) = opening {
            self.publish_movement(&movement).await;
        }
        Ok(part)
    }

    #[instrument(skip(self))]
    pub async fn get_part(&self, tenant_id: i32, part_id: i32) -> Result<part::Model, ServiceError> {
        find_part(&*self.db_pool, tenant_id, part_id).await
    }

    /// Parts ordered by name. `search` matches SKU, barcode or name.
    #[instrument(skip(self))]
    pub async fn list_parts(
        &self,
        tenant_id: i32,
        search: Option<String>,
    ) -> Result<Vec<part::Model>, ServiceError> {
        let mut query = part::Entity::find().filter(part::Column::TenantId.eq(tenant_id));
        if let Some(term) = non_blank(search) {
            query = query.filter(
                sea_orm::Condition::any()
                    .add(part::Column::Sku.contains(&term))
                    .add(part::Column::Barcode.contains(&term))
                    .add(part::Column::Name.contains(&term)),
            );
        }
        Ok(query
            .order_by_asc(part::Column::Name)
            .order_by_asc(part::Column::Id)
            .all(&*self.db_pool)
            .await?)
    }

    /// Parts at or below their minimum stock.
    #[instrument(skip(self))]
    pub async fn list_low_stock(&self, tenant_id: i32) -> Result<Vec<part::Model>, ServiceError> {
        Ok(part::Entity::find()
            .filter(part::Column::TenantId.eq(tenant_id))
            .filter(Expr::col(part::Column::Quantity).lte(Expr::col(part::Column::MinStock)))
            .order_by_asc(part::Column::Name)
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self, request))]
    pub async fn update_part(
        &self,
        tenant_id: i32,
        part_id: i32,
        request: UpdatePartRequest,
    ) -> Result<part::Model, ServiceError> {
        request.validate()?;
        let existing = find_part(&*self.db_pool, tenant_id, part_id).await?;

        let mut active: part::ActiveModel = existing.into();
        if let Some(name) = request.name {
            active.name = Set(name.trim().to_string());
        }
        if request.barcode.is_some() {
            active.barcode = Set(non_blank(request.barcode));
        }
        if let Some(cost) = request.cost {
            active.cost = Set(cost);
        }
        if let Some(price) = request.price {
            active.price = Set(price);
        }
        if let Some(min_stock) = request.min_stock {
            active.min_stock = Set(min_stock);
        }
        if request.location.is_some() {
            active.location = Set(non_blank(request.location));
        }

        let part = active.update(&*self.db_pool).await?;
        info!(tenant_id, part_id, "Part updated");
        Ok(part)
    }

    /// Manual stock movement. Consumption by service orders is reserved for
    /// the completion workflow.
    #[instrument(skip(self, request), fields(part_id = request.part_id, movement_type = %request.movement_type))]
    pub async fn record_movement(
        &self,
        tenant_id: i32,
        actor: &str,
        request: RecordMovementRequest,
    ) -> Result<stock_movement::Model, ServiceError> {
        request.validate()?;
        if request.movement_type == MovementType::OutServiceOrder {
            return Err(ServiceError::ValidationError(
                "OUT_SERVICE_ORDER movements are recorded by service order completion".to_string(),
            ));
        }
        let actor = actor.to_string();

        let (movement, part) = with_transaction(&*self.db_pool, move |txn| {
            Box::pin(async move { record_movement_tx(txn, tenant_id, &actor, request).await })
        })
        .await?;

        info!(
            tenant_id,
            part_id = part.id,
            movement_id = movement.id,
            quantity = %part.quantity,
            "Stock movement recorded"
        );
        self.publish_movement(&movement).await;
        self.check_low_stock(&part).await;
        Ok(movement)
    }

    /// Ledger entries, newest first.
    #[instrument(skip(self))]
    pub async fn list_movements(
        &self,
        tenant_id: i32,
        part_id: Option<i32>,
    ) -> Result<Vec<stock_movement::Model>, ServiceError> {
        let mut query = stock_movement::Entity::find()
            .filter(stock_movement::Column::TenantId.eq(tenant_id));
        if let Some(part_id) = part_id {
            query = query.filter(stock_movement::Column::PartId.eq(part_id));
        }
        Ok(query
            .order_by_desc(stock_movement::Column::Date)
            .order_by_desc(stock_movement::Column::Id)
            .all(&*self.db_pool)
            .await?)
    }

    /// Stores an invoice header and receives every line into stock with an
    /// `IN_INVOICE` movement. The line's unit cost becomes the part's cost.
    #[instrument(skip(self, request), fields(number = %request.number))]
    pub async fn register_invoice(
        &self,
        tenant_id: i32,
        actor: &str,
        request: RegisterInvoiceRequest,
    ) -> Result<invoice::Model, ServiceError> {
        request.validate()?;
        if request.lines.is_empty() {
            return Err(ServiceError::ValidationError(
                "Invoice needs at least one line".to_string(),
            ));
        }
        for line in &request.lines {
            line.validate()?;
        }
        let actor = actor.to_string();

        let (invoice, movements) = with_transaction(&*self.db_pool, move |txn| {
            Box::pin(async move { register_invoice_tx(txn, tenant_id, &actor, request).await })
        })
        .await?;

        counter!("marine_service_inventory.stock_movements", movements.len() as u64);
        info!(
            tenant_id,
            invoice_id = invoice.id,
            lines = movements.len(),
            total_value = %invoice.total_value,
            "Invoice received into stock"
        );
        for movement in &movements {
            self.publish_movement(movement).await;
        }
        Ok(invoice)
    }

    #[instrument(skip(self))]
    pub async fn list_invoices(&self, tenant_id: i32) -> Result<Vec<invoice::Model>, ServiceError> {
        Ok(invoice::Entity::find()
            .filter(invoice::Column::TenantId.eq(tenant_id))
            .order_by_desc(invoice::Column::Date)
            .order_by_desc(invoice::Column::Id)
            .all(&*self.db_pool)
            .await?)
    }

    async fn publish_movement(&self, movement: &stock_movement::Model) {
        self.event_sender
            .send_or_log(Event::StockMovementRecorded {
                tenant_id: movement.tenant_id,
                part_id: movement.part_id,
                movement_id: movement.id,
                movement_type: movement.movement_type.to_string(),
                quantity: movement.quantity,
            })
            .await;
    }

    async fn check_low_stock(&self, part: &part::Model) {
        if self.low_stock_alerts && part.is_below_minimum() {
            self.event_sender
                .send_or_log(Event::LowStock {
                    tenant_id: part.tenant_id,
                    part_id: part.id,
                    sku: part.sku.clone(),
                    quantity: part.quantity,
                    min_stock: part.min_stock,
                })
                .await;
        }
    }
}

async fn find_part<C>(conn: &C, tenant_id: i32, part_id: i32) -> Result<part::Model, ServiceError>
where
    C: ConnectionTrait,
{
    part::Entity::find_by_id(part_id)
        .filter(part::Column::TenantId.eq(tenant_id))
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Part", part_id))
}

async fn lock_part(
    txn: &DatabaseTransaction,
    tenant_id: i32,
    part_id: i32,
) -> Result<part::Model, ServiceError> {
    part::Entity::find_by_id(part_id)
        .filter(part::Column::TenantId.eq(tenant_id))
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Part", part_id))
}

async fn create_part_tx(
    txn: &DatabaseTransaction,
    tenant_id: i32,
    actor: &str,
    request: CreatePartRequest,
) -> Result<(part::Model, Option<stock_movement::Model>), ServiceError> {
    let sku = request.sku.trim().to_string();
    let duplicate = part::Entity::find()
        .filter(part::Column::TenantId.eq(tenant_id))
        .filter(part::Column::Sku.eq(sku.as_str()))
        .one(txn)
        .await?;
    if duplicate.is_some() {
        return Err(ServiceError::Conflict(format!("SKU {} already exists", sku)));
    }

    let part = part::ActiveModel {
        tenant_id: Set(tenant_id),
        sku: Set(sku),
        barcode: Set(non_blank(request.barcode)),
        name: Set(request.name.trim().to_string()),
        quantity: Set(request.quantity),
        cost: Set(request.cost),
        price: Set(request.price),
        min_stock: Set(request.min_stock),
        location: Set(non_blank(request.location)),
        ..Default::default()
    }
    .insert(txn)
    .await?;

    if request.quantity.is_zero() {
        return Ok((part, None));
    }

    let movement = insert_movement(
        txn,
        &part,
        MovementType::AdjustmentPlus,
        request.quantity,
        "Opening balance".to_string(),
        None,
        actor,
    )
    .await?;
    Ok((part, Some(movement)))
}

async fn record_movement_tx(
    txn: &DatabaseTransaction,
    tenant_id: i32,
    actor: &str,
    request: RecordMovementRequest,
) -> Result<(stock_movement::Model, part::Model), ServiceError> {
    let part = lock_part(txn, tenant_id, request.part_id).await?;

    let new_quantity = if request.movement_type.is_inbound() {
        received_quantity(&part, request.quantity)?
    } else {
        if request.quantity > part.quantity {
            warn!(
                part_id = part.id,
                on_hand = %part.quantity,
                requested = %request.quantity,
                "Adjustment would drive stock negative"
            );
            return Err(ServiceError::ValidationError(format!(
                "Cannot remove {} units of part {}: only {} on hand",
                request.quantity, part.id, part.quantity
            )));
        }
        part.quantity - request.quantity
    };

    let mut active: part::ActiveModel = part.into();
    active.quantity = Set(new_quantity);
    let part = active.update(txn).await?;

    let movement = insert_movement(
        txn,
        &part,
        request.movement_type,
        request.quantity,
        request.description.trim().to_string(),
        non_blank(request.reference_id),
        actor,
    )
    .await?;
    counter!("marine_service_inventory.stock_movements", 1);

    Ok((movement, part))
}

async fn register_invoice_tx(
    txn: &DatabaseTransaction,
    tenant_id: i32,
    actor: &str,
    request: RegisterInvoiceRequest,
) -> Result<(invoice::Model, Vec<stock_movement::Model>), ServiceError> {
    let number = request.number.trim().to_string();
    let supplier = request.supplier.trim().to_string();

    let duplicate = invoice::Entity::find()
        .filter(invoice::Column::TenantId.eq(tenant_id))
        .filter(invoice::Column::Number.eq(number.as_str()))
        .filter(invoice::Column::Supplier.eq(supplier.as_str()))
        .one(txn)
        .await?;
    if duplicate.is_some() {
        return Err(ServiceError::Conflict(format!(
            "Invoice {} from {} was already imported",
            number, supplier
        )));
    }

    let total = request
        .lines
        .iter()
        .map(|line| order_totals::checked_line_total(line.quantity, line.unit_cost))
        .collect::<Option<Vec<_>>>()
        .and_then(order_totals::checked_sum)
        .ok_or_else(|| {
            ServiceError::ValidationError(format!("Total of invoice {} is too large", number))
        })?;

    let invoice = invoice::ActiveModel {
        tenant_id: Set(tenant_id),
        number: Set(number.clone()),
        supplier: Set(supplier.clone()),
        date: Set(request.date),
        total_value: Set(total),
        xml_key: Set(non_blank(request.xml_key)),
        imported_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(txn)
    .await?;

    let mut movements = Vec::with_capacity(request.lines.len());
    for line in request.lines {
        let part = lock_part(txn, tenant_id, line.part_id).await?;
        let mut active: part::ActiveModel = part.clone().into();
        active.quantity = Set(received_quantity(&part, line.quantity)?);
        active.cost = Set(line.unit_cost);
        let part = active.update(txn).await?;

        movements.push(
            insert_movement(
                txn,
                &part,
                MovementType::InInvoice,
                line.quantity,
                format!("Invoice {} from {}", number, supplier),
                Some(number.clone()),
                actor,
            )
            .await?,
        );
    }

    Ok((invoice, movements))
}

/// On-hand quantity after receiving `quantity` units.
fn received_quantity(part: &part::Model, quantity: Decimal) -> Result<Decimal, ServiceError> {
    part.quantity.checked_add(quantity).ok_or_else(|| {
        ServiceError::ValidationError(format!(
            "Receiving {} units would overflow the stock of part {}",
            quantity, part.id
        ))
    })
}

async fn insert_movement(
    txn: &DatabaseTransaction,
    part: &part::Model,
    movement_type: MovementType,
    quantity: Decimal,
    description: String,
    reference_id: Option<String>,
    actor: &str,
) -> Result<stock_movement::Model, ServiceError> {
    Ok(stock_movement::ActiveModel {
        tenant_id: Set(part.tenant_id),
        part_id: Set(part.id),
        movement_type: Set(movement_type),
        quantity: Set(quantity),
        date: Set(Utc::now()),
        description: Set(description),
        reference_id: Set(reference_id),
        actor: Set(actor.to_string()),
        ..Default::default()
    }
    .insert(txn)
    .await?)
}
