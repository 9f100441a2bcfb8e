use crate::{
    common::{non_blank, validate_non_negative_decimal},
    db::{with_transaction, DbPool},
    entities::{
        boat, client, engine, manufacturer,
        manufacturer::ManufacturerType,
        manufacturer_model, marina, service_order,
    },
    errors::ServiceError,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, LoaderTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

#[derive(Debug, Clone, Validate)]
pub struct CreateClientRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Document is required"))]
    pub document: String,
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub address: Option<String>,
    pub client_type: Option<String>,
}

#[derive(Debug, Clone, Validate)]
pub struct CreateMarinaRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    pub address: Option<String>,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub coordinates: Option<String>,
    pub operating_hours: Option<String>,
}

#[derive(Debug, Clone, Validate)]
pub struct NewEngine {
    #[validate(length(min = 1, message = "Serial number is required"))]
    pub serial_number: String,
    pub motor_number: Option<String>,
    #[validate(length(min = 1, message = "Engine model is required"))]
    pub model: String,
    pub sale_date: Option<DateTime<Utc>>,
    pub warranty_status: Option<String>,
    pub warranty_validity: Option<DateTime<Utc>>,
    #[validate(custom = "validate_non_negative_decimal")]
    pub hours: Decimal,
    #[validate(range(min = 1900, max = 2100))]
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Validate)]
pub struct CreateBoatRequest {
    pub client_id: i32,
    pub marina_id: Option<i32>,
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Hull id is required"))]
    pub hull_id: String,
    pub usage_type: Option<String>,
    pub model: Option<String>,
    pub engines: Vec<NewEngine>,
}

/// An engine in a boat update. Entries with an id edit that engine, entries
/// without one are added.
#[derive(Debug, Clone)]
pub struct EngineUpdate {
    pub id: Option<i32>,
    pub engine: NewEngine,
}

/// Partial boat update. `engines`, when present, is the complete engine list:
/// engines of the boat missing from it are removed.
#[derive(Debug, Clone, Default, Validate)]
pub struct UpdateBoatRequest {
    pub client_id: Option<i32>,
    pub marina_id: Option<i32>,
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: Option<String>,
    #[validate(length(min = 1, message = "Hull id is required"))]
    pub hull_id: Option<String>,
    pub usage_type: Option<String>,
    pub model: Option<String>,
    pub engines: Option<Vec<EngineUpdate>>,
}

#[derive(Debug, Clone, Validate)]
pub struct CreateManufacturerRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    pub manufacturer_type: ManufacturerType,
    pub models: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoatDetails {
    pub boat: boat::Model,
    pub engines: Vec<engine::Model>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ManufacturerDetails {
    pub manufacturer: manufacturer::Model,
    pub models: Vec<manufacturer_model::Model>,
}

/// Clients, marinas, boats with their engines, and the manufacturer catalogue.
#[derive(Clone)]
pub struct FleetService {
    db_pool: Arc<DbPool>,
}

impl FleetService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self, request))]
    pub async fn create_client(
        &self,
        tenant_id: i32,
        request: CreateClientRequest,
    ) -> Result<client::Model, ServiceError> {
        request.validate()?;
        let client = client::ActiveModel {
            tenant_id: Set(tenant_id),
            name: Set(request.name.trim().to_string()),
            document: Set(request.document.trim().to_string()),
            phone: Set(non_blank(request.phone)),
            email: Set(non_blank(request.email)),
            address: Set(non_blank(request.address)),
            client_type: Set(non_blank(request.client_type)),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?;
        info!(tenant_id, client_id = client.id, "Client created");
        Ok(client)
    }

    #[instrument(skip(self))]
    pub async fn get_client(&self, tenant_id: i32, client_id: i32) -> Result<client::Model, ServiceError> {
        client::Entity::find_by_id(client_id)
            .filter(client::Column::TenantId.eq(tenant_id))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Client", client_id))
    }

    #[instrument(skip(self))]
    pub async fn list_clients(&self, tenant_id: i32) -> Result<Vec<client::Model>, ServiceError> {
        Ok(client::Entity::find()
            .filter(client::Column::TenantId.eq(tenant_id))
            .order_by_asc(client::Column::Name)
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self, request))]
    pub async fn create_marina(
        &self,
        tenant_id: i32,
        request: CreateMarinaRequest,
    ) -> Result<marina::Model, ServiceError> {
        request.validate()?;
        let marina = marina::ActiveModel {
            tenant_id: Set(tenant_id),
            name: Set(request.name.trim().to_string()),
            address: Set(non_blank(request.address)),
            contact_name: Set(non_blank(request.contact_name)),
            phone: Set(non_blank(request.phone)),
            coordinates: Set(non_blank(request.coordinates)),
            operating_hours: Set(non_blank(request.operating_hours)),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?;
        info!(tenant_id, marina_id = marina.id, "Marina created");
        Ok(marina)
    }

    #[instrument(skip(self))]
    pub async fn list_marinas(&self, tenant_id: i32) -> Result<Vec<marina::Model>, ServiceError> {
        Ok(marina::Entity::find()
            .filter(marina::Column::TenantId.eq(tenant_id))
            .order_by_asc(marina::Column::Name)
            .all(&*self.db_pool)
            .await?)
    }

    /// Creates a boat together with its engines. Client and marina must belong
    /// to the tenant.
    #[instrument(skip(self, request), fields(client_id = request.client_id))]
    pub async fn create_boat(
        &self,
        tenant_id: i32,
        request: CreateBoatRequest,
    ) -> Result<BoatDetails, ServiceError> {
        request.validate()?;
        for engine in &request.engines {
            engine.validate()?;
        }

        let details = with_transaction(&*self.db_pool, move |txn| {
            Box::pin(async move { create_boat_tx(txn, tenant_id, request).await })
        })
        .await?;

        info!(
            tenant_id,
            boat_id = details.boat.id,
            engines = details.engines.len(),
            "Boat created"
        );
        Ok(details)
    }

    #[instrument(skip(self))]
    pub async fn get_boat(&self, tenant_id: i32, boat_id: i32) -> Result<BoatDetails, ServiceError> {
        let db = &*self.db_pool;
        let boat = boat::Entity::find_by_id(boat_id)
            .filter(boat::Column::TenantId.eq(tenant_id))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Boat", boat_id))?;
        let engines = boat
            .find_related(engine::Entity)
            .order_by_asc(engine::Column::Id)
            .all(db)
            .await?;
        Ok(BoatDetails { boat, engines })
    }

    #[instrument(skip(self))]
    pub async fn list_boats(
        &self,
        tenant_id: i32,
        client_id: Option<i32>,
    ) -> Result<Vec<BoatDetails>, ServiceError> {
        let db = &*self.db_pool;
        let mut query = boat::Entity::find().filter(boat::Column::TenantId.eq(tenant_id));
        if let Some(client_id) = client_id {
            query = query.filter(boat::Column::ClientId.eq(client_id));
        }
        let boats = query.order_by_asc(boat::Column::Name).all(db).await?;
        let engines = boats.load_many(engine::Entity, db).await?;

        Ok(boats
            .into_iter()
            .zip(engines)
            .map(|(boat, mut engines)| {
                engines.sort_by_key(|e| e.id);
                BoatDetails { boat, engines }
            })
            .collect())
    }

    /// Updates boat fields and, when an engine list is given, syncs the boat's
    /// engines to it. Engines referenced by service orders cannot be removed.
    #[instrument(skip(self, request))]
    pub async fn update_boat(
        &self,
        tenant_id: i32,
        boat_id: i32,
        request: UpdateBoatRequest,
    ) -> Result<BoatDetails, ServiceError> {
        request.validate()?;
        for update in request.engines.iter().flatten() {
            update.engine.validate()?;
        }

        let details = with_transaction(&*self.db_pool, move |txn| {
            Box::pin(async move { update_boat_tx(txn, tenant_id, boat_id, request).await })
        })
        .await?;

        info!(
            tenant_id,
            boat_id,
            engines = details.engines.len(),
            "Boat updated"
        );
        Ok(details)
    }

    /// Deletes a boat and its engines. Boats with service history are kept.
    #[instrument(skip(self))]
    pub async fn delete_boat(&self, tenant_id: i32, boat_id: i32) -> Result<(), ServiceError> {
        with_transaction(&*self.db_pool, move |txn| {
            Box::pin(async move { delete_boat_tx(txn, tenant_id, boat_id).await })
        })
        .await?;
        info!(tenant_id, boat_id, "Boat deleted");
        Ok(())
    }

    #[instrument(skip(self, request))]
    pub async fn create_manufacturer(
        &self,
        tenant_id: i32,
        request: CreateManufacturerRequest,
    ) -> Result<ManufacturerDetails, ServiceError> {
        request.validate()?;
        with_transaction(&*self.db_pool, move |txn| {
            Box::pin(async move { create_manufacturer_tx(txn, tenant_id, request).await })
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn list_manufacturers(
        &self,
        tenant_id: i32,
        manufacturer_type: Option<ManufacturerType>,
    ) -> Result<Vec<ManufacturerDetails>, ServiceError> {
        let db = &*self.db_pool;
        let mut query =
            manufacturer::Entity::find().filter(manufacturer::Column::TenantId.eq(tenant_id));
        if let Some(kind) = manufacturer_type {
            query = query.filter(manufacturer::Column::ManufacturerType.eq(kind));
        }
        let manufacturers = query.order_by_asc(manufacturer::Column::Name).all(db).await?;
        let models = manufacturers.load_many(manufacturer_model::Entity, db).await?;

        Ok(manufacturers
            .into_iter()
            .zip(models)
            .map(|(manufacturer, mut models)| {
                models.sort_by(|a, b| a.name.cmp(&b.name));
                ManufacturerDetails {
                    manufacturer,
                    models,
                }
            })
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn add_model(
        &self,
        tenant_id: i32,
        manufacturer_id: i32,
        name: &str,
    ) -> Result<manufacturer_model::Model, ServiceError> {
        let name = non_blank(Some(name.to_string()))
            .ok_or_else(|| ServiceError::ValidationError("Model name is required".to_string()))?;
        let db = &*self.db_pool;
        let manufacturer = find_manufacturer(db, tenant_id, manufacturer_id).await?;
        let model = manufacturer_model::ActiveModel {
            manufacturer_id: Set(manufacturer.id),
            name: Set(name),
            ..Default::default()
        }
        .insert(db)
        .await?;
        info!(tenant_id, manufacturer_id, model_id = model.id, "Model added");
        Ok(model)
    }

    /// Deletes one model. The model is only visible through a manufacturer of
    /// the caller's tenant.
    #[instrument(skip(self))]
    pub async fn delete_model(&self, tenant_id: i32, model_id: i32) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let (model, manufacturer) = manufacturer_model::Entity::find_by_id(model_id)
            .find_also_related(manufacturer::Entity)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Model", model_id))?;
        if manufacturer.map(|m| m.tenant_id) != Some(tenant_id) {
            return Err(ServiceError::not_found("Model", model_id));
        }
        model.delete(db).await?;
        info!(tenant_id, model_id, "Model deleted");
        Ok(())
    }

    /// Deletes a manufacturer and its models.
    #[instrument(skip(self))]
    pub async fn delete_manufacturer(
        &self,
        tenant_id: i32,
        manufacturer_id: i32,
    ) -> Result<(), ServiceError> {
        with_transaction(&*self.db_pool, move |txn| {
            Box::pin(async move {
                let manufacturer = find_manufacturer(txn, tenant_id, manufacturer_id).await?;
                manufacturer_model::Entity::delete_many()
                    .filter(manufacturer_model::Column::ManufacturerId.eq(manufacturer.id))
                    .exec(txn)
                    .await?;
                manufacturer.delete(txn).await?;
                Ok::<_, ServiceError>(())
            })
        })
        .await
    }
}

async fn create_boat_tx(
    txn: &DatabaseTransaction,
    tenant_id: i32,
    request: CreateBoatRequest,
) -> Result<BoatDetails, ServiceError> {
    ensure_client(txn, tenant_id, request.client_id).await?;
    if let Some(marina_id) = request.marina_id {
        ensure_marina(txn, tenant_id, marina_id).await?;
    }

    let boat = boat::ActiveModel {
        tenant_id: Set(tenant_id),
        client_id: Set(request.client_id),
        marina_id: Set(request.marina_id),
        name: Set(request.name.trim().to_string()),
        hull_id: Set(request.hull_id.trim().to_string()),
        usage_type: Set(non_blank(request.usage_type)),
        model: Set(non_blank(request.model)),
        ..Default::default()
    }
    .insert(txn)
    .await?;

    let mut engines = Vec::with_capacity(request.engines.len());
    for new_engine in request.engines {
        let mut active = engine::ActiveModel {
            tenant_id: Set(tenant_id),
            boat_id: Set(boat.id),
            ..Default::default()
        };
        apply_engine_fields(&mut active, new_engine);
        engines.push(active.insert(txn).await?);
    }

    Ok(BoatDetails { boat, engines })
}

async fn update_boat_tx(
    txn: &DatabaseTransaction,
    tenant_id: i32,
    boat_id: i32,
    request: UpdateBoatRequest,
) -> Result<BoatDetails, ServiceError> {
    let boat = boat::Entity::find_by_id(boat_id)
        .filter(boat::Column::TenantId.eq(tenant_id))
        .one(txn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Boat", boat_id))?;

    let mut active: boat::ActiveModel = boat.clone().into();
    if let Some(client_id) = request.client_id {
        ensure_client(txn, tenant_id, client_id).await?;
        active.client_id = Set(client_id);
    }
    if let Some(marina_id) = request.marina_id {
        ensure_marina(txn, tenant_id, marina_id).await?;
        active.marina_id = Set(Some(marina_id));
    }
    if let Some(name) = request.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(hull_id) = request.hull_id {
        active.hull_id = Set(hull_id.trim().to_string());
    }
    if request.usage_type.is_some() {
        active.usage_type = Set(non_blank(request.usage_type));
    }
    if request.model.is_some() {
        active.model = Set(non_blank(request.model));
    }
    let boat = active.update(txn).await?;

    if let Some(updates) = request.engines {
        sync_engines(txn, &boat, updates).await?;
    }

    let engines = boat
        .find_related(engine::Entity)
        .order_by_asc(engine::Column::Id)
        .all(txn)
        .await?;
    Ok(BoatDetails { boat, engines })
}

async fn sync_engines(
    txn: &DatabaseTransaction,
    boat: &boat::Model,
    updates: Vec<EngineUpdate>,
) -> Result<(), ServiceError> {
    let existing = boat.find_related(engine::Entity).all(txn).await?;
    let kept: HashSet<i32> = updates.iter().filter_map(|u| u.id).collect();

    for stale in existing.iter().filter(|e| !kept.contains(&e.id)) {
        let orders = service_order::Entity::find()
            .filter(service_order::Column::EngineId.eq(stale.id))
            .count(txn)
            .await?;
        if orders > 0 {
            return Err(ServiceError::Conflict(format!(
                "Engine {} is referenced by {} service orders and cannot be removed",
                stale.id, orders
            )));
        }
        stale.clone().delete(txn).await?;
    }

    for update in updates {
        match update.id {
            Some(engine_id) => {
                let current = existing
                    .iter()
                    .find(|e| e.id == engine_id)
                    .ok_or_else(|| ServiceError::not_found("Engine", engine_id))?;
                let mut active: engine::ActiveModel = current.clone().into();
                apply_engine_fields(&mut active, update.engine);
                active.update(txn).await?;
            }
            None => {
                let mut active = engine::ActiveModel {
                    tenant_id: Set(boat.tenant_id),
                    boat_id: Set(boat.id),
                    ..Default::default()
                };
                apply_engine_fields(&mut active, update.engine);
                active.insert(txn).await?;
            }
        }
    }
    Ok(())
}

fn apply_engine_fields(active: &mut engine::ActiveModel, engine: NewEngine) {
    active.serial_number = Set(engine.serial_number.trim().to_string());
    active.motor_number = Set(non_blank(engine.motor_number));
    active.model = Set(engine.model.trim().to_string());
    active.sale_date = Set(engine.sale_date);
    active.warranty_status = Set(non_blank(engine.warranty_status));
    active.warranty_validity = Set(engine.warranty_validity);
    active.hours = Set(engine.hours);
    active.year = Set(engine.year);
}

async fn ensure_client<C: ConnectionTrait>(
    db: &C,
    tenant_id: i32,
    client_id: i32,
) -> Result<(), ServiceError> {
    client::Entity::find_by_id(client_id)
        .filter(client::Column::TenantId.eq(tenant_id))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Client", client_id))?;
    Ok(())
}

async fn ensure_marina<C: ConnectionTrait>(
    db: &C,
    tenant_id: i32,
    marina_id: i32,
) -> Result<(), ServiceError> {
    marina::Entity::find_by_id(marina_id)
        .filter(marina::Column::TenantId.eq(tenant_id))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Marina", marina_id))?;
    Ok(())
}

async fn find_manufacturer<C: ConnectionTrait>(
    db: &C,
    tenant_id: i32,
    manufacturer_id: i32,
) -> Result<manufacturer::Model, ServiceError> {
    manufacturer::Entity::find_by_id(manufacturer_id)
        .filter(manufacturer::Column::TenantId.eq(tenant_id))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Manufacturer", manufacturer_id))
}

async fn delete_boat_tx(
    txn: &DatabaseTransaction,
    tenant_id: i32,
    boat_id: i32,
) -> Result<(), ServiceError> {
    let boat = boat::Entity::find_by_id(boat_id)
        .filter(boat::Column::TenantId.eq(tenant_id))
        .one(txn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Boat", boat_id))?;

    let orders = service_order::Entity::find()
        .filter(service_order::Column::BoatId.eq(boat.id))
        .count(txn)
        .await?;
    if orders > 0 {
        return Err(ServiceError::Conflict(format!(
            "Boat {} has {} service orders and cannot be deleted",
            boat_id, orders
        )));
    }

    engine::Entity::delete_many()
        .filter(engine::Column::BoatId.eq(boat.id))
        .exec(txn)
        .await?;
    boat.delete(txn).await?;
    Ok(())
}

async fn create_manufacturer_tx(
    txn: &DatabaseTransaction,
    tenant_id: i32,
    request: CreateManufacturerRequest,
) -> Result<ManufacturerDetails, ServiceError> {
    let manufacturer = manufacturer::ActiveModel {
        tenant_id: Set(tenant_id),
        name: Set(request.name.trim().to_string()),
        manufacturer_type: Set(request.manufacturer_type),
        ..Default::default()
    }
    .insert(txn)
    .await?;

    let mut models = Vec::new();
    for name in request.models.into_iter().filter_map(|m| non_blank(Some(m))) {
        models.push(
            manufacturer_model::ActiveModel {
                manufacturer_id: Set(manufacturer.id),
                name: Set(name),
                ..Default::default()
            }
            .insert(txn)
            .await?,
        );
    }

    Ok(ManufacturerDetails {
        manufacturer,
        models,
    })
}
