use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::auth::TenantContext;
use crate::entities::{client, engine, manufacturer::ManufacturerType, manufacturer_model, marina};
use crate::services::fleet::{
    BoatDetails, CreateBoatRequest, CreateClientRequest, CreateManufacturerRequest,
    CreateMarinaRequest, EngineUpdate, ManufacturerDetails, NewEngine, UpdateBoatRequest,
};
use crate::{errors::ServiceError, ApiResponse, ApiResult, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClientBody {
    pub name: String,
    pub document: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    #[serde(rename = "type")]
    pub client_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMarinaBody {
    pub name: String,
    pub address: Option<String>,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub coordinates: Option<String>,
    pub operating_hours: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineBody {
    pub serial_number: String,
    pub motor_number: Option<String>,
    pub model: String,
    pub sale_date: Option<DateTime<Utc>>,
    pub warranty_status: Option<String>,
    pub warranty_validity: Option<DateTime<Utc>>,
    #[serde(default)]
    pub hours: Decimal,
    pub year: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBoatBody {
    pub client_id: i32,
    pub marina_id: Option<i32>,
    pub name: String,
    pub hull_id: String,
    pub usage_type: Option<String>,
    pub model: Option<String>,
    #[serde(default)]
    pub engines: Vec<EngineBody>,
}

impl From<EngineBody> for NewEngine {
    fn from(e: EngineBody) -> Self {
        NewEngine {
            serial_number: e.serial_number,
            motor_number: e.motor_number,
            model: e.model,
            sale_date: e.sale_date,
            warranty_status: e.warranty_status,
            warranty_validity: e.warranty_validity,
            hours: e.hours,
            year: e.year,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineUpdateBody {
    pub id: Option<i32>,
    #[serde(flatten)]
    pub engine: EngineBody,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBoatBody {
    pub client_id: Option<i32>,
    pub marina_id: Option<i32>,
    pub name: Option<String>,
    pub hull_id: Option<String>,
    pub usage_type: Option<String>,
    pub model: Option<String>,
    pub engines: Option<Vec<EngineUpdateBody>>,
}

#[derive(Debug, Deserialize)]
pub struct AddModelBody {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateManufacturerBody {
    pub name: String,
    #[serde(rename = "type")]
    pub manufacturer_type: ManufacturerType,
    #[serde(default)]
    pub models: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoatListQuery {
    pub client_id: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ManufacturerListQuery {
    #[serde(rename = "type")]
    pub manufacturer_type: Option<ManufacturerType>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientResponse {
    pub id: i32,
    pub name: String,
    pub document: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    #[serde(rename = "type")]
    pub client_type: Option<String>,
}

impl From<client::Model> for ClientResponse {
    fn from(c: client::Model) -> Self {
        Self {
            id: c.id,
            name: c.name,
            document: c.document,
            phone: c.phone,
            email: c.email,
            address: c.address,
            client_type: c.client_type,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarinaResponse {
    pub id: i32,
    pub name: String,
    pub address: Option<String>,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub coordinates: Option<String>,
    pub operating_hours: Option<String>,
}

impl From<marina::Model> for MarinaResponse {
    fn from(m: marina::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            address: m.address,
            contact_name: m.contact_name,
            phone: m.phone,
            coordinates: m.coordinates,
            operating_hours: m.operating_hours,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineResponse {
    pub id: i32,
    pub serial_number: String,
    pub motor_number: Option<String>,
    pub model: String,
    pub sale_date: Option<DateTime<Utc>>,
    pub warranty_status: Option<String>,
    pub warranty_validity: Option<DateTime<Utc>>,
    pub hours: Decimal,
    pub year: Option<i32>,
}

impl From<engine::Model> for EngineResponse {
    fn from(e: engine::Model) -> Self {
        Self {
            id: e.id,
            serial_number: e.serial_number,
            motor_number: e.motor_number,
            model: e.model,
            sale_date: e.sale_date,
            warranty_status: e.warranty_status,
            warranty_validity: e.warranty_validity,
            hours: e.hours,
            year: e.year,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoatResponse {
    pub id: i32,
    pub client_id: i32,
    pub marina_id: Option<i32>,
    pub name: String,
    pub hull_id: String,
    pub usage_type: Option<String>,
    pub model: Option<String>,
    pub engines: Vec<EngineResponse>,
}

impl From<BoatDetails> for BoatResponse {
    fn from(details: BoatDetails) -> Self {
        let boat = details.boat;
        Self {
            id: boat.id,
            client_id: boat.client_id,
            marina_id: boat.marina_id,
            name: boat.name,
            hull_id: boat.hull_id,
            usage_type: boat.usage_type,
            model: boat.model,
            engines: details.engines.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManufacturerResponse {
    pub id: i32,
    pub name: String,
    #[serde(rename = "type")]
    pub manufacturer_type: ManufacturerType,
    pub models: Vec<String>,
}

impl From<ManufacturerDetails> for ManufacturerResponse {
    fn from(details: ManufacturerDetails) -> Self {
        Self {
            id: details.manufacturer.id,
            name: details.manufacturer.name,
            manufacturer_type: details.manufacturer.manufacturer_type,
            models: details.models.into_iter().map(|m| m.name).collect(),
        }
    }
}

pub async fn list_clients(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
) -> ApiResult<Vec<ClientResponse>> {
    let clients = state.services.fleet.list_clients(ctx.tenant_id).await?;
    Ok(Json(ApiResponse::success(
        clients.into_iter().map(Into::into).collect(),
    )))
}

pub async fn get_client(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<i32>,
) -> ApiResult<ClientResponse> {
    let client = state.services.fleet.get_client(ctx.tenant_id, id).await?;
    Ok(Json(ApiResponse::success(client.into())))
}

pub async fn create_client(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Json(body): Json<CreateClientBody>,
) -> Result<(StatusCode, Json<ApiResponse<ClientResponse>>), ServiceError> {
    let request = CreateClientRequest {
        name: body.name,
        document: body.document,
        phone: body.phone,
        email: body.email,
        address: body.address,
        client_type: body.client_type,
    };
    let client = state
        .services
        .fleet
        .create_client(ctx.tenant_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(client.into()))))
}

pub async fn list_marinas(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
) -> ApiResult<Vec<MarinaResponse>> {
    let marinas = state.services.fleet.list_marinas(ctx.tenant_id).await?;
    Ok(Json(ApiResponse::success(
        marinas.into_iter().map(Into::into).collect(),
    )))
}

pub async fn create_marina(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Json(body): Json<CreateMarinaBody>,
) -> Result<(StatusCode, Json<ApiResponse<MarinaResponse>>), ServiceError> {
    let request = CreateMarinaRequest {
        name: body.name,
        address: body.address,
        contact_name: body.contact_name,
        phone: body.phone,
        coordinates: body.coordinates,
        operating_hours: body.operating_hours,
    };
    let marina = state
        .services
        .fleet
        .create_marina(ctx.tenant_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(marina.into()))))
}

pub async fn list_boats(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Query(query): Query<BoatListQuery>,
) -> ApiResult<Vec<BoatResponse>> {
    let boats = state
        .services
        .fleet
        .list_boats(ctx.tenant_id, query.client_id)
        .await?;
    Ok(Json(ApiResponse::success(
        boats.into_iter().map(Into::into).collect(),
    )))
}

pub async fn get_boat(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<i32>,
) -> ApiResult<BoatResponse> {
    let boat = state.services.fleet.get_boat(ctx.tenant_id, id).await?;
    Ok(Json(ApiResponse::success(boat.into())))
}

/// Register a boat together with its engines
pub async fn create_boat(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Json(body): Json<CreateBoatBody>,
) -> Result<(StatusCode, Json<ApiResponse<BoatResponse>>), ServiceError> {
    let request = CreateBoatRequest {
        client_id: body.client_id,
        marina_id: body.marina_id,
        name: body.name,
        hull_id: body.hull_id,
        usage_type: body.usage_type,
        model: body.model,
        engines: body.engines.into_iter().map(Into::into).collect(),
    };
    let boat = state
        .services
        .fleet
        .create_boat(ctx.tenant_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(boat.into()))))
}

/// Update a boat; an `engines` list replaces the boat's engine set
pub async fn update_boat(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<i32>,
    Json(body): Json<UpdateBoatBody>,
) -> ApiResult<BoatResponse> {
    let request = UpdateBoatRequest {
        client_id: body.client_id,
        marina_id: body.marina_id,
        name: body.name,
        hull_id: body.hull_id,
        usage_type: body.usage_type,
        model: body.model,
        engines: body.engines.map(|engines| {
            engines
                .into_iter()
                .map(|e| EngineUpdate {
                    id: e.id,
                    engine: e.engine.into(),
                })
                .collect()
        }),
    };
    let boat = state
        .services
        .fleet
        .update_boat(ctx.tenant_id, id, request)
        .await?;
    Ok(Json(ApiResponse::success(boat.into())))
}

pub async fn delete_boat(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ServiceError> {
    state.services.fleet.delete_boat(ctx.tenant_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_manufacturers(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Query(query): Query<ManufacturerListQuery>,
) -> ApiResult<Vec<ManufacturerResponse>> {
    let manufacturers = state
        .services
        .fleet
        .list_manufacturers(ctx.tenant_id, query.manufacturer_type)
        .await?;
    Ok(Json(ApiResponse::success(
        manufacturers.into_iter().map(Into::into).collect(),
    )))
}

pub async fn create_manufacturer(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Json(body): Json<CreateManufacturerBody>,
) -> Result<(StatusCode, Json<ApiResponse<ManufacturerResponse>>), ServiceError> {
    let request = CreateManufacturerRequest {
        name: body.name,
        manufacturer_type: body.manufacturer_type,
        models: body.models,
    };
    let manufacturer = state
        .services
        .fleet
        .create_manufacturer(ctx.tenant_id, request)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(manufacturer.into())),
    ))
}

pub async fn delete_manufacturer(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ServiceError> {
    state
        .services
        .fleet
        .delete_manufacturer(ctx.tenant_id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelResponse {
    pub id: i32,
    pub manufacturer_id: i32,
    pub name: String,
}

impl From<manufacturer_model::Model> for ModelResponse {
    fn from(m: manufacturer_model::Model) -> Self {
        Self {
            id: m.id,
            manufacturer_id: m.manufacturer_id,
            name: m.name,
        }
    }
}

pub async fn add_model(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<i32>,
    Json(body): Json<AddModelBody>,
) -> Result<(StatusCode, Json<ApiResponse<ModelResponse>>), ServiceError> {
    let model = state
        .services
        .fleet
        .add_model(ctx.tenant_id, id, &body.name)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(model.into()))))
}

pub async fn delete_model(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ServiceError> {
    state.services.fleet.delete_model(ctx.tenant_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
