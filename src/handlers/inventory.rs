use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::auth::TenantContext;
use crate::entities::{
    invoice, part,
    stock_movement::{self, MovementType},
};
use crate::services::inventory::{
    CreatePartRequest, InvoiceLine, RecordMovementRequest, RegisterInvoiceRequest,
    UpdatePartRequest,
};
use crate::{errors::ServiceError, ApiResponse, ApiResult, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePartBody {
    pub sku: String,
    pub barcode: Option<String>,
    pub name: String,
    #[serde(default)]
    pub quantity: Decimal,
    #[serde(default)]
    pub cost: Decimal,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub min_stock: Decimal,
    pub location: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePartBody {
    pub name: Option<String>,
    pub barcode: Option<String>,
    pub cost: Option<Decimal>,
    pub price: Option<Decimal>,
    pub min_stock: Option<Decimal>,
    pub location: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMovementBody {
    pub part_id: i32,
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    pub quantity: Decimal,
    pub description: String,
    pub reference_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLineBody {
    pub part_id: i32,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInvoiceBody {
    pub number: String,
    pub supplier: String,
    pub date: Option<DateTime<Utc>>,
    pub xml_key: Option<String>,
    pub lines: Vec<InvoiceLineBody>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PartListQuery {
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementListQuery {
    pub part_id: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartResponse {
    pub id: i32,
    pub sku: String,
    pub barcode: Option<String>,
    pub name: String,
    pub quantity: Decimal,
    pub cost: Decimal,
    pub price: Decimal,
    pub min_stock: Decimal,
    pub location: Option<String>,
    pub below_minimum: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<part::Model> for PartResponse {
    fn from(part: part::Model) -> Self {
        let below_minimum = part.is_below_minimum();
        Self {
            id: part.id,
            sku: part.sku,
            barcode: part.barcode,
            name: part.name,
            quantity: part.quantity,
            cost: part.cost,
            price: part.price,
            min_stock: part.min_stock,
            location: part.location,
            below_minimum,
            created_at: part.created_at,
            updated_at: part.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockMovementResponse {
    pub id: i32,
    pub part_id: i32,
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    pub quantity: Decimal,
    pub date: DateTime<Utc>,
    pub description: String,
    pub reference_id: Option<String>,
    pub actor: String,
}

impl From<stock_movement::Model> for StockMovementResponse {
    fn from(movement: stock_movement::Model) -> Self {
        Self {
            id: movement.id,
            part_id: movement.part_id,
            movement_type: movement.movement_type,
            quantity: movement.quantity,
            date: movement.date,
            description: movement.description,
            reference_id: movement.reference_id,
            actor: movement.actor,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceResponse {
    pub id: i32,
    pub number: String,
    pub supplier: String,
    pub date: DateTime<Utc>,
    pub total_value: Decimal,
    pub xml_key: Option<String>,
    pub imported_at: DateTime<Utc>,
}

impl From<invoice::Model> for InvoiceResponse {
    fn from(invoice: invoice::Model) -> Self {
        Self {
            id: invoice.id,
            number: invoice.number,
            supplier: invoice.supplier,
            date: invoice.date,
            total_value: invoice.total_value,
            xml_key: invoice.xml_key,
            imported_at: invoice.imported_at,
        }
    }
}

/// Parts catalogue, filtered by SKU, barcode or name
pub async fn list_parts(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Query(query): Query<PartListQuery>,
) -> ApiResult<Vec<PartResponse>> {
    let parts = state
        .services
        .inventory
        .list_parts(ctx.tenant_id, query.search)
        .await?;
    Ok(Json(ApiResponse::success(
        parts.into_iter().map(Into::into).collect(),
    )))
}

pub async fn list_low_stock(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
) -> ApiResult<Vec<PartResponse>> {
    let parts = state.services.inventory.list_low_stock(ctx.tenant_id).await?;
    Ok(Json(ApiResponse::success(
        parts.into_iter().map(Into::into).collect(),
    )))
}

pub async fn create_part(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Json(body): Json<CreatePartBody>,
) -> Result<(StatusCode, Json<ApiResponse<PartResponse>>), ServiceError> {
    let request = CreatePartRequest {
        sku: body.sku,
        barcode: body.barcode,
        name: body.name,
        quantity: body.quantity,
        cost: body.cost,
        price: body.price,
        min_stock: body.min_stock,
        location: body.location,
    };

    let part = state
        .services
        .inventory
        .create_part(ctx.tenant_id, &ctx.actor, request)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(part.into()))))
}

pub async fn get_part(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<i32>,
) -> ApiResult<PartResponse> {
    let part = state.services.inventory.get_part(ctx.tenant_id, id).await?;
    Ok(Json(ApiResponse::success(part.into())))
}

/// Edit catalogue fields. Quantity only changes through stock movements.
pub async fn update_part(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<i32>,
    Json(body): Json<UpdatePartBody>,
) -> ApiResult<PartResponse> {
    let request = UpdatePartRequest {
        name: body.name,
        barcode: body.barcode,
        cost: body.cost,
        price: body.price,
        min_stock: body.min_stock,
        location: body.location,
    };

    let part = state
        .services
        .inventory
        .update_part(ctx.tenant_id, id, request)
        .await?;
    Ok(Json(ApiResponse::success(part.into())))
}

pub async fn list_movements(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Query(query): Query<MovementListQuery>,
) -> ApiResult<Vec<StockMovementResponse>> {
    let movements = state
        .services
        .inventory
        .list_movements(ctx.tenant_id, query.part_id)
        .await?;
    Ok(Json(ApiResponse::success(
        movements.into_iter().map(Into::into).collect(),
    )))
}

/// Manual adjustment or return. Consumption is only written by order completion.
pub async fn record_movement(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Json(body): Json<RecordMovementBody>,
) -> Result<(StatusCode, Json<ApiResponse<StockMovementResponse>>), ServiceError> {
    let request = RecordMovementRequest {
        part_id: body.part_id,
        movement_type: body.movement_type,
        quantity: body.quantity,
        description: body.description,
        reference_id: body.reference_id,
    };

    let movement = state
        .services
        .inventory
        .record_movement(ctx.tenant_id, &ctx.actor, request)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(movement.into())),
    ))
}

pub async fn list_invoices(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
) -> ApiResult<Vec<InvoiceResponse>> {
    let invoices = state.services.inventory.list_invoices(ctx.tenant_id).await?;
    Ok(Json(ApiResponse::success(
        invoices.into_iter().map(Into::into).collect(),
    )))
}

/// Register a supplier invoice; each line adds stock at its unit cost
pub async fn register_invoice(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Json(body): Json<RegisterInvoiceBody>,
) -> Result<(StatusCode, Json<ApiResponse<InvoiceResponse>>), ServiceError> {
    let request = RegisterInvoiceRequest {
        number: body.number,
        supplier: body.supplier,
        date: body.date.unwrap_or_else(Utc::now),
        xml_key: body.xml_key,
        lines: body
            .lines
            .into_iter()
            .map(|line| InvoiceLine {
                part_id: line.part_id,
                quantity: line.quantity,
                unit_cost: line.unit_cost,
            })
            .collect(),
    };

    let invoice = state
        .services
        .inventory
        .register_invoice(ctx.tenant_id, &ctx.actor, request)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(invoice.into()))))
}
