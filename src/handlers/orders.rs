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
    order_note,
    service_item::{self, ServiceItemType},
    service_order::{self, ServiceOrderStatus},
};
use crate::services::orders::{
    AddNoteRequest, CreateServiceOrderRequest, NewServiceItem, OrderDetails,
    UpdateServiceOrderRequest,
};
use crate::{errors::ServiceError, ApiResponse, ApiResult, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderBody {
    pub boat_id: i32,
    pub engine_id: Option<i32>,
    pub description: String,
    pub diagnosis: Option<String>,
    pub requester: Option<String>,
    pub technician_name: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub estimated_duration: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderBody {
    pub description: Option<String>,
    pub diagnosis: Option<String>,
    pub requester: Option<String>,
    pub technician_name: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub estimated_duration: Option<i32>,
    pub status: Option<ServiceOrderStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemBody {
    #[serde(rename = "type")]
    pub item_type: ServiceItemType,
    pub description: String,
    pub part_id: Option<i32>,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub unit_cost: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddNoteBody {
    pub text: String,
    pub user_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceItemResponse {
    pub id: i32,
    #[serde(rename = "type")]
    pub item_type: ServiceItemType,
    pub description: String,
    pub part_id: Option<i32>,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    pub unit_price: Decimal,
    pub total: Decimal,
}

impl From<service_item::Model> for ServiceItemResponse {
    fn from(item: service_item::Model) -> Self {
        Self {
            id: item.id,
            item_type: item.item_type,
            description: item.description,
            part_id: item.part_id,
            quantity: item.quantity,
            unit_cost: item.unit_cost,
            unit_price: item.unit_price,
            total: item.total,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderNoteResponse {
    pub id: i32,
    pub text: String,
    pub user_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<order_note::Model> for OrderNoteResponse {
    fn from(note: order_note::Model) -> Self {
        Self {
            id: note.id,
            text: note.text,
            user_name: note.user_name,
            created_at: note.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOrderResponse {
    pub id: i32,
    pub boat_id: i32,
    pub engine_id: Option<i32>,
    pub description: String,
    pub diagnosis: Option<String>,
    pub status: ServiceOrderStatus,
    pub total_value: Decimal,
    pub requester: Option<String>,
    pub technician_name: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub estimated_duration: Option<i32>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<ServiceItemResponse>,
    pub notes: Vec<OrderNoteResponse>,
}

impl From<OrderDetails> for ServiceOrderResponse {
    fn from(details: OrderDetails) -> Self {
        let service_order::Model {
            id,
            boat_id,
            engine_id,
            description,
            diagnosis,
            status,
            total_value,
            requester,
            technician_name,
            scheduled_at,
            estimated_duration,
            completed_at,
            created_at,
            updated_at,
            ..
        } = details.order;

        Self {
            id,
            boat_id,
            engine_id,
            description,
            diagnosis,
            status,
            total_value,
            requester,
            technician_name,
            scheduled_at,
            estimated_duration,
            completed_at,
            created_at,
            updated_at,
            items: details.items.into_iter().map(Into::into).collect(),
            notes: details.notes.into_iter().map(Into::into).collect(),
        }
    }
}

fn parse_status_filter(raw: Option<&str>) -> Result<Option<ServiceOrderStatus>, ServiceError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(value) => value
            .parse::<ServiceOrderStatus>()
            .map(Some)
            .map_err(|_| ServiceError::ValidationError(format!("Unknown order status: {value}"))),
    }
}

/// List the tenant's service orders, newest first, optionally by status
pub async fn list_orders(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Query(query): Query<OrderListQuery>,
) -> ApiResult<Vec<ServiceOrderResponse>> {
    let status = parse_status_filter(query.status.as_deref())?;
    let orders = state
        .services
        .orders
        .list_orders(ctx.tenant_id, status)
        .await?;

    Ok(Json(ApiResponse::success(
        orders.into_iter().map(Into::into).collect(),
    )))
}

/// Open a new service order in PENDING with a zero total
pub async fn create_order(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Json(body): Json<CreateOrderBody>,
) -> Result<(StatusCode, Json<ApiResponse<ServiceOrderResponse>>), ServiceError> {
    let request = CreateServiceOrderRequest {
        boat_id: body.boat_id,
        engine_id: body.engine_id,
        description: body.description,
        diagnosis: body.diagnosis,
        requester: body.requester,
        technician_name: body.technician_name,
        scheduled_at: body.scheduled_at,
        estimated_duration: body.estimated_duration,
    };

    let order = state
        .services
        .orders
        .create_order(ctx.tenant_id, request)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(order.into()))))
}

pub async fn get_order(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<i32>,
) -> ApiResult<ServiceOrderResponse> {
    let order = state.services.orders.get_order(ctx.tenant_id, id).await?;
    Ok(Json(ApiResponse::success(order.into())))
}

pub async fn update_order(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<i32>,
    Json(body): Json<UpdateOrderBody>,
) -> ApiResult<ServiceOrderResponse> {
    let request = UpdateServiceOrderRequest {
        description: body.description,
        diagnosis: body.diagnosis,
        requester: body.requester,
        technician_name: body.technician_name,
        scheduled_at: body.scheduled_at,
        estimated_duration: body.estimated_duration,
        status: body.status,
    };

    let order = state
        .services
        .orders
        .update_order(ctx.tenant_id, id, request)
        .await?;
    Ok(Json(ApiResponse::success(order.into())))
}

pub async fn delete_order(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ServiceError> {
    state.services.orders.delete_order(ctx.tenant_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Append a PART or LABOR line; the order total is recomputed in the same transaction
pub async fn add_item(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<i32>,
    Json(body): Json<AddItemBody>,
) -> Result<(StatusCode, Json<ApiResponse<ServiceOrderResponse>>), ServiceError> {
    let item = NewServiceItem {
        item_type: body.item_type,
        description: body.description,
        part_id: body.part_id,
        quantity: body.quantity,
        unit_price: body.unit_price,
        unit_cost: body.unit_cost,
    };

    let order = state
        .services
        .orders
        .add_item(ctx.tenant_id, id, item)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(order.into()))))
}

pub async fn remove_item(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path((id, item_id)): Path<(i32, i32)>,
) -> ApiResult<ServiceOrderResponse> {
    let order = state
        .services
        .orders
        .remove_item(ctx.tenant_id, id, item_id)
        .await?;
    Ok(Json(ApiResponse::success(order.into())))
}

pub async fn add_note(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<i32>,
    Json(body): Json<AddNoteBody>,
) -> Result<(StatusCode, Json<ApiResponse<ServiceOrderResponse>>), ServiceError> {
    let request = AddNoteRequest {
        text: body.text,
        user_name: body.user_name,
    };

    let order = state
        .services
        .orders
        .add_note(ctx.tenant_id, &ctx.actor, id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(order.into()))))
}

/// Complete an order: consume stock, write movements and book the receivable
pub async fn complete_order(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<i32>,
) -> ApiResult<ServiceOrderResponse> {
    let order = state
        .services
        .orders
        .complete_order(ctx.tenant_id, &ctx.actor, id)
        .await?;
    Ok(Json(ApiResponse::success(order.into())))
}
