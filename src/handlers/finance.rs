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
    company_info,
    financial_transaction::{self, TransactionStatus, TransactionType},
};
use crate::services::finance::{CompanyInfoRequest, CreateTransactionRequest};
use crate::{errors::ServiceError, ApiResponse, ApiResult, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionBody {
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub category: String,
    pub description: String,
    pub amount: Decimal,
    pub date: Option<DateTime<Utc>>,
    pub status: Option<TransactionStatus>,
    pub order_id: Option<i32>,
    pub document_number: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusBody {
    pub status: TransactionStatus,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionListQuery {
    pub order_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyInfoBody {
    pub company_name: String,
    pub trade_name: Option<String>,
    pub cnpj: Option<String>,
    pub ie: Option<String>,
    pub street: Option<String>,
    pub number: Option<String>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub crt: Option<String>,
    pub environment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub id: i32,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub category: String,
    pub description: String,
    pub amount: Decimal,
    pub date: DateTime<Utc>,
    pub status: TransactionStatus,
    pub order_id: Option<i32>,
    pub document_number: Option<String>,
}

impl From<financial_transaction::Model> for TransactionResponse {
    fn from(tx: financial_transaction::Model) -> Self {
        Self {
            id: tx.id,
            transaction_type: tx.transaction_type,
            category: tx.category,
            description: tx.description,
            amount: tx.amount,
            date: tx.date,
            status: tx.status,
            order_id: tx.order_id,
            document_number: tx.document_number,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyInfoResponse {
    pub company_name: String,
    pub trade_name: Option<String>,
    pub cnpj: Option<String>,
    pub ie: Option<String>,
    pub street: Option<String>,
    pub number: Option<String>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub crt: Option<String>,
    pub environment: String,
}

impl From<company_info::Model> for CompanyInfoResponse {
    fn from(info: company_info::Model) -> Self {
        Self {
            company_name: info.company_name,
            trade_name: info.trade_name,
            cnpj: info.cnpj,
            ie: info.ie,
            street: info.street,
            number: info.number,
            neighborhood: info.neighborhood,
            city: info.city,
            state: info.state,
            zip_code: info.zip_code,
            crt: info.crt,
            environment: info.environment,
        }
    }
}

pub async fn list_transactions(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Query(query): Query<TransactionListQuery>,
) -> ApiResult<Vec<TransactionResponse>> {
    let transactions = state
        .services
        .finance
        .list_transactions(ctx.tenant_id, query.order_id)
        .await?;
    Ok(Json(ApiResponse::success(
        transactions.into_iter().map(Into::into).collect(),
    )))
}

pub async fn create_transaction(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Json(body): Json<CreateTransactionBody>,
) -> Result<(StatusCode, Json<ApiResponse<TransactionResponse>>), ServiceError> {
    let request = CreateTransactionRequest {
        transaction_type: body.transaction_type,
        category: body.category,
        description: body.description,
        amount: body.amount,
        date: body.date,
        status: body.status,
        order_id: body.order_id,
        document_number: body.document_number,
    };

    let tx = state
        .services
        .finance
        .create_transaction(ctx.tenant_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(tx.into()))))
}

/// Settle (PAID) or cancel a pending transaction
pub async fn update_transaction_status(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<i32>,
    Json(body): Json<UpdateStatusBody>,
) -> ApiResult<TransactionResponse> {
    let tx = state
        .services
        .finance
        .update_transaction_status(ctx.tenant_id, id, body.status)
        .await?;
    Ok(Json(ApiResponse::success(tx.into())))
}

pub async fn get_company_info(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
) -> ApiResult<CompanyInfoResponse> {
    let info = state
        .services
        .finance
        .get_company_info(ctx.tenant_id)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound("Company information has not been set up".to_string())
        })?;
    Ok(Json(ApiResponse::success(info.into())))
}

pub async fn put_company_info(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Json(body): Json<CompanyInfoBody>,
) -> ApiResult<CompanyInfoResponse> {
    let request = CompanyInfoRequest {
        company_name: body.company_name,
        trade_name: body.trade_name,
        cnpj: body.cnpj,
        ie: body.ie,
        street: body.street,
        number: body.number,
        neighborhood: body.neighborhood,
        city: body.city,
        state: body.state,
        zip_code: body.zip_code,
        crt: body.crt,
        environment: body.environment,
    };

    let info = state
        .services
        .finance
        .upsert_company_info(ctx.tenant_id, request)
        .await?;
    Ok(Json(ApiResponse::success(info.into())))
}
