use crate::{
    common::{non_blank, validate_positive_decimal},
    db::DbPool,
    entities::{
        company_info,
        financial_transaction::{self, TransactionStatus, TransactionType},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TryIntoModel,
};
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

#[derive(Debug, Clone, Validate)]
pub struct CreateTransactionRequest {
    pub transaction_type: TransactionType,
    #[validate(length(min = 1, message = "Category is required"))]
    pub category: String,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    #[validate(custom = "validate_positive_decimal")]
    pub amount: Decimal,
    pub date: Option<DateTime<Utc>>,
    pub status: Option<TransactionStatus>,
    pub order_id: Option<i32>,
    pub document_number: Option<String>,
}

#[derive(Debug, Clone, Validate)]
pub struct CompanyInfoRequest {
    #[validate(length(min = 1, message = "Company name is required"))]
    pub company_name: String,
    pub trade_name: Option<String>,
    #[validate(length(equal = 14, message = "CNPJ must have 14 digits"))]
    pub cnpj: Option<String>,
    pub ie: Option<String>,
    pub street: Option<String>,
    pub number: Option<String>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    #[validate(length(equal = 2, message = "State must be a two-letter code"))]
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub crt: Option<String>,
    pub environment: Option<String>,
}

/// Receivables, payables and the shop's fiscal identity.
#[derive(Clone)]
pub struct FinanceService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl FinanceService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Ledger entries, newest first, optionally for one order.
    #[instrument(skip(self))]
    pub async fn list_transactions(
        &self,
        tenant_id: i32,
        order_id: Option<i32>,
    ) -> Result<Vec<financial_transaction::Model>, ServiceError> {
        let mut query = financial_transaction::Entity::find()
            .filter(financial_transaction::Column::TenantId.eq(tenant_id));
        if let Some(order_id) = order_id {
            query = query.filter(financial_transaction::Column::OrderId.eq(order_id));
        }
        Ok(query
            .order_by_desc(financial_transaction::Column::Date)
            .order_by_desc(financial_transaction::Column::Id)
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self, request), fields(amount = %request.amount))]
    pub async fn create_transaction(
        &self,
        tenant_id: i32,
        request: CreateTransactionRequest,
    ) -> Result<financial_transaction::Model, ServiceError> {
        request.validate()?;
        if request.status == Some(TransactionStatus::Canceled) {
            return Err(ServiceError::ValidationError(
                "A transaction cannot be created as CANCELED".to_string(),
            ));
        }

        let transaction = financial_transaction::ActiveModel {
            tenant_id: Set(tenant_id),
            transaction_type: Set(request.transaction_type),
            category: Set(request.category.trim().to_string()),
            description: Set(request.description.trim().to_string()),
            amount: Set(request.amount),
            date: Set(request.date.unwrap_or_else(Utc::now)),
            status: Set(request.status.unwrap_or(TransactionStatus::Pending)),
            order_id: Set(request.order_id),
            document_number: Set(non_blank(request.document_number)),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?;

        info!(tenant_id, transaction_id = transaction.id, "Transaction created");
        self.event_sender
            .send_or_log(Event::TransactionCreated {
                tenant_id,
                transaction_id: transaction.id,
                amount: transaction.amount,
            })
            .await;
        Ok(transaction)
    }

    /// Settles or cancels a pending entry. Settled and canceled entries are
    /// final.
    #[instrument(skip(self))]
    pub async fn update_transaction_status(
        &self,
        tenant_id: i32,
        transaction_id: i32,
        status: TransactionStatus,
    ) -> Result<financial_transaction::Model, ServiceError> {
        let existing = financial_transaction::Entity::find_by_id(transaction_id)
            .filter(financial_transaction::Column::TenantId.eq(tenant_id))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Transaction", transaction_id))?;

        if existing.status != TransactionStatus::Pending || status == TransactionStatus::Pending {
            return Err(ServiceError::InvalidState(format!(
                "Transaction {} cannot move from {} to {}",
                transaction_id, existing.status, status
            )));
        }

        let mut active: financial_transaction::ActiveModel = existing.into();
        active.status = Set(status);
        let updated = active.update(&*self.db_pool).await?;
        info!(tenant_id, transaction_id, status = %status, "Transaction status updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn get_company_info(
        &self,
        tenant_id: i32,
    ) -> Result<Option<company_info::Model>, ServiceError> {
        Ok(company_info::Entity::find()
            .filter(company_info::Column::TenantId.eq(tenant_id))
            .one(&*self.db_pool)
            .await?)
    }

    /// Creates or replaces the tenant's fiscal identity.
    #[instrument(skip(self, request))]
    pub async fn upsert_company_info(
        &self,
        tenant_id: i32,
        request: CompanyInfoRequest,
    ) -> Result<company_info::Model, ServiceError> {
        request.validate()?;
        let existing = self.get_company_info(tenant_id).await?;

        let mut active = match existing {
            Some(model) => company_info::ActiveModel::from(model),
            None => company_info::ActiveModel {
                tenant_id: Set(tenant_id),
                ..Default::default()
            },
        };
        active.company_name = Set(request.company_name.trim().to_string());
        active.trade_name = Set(non_blank(request.trade_name));
        active.cnpj = Set(non_blank(request.cnpj));
        active.ie = Set(non_blank(request.ie));
        active.street = Set(non_blank(request.street));
        active.number = Set(non_blank(request.number));
        active.neighborhood = Set(non_blank(request.neighborhood));
        active.city = Set(non_blank(request.city));
        active.state = Set(non_blank(request.state).map(|s| s.to_uppercase()));
        active.zip_code = Set(non_blank(request.zip_code));
        active.crt = Set(non_blank(request.crt));
        active.environment =
            Set(non_blank(request.environment).unwrap_or_else(|| "homologation".to_string()));

        let saved = active.save(&*self.db_pool).await?;
        let model = saved.try_into_model()?;
        info!(tenant_id, "Company info saved");
        Ok(model)
    }
}
