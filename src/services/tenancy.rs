use crate::{
    auth::{hash_password, normalize_email, MIN_PASSWORD_LENGTH},
    common::non_blank,
    db::DbPool,
    entities::{
        tenant,
        user::{self, UserRole},
    },
    errors::ServiceError,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use std::sync::Arc;
use tracing::{info, instrument};
use validator::{Validate, ValidationError};

fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        let mut err = ValidationError::new("password_too_short");
        err.message = Some(format!("must have at least {} characters", MIN_PASSWORD_LENGTH).into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Validate)]
pub struct CreateTenantRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    pub document: Option<String>,
    pub subdomain: Option<String>,
}

#[derive(Debug, Clone, Validate)]
pub struct RegisterUserRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(custom = "validate_password_strength")]
    pub password: String,
    pub role: UserRole,
    pub client_id: Option<i32>,
}

/// Tenants and their users.
#[derive(Clone)]
pub struct TenancyService {
    db_pool: Arc<DbPool>,
}

impl TenancyService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_tenant(&self, request: CreateTenantRequest) -> Result<tenant::Model, ServiceError> {
        request.validate()?;
        let db = &*self.db_pool;
        let name = request.name.trim().to_string();

        let taken = tenant::Entity::find()
            .filter(tenant::Column::Name.eq(name.as_str()))
            .one(db)
            .await?;
        if taken.is_some() {
            return Err(ServiceError::Conflict(format!("Tenant {} already exists", name)));
        }

        let tenant = tenant::ActiveModel {
            name: Set(name),
            document: Set(non_blank(request.document)),
            subdomain: Set(non_blank(request.subdomain).map(|s| s.to_lowercase())),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(db)
        .await?;

        info!(tenant_id = tenant.id, "Tenant created");
        Ok(tenant)
    }

    /// Activates or deactivates a tenant. Users of a deactivated tenant are
    /// rejected on their next request.
    #[instrument(skip(self))]
    pub async fn set_tenant_active(
        &self,
        tenant_id: i32,
        is_active: bool,
    ) -> Result<tenant::Model, ServiceError> {
        let db = &*self.db_pool;
        let existing = tenant::Entity::find_by_id(tenant_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Tenant", tenant_id))?;

        let mut active: tenant::ActiveModel = existing.into();
        active.is_active = Set(is_active);
        let tenant = active.update(db).await?;
        info!(tenant_id, is_active, "Tenant activation changed");
        Ok(tenant)
    }

    /// Creates a user in the tenant. Emails are unique per tenant.
    #[instrument(skip(self, request), fields(role = request.role.as_str()))]
    pub async fn register_user(
        &self,
        tenant_id: i32,
        request: RegisterUserRequest,
    ) -> Result<user::Model, ServiceError> {
        request.validate()?;
        let db = &*self.db_pool;
        let email = normalize_email(&request.email);

        let taken = user::Entity::find()
            .filter(user::Column::TenantId.eq(tenant_id))
            .filter(user::Column::Email.eq(email.as_str()))
            .one(db)
            .await?;
        if taken.is_some() {
            return Err(ServiceError::Conflict(format!(
                "User with email {} already exists",
                email
            )));
        }

        let password_hash =
            hash_password(&request.password).map_err(|e| ServiceError::HashError(e.to_string()))?;

        let user = user::ActiveModel {
            tenant_id: Set(tenant_id),
            name: Set(request.name.trim().to_string()),
            email: Set(email),
            password_hash: Set(password_hash),
            role: Set(request.role),
            client_id: Set(request.client_id),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(db)
        .await?;

        info!(tenant_id, user_id = user.id, "User registered");
        Ok(user)
    }

    #[instrument(skip(self))]
    pub async fn list_users(&self, tenant_id: i32) -> Result<Vec<user::Model>, ServiceError> {
        Ok(user::Entity::find()
            .filter(user::Column::TenantId.eq(tenant_id))
            .order_by_asc(user::Column::Name)
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn get_user(&self, tenant_id: i32, user_id: i32) -> Result<user::Model, ServiceError> {
        user::Entity::find_by_id(user_id)
            .filter(user::Column::TenantId.eq(tenant_id))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", user_id))
    }

    #[instrument(skip(self))]
    pub async fn set_user_active(
        &self,
        tenant_id: i32,
        user_id: i32,
        is_active: bool,
    ) -> Result<user::Model, ServiceError> {
        let db = &*self.db_pool;
        let existing = user::Entity::find_by_id(user_id)
            .filter(user::Column::TenantId.eq(tenant_id))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", user_id))?;

        let mut active: user::ActiveModel = existing.into();
        active.is_active = Set(is_active);
        Ok(active.update(db).await?)
    }
}
