use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::TenantContext;
use crate::entities::user::{self, UserRole};
use crate::services::tenancy::RegisterUserRequest;
use crate::{errors::ServiceError, ApiResponse, ApiResult, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserBody {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
    pub client_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetActiveBody {
    pub is_active: bool,
}

/// A user without the password hash
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub client_id: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            role: u.role,
            client_id: u.client_id,
            is_active: u.is_active,
            created_at: u.created_at,
        }
    }
}

pub async fn list_users(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
) -> ApiResult<Vec<UserResponse>> {
    let users = state.services.tenancy.list_users(ctx.tenant_id).await?;
    Ok(Json(ApiResponse::success(
        users.into_iter().map(Into::into).collect(),
    )))
}

/// Register a user in the caller's tenant
pub async fn register_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Json(body): Json<RegisterUserBody>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>), ServiceError> {
    let request = RegisterUserRequest {
        name: body.name,
        email: body.email,
        password: body.password,
        role: body.role,
        client_id: body.client_id,
    };

    let user = state
        .services
        .tenancy
        .register_user(ctx.tenant_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(user.into()))))
}

pub async fn set_user_active(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
    Path(id): Path<i32>,
    Json(body): Json<SetActiveBody>,
) -> ApiResult<UserResponse> {
    if id == ctx.user_id && !body.is_active {
        return Err(ServiceError::ValidationError(
            "You cannot deactivate your own account".to_string(),
        ));
    }

    let user = state
        .services
        .tenancy
        .set_user_active(ctx.tenant_id, id, body.is_active)
        .await?;
    Ok(Json(ApiResponse::success(user.into())))
}
