use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::{AuthError, AuthService, TenantContext};
use crate::handlers::users::UserResponse;
use crate::{ApiResponse, ApiResult, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub tenant_id: Option<i32>,
}

/// `POST /auth/login`. Exchanges email and password for a bearer token.
pub async fn login(
    Extension(auth): Extension<Arc<AuthService>>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AuthError> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(AuthError::InvalidCredentials);
    }

    match auth
        .login(&payload.email, &payload.password, payload.tenant_id)
        .await
    {
        Ok(response) => {
            info!(
                user_id = response.user_id,
                tenant_id = response.tenant_id,
                "User logged in"
            );
            Ok((StatusCode::OK, Json(response)))
        }
        Err(err) => {
            warn!(error = %err, "Login rejected");
            Err(err)
        }
    }
}

/// `GET /auth/me`. The user behind the bearer token.
pub async fn me(
    State(state): State<AppState>,
    Extension(ctx): Extension<TenantContext>,
) -> ApiResult<UserResponse> {
    let user = state
        .services
        .tenancy
        .get_user(ctx.tenant_id, ctx.user_id)
        .await?;
    Ok(Json(ApiResponse::success(user.into())))
}
