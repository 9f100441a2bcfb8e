/*!
 * # Authentication and tenant resolution
 *
 * Bearer JWTs are validated and then resolved against the database on every
 * request: the user must still exist in the tenant named by the token, be
 * active, and belong to an active tenant. Any failure rejects the request with
 * 401; there is no fallback tenant.
 *
 * The resolved [`TenantContext`] is stored in the request extensions and taken
 * by every handler.
 */

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::entities::user::{self, UserRole};
use crate::entities::tenant;

mod password;

pub use password::{hash_password, verify_password, MIN_PASSWORD_LENGTH};

/// Claim structure for JWT tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,    // User id
    pub tenant_id: i32, // Tenant the user belongs to
    pub role: String,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
}

/// The authenticated caller, resolved against the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext {
    pub tenant_id: i32,
    pub user_id: i32,
    /// Display name recorded on audit rows (stock movements, notes)
    pub actor: String,
    pub role: UserRole,
}

impl TenantContext {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_audience: String,
    pub jwt_issuer: String,
    pub token_expiration: Duration,
}

impl AuthConfig {
    pub fn new(
        jwt_secret: String,
        jwt_audience: String,
        jwt_issuer: String,
        token_expiration: Duration,
    ) -> Self {
        Self {
            jwt_secret,
            jwt_audience,
            jwt_issuer,
            token_expiration,
        }
    }
}

impl From<&AppConfig> for AuthConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self::new(
            cfg.jwt_secret.clone(),
            cfg.auth_audience.clone(),
            cfg.auth_issuer.clone(),
            Duration::from_secs(cfg.jwt_expiration),
        )
    }
}

/// Successful login payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub user_id: i32,
    pub tenant_id: i32,
    pub name: String,
    pub role: UserRole,
}

#[derive(Debug, Clone)]
pub struct AuthService {
    pub config: AuthConfig,
    pub db: Arc<DatabaseConnection>,
}

impl AuthService {
    pub fn new(config: AuthConfig, db: Arc<DatabaseConnection>) -> Self {
        Self { config, db }
    }

    /// Issues an access token for a user.
    pub fn issue_token(&self, user: &user::Model) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user.id.to_string(),
            tenant_id: user.tenant_id,
            role: user.role.as_str().to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now,
            exp: now + self.config.token_expiration.as_secs() as i64,
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))
    }

    /// Verifies signature, expiry, issuer and audience.
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.config.jwt_issuer.as_str()]);
        validation.set_audience(&[self.config.jwt_audience.as_str()]);

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })
    }

    /// Resolves validated claims to a live user and tenant.
    pub async fn resolve_tenant_context(&self, claims: &Claims) -> Result<TenantContext, AuthError> {
        let user_id: i32 = claims.sub.parse().map_err(|_| AuthError::InvalidToken)?;

        let user = user::Entity::find_by_id(user_id)
            .filter(user::Column::TenantId.eq(claims.tenant_id))
            .one(&*self.db)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?
            .ok_or_else(|| {
                warn!(user_id, tenant_id = claims.tenant_id, "Token subject not found in tenant");
                AuthError::InvalidToken
            })?;

        if !user.is_active {
            return Err(AuthError::InactiveAccount);
        }

        self.ensure_tenant_active(user.tenant_id).await?;

        Ok(TenantContext {
            tenant_id: user.tenant_id,
            user_id: user.id,
            actor: user.name,
            role: user.role,
        })
    }

    /// Validates a bearer token and resolves it in one step.
    pub async fn authenticate(&self, token: &str) -> Result<TenantContext, AuthError> {
        let claims = self.validate_token(token)?;
        self.resolve_tenant_context(&claims).await
    }

    /// Email and password login. `tenant_id` disambiguates an email registered
    /// in more than one tenant.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        tenant_id: Option<i32>,
    ) -> Result<LoginResponse, AuthError> {
        let mut query = user::Entity::find().filter(user::Column::Email.eq(normalize_email(email)));
        if let Some(tenant_id) = tenant_id {
            query = query.filter(user::Column::TenantId.eq(tenant_id));
        }

        let mut candidates = query
            .all(&*self.db)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        if candidates.len() != 1 {
            debug!(matches = candidates.len(), "Login did not resolve to a single user");
            return Err(AuthError::InvalidCredentials);
        }
        let user = candidates.remove(0);

        if !verify_password(password, &user.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }
        if !user.is_active {
            return Err(AuthError::InactiveAccount);
        }
        self.ensure_tenant_active(user.tenant_id).await?;

        let access_token = self.issue_token(&user)?;
        Ok(LoginResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.config.token_expiration.as_secs(),
            user_id: user.id,
            tenant_id: user.tenant_id,
            name: user.name,
            role: user.role,
        })
    }

    async fn ensure_tenant_active(&self, tenant_id: i32) -> Result<(), AuthError> {
        let tenant = tenant::Entity::find_by_id(tenant_id)
            .one(&*self.db)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        match tenant {
            Some(t) if t.is_active => Ok(()),
            Some(_) => {
                warn!(tenant_id, "Rejecting request for deactivated tenant");
                Err(AuthError::InactiveAccount)
            }
            None => Err(AuthError::InvalidToken),
        }
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing authentication")]
    MissingAuth,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Account or tenant is inactive")]
    InactiveAccount,

    #[error("Token creation failed: {0}")]
    TokenCreation(String),

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AuthError {
    fn parts(&self) -> (StatusCode, &'static str, &'static str) {
        match self {
            Self::MissingAuth => (
                StatusCode::UNAUTHORIZED,
                "AUTH_MISSING",
                "Authentication required",
            ),
            Self::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "AUTH_INVALID_CREDENTIALS",
                "Invalid credentials",
            ),
            Self::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "AUTH_INVALID_TOKEN",
                "Invalid authentication token",
            ),
            Self::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                "AUTH_TOKEN_EXPIRED",
                "Token has expired",
            ),
            Self::InactiveAccount => (
                StatusCode::UNAUTHORIZED,
                "AUTH_INACTIVE",
                "Account or tenant is inactive",
            ),
            Self::InsufficientPermissions => (
                StatusCode::FORBIDDEN,
                "AUTH_INSUFFICIENT_PERMISSIONS",
                "Insufficient permissions",
            ),
            Self::TokenCreation(_) | Self::DatabaseError(_) | Self::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "AUTH_INTERNAL_ERROR",
                "Internal server error",
            ),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        if status.is_server_error() {
            tracing::error!(error = %self, "authentication failed with internal error");
        }

        let body = Json(serde_json::json!({
            "error": {
                "code": code,
                "message": message,
            },
            "request_id": crate::tracing::current_request_id().map(|r| r.as_str().to_string()),
        }));

        (status, body).into_response()
    }
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuth)?
        .to_str()
        .map_err(|_| AuthError::InvalidToken)?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::InvalidToken)
}

/// Authentication middleware. Expects an `Arc<AuthService>` in the request
/// extensions.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let auth_service = match request.extensions().get::<Arc<AuthService>>() {
        Some(service) => service.clone(),
        None => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Authentication service not available",
            )
                .into_response();
        }
    };

    let token = match bearer_token(request.headers()) {
        Ok(token) => token.to_string(),
        Err(e) => return e.into_response(),
    };

    match auth_service.authenticate(&token).await {
        Ok(ctx) => {
            tracing::Span::current().record("tenant_id", ctx.tenant_id);
            request.extensions_mut().insert(ctx);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Role middleware; must run after [`auth_middleware`].
pub async fn role_middleware(
    State(required_role): State<UserRole>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let ctx = request
        .extensions()
        .get::<TenantContext>()
        .ok_or(AuthError::MissingAuth)?;

    if !ctx.role.satisfies(required_role) {
        return Err(AuthError::InsufficientPermissions);
    }

    Ok(next.run(request).await)
}

pub trait AuthRouterExt {
    fn with_auth(self) -> Self;
    fn with_role(self, role: UserRole) -> Self;
}

impl<S> AuthRouterExt for axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self) -> Self {
        self.layer(axum::middleware::from_fn(auth_middleware))
    }

    fn with_role(self, role: UserRole) -> Self {
        self.layer(axum::middleware::from_fn_with_state(role, role_middleware))
            .with_auth()
    }
}
