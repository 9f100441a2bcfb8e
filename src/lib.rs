//! Marine Service API
//!
//! Multi-tenant backend for marine service shops: service orders with part and
//! labor lines, parts inventory with an audited stock ledger, fleet records and
//! receivables.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod commands;
pub mod common;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod middleware_helpers;
pub mod migrator;
pub mod services;
pub mod tracing;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{Json, Response},
    routing::{delete, get, patch, post},
    Router,
};
use chrono::Utc;
use http::HeaderValue;
use serde::Serialize;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
};

use crate::auth::{AuthConfig, AuthRouterExt, AuthService};
use crate::entities::user::UserRole;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<db::DbPool>,
    pub config: config::AppConfig,
    pub event_sender: Arc<events::EventSender>,
    pub auth: Arc<AuthService>,
    pub services: handlers::AppServices,
}

impl AppState {
    /// Wires the services and the auth service around one pool and event channel.
    pub fn new(db: Arc<db::DbPool>, config: config::AppConfig, event_sender: events::EventSender) -> Self {
        let event_sender = Arc::new(event_sender);
        let auth = Arc::new(AuthService::new(AuthConfig::from(&config), db.clone()));
        let services =
            handlers::AppServices::new(db.clone(), event_sender.clone(), config.low_stock_alerts);

        Self {
            db,
            config,
            event_sender,
            auth,
            services,
        }
    }
}

// Common response wrappers
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn validation_errors(errors: Vec<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some("Validation failed".to_string()),
            errors: Some(errors),
            meta: Some(ResponseMeta::capture()),
        }
    }
}

#[cfg(test)]
mod response_tests {
    use super::ApiResponse;
    use chrono::DateTime;

    #[tokio::test]
    async fn success_response_includes_metadata() {
        let response = crate::tracing::scope_request_id(
            crate::tracing::RequestId::new("meta-success"),
            async { ApiResponse::success("ok") },
        )
        .await;

        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-success"));
        DateTime::parse_from_rfc3339(&meta.timestamp).expect("timestamp should parse");
    }

    #[tokio::test]
    async fn validation_errors_response_includes_metadata() {
        let response = crate::tracing::scope_request_id(
            crate::tracing::RequestId::new("meta-validation"),
            async { ApiResponse::<()>::validation_errors(vec!["missing".into()]) },
        )
        .await;

        assert!(!response.success);
        assert_eq!(response.errors.as_deref(), Some(&["missing".to_string()][..]));
        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-validation"));
        DateTime::parse_from_rfc3339(&meta.timestamp).expect("timestamp should parse");
    }

    #[test]
    fn error_response_carries_metadata() {
        let response: ApiResponse<()> = ApiResponse::error("boom".to_string());
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], false);
        assert!(json["meta"].get("timestamp").is_some());
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

/// Routes mounted under `/api/v1`. Staff (technicians and admins) only;
/// user management and company settings are admin only.
pub fn api_v1_routes() -> Router<AppState> {
    let orders = Router::new()
        .route(
            "/orders",
            get(handlers::orders::list_orders).post(handlers::orders::create_order),
        )
        .route(
            "/orders/:id",
            get(handlers::orders::get_order)
                .put(handlers::orders::update_order)
                .delete(handlers::orders::delete_order),
        )
        .route("/orders/:id/items", post(handlers::orders::add_item))
        .route(
            "/orders/:id/items/:item_id",
            delete(handlers::orders::remove_item),
        )
        .route("/orders/:id/notes", post(handlers::orders::add_note))
        .route(
            "/orders/:id/complete",
            post(handlers::orders::complete_order),
        )
        .with_role(UserRole::Technician);

    let inventory = Router::new()
        .route(
            "/parts",
            get(handlers::inventory::list_parts).post(handlers::inventory::create_part),
        )
        .route("/parts/low-stock", get(handlers::inventory::list_low_stock))
        .route(
            "/parts/:id",
            get(handlers::inventory::get_part).put(handlers::inventory::update_part),
        )
        .route(
            "/stock-movements",
            get(handlers::inventory::list_movements).post(handlers::inventory::record_movement),
        )
        .route(
            "/invoices",
            get(handlers::inventory::list_invoices).post(handlers::inventory::register_invoice),
        )
        .with_role(UserRole::Technician);

    let finance = Router::new()
        .route(
            "/transactions",
            get(handlers::finance::list_transactions)
                .post(handlers::finance::create_transaction),
        )
        .route(
            "/transactions/:id/status",
            patch(handlers::finance::update_transaction_status),
        )
        .route("/company-info", get(handlers::finance::get_company_info))
        .with_role(UserRole::Technician);

    let fleet = Router::new()
        .route(
            "/clients",
            get(handlers::fleet::list_clients).post(handlers::fleet::create_client),
        )
        .route("/clients/:id", get(handlers::fleet::get_client))
        .route(
            "/marinas",
            get(handlers::fleet::list_marinas).post(handlers::fleet::create_marina),
        )
        .route(
            "/boats",
            get(handlers::fleet::list_boats).post(handlers::fleet::create_boat),
        )
        .route(
            "/boats/:id",
            get(handlers::fleet::get_boat)
                .put(handlers::fleet::update_boat)
                .delete(handlers::fleet::delete_boat),
        )
        .route(
            "/manufacturers",
            get(handlers::fleet::list_manufacturers).post(handlers::fleet::create_manufacturer),
        )
        .route(
            "/manufacturers/:id",
            delete(handlers::fleet::delete_manufacturer),
        )
        .route(
            "/manufacturers/:id/models",
            post(handlers::fleet::add_model),
        )
        .route("/models/:id", delete(handlers::fleet::delete_model))
        .with_role(UserRole::Technician);

    let admin = Router::new()
        .route(
            "/users",
            get(handlers::users::list_users).post(handlers::users::register_user),
        )
        .route("/users/:id/active", patch(handlers::users::set_user_active))
        .route(
            "/company-info",
            axum::routing::put(handlers::finance::put_company_info),
        )
        .with_role(UserRole::Admin);

    Router::new()
        .merge(orders)
        .merge(inventory)
        .merge(finance)
        .merge(fleet)
        .merge(admin)
}

/// Builds the CORS layer from configuration. Explicit origins win; otherwise
/// development (or an explicit opt-in) gets a permissive layer and everything
/// else gets no cross-origin access.
pub fn cors_layer(cfg: &config::AppConfig) -> CorsLayer {
    let configured_origins: Option<Vec<HeaderValue>> = cfg
        .cors_allowed_origins
        .as_ref()
        .map(|raw| {
            raw.split(',')
                .filter_map(|origin| {
                    let trimmed = origin.trim();
                    if trimmed.is_empty() {
                        None
                    } else {
                        HeaderValue::from_str(trimmed).ok()
                    }
                })
                .collect::<Vec<_>>()
        })
        .filter(|origins| !origins.is_empty());

    if let Some(origins) = configured_origins {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    } else if cfg.should_allow_permissive_cors() {
        ::tracing::info!(
            "Using permissive CORS because explicit origins were not configured ({})",
            if cfg.is_development() {
                "development environment"
            } else {
                "explicit override enabled"
            }
        );
        CorsLayer::permissive()
    } else {
        ::tracing::error!(
            "Missing CORS configuration; set APP__CORS_ALLOWED_ORIGINS or APP__CORS_ALLOW_ANY_ORIGIN=true"
        );
        CorsLayer::new()
    }
}

async fn inject_auth_service(
    State(auth): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Response {
    request.extensions_mut().insert(auth);
    next.run(request).await
}

/// The full HTTP application: health, login and the versioned API, with
/// request ids, HTTP tracing, compression and CORS.
pub fn app_router(state: AppState) -> Router {
    let auth = state.auth.clone();
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/", get(|| async { "marine-service-api up" }))
        .merge(handlers::health::health_routes())
        .route("/auth/login", post(handlers::auth::login))
        .merge(Router::new().route("/auth/me", get(handlers::auth::me)).with_auth())
        .nest("/api/v1", api_v1_routes())
        .layer(crate::tracing::configure_http_tracing())
        .layer(CompressionLayer::new())
        .layer(cors)
        // AuthService must be in the extensions before auth middleware runs
        .layer(axum::middleware::from_fn_with_state(auth, inject_auth_service))
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id_middleware,
        ))
        .with_state(state)
}
