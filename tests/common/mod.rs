#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request},
    response::Response,
    Router,
};
use marine_service_api::{
    app_router,
    config::AppConfig,
    db,
    entities::{boat, client, part, tenant, user, user::UserRole},
    events::{self, EventSender},
    services::{
        fleet::CreateBoatRequest,
        fleet::CreateClientRequest,
        fleet::NewEngine,
        inventory::CreatePartRequest,
        orders::{CreateServiceOrderRequest, OrderDetails},
        tenancy::{CreateTenantRequest, RegisterUserRequest},
    },
    AppState,
};
use rust_decimal::Decimal;
use sea_orm::{ConnectionTrait, DatabaseBackend as DbBackend, Statement};
use serde_json::Value;
use tower::ServiceExt;

pub const TEST_JWT_SECRET: &str = "k7Qp2xWv9LmZr4TbYc8NdHs3FgJa6Ue1";
pub const TEST_PASSWORD: &str = "harbour-master-42";

/// A seeded tenant with one admin and one technician.
pub struct SeededTenant {
    pub tenant: tenant::Model,
    pub admin: user::Model,
    pub technician: user::Model,
    pub admin_token: String,
    pub technician_token: String,
}

/// Application state plus router backed by a private in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub shop_a: SeededTenant,
    pub shop_b: SeededTenant,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            TEST_JWT_SECRET.to_string(),
            3600,
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        // One connection: every connection to `sqlite::memory:` is its own database.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.db_idle_timeout_secs = 3600;
        cfg.cors_allow_any_origin = true;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let (event_sender, event_rx) = EventSender::channel(256);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let state = AppState::new(Arc::new(pool), cfg, event_sender);
        let router = app_router(state.clone());

        let shop_a = seed_tenant(&state, "Porto Azul Nautica").await;
        let shop_b = seed_tenant(&state, "Baia Norte Marine").await;

        Self {
            router,
            state,
            shop_a,
            shop_b,
            _event_task: event_task,
        }
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Run raw SQL against the test database.
    pub async fn execute_sql(&self, sql: &str) {
        self.state
            .db
            .execute(Statement::from_string(DbBackend::Sqlite, sql.to_string()))
            .await
            .expect("raw sql failed");
    }

    pub async fn seed_boat(&self, tenant_id: i32, hull_id: &str) -> (client::Model, boat::Model) {
        let fleet = &self.state.services.fleet;
        let owner = fleet
            .create_client(
                tenant_id,
                CreateClientRequest {
                    name: format!("Owner of {hull_id}"),
                    document: format!("doc-{hull_id}"),
                    phone: None,
                    email: None,
                    address: None,
                    client_type: Some("PF".to_string()),
                },
            )
            .await
            .expect("seed client");

        let details = fleet
            .create_boat(
                tenant_id,
                CreateBoatRequest {
                    client_id: owner.id,
                    marina_id: None,
                    name: format!("Boat {hull_id}"),
                    hull_id: hull_id.to_string(),
                    usage_type: Some("LEISURE".to_string()),
                    model: Some("Focker 242".to_string()),
                    engines: vec![NewEngine {
                        serial_number: format!("SN-{hull_id}"),
                        motor_number: None,
                        model: "Mercury 250".to_string(),
                        sale_date: None,
                        warranty_status: None,
                        warranty_validity: None,
                        hours: Decimal::ZERO,
                        year: Some(2022),
                    }],
                },
            )
            .await
            .expect("seed boat");

        (owner, details.boat)
    }

    pub async fn seed_part(
        &self,
        tenant_id: i32,
        sku: &str,
        quantity: Decimal,
        price: Decimal,
    ) -> part::Model {
        self.state
            .services
            .inventory
            .create_part(
                tenant_id,
                "seed",
                CreatePartRequest {
                    sku: sku.to_string(),
                    barcode: None,
                    name: format!("Part {sku}"),
                    quantity,
                    cost: price / Decimal::from(2),
                    price,
                    min_stock: Decimal::ONE,
                    location: Some("A-1".to_string()),
                },
            )
            .await
            .expect("seed part")
    }

    pub async fn seed_order(&self, tenant_id: i32, boat_id: i32) -> OrderDetails {
        self.state
            .services
            .orders
            .create_order(
                tenant_id,
                CreateServiceOrderRequest {
                    boat_id,
                    engine_id: None,
                    description: "100h revision".to_string(),
                    diagnosis: None,
                    requester: Some("Owner".to_string()),
                    technician_name: None,
                    scheduled_at: None,
                    estimated_duration: Some(4),
                },
            )
            .await
            .expect("seed order")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

async fn seed_tenant(state: &AppState, name: &str) -> SeededTenant {
    let tenancy = &state.services.tenancy;
    let tenant = tenancy
        .create_tenant(CreateTenantRequest {
            name: name.to_string(),
            document: None,
            subdomain: None,
        })
        .await
        .expect("seed tenant");

    let slug: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase();

    let admin = tenancy
        .register_user(
            tenant.id,
            RegisterUserRequest {
                name: format!("{name} Admin"),
                email: format!("admin@{slug}.test"),
                password: TEST_PASSWORD.to_string(),
                role: UserRole::Admin,
                client_id: None,
            },
        )
        .await
        .expect("seed admin");

    let technician = tenancy
        .register_user(
            tenant.id,
            RegisterUserRequest {
                name: format!("{name} Technician"),
                email: format!("tech@{slug}.test"),
                password: TEST_PASSWORD.to_string(),
                role: UserRole::Technician,
                client_id: None,
            },
        )
        .await
        .expect("seed technician");

    let admin_token = state.auth.issue_token(&admin).expect("admin token");
    let technician_token = state.auth.issue_token(&technician).expect("technician token");

    SeededTenant {
        tenant,
        admin,
        technician,
        admin_token,
        technician_token,
    }
}

/// Reads a response body as JSON.
pub async fn read_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    serde_json::from_slice(&bytes).expect("response body is not json")
}

/// Parses a decimal that was serialized as a JSON string or number.
pub fn json_decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().expect("decimal string"),
        Value::Number(n) => n.to_string().parse().expect("decimal number"),
        other => panic!("expected decimal, got {other}"),
    }
}
