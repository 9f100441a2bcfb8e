mod common;

use assert_matches::assert_matches;
use axum::http::{Method, StatusCode};
use common::{read_json, TestApp};
use marine_service_api::{
    entities::{part, service_item::ServiceItemType, service_order::ServiceOrderStatus},
    errors::ServiceError,
    services::orders::{NewServiceItem, UpdateServiceOrderRequest},
};
use rust_decimal_macros::dec;
use sea_orm::EntityTrait;
use serde_json::json;

#[tokio::test]
async fn other_tenants_orders_behave_as_missing() {
    let app = TestApp::new().await;
    let owner = app.shop_a.tenant.id;
    let intruder = app.shop_b.tenant.id;
    let (_, boat) = app.seed_boat(owner, "HULL-ISO1").await;
    let order = app.seed_order(owner, boat.id).await;
    let order_id = order.order.id;
    let orders = &app.state.services.orders;

    assert_matches!(
        orders.get_order(intruder, order_id).await,
        Err(ServiceError::NotFound(_))
    );
    assert_matches!(
        orders.complete_order(intruder, "intruder", order_id).await,
        Err(ServiceError::NotFound(_))
    );
    assert_matches!(
        orders
            .add_item(
                intruder,
                order_id,
                NewServiceItem {
                    item_type: ServiceItemType::Labor,
                    description: "Sneaky".to_string(),
                    part_id: None,
                    quantity: dec!(1),
                    unit_price: dec!(1),
                    unit_cost: None,
                },
            )
            .await,
        Err(ServiceError::NotFound(_))
    );
    assert_matches!(
        orders
            .update_order(
                intruder,
                order_id,
                UpdateServiceOrderRequest {
                    status: Some(ServiceOrderStatus::Canceled),
                    ..Default::default()
                },
            )
            .await,
        Err(ServiceError::NotFound(_))
    );
    assert_matches!(
        orders.delete_order(intruder, order_id).await,
        Err(ServiceError::NotFound(_))
    );
    assert!(orders.list_orders(intruder, None).await.unwrap().is_empty());

    let untouched = orders.get_order(owner, order_id).await.unwrap();
    assert_eq!(untouched.order.status, ServiceOrderStatus::Pending);
    assert!(untouched.items.is_empty());
}

#[tokio::test]
async fn parts_of_another_tenant_cannot_be_put_on_an_order() {
    let app = TestApp::new().await;
    let owner = app.shop_a.tenant.id;
    let (_, boat) = app.seed_boat(owner, "HULL-ISO2").await;
    let order = app.seed_order(owner, boat.id).await;
    let foreign_part = app
        .seed_part(app.shop_b.tenant.id, "B-ONLY", dec!(3), dec!(10))
        .await;

    let err = app
        .state
        .services
        .orders
        .add_item(
            owner,
            order.order.id,
            NewServiceItem {
                item_type: ServiceItemType::Part,
                description: "Foreign part".to_string(),
                part_id: Some(foreign_part.id),
                quantity: dec!(1),
                unit_price: dec!(10),
                unit_cost: None,
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));

    let stored = part::Entity::find_by_id(foreign_part.id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.quantity, dec!(3));
}

#[tokio::test]
async fn orders_cannot_reference_another_tenants_boat() {
    let app = TestApp::new().await;
    let (_, foreign_boat) = app.seed_boat(app.shop_b.tenant.id, "HULL-ISO3").await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/orders",
            Some(json!({ "boatId": foreign_boat.id, "description": "Hijack" })),
            Some(&app.shop_a.technician_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn http_access_across_tenants_is_not_found() {
    let app = TestApp::new().await;
    let (_, boat) = app.seed_boat(app.shop_a.tenant.id, "HULL-ISO4").await;
    let order = app.seed_order(app.shop_a.tenant.id, boat.id).await;
    let uri = format!("/api/v1/orders/{}", order.order.id);
    let token_b = app.shop_b.technician_token.clone();

    let read = app.request(Method::GET, &uri, None, Some(&token_b)).await;
    assert_eq!(read.status(), StatusCode::NOT_FOUND);
    let body = read_json(read).await;
    assert!(body["message"]
        .as_str()
        .unwrap_or_default()
        .contains(&order.order.id.to_string()));

    let complete = app
        .request(
            Method::POST,
            &format!("{uri}/complete"),
            None,
            Some(&token_b),
        )
        .await;
    assert_eq!(complete.status(), StatusCode::NOT_FOUND);

    let edit = app
        .request(
            Method::PUT,
            &uri,
            Some(json!({ "description": "Overwritten" })),
            Some(&token_b),
        )
        .await;
    assert_eq!(edit.status(), StatusCode::NOT_FOUND);

    let own = app
        .request(Method::GET, &uri, None, Some(&app.shop_a.technician_token))
        .await;
    assert_eq!(own.status(), StatusCode::OK);
    let body = read_json(own).await;
    assert_eq!(body["data"]["description"], "100h revision");
}

#[tokio::test]
async fn deactivated_tenant_is_locked_out() {
    let app = TestApp::new().await;
    let token = app.shop_a.technician_token.clone();

    let before = app
        .request(Method::GET, "/api/v1/orders", None, Some(&token))
        .await;
    assert_eq!(before.status(), StatusCode::OK);

    app.state
        .services
        .tenancy
        .set_tenant_active(app.shop_a.tenant.id, false)
        .await
        .unwrap();

    let after = app
        .request(Method::GET, "/api/v1/orders", None, Some(&token))
        .await;
    assert_eq!(after.status(), StatusCode::UNAUTHORIZED);

    let other = app
        .request(
            Method::GET,
            "/api/v1/orders",
            None,
            Some(&app.shop_b.technician_token),
        )
        .await;
    assert_eq!(other.status(), StatusCode::OK);
}

#[tokio::test]
async fn requests_without_a_valid_token_are_rejected() {
    let app = TestApp::new().await;

    let missing = app.request(Method::GET, "/api/v1/orders", None, None).await;
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let garbage = app
        .request(Method::GET, "/api/v1/orders", None, Some("not-a-jwt"))
        .await;
    assert_eq!(garbage.status(), StatusCode::UNAUTHORIZED);
}
