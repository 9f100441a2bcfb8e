mod common;

use assert_matches::assert_matches;
use common::TestApp;
use marine_service_api::{
    entities::{service_item::ServiceItemType, service_order::ServiceOrderStatus},
    errors::ServiceError,
    services::orders::{
        AddNoteRequest, CreateServiceOrderRequest, NewServiceItem, OrderDetails,
        UpdateServiceOrderRequest,
    },
};
use rstest::rstest;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn labor(quantity: Decimal, unit_price: Decimal) -> NewServiceItem {
    NewServiceItem {
        item_type: ServiceItemType::Labor,
        description: "Labor".to_string(),
        part_id: None,
        quantity,
        unit_price,
        unit_cost: None,
    }
}

fn assert_total_matches_items(details: &OrderDetails) {
    let sum: Decimal = details.items.iter().map(|i| i.total).sum();
    assert_eq!(details.order.total_value, sum);
}

#[tokio::test]
async fn total_tracks_every_add_and_remove() {
    let app = TestApp::new().await;
    let tenant_id = app.shop_a.tenant.id;
    let (_, boat) = app.seed_boat(tenant_id, "HULL-T1").await;
    let filter = app.seed_part(tenant_id, "FLT-9", dec!(10), dec!(45.50)).await;
    let order = app.seed_order(tenant_id, boat.id).await;
    let orders = &app.state.services.orders;

    assert_eq!(order.order.total_value, Decimal::ZERO);

    let details = orders
        .add_item(
            tenant_id,
            order.order.id,
            NewServiceItem {
                item_type: ServiceItemType::Part,
                description: "Fuel filter".to_string(),
                part_id: Some(filter.id),
                quantity: dec!(2),
                unit_price: dec!(45.50),
                unit_cost: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(details.order.total_value, dec!(91.00));
    assert_eq!(details.items[0].total, dec!(91.00));
    // Unit cost falls back to the part's cost.
    assert_eq!(details.items[0].unit_cost, filter.cost);
    assert_total_matches_items(&details);

    let details = orders
        .add_item(tenant_id, order.order.id, labor(dec!(3), dec!(150)))
        .await
        .unwrap();
    assert_eq!(details.order.total_value, dec!(541.00));
    assert_total_matches_items(&details);

    let labor_id = details.items[1].id;
    let details = orders
        .remove_item(tenant_id, order.order.id, labor_id)
        .await
        .unwrap();
    assert_eq!(details.items.len(), 1);
    assert_eq!(details.order.total_value, dec!(91.00));
    assert_total_matches_items(&details);
}

#[tokio::test]
async fn concurrent_additions_are_all_counted() {
    let app = TestApp::new().await;
    let tenant_id = app.shop_a.tenant.id;
    let (_, boat) = app.seed_boat(tenant_id, "HULL-T2").await;
    let order = app.seed_order(tenant_id, boat.id).await;
    let orders = app.state.services.orders.clone();

    let tasks = (1..=5).map(|n| {
        let orders = orders.clone();
        let order_id = order.order.id;
        tokio::spawn(async move {
            orders
                .add_item(tenant_id, order_id, labor(Decimal::ONE, Decimal::from(n * 10)))
                .await
        })
    });
    for task in futures::future::join_all(tasks).await {
        task.expect("task panicked").expect("add_item failed");
    }

    let details = orders.get_order(tenant_id, order.order.id).await.unwrap();
    assert_eq!(details.items.len(), 5);
    assert_eq!(details.order.total_value, dec!(150));
    assert_total_matches_items(&details);
}

#[rstest]
#[case::part_without_part_id(ServiceItemType::Part, None, dec!(1), dec!(10))]
#[case::labor_with_part_id(ServiceItemType::Labor, Some(1), dec!(1), dec!(10))]
#[case::zero_quantity(ServiceItemType::Labor, None, dec!(0), dec!(10))]
#[case::negative_price(ServiceItemType::Labor, None, dec!(1), dec!(-5))]
#[tokio::test]
async fn invalid_lines_are_rejected(
    #[case] item_type: ServiceItemType,
    #[case] part_id: Option<i32>,
    #[case] quantity: Decimal,
    #[case] unit_price: Decimal,
) {
    let app = TestApp::new().await;
    let tenant_id = app.shop_a.tenant.id;
    let (_, boat) = app.seed_boat(tenant_id, "HULL-T3").await;
    let order = app.seed_order(tenant_id, boat.id).await;

    let err = app
        .state
        .services
        .orders
        .add_item(
            tenant_id,
            order.order.id,
            NewServiceItem {
                item_type,
                description: "Bad line".to_string(),
                part_id,
                quantity,
                unit_price,
                unit_cost: None,
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));

    let details = app
        .state
        .services
        .orders
        .get_order(tenant_id, order.order.id)
        .await
        .unwrap();
    assert!(details.items.is_empty());
    assert_eq!(details.order.total_value, Decimal::ZERO);
}

#[tokio::test]
async fn removing_an_unknown_item_is_not_found() {
    let app = TestApp::new().await;
    let tenant_id = app.shop_a.tenant.id;
    let (_, boat) = app.seed_boat(tenant_id, "HULL-T4").await;
    let order = app.seed_order(tenant_id, boat.id).await;

    let err = app
        .state
        .services
        .orders
        .remove_item(tenant_id, order.order.id, 9_999)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn order_lifecycle_edits_notes_and_deletion() {
    let app = TestApp::new().await;
    let tenant_id = app.shop_a.tenant.id;
    let (_, boat) = app.seed_boat(tenant_id, "HULL-T5").await;
    let orders = &app.state.services.orders;

    let created = orders
        .create_order(
            tenant_id,
            CreateServiceOrderRequest {
                boat_id: boat.id,
                engine_id: None,
                description: "Bottom paint".to_string(),
                diagnosis: None,
                requester: None,
                technician_name: None,
                scheduled_at: None,
                estimated_duration: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(created.order.status, ServiceOrderStatus::Pending);

    let updated = orders
        .update_order(
            tenant_id,
            created.order.id,
            UpdateServiceOrderRequest {
                status: Some(ServiceOrderStatus::Quotation),
                technician_name: Some("Marcos".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.order.status, ServiceOrderStatus::Quotation);
    assert_eq!(updated.order.technician_name.as_deref(), Some("Marcos"));

    let completing = orders
        .update_order(
            tenant_id,
            created.order.id,
            UpdateServiceOrderRequest {
                status: Some(ServiceOrderStatus::Completed),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_matches!(completing, ServiceError::InvalidState(_));

    let noted = orders
        .add_note(
            tenant_id,
            "Marcos",
            created.order.id,
            AddNoteRequest {
                text: "Customer approved the quote by phone".to_string(),
                user_name: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(noted.notes.len(), 1);
    assert_eq!(noted.notes[0].user_name.as_deref(), Some("Marcos"));

    orders
        .add_item(tenant_id, created.order.id, labor(dec!(1), dec!(200)))
        .await
        .unwrap();
    orders.delete_order(tenant_id, created.order.id).await.unwrap();

    let err = orders.get_order(tenant_id, created.order.id).await.unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn list_filters_by_status_newest_first() {
    let app = TestApp::new().await;
    let tenant_id = app.shop_a.tenant.id;
    let (_, boat) = app.seed_boat(tenant_id, "HULL-T6").await;
    let first = app.seed_order(tenant_id, boat.id).await;
    let second = app.seed_order(tenant_id, boat.id).await;
    let orders = &app.state.services.orders;

    orders
        .update_order(
            tenant_id,
            first.order.id,
            UpdateServiceOrderRequest {
                status: Some(ServiceOrderStatus::Canceled),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let all = orders.list_orders(tenant_id, None).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].order.id, second.order.id);

    let canceled = orders
        .list_orders(tenant_id, Some(ServiceOrderStatus::Canceled))
        .await
        .unwrap();
    assert_eq!(canceled.len(), 1);
    assert_eq!(canceled[0].order.id, first.order.id);
}

#[tokio::test]
async fn oversized_line_is_rejected_before_anything_is_written() {
    let app = TestApp::new().await;
    let tenant_id = app.shop_a.tenant.id;
    let (_, boat) = app.seed_boat(tenant_id, "HULL-T7").await;
    let order = app.seed_order(tenant_id, boat.id).await;
    let orders = &app.state.services.orders;

    let err = orders
        .add_item(
            tenant_id,
            order.order.id,
            labor(dec!(10000000000000000), dec!(10000000000000000)),
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));

    let details = orders.get_order(tenant_id, order.order.id).await.unwrap();
    assert!(details.items.is_empty());
    assert_eq!(details.order.total_value, Decimal::ZERO);
}

#[tokio::test]
async fn total_beyond_decimal_range_rolls_back_the_new_line() {
    let app = TestApp::new().await;
    let tenant_id = app.shop_a.tenant.id;
    let (_, boat) = app.seed_boat(tenant_id, "HULL-T8").await;
    let order = app.seed_order(tenant_id, boat.id).await;
    let orders = &app.state.services.orders;
    let huge = dec!(40000000000000000000000000000);

    orders
        .add_item(tenant_id, order.order.id, labor(Decimal::ONE, huge))
        .await
        .unwrap();

    let err = orders
        .add_item(tenant_id, order.order.id, labor(Decimal::ONE, huge))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));

    let details = orders.get_order(tenant_id, order.order.id).await.unwrap();
    assert_eq!(details.items.len(), 1);
    assert!(details.order.total_value > Decimal::ZERO);
}
