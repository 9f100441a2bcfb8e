mod common;

use assert_matches::assert_matches;
use common::TestApp;
use marine_service_api::{
    commands::orders::SERVICE_INCOME_CATEGORY,
    entities::{
        financial_transaction::{self, TransactionStatus, TransactionType},
        part,
        service_item::ServiceItemType,
        service_order::{self, ServiceOrderStatus},
        stock_movement::{self, MovementType},
    },
    errors::ServiceError,
    services::orders::NewServiceItem,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

fn part_line(part_id: i32, quantity: Decimal, unit_price: Decimal) -> NewServiceItem {
    NewServiceItem {
        item_type: ServiceItemType::Part,
        description: "Impeller kit".to_string(),
        part_id: Some(part_id),
        quantity,
        unit_price,
        unit_cost: None,
    }
}

fn labor_line(hours: Decimal, rate: Decimal) -> NewServiceItem {
    NewServiceItem {
        item_type: ServiceItemType::Labor,
        description: "Engine revision".to_string(),
        part_id: None,
        quantity: hours,
        unit_price: rate,
        unit_cost: None,
    }
}

/// Order with `[PART qty 4 @ 85.00, LABOR qty 1 @ 800]` against a part holding `stock`.
async fn revision_order(app: &TestApp, stock: Decimal) -> (i32, part::Model) {
    let tenant_id = app.shop_a.tenant.id;
    let (_, boat) = app.seed_boat(tenant_id, "HULL-001").await;
    let impeller = app.seed_part(tenant_id, "IMP-01", stock, dec!(85.00)).await;
    let order = app.seed_order(tenant_id, boat.id).await;

    let orders = &app.state.services.orders;
    orders
        .add_item(tenant_id, order.order.id, part_line(impeller.id, dec!(4), dec!(85.00)))
        .await
        .expect("add part line");
    let details = orders
        .add_item(tenant_id, order.order.id, labor_line(dec!(1), dec!(800)))
        .await
        .expect("add labor line");
    assert_eq!(details.order.total_value, dec!(1140.00));

    (order.order.id, impeller)
}

async fn receivables_for(app: &TestApp, order_id: i32) -> Vec<financial_transaction::Model> {
    financial_transaction::Entity::find()
        .filter(financial_transaction::Column::OrderId.eq(order_id))
        .all(&*app.state.db)
        .await
        .unwrap()
}

async fn consumption_movements(app: &TestApp, part_id: i32) -> Vec<stock_movement::Model> {
    stock_movement::Entity::find()
        .filter(stock_movement::Column::PartId.eq(part_id))
        .filter(stock_movement::Column::MovementType.eq(MovementType::OutServiceOrder))
        .all(&*app.state.db)
        .await
        .unwrap()
}

async fn part_quantity(app: &TestApp, part_id: i32) -> Decimal {
    part::Entity::find_by_id(part_id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap()
        .quantity
}

#[tokio::test]
async fn completion_consumes_stock_and_books_receivable() {
    let app = TestApp::new().await;
    let tenant_id = app.shop_a.tenant.id;
    let (order_id, impeller) = revision_order(&app, dec!(5)).await;

    let completed = app
        .state
        .services
        .orders
        .complete_order(tenant_id, &app.shop_a.technician.name, order_id)
        .await
        .expect("completion succeeds");

    assert_eq!(completed.order.status, ServiceOrderStatus::Completed);
    assert!(completed.order.completed_at.is_some());
    assert_eq!(completed.order.total_value, dec!(1140.00));
    assert_eq!(part_quantity(&app, impeller.id).await, dec!(1));

    let movements = consumption_movements(&app, impeller.id).await;
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].quantity, dec!(4));
    assert_eq!(movements[0].reference_id.as_deref(), Some(order_id.to_string().as_str()));
    assert_eq!(movements[0].actor, app.shop_a.technician.name);
    assert_eq!(movements[0].tenant_id, tenant_id);

    let receivables = receivables_for(&app, order_id).await;
    assert_eq!(receivables.len(), 1);
    let receivable = &receivables[0];
    assert_eq!(receivable.amount, dec!(1140.00));
    assert_eq!(receivable.status, TransactionStatus::Pending);
    assert_eq!(receivable.transaction_type, TransactionType::Income);
    assert_eq!(receivable.category, SERVICE_INCOME_CATEGORY);
    assert_eq!(receivable.tenant_id, tenant_id);
}

#[tokio::test]
async fn completion_clamps_stock_but_records_requested_quantity() {
    let app = TestApp::new().await;
    let tenant_id = app.shop_a.tenant.id;
    let (order_id, impeller) = revision_order(&app, dec!(2)).await;

    app.state
        .services
        .orders
        .complete_order(tenant_id, "tech", order_id)
        .await
        .expect("completion succeeds");

    assert_eq!(part_quantity(&app, impeller.id).await, Decimal::ZERO);
    let movements = consumption_movements(&app, impeller.id).await;
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].quantity, dec!(4));
}

#[tokio::test]
async fn second_completion_is_rejected_without_side_effects() {
    let app = TestApp::new().await;
    let tenant_id = app.shop_a.tenant.id;
    let (order_id, impeller) = revision_order(&app, dec!(5)).await;
    let orders = &app.state.services.orders;

    orders
        .complete_order(tenant_id, "tech", order_id)
        .await
        .expect("first completion");

    let err = orders
        .complete_order(tenant_id, "tech", order_id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidState(msg) if msg.contains(&order_id.to_string()));

    assert_eq!(part_quantity(&app, impeller.id).await, dec!(1));
    assert_eq!(consumption_movements(&app, impeller.id).await.len(), 1);
    assert_eq!(receivables_for(&app, order_id).await.len(), 1);
}

#[tokio::test]
async fn failed_movement_insert_rolls_back_everything() {
    let app = TestApp::new().await;
    let tenant_id = app.shop_a.tenant.id;
    let (order_id, impeller) = revision_order(&app, dec!(5)).await;

    app.execute_sql(
        "CREATE TRIGGER reject_movements BEFORE INSERT ON stock_movements \
         BEGIN SELECT RAISE(ABORT, 'ledger unavailable'); END;",
    )
    .await;

    let err = app
        .state
        .services
        .orders
        .complete_order(tenant_id, "tech", order_id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::DatabaseError(_));

    let order = service_order::Entity::find_by_id(order_id)
        .one(&*app.state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.status, ServiceOrderStatus::Pending);
    assert!(order.completed_at.is_none());
    assert_eq!(part_quantity(&app, impeller.id).await, dec!(5));
    assert!(receivables_for(&app, order_id).await.is_empty());

    app.execute_sql("DROP TRIGGER reject_movements;").await;
    app.state
        .services
        .orders
        .complete_order(tenant_id, "tech", order_id)
        .await
        .expect("completion succeeds once the ledger accepts writes");
    assert_eq!(part_quantity(&app, impeller.id).await, dec!(1));
}

#[tokio::test]
async fn concurrent_completions_succeed_exactly_once() {
    let app = TestApp::new().await;
    let tenant_id = app.shop_a.tenant.id;
    let (order_id, impeller) = revision_order(&app, dec!(5)).await;
    let orders = app.state.services.orders.clone();
    let other = app.state.services.orders.clone();

    let (first, second) = tokio::join!(
        orders.complete_order(tenant_id, "tech-1", order_id),
        other.complete_order(tenant_id, "tech-2", order_id),
    );

    let outcomes = [first, second];
    let successes = outcomes.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    assert!(outcomes
        .iter()
        .any(|r| matches!(r, Err(ServiceError::InvalidState(_)))));

    assert_eq!(part_quantity(&app, impeller.id).await, dec!(1));
    assert_eq!(receivables_for(&app, order_id).await.len(), 1);
}

#[tokio::test]
async fn labor_only_order_books_receivable_without_movements() {
    let app = TestApp::new().await;
    let tenant_id = app.shop_a.tenant.id;
    let (_, boat) = app.seed_boat(tenant_id, "HULL-LAB").await;
    let order = app.seed_order(tenant_id, boat.id).await;
    let orders = &app.state.services.orders;

    orders
        .add_item(tenant_id, order.order.id, labor_line(dec!(2.5), dec!(120.00)))
        .await
        .unwrap();
    let completed = orders
        .complete_order(tenant_id, "tech", order.order.id)
        .await
        .unwrap();

    assert_eq!(completed.order.total_value, dec!(300.00));
    let receivables = receivables_for(&app, order.order.id).await;
    assert_eq!(receivables.len(), 1);
    assert_eq!(receivables[0].amount, dec!(300.00));
    let movements = stock_movement::Entity::find()
        .filter(stock_movement::Column::ReferenceId.eq(order.order.id.to_string()))
        .all(&*app.state.db)
        .await
        .unwrap();
    assert!(movements.is_empty());
}

#[tokio::test]
async fn completed_orders_reject_item_changes_and_deletion() {
    let app = TestApp::new().await;
    let tenant_id = app.shop_a.tenant.id;
    let (order_id, impeller) = revision_order(&app, dec!(5)).await;
    let orders = &app.state.services.orders;

    let completed = orders.complete_order(tenant_id, "tech", order_id).await.unwrap();
    let item_id = completed.items[0].id;

    let add = orders
        .add_item(tenant_id, order_id, part_line(impeller.id, dec!(1), dec!(85)))
        .await
        .unwrap_err();
    assert_matches!(add, ServiceError::InvalidState(_));

    let remove = orders.remove_item(tenant_id, order_id, item_id).await.unwrap_err();
    assert_matches!(remove, ServiceError::InvalidState(_));

    let delete = orders.delete_order(tenant_id, order_id).await.unwrap_err();
    assert_matches!(delete, ServiceError::InvalidState(_));

    let reopened = orders
        .update_order(
            tenant_id,
            order_id,
            marine_service_api::services::orders::UpdateServiceOrderRequest {
                status: Some(ServiceOrderStatus::InProgress),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_matches!(reopened, ServiceError::InvalidState(_));
}
