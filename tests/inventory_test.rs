mod common;

use assert_matches::assert_matches;
use chrono::Utc;
use common::TestApp;
use marine_service_api::{
    entities::stock_movement::MovementType,
    errors::ServiceError,
    services::inventory::{
        CreatePartRequest, InvoiceLine, RecordMovementRequest, RegisterInvoiceRequest,
        UpdatePartRequest,
    },
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn movement(part_id: i32, movement_type: MovementType, quantity: Decimal) -> RecordMovementRequest {
    RecordMovementRequest {
        part_id,
        movement_type,
        quantity,
        description: "Counted on the shelf".to_string(),
        reference_id: None,
    }
}

#[tokio::test]
async fn opening_balance_is_recorded_in_the_ledger() {
    let app = TestApp::new().await;
    let tenant_id = app.shop_a.tenant.id;
    let part = app.seed_part(tenant_id, "OIL-4T", dec!(12), dec!(60)).await;

    let ledger = app
        .state
        .services
        .inventory
        .list_movements(tenant_id, Some(part.id))
        .await
        .unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].movement_type, MovementType::AdjustmentPlus);
    assert_eq!(ledger[0].quantity, dec!(12));
}

#[tokio::test]
async fn duplicate_sku_conflicts_within_a_tenant_only() {
    let app = TestApp::new().await;
    let inventory = &app.state.services.inventory;
    app.seed_part(app.shop_a.tenant.id, "SPK-1", dec!(1), dec!(20)).await;

    let request = CreatePartRequest {
        sku: "SPK-1".to_string(),
        barcode: None,
        name: "Spark plug".to_string(),
        quantity: Decimal::ZERO,
        cost: dec!(8),
        price: dec!(20),
        min_stock: Decimal::ZERO,
        location: None,
    };

    let err = inventory
        .create_part(app.shop_a.tenant.id, "tech", request.clone())
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Conflict(_));

    inventory
        .create_part(app.shop_b.tenant.id, "tech", request)
        .await
        .expect("other tenants may reuse the SKU");
}

#[tokio::test]
async fn manual_movements_adjust_stock() {
    let app = TestApp::new().await;
    let tenant_id = app.shop_a.tenant.id;
    let inventory = &app.state.services.inventory;
    let part = app.seed_part(tenant_id, "ANODE-2", dec!(3), dec!(40)).await;

    inventory
        .record_movement(tenant_id, "Ana", movement(part.id, MovementType::AdjustmentPlus, dec!(2)))
        .await
        .unwrap();
    let recorded = inventory
        .record_movement(tenant_id, "Ana", movement(part.id, MovementType::AdjustmentMinus, dec!(4)))
        .await
        .unwrap();
    assert_eq!(recorded.actor, "Ana");

    assert_eq!(inventory.get_part(tenant_id, part.id).await.unwrap().quantity, dec!(1));

    let err = inventory
        .record_movement(tenant_id, "Ana", movement(part.id, MovementType::AdjustmentMinus, dec!(2)))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
    assert_eq!(inventory.get_part(tenant_id, part.id).await.unwrap().quantity, dec!(1));
}

#[tokio::test]
async fn consumption_movements_are_reserved_for_completion() {
    let app = TestApp::new().await;
    let tenant_id = app.shop_a.tenant.id;
    let part = app.seed_part(tenant_id, "BELT-7", dec!(3), dec!(40)).await;

    let err = app
        .state
        .services
        .inventory
        .record_movement(tenant_id, "Ana", movement(part.id, MovementType::OutServiceOrder, dec!(1)))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn low_stock_lists_parts_at_or_below_minimum() {
    let app = TestApp::new().await;
    let tenant_id = app.shop_a.tenant.id;
    // seed_part uses a minimum of one
    let at_minimum = app.seed_part(tenant_id, "LOW-1", dec!(1), dec!(10)).await;
    app.seed_part(tenant_id, "OK-1", dec!(10), dec!(10)).await;
    app.seed_part(app.shop_b.tenant.id, "LOW-B", dec!(0), dec!(10)).await;

    let low = app
        .state
        .services
        .inventory
        .list_low_stock(tenant_id)
        .await
        .unwrap();
    assert_eq!(low.len(), 1);
    assert_eq!(low[0].id, at_minimum.id);
}

#[tokio::test]
async fn search_and_update_parts() {
    let app = TestApp::new().await;
    let tenant_id = app.shop_a.tenant.id;
    let inventory = &app.state.services.inventory;
    let part = app.seed_part(tenant_id, "PROP-13", dec!(2), dec!(900)).await;
    app.seed_part(tenant_id, "TRIM-1", dec!(2), dec!(50)).await;

    let found = inventory
        .list_parts(tenant_id, Some("PROP".to_string()))
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, part.id);

    let updated = inventory
        .update_part(
            tenant_id,
            part.id,
            UpdatePartRequest {
                price: Some(dec!(950)),
                location: Some("B-3".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.price, dec!(950));
    assert_eq!(updated.location.as_deref(), Some("B-3"));
    assert_eq!(updated.quantity, dec!(2));

    let err = inventory
        .update_part(app.shop_b.tenant.id, part.id, UpdatePartRequest::default())
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn invoices_receive_stock_and_update_cost() {
    let app = TestApp::new().await;
    let tenant_id = app.shop_a.tenant.id;
    let inventory = &app.state.services.inventory;
    let filter = app.seed_part(tenant_id, "FLT-1", dec!(2), dec!(40)).await;
    let pump = app.seed_part(tenant_id, "PMP-1", dec!(0), dec!(300)).await;

    let request = RegisterInvoiceRequest {
        number: "NF-1001".to_string(),
        supplier: "Nautica Distribuidora".to_string(),
        date: Utc::now(),
        xml_key: None,
        lines: vec![
            InvoiceLine {
                part_id: filter.id,
                quantity: dec!(10),
                unit_cost: dec!(18),
            },
            InvoiceLine {
                part_id: pump.id,
                quantity: dec!(1),
                unit_cost: dec!(150),
            },
        ],
    };

    let invoice = inventory
        .register_invoice(tenant_id, "Ana", request.clone())
        .await
        .unwrap();
    assert_eq!(invoice.total_value, dec!(330));

    let filter = inventory.get_part(tenant_id, filter.id).await.unwrap();
    assert_eq!(filter.quantity, dec!(12));
    assert_eq!(filter.cost, dec!(18));
    let pump = inventory.get_part(tenant_id, pump.id).await.unwrap();
    assert_eq!(pump.quantity, dec!(1));

    let ledger = inventory.list_movements(tenant_id, Some(pump.id)).await.unwrap();
    assert!(ledger
        .iter()
        .any(|m| m.movement_type == MovementType::InInvoice && m.quantity == dec!(1)));

    let err = inventory
        .register_invoice(tenant_id, "Ana", request)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Conflict(_));
    assert_eq!(inventory.list_invoices(tenant_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn invoice_without_lines_is_rejected() {
    let app = TestApp::new().await;
    let inventory = &app.state.services.inventory;

    let err = inventory
        .register_invoice(
            app.shop_a.tenant.id,
            "Ana",
            RegisterInvoiceRequest {
                number: "NF-2002".to_string(),
                supplier: "Nautica Distribuidora".to_string(),
                date: Utc::now(),
                xml_key: None,
                lines: Vec::new(),
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
    assert!(inventory.list_invoices(app.shop_a.tenant.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn receipt_beyond_decimal_range_is_rejected() {
    let app = TestApp::new().await;
    let tenant_id = app.shop_a.tenant.id;
    let inventory = &app.state.services.inventory;
    let part = app.seed_part(tenant_id, "HUGE-1", dec!(3), dec!(10)).await;

    let err = inventory
        .record_movement(tenant_id, "Ana", movement(part.id, MovementType::AdjustmentPlus, Decimal::MAX))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
    assert_eq!(inventory.get_part(tenant_id, part.id).await.unwrap().quantity, dec!(3));
    assert_eq!(inventory.list_movements(tenant_id, Some(part.id)).await.unwrap().len(), 1);
}
