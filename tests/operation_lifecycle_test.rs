//! End-to-end coverage of the fuel operation lifecycle at the service
//! layer: creation with receipt numbering, ownership-gated edits, the
//! dispensed terminal state, deletion, and audit reconstruction.

mod common;

use assert_matches::assert_matches;
use chrono::NaiveDate;
use common::TestApp;
use fuelops_api::auth::Role;
use fuelops_api::entities::receipt_status::{DISPENSED_STATUS_ID, PENDING_STATUS_ID};
use fuelops_api::errors::ServiceError;
use fuelops_api::services::activity_log::{actions, tables};
use fuelops_api::services::operations::{
    CreateOperationRequest, DispenseRequest, OperationFilter, UpdateOperationRequest,
};

fn march(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, day).expect("valid date")
}

fn create_request(app: &TestApp, day: u32, driver: &str) -> CreateOperationRequest {
    CreateOperationRequest {
        operation_date: march(day),
        unit_id: Some(app.unit.id),
        driver_name: driver.to_string(),
        vehicle_type: "truck".to_string(),
        petrol_quantity: 50.0,
        diesel_quantity: 0.0,
        receipt_status_id: None,
        dispense_type_id: 1,
        purpose: Some("resupply run".to_string()),
        notes: None,
        operation_officer: None,
    }
}

#[tokio::test]
async fn create_assigns_sequential_receipt_numbers_from_1001() {
    let app = TestApp::new().await;
    let ctx = app.ctx(Role::OperationsDuty);

    let first = app
        .state
        .services
        .operations
        .create(&ctx, create_request(&app, 15, "Driver One"))
        .await
        .unwrap();
    let second = app
        .state
        .services
        .operations
        .create(&ctx, create_request(&app, 16, "Driver Two"))
        .await
        .unwrap();

    assert_eq!(first.receipt_number, 1001);
    assert_eq!(second.receipt_number, 1002);
    assert_eq!(first.month, "2024-03");
    assert_eq!(first.receipt_status_id, PENDING_STATUS_ID);
    assert_eq!(first.user_id, app.ops_id);

    // The create is on the audit trail with the receipt number in details
    let entry = app
        .state
        .services
        .activity
        .latest(tables::FUEL_OPERATIONS, first.id, actions::CREATE_OPERATION)
        .await
        .unwrap()
        .expect("create should be logged");
    assert!(entry.details.unwrap().contains("1001"));
}

#[tokio::test]
async fn create_accepts_an_explicit_status() {
    let app = TestApp::new().await;
    let ctx = app.ctx(Role::OperationsDuty);

    let mut request = create_request(&app, 15, "Driver");
    request.receipt_status_id = Some(DISPENSED_STATUS_ID);
    request.operation_officer = Some("Officer X".to_string());

    let created = app
        .state
        .services
        .operations
        .create(&ctx, request)
        .await
        .unwrap();
    assert_eq!(created.receipt_status_id, DISPENSED_STATUS_ID);
}

#[tokio::test]
async fn create_requires_a_unit_reference() {
    let app = TestApp::new().await;
    let ctx = app.ctx(Role::OperationsDuty);

    let mut request = create_request(&app, 15, "Driver");
    request.unit_id = None;

    let err = app
        .state
        .services
        .operations
        .create(&ctx, request)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn create_rejects_blank_required_fields_and_negative_quantities() {
    let app = TestApp::new().await;
    let ctx = app.ctx(Role::OperationsDuty);

    let mut request = create_request(&app, 15, "");
    let err = app
        .state
        .services
        .operations
        .create(&ctx, request)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));

    request = create_request(&app, 15, "Driver");
    request.petrol_quantity = -1.0;
    let err = app
        .state
        .services
        .operations
        .create(&ctx, request)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn create_is_gated_on_the_operations_role() {
    let app = TestApp::new().await;

    let err = app
        .state
        .services
        .operations
        .create(&app.ctx(Role::FuelDuty), create_request(&app, 15, "Driver"))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Forbidden(_));

    // The admin super-role bypasses the gate
    let created = app
        .state
        .services
        .operations
        .create(&app.ctx(Role::SystemAdmin), create_request(&app, 15, "Driver"))
        .await
        .unwrap();
    assert_eq!(created.receipt_number, 1001);
}

#[tokio::test]
async fn edit_recomputes_month_and_logs_the_editor() {
    let app = TestApp::new().await;
    let ctx = app.ctx(Role::OperationsDuty);

    let created = app
        .state
        .services
        .operations
        .create(&ctx, create_request(&app, 15, "Driver"))
        .await
        .unwrap();

    let update = UpdateOperationRequest {
        operation_date: NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(),
        unit_id: Some(app.unit.id),
        driver_name: "Renamed Driver".to_string(),
        vehicle_type: "tanker".to_string(),
        petrol_quantity: 75.0,
        diesel_quantity: 10.0,
        dispense_type_id: 2,
        purpose: None,
        notes: Some("updated".to_string()),
    };

    let updated = app
        .state
        .services
        .operations
        .update(&ctx, created.id, update)
        .await
        .unwrap();

    assert_eq!(updated.month, "2024-04");
    assert_eq!(updated.driver_name, "Renamed Driver");
    assert_eq!(updated.petrol_quantity, 75.0);
    assert!(updated.updated_at >= created.updated_at);
    // Receipt number survives edits untouched
    assert_eq!(updated.receipt_number, created.receipt_number);

    let detail = app.state.services.operations.get(created.id).await.unwrap();
    assert_eq!(detail.last_updated_by.as_deref(), Some("Operations Officer"));
}

#[tokio::test]
async fn edit_by_a_non_owner_is_forbidden_even_for_the_admin() {
    let app = TestApp::new().await;

    let created = app
        .state
        .services
        .operations
        .create(
            &app.ctx(Role::OperationsDuty),
            create_request(&app, 15, "Driver"),
        )
        .await
        .unwrap();

    let update = UpdateOperationRequest {
        operation_date: march(15),
        unit_id: Some(app.unit.id),
        driver_name: "Hijacked".to_string(),
        vehicle_type: "truck".to_string(),
        petrol_quantity: 1.0,
        diesel_quantity: 0.0,
        dispense_type_id: 1,
        purpose: None,
        notes: None,
    };

    let err = app
        .state
        .services
        .operations
        .update(&app.ctx(Role::SystemAdmin), created.id, update)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Forbidden(_));
}

#[tokio::test]
async fn edit_of_a_missing_operation_is_not_found() {
    let app = TestApp::new().await;

    let update = UpdateOperationRequest {
        operation_date: march(15),
        unit_id: Some(app.unit.id),
        driver_name: "Driver".to_string(),
        vehicle_type: "truck".to_string(),
        petrol_quantity: 1.0,
        diesel_quantity: 0.0,
        dispense_type_id: 1,
        purpose: None,
        notes: None,
    };

    let err = app
        .state
        .services
        .operations
        .update(&app.ctx(Role::OperationsDuty), 9999, update)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn dispense_freezes_the_record_and_reconstructs_audit_fields() {
    let app = TestApp::new().await;
    let ops_ctx = app.ctx(Role::OperationsDuty);
    let fuel_ctx = app.ctx(Role::FuelDuty);

    let created = app
        .state
        .services
        .operations
        .create(&ops_ctx, create_request(&app, 15, "Driver"))
        .await
        .unwrap();

    // Any fuel-duty actor may dispense any pending record
    let dispensed = app
        .state
        .services
        .operations
        .dispense(
            &fuel_ctx,
            created.id,
            DispenseRequest {
                operation_officer: "Officer X".to_string(),
                dispense_notes: Some("full tank".to_string()),
            },
        )
        .await
        .unwrap();

    assert_eq!(dispensed.receipt_status_id, DISPENSED_STATUS_ID);
    assert_eq!(dispensed.operation_officer.as_deref(), Some("Officer X"));

    let entry = app
        .state
        .services
        .activity
        .latest(
            tables::FUEL_OPERATIONS,
            created.id,
            actions::CHANGE_RECEIPT_STATUS,
        )
        .await
        .unwrap()
        .expect("dispense should be logged");
    let details = entry.details.unwrap();
    assert!(details.contains("#1001"));
    assert!(details.contains("full tank"));

    let detail = app.state.services.operations.get(created.id).await.unwrap();
    assert_eq!(detail.dispensed_by.as_deref(), Some("Fuel Officer"));
    assert!(detail.dispensed_at.is_some());
    assert!(detail.dispense_notes.unwrap().contains("full tank"));

    // Dispensed is terminal for edits, for everyone
    let update = UpdateOperationRequest {
        operation_date: march(15),
        unit_id: Some(app.unit.id),
        driver_name: "Driver".to_string(),
        vehicle_type: "truck".to_string(),
        petrol_quantity: 1.0,
        diesel_quantity: 0.0,
        dispense_type_id: 1,
        purpose: None,
        notes: None,
    };
    let err = app
        .state
        .services
        .operations
        .update(&ops_ctx, created.id, update)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Conflict(_));
}

#[tokio::test]
async fn dispense_is_gated_on_the_fuel_role() {
    let app = TestApp::new().await;

    let created = app
        .state
        .services
        .operations
        .create(
            &app.ctx(Role::OperationsDuty),
            create_request(&app, 15, "Driver"),
        )
        .await
        .unwrap();

    let err = app
        .state
        .services
        .operations
        .dispense(
            &app.ctx(Role::OperationsDuty),
            created.id,
            DispenseRequest {
                operation_officer: "Officer X".to_string(),
                dispense_notes: None,
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Forbidden(_));
}

#[tokio::test]
async fn redispense_is_rejected_and_leaves_the_record_unchanged() {
    let app = TestApp::new().await;

    let created = app
        .state
        .services
        .operations
        .create(
            &app.ctx(Role::OperationsDuty),
            create_request(&app, 15, "Driver"),
        )
        .await
        .unwrap();

    let fuel_ctx = app.ctx(Role::FuelDuty);
    let first = app
        .state
        .services
        .operations
        .dispense(
            &fuel_ctx,
            created.id,
            DispenseRequest {
                operation_officer: "Officer X".to_string(),
                dispense_notes: None,
            },
        )
        .await
        .unwrap();

    let err = app
        .state
        .services
        .operations
        .dispense(
            &fuel_ctx,
            created.id,
            DispenseRequest {
                operation_officer: "Officer Y".to_string(),
                dispense_notes: Some("second attempt".to_string()),
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Conflict(_));

    // Idempotence: officer and updated_at are untouched by the rejection
    let detail = app.state.services.operations.get(created.id).await.unwrap();
    assert_eq!(detail.operation.operation_officer.as_deref(), Some("Officer X"));
    assert_eq!(detail.operation.updated_at, first.updated_at);
}

#[tokio::test]
async fn dispense_of_a_missing_operation_is_not_found() {
    let app = TestApp::new().await;

    let err = app
        .state
        .services
        .operations
        .dispense(
            &app.ctx(Role::FuelDuty),
            4242,
            DispenseRequest {
                operation_officer: "Officer X".to_string(),
                dispense_notes: None,
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn delete_removes_the_record_and_the_number_is_not_reassigned() {
    let app = TestApp::new().await;
    let ctx = app.ctx(Role::OperationsDuty);
    let operations = app.state.services.operations.clone();

    let first = operations
        .create(&ctx, create_request(&app, 14, "Driver A"))
        .await
        .unwrap();
    let second = operations
        .create(&ctx, create_request(&app, 15, "Driver B"))
        .await
        .unwrap();
    let third = operations
        .create(&ctx, create_request(&app, 16, "Driver C"))
        .await
        .unwrap();
    assert_eq!(
        (first.receipt_number, second.receipt_number, third.receipt_number),
        (1001, 1002, 1003)
    );

    operations.delete(&ctx, second.id).await.unwrap();

    // Gone from reads
    let err = operations.get(second.id).await.unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
    let listed = operations.list(OperationFilter::default()).await.unwrap();
    assert!(listed.operations.iter().all(|op| op.id != second.id));

    // The deletion is on the audit trail with the receipt number captured
    // before the row disappeared
    let entry = app
        .state
        .services
        .activity
        .latest(tables::FUEL_OPERATIONS, second.id, actions::DELETE_OPERATION)
        .await
        .unwrap()
        .expect("delete should be logged");
    assert!(entry.details.unwrap().contains("1002"));

    // Numbering keeps climbing past the deleted receipt
    let fourth = operations
        .create(&ctx, create_request(&app, 17, "Driver D"))
        .await
        .unwrap();
    assert_eq!(fourth.receipt_number, 1004);
}

#[tokio::test]
async fn dispensed_records_stay_deletable() {
    let app = TestApp::new().await;
    let ctx = app.ctx(Role::OperationsDuty);

    let created = app
        .state
        .services
        .operations
        .create(&ctx, create_request(&app, 15, "Driver"))
        .await
        .unwrap();
    app.state
        .services
        .operations
        .dispense(
            &app.ctx(Role::FuelDuty),
            created.id,
            DispenseRequest {
                operation_officer: "Officer X".to_string(),
                dispense_notes: None,
            },
        )
        .await
        .unwrap();

    app.state
        .services
        .operations
        .delete(&ctx, created.id)
        .await
        .unwrap();
    let err = app.state.services.operations.get(created.id).await.unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn list_filters_and_orders_operations() {
    let app = TestApp::new().await;
    let ctx = app.ctx(Role::OperationsDuty);
    let operations = app.state.services.operations.clone();

    let mut request = create_request(&app, 14, "Alpha Driver");
    request.vehicle_type = "jeep".to_string();
    operations.create(&ctx, request).await.unwrap();

    let mut request = create_request(&app, 16, "Bravo Driver");
    request.purpose = Some("night patrol".to_string());
    operations.create(&ctx, request).await.unwrap();

    let older = CreateOperationRequest {
        operation_date: NaiveDate::from_ymd_opt(2024, 2, 10).unwrap(),
        ..create_request(&app, 15, "Charlie Driver")
    };
    let february = operations.create(&ctx, older).await.unwrap();

    // Newest operation date first
    let listed = operations.list(OperationFilter::default()).await.unwrap();
    assert_eq!(listed.total, 3);
    assert_eq!(listed.operations[0].driver_name, "Bravo Driver");
    assert_eq!(listed.operations[2].driver_name, "Charlie Driver");

    // Case-insensitive substring search over driver names
    let found = operations
        .list(OperationFilter {
            search: Some("ALPHA".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(found.total, 1);
    assert_eq!(found.operations[0].driver_name, "Alpha Driver");

    // Search also covers purpose and receipt number
    let by_purpose = operations
        .list(OperationFilter {
            search: Some("patrol".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_purpose.total, 1);

    let by_receipt = operations
        .list(OperationFilter {
            search: Some("1003".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_receipt.total, 1);
    assert_eq!(by_receipt.operations[0].id, february.id);

    // Month filter
    let by_month = operations
        .list(OperationFilter {
            month: Some("2024-02".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_month.total, 1);

    // Status filter: nothing dispensed yet
    let dispensed = operations
        .list(OperationFilter {
            status_id: Some(DISPENSED_STATUS_ID),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(dispensed.total, 0);

    // The row carries joined display fields
    assert_eq!(listed.operations[0].unit_name.as_deref(), Some("First Logistics"));
    assert_eq!(listed.operations[0].status_name, "pending");
    assert_eq!(listed.operations[0].created_by, "Operations Officer");

    let months = operations.months().await.unwrap();
    assert_eq!(months, vec!["2024-03".to_string(), "2024-02".to_string()]);
}

#[tokio::test]
async fn list_breaks_date_ties_by_creation_time() {
    let app = TestApp::new().await;
    let ctx = app.ctx(Role::OperationsDuty);
    let operations = app.state.services.operations.clone();

    operations
        .create(&ctx, create_request(&app, 15, "Earlier"))
        .await
        .unwrap();
    operations
        .create(&ctx, create_request(&app, 15, "Later"))
        .await
        .unwrap();

    let listed = operations.list(OperationFilter::default()).await.unwrap();
    assert_eq!(listed.operations[0].driver_name, "Later");
    assert_eq!(listed.operations[1].driver_name, "Earlier");
}
