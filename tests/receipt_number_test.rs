//! Receipt-number assignment under concurrent creates: numbers must stay
//! unique and strictly increasing, with no duplicates surviving the race.

mod common;

use chrono::NaiveDate;
use common::TestApp;
use fuelops_api::auth::Role;
use fuelops_api::services::operations::CreateOperationRequest;

fn request(unit_id: i32, driver: String) -> CreateOperationRequest {
    CreateOperationRequest {
        operation_date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
        unit_id: Some(unit_id),
        driver_name: driver,
        vehicle_type: "truck".to_string(),
        petrol_quantity: 10.0,
        diesel_quantity: 5.0,
        receipt_status_id: None,
        dispense_type_id: 1,
        purpose: None,
        notes: None,
        operation_officer: None,
    }
}

#[tokio::test]
async fn concurrent_creates_never_duplicate_receipt_numbers() {
    let app = TestApp::new().await;
    let ctx = app.ctx(Role::OperationsDuty);
    let unit_id = app.unit.id;

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let operations = app.state.services.operations.clone();
            let ctx = ctx.clone();
            tokio::spawn(async move {
                operations
                    .create(&ctx, request(unit_id, format!("Driver {i}")))
                    .await
            })
        })
        .collect();

    let mut numbers = Vec::new();
    for task in tasks {
        let created = task.await.expect("task join").expect("create succeeds");
        numbers.push(created.receipt_number);
    }

    numbers.sort_unstable();
    let mut deduped = numbers.clone();
    deduped.dedup();
    assert_eq!(numbers.len(), deduped.len(), "receipt numbers must be unique");

    // Consecutive block starting right above the seed
    assert_eq!(numbers.first().copied(), Some(1001));
    assert_eq!(numbers.last().copied(), Some(1008));
}

#[tokio::test]
async fn sequential_creates_are_strictly_increasing() {
    let app = TestApp::new().await;
    let ctx = app.ctx(Role::OperationsDuty);

    let mut previous = 1000;
    for i in 0..5 {
        let created = app
            .state
            .services
            .operations
            .create(&ctx, request(app.unit.id, format!("Driver {i}")))
            .await
            .unwrap();
        assert!(created.receipt_number > previous);
        previous = created.receipt_number;
    }
}
