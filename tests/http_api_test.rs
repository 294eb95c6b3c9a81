//! Full HTTP round trip of the receipt lifecycle, exercising the JSON
//! envelope, status codes, and audit-derived detail fields.

mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp, FUEL_PASSWORD, OPS_PASSWORD};
use serde_json::json;

#[tokio::test]
async fn status_endpoint_needs_no_auth() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/api/v1/status", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["service"], "fuelops-api");
}

#[tokio::test]
async fn health_endpoint_reports_database_state() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/api/v1/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["checks"]["database"], "healthy");
}

#[tokio::test]
async fn receipt_lifecycle_over_http() {
    let app = TestApp::new().await;
    let ops_token = app.login("ops1", OPS_PASSWORD).await.access_token;
    let fuel_token = app.login("fuel1", FUEL_PASSWORD).await.access_token;

    // Record a petrol-only request
    let create = app
        .request(
            Method::POST,
            "/api/v1/operations",
            Some(&ops_token),
            Some(json!({
                "operation_date": "2024-03-15",
                "unit_id": app.unit.id,
                "driver_name": "Driver One",
                "vehicle_type": "truck",
                "petrol_quantity": 50.0,
                "diesel_quantity": 0.0,
                "dispense_type_id": 1,
                "purpose": "resupply"
            })),
        )
        .await;
    assert_eq!(create.status(), StatusCode::CREATED);
    let body = response_json(create).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["receipt_number"], 1001);
    assert_eq!(body["data"]["month"], "2024-03");
    assert_eq!(body["data"]["receipt_status_id"], 2);
    let id = body["data"]["id"].as_i64().unwrap();

    // Missing required fields fail with 400
    let invalid = app
        .request(
            Method::POST,
            "/api/v1/operations",
            Some(&ops_token),
            Some(json!({
                "operation_date": "2024-03-15",
                "unit_id": app.unit.id,
                "driver_name": "",
                "vehicle_type": "truck",
                "dispense_type_id": 1
            })),
        )
        .await;
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

    // Dispense by the fuel duty officer
    let dispense = app
        .request(
            Method::POST,
            &format!("/api/v1/operations/{id}/dispense"),
            Some(&fuel_token),
            Some(json!({
                "operation_officer": "Officer X",
                "dispense_notes": "full tank"
            })),
        )
        .await;
    assert_eq!(dispense.status(), StatusCode::OK);
    let body = response_json(dispense).await;
    assert_eq!(body["data"]["receipt_status_id"], 1);
    assert_eq!(body["data"]["operation_officer"], "Officer X");

    // Re-dispense conflicts
    let again = app
        .request(
            Method::POST,
            &format!("/api/v1/operations/{id}/dispense"),
            Some(&fuel_token),
            Some(json!({"operation_officer": "Officer Y"})),
        )
        .await;
    assert_eq!(again.status(), StatusCode::CONFLICT);

    // Detail carries audit-derived fields
    let get = app
        .request(
            Method::GET,
            &format!("/api/v1/operations/{id}"),
            Some(&ops_token),
            None,
        )
        .await;
    assert_eq!(get.status(), StatusCode::OK);
    let body = response_json(get).await;
    assert_eq!(body["data"]["dispensed_by"], "Fuel Officer");
    assert!(body["data"]["dispensed_at"].is_string());
    assert_eq!(body["data"]["status_name"], "dispensed");
    assert_eq!(body["data"]["unit_name"], "First Logistics");

    // Edit after dispense conflicts
    let edit = app
        .request(
            Method::PUT,
            &format!("/api/v1/operations/{id}"),
            Some(&ops_token),
            Some(json!({
                "operation_date": "2024-03-16",
                "unit_id": app.unit.id,
                "driver_name": "Driver One",
                "vehicle_type": "truck",
                "petrol_quantity": 60.0,
                "diesel_quantity": 0.0,
                "dispense_type_id": 1
            })),
        )
        .await;
    assert_eq!(edit.status(), StatusCode::CONFLICT);

    // Delete still works on a dispensed record
    let delete = app
        .request(
            Method::DELETE,
            &format!("/api/v1/operations/{id}"),
            Some(&ops_token),
            None,
        )
        .await;
    assert_eq!(delete.status(), StatusCode::OK);

    let gone = app
        .request(
            Method::GET,
            &format!("/api/v1/operations/{id}"),
            Some(&ops_token),
            None,
        )
        .await;
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);

    // Error envelope shape
    let body = response_json(gone).await;
    assert_eq!(body["error"], "Not Found");
    assert!(body["request_id"].is_string());
}

#[tokio::test]
async fn list_and_reference_endpoints_round_trip() {
    let app = TestApp::new().await;
    let ops_token = app.login("ops1", OPS_PASSWORD).await.access_token;

    app.request(
        Method::POST,
        "/api/v1/operations",
        Some(&ops_token),
        Some(json!({
            "operation_date": "2024-03-15",
            "unit_id": app.unit.id,
            "driver_name": "Searchable Driver",
            "vehicle_type": "truck",
            "petrol_quantity": 10.0,
            "diesel_quantity": 0.0,
            "dispense_type_id": 1
        })),
    )
    .await;

    let list = app
        .request(
            Method::GET,
            "/api/v1/operations?search=searchable",
            Some(&ops_token),
            None,
        )
        .await;
    assert_eq!(list.status(), StatusCode::OK);
    let body = response_json(list).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["operations"][0]["driver_name"], "Searchable Driver");

    let units = app
        .request(Method::GET, "/api/v1/units", Some(&ops_token), None)
        .await;
    assert_eq!(units.status(), StatusCode::OK);

    let statuses = app
        .request(Method::GET, "/api/v1/receipt-statuses", Some(&ops_token), None)
        .await;
    let body = response_json(statuses).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 4);
    assert_eq!(body["data"][0]["id"], 1);
    assert_eq!(body["data"][0]["name"], "dispensed");

    let types = app
        .request(Method::GET, "/api/v1/dispense-types", Some(&ops_token), None)
        .await;
    let body = response_json(types).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 5);

    let months = app
        .request(Method::GET, "/api/v1/operations/months", Some(&ops_token), None)
        .await;
    let body = response_json(months).await;
    assert_eq!(body["data"][0], "2024-03");
}

#[tokio::test]
async fn me_endpoint_echoes_the_caller() {
    let app = TestApp::new().await;
    let token = app.login("ops1", OPS_PASSWORD).await.access_token;

    let response = app.request(Method::GET, "/auth/me", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["username"], "ops1");
    assert_eq!(body["data"]["role"], "operations_duty");
}
