//! Role gates and authentication over the HTTP surface.

mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp, FUEL_PASSWORD, MANAGER_PASSWORD, OPS_PASSWORD};
use serde_json::json;

fn operation_payload(unit_id: i32) -> serde_json::Value {
    json!({
        "operation_date": "2024-03-15",
        "unit_id": unit_id,
        "driver_name": "Driver",
        "vehicle_type": "truck",
        "petrol_quantity": 50.0,
        "diesel_quantity": 0.0,
        "dispense_type_id": 1
    })
}

#[tokio::test]
async fn login_issues_a_token_and_lands_on_the_audit_trail() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({"username": "ops1", "password": OPS_PASSWORD})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["user"]["role"], "operations_duty");
    assert!(body["data"]["access_token"].as_str().is_some());

    let entries = app.state.services.activity.recent(None, 50).await.unwrap();
    assert!(entries.iter().any(|e| e.action == "login"));
}

#[tokio::test]
async fn failed_login_is_unauthorized_and_logged_without_an_actor() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({"username": "ops1", "password": "wrong"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let entries = app.state.services.activity.recent(None, 50).await.unwrap();
    let failed = entries
        .iter()
        .find(|e| e.action == "failed login")
        .expect("failed login should be logged");
    assert_eq!(failed.user_id, None);
    assert!(failed.details.as_deref().unwrap_or("").contains("ops1"));
}

#[tokio::test]
async fn deactivated_accounts_cannot_log_in() {
    let app = TestApp::new().await;
    let admin_ctx = app.ctx(fuelops_api::auth::Role::SystemAdmin);

    app.state
        .services
        .users
        .set_active(&admin_ctx, app.fuel_id, false)
        .await
        .unwrap();

    let response = app
        .request(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({"username": "fuel1", "password": FUEL_PASSWORD})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn requests_without_a_token_are_unauthorized() {
    let app = TestApp::new().await;

    let response = app
        .request(Method::GET, "/api/v1/operations", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn garbage_tokens_are_rejected() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::GET,
            "/api/v1/operations",
            Some("not-a-real-token"),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn fuel_duty_cannot_create_operations() {
    let app = TestApp::new().await;
    let token = app.login("fuel1", FUEL_PASSWORD).await.access_token;

    let response = app
        .request(
            Method::POST,
            "/api/v1/operations",
            Some(&token),
            Some(operation_payload(app.unit.id)),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn operations_duty_cannot_dispense() {
    let app = TestApp::new().await;
    let ops_token = app.login("ops1", OPS_PASSWORD).await.access_token;

    let create = app
        .request(
            Method::POST,
            "/api/v1/operations",
            Some(&ops_token),
            Some(operation_payload(app.unit.id)),
        )
        .await;
    assert_eq!(create.status(), StatusCode::CREATED);
    let body = response_json(create).await;
    let id = body["data"]["id"].as_i64().unwrap();

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/operations/{id}/dispense"),
            Some(&ops_token),
            Some(json!({"operation_officer": "Officer X"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn the_admin_super_role_passes_every_gate() {
    let app = TestApp::new().await;
    let admin_token = app.login("admin", common::ADMIN_PASSWORD).await.access_token;

    // Role gate for operations-duty: bypassed
    let create = app
        .request(
            Method::POST,
            "/api/v1/operations",
            Some(&admin_token),
            Some(operation_payload(app.unit.id)),
        )
        .await;
    assert_eq!(create.status(), StatusCode::CREATED);
    let body = response_json(create).await;
    let id = body["data"]["id"].as_i64().unwrap();

    // Role gate for fuel-duty: bypassed too
    let dispense = app
        .request(
            Method::POST,
            &format!("/api/v1/operations/{id}/dispense"),
            Some(&admin_token),
            Some(json!({"operation_officer": "Officer X"})),
        )
        .await;
    assert_eq!(dispense.status(), StatusCode::OK);
}

#[tokio::test]
async fn user_administration_requires_the_admin_role() {
    let app = TestApp::new().await;
    let manager_token = app.login("manager", MANAGER_PASSWORD).await.access_token;

    let response = app
        .request(Method::GET, "/api/v1/admin/users", Some(&manager_token), None)
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let admin_token = app.login("admin", common::ADMIN_PASSWORD).await.access_token;
    let response = app
        .request(Method::GET, "/api/v1/admin/users", Some(&admin_token), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn the_activity_log_is_manager_gated() {
    let app = TestApp::new().await;

    let ops_token = app.login("ops1", OPS_PASSWORD).await.access_token;
    let response = app
        .request(Method::GET, "/api/v1/activity", Some(&ops_token), None)
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let manager_token = app.login("manager", MANAGER_PASSWORD).await.access_token;
    let response = app
        .request(Method::GET, "/api/v1/activity", Some(&manager_token), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn duplicate_usernames_conflict() {
    let app = TestApp::new().await;
    let admin_token = app.login("admin", common::ADMIN_PASSWORD).await.access_token;

    let response = app
        .request(
            Method::POST,
            "/api/v1/admin/users",
            Some(&admin_token),
            Some(json!({
                "username": "ops1",
                "password": "another123",
                "name": "Duplicate",
                "role": "operations_duty"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}
