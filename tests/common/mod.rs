#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, Response},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use fuelops_api::{
    auth::{RequestContext, Role, TokenResponse},
    config::AppConfig,
    db::{self, DbConfig},
    entities::unit::Model as UnitModel,
    services::{
        users::{ensure_bootstrap_admin, CreateUserRequest},
        AppServices,
    },
    AppState,
};

pub const ADMIN_PASSWORD: &str = "admin123";
pub const MANAGER_PASSWORD: &str = "manager123";
pub const OPS_PASSWORD: &str = "ops123";
pub const FUEL_PASSWORD: &str = "fuel123";

/// Test harness: application state over a throwaway SQLite database with one
/// seeded account per role and one active unit.
pub struct TestApp {
    pub state: AppState,
    pub router: Router,
    pub unit: UnitModel,
    pub admin_id: i64,
    pub manager_id: i64,
    pub ops_id: i64,
    pub fuel_id: i64,
    _tmp: tempfile::TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let tmp = tempfile::tempdir().expect("create temp dir");
        let db_path = tmp.path().join("fuelops_test.db");
        let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

        // A single connection serializes writes the way the production
        // request model expects and keeps SQLite happy under concurrency.
        let db_config = DbConfig {
            url: db_url.clone(),
            max_connections: 1,
            min_connections: 1,
            ..Default::default()
        };
        let db = db::establish_connection_with_config(&db_config)
            .await
            .expect("connect test database");
        db::run_migrations(&db).await.expect("apply migrations");

        let db = Arc::new(db);
        let admin = ensure_bootstrap_admin(&db, ADMIN_PASSWORD)
            .await
            .expect("bootstrap admin")
            .expect("admin created on empty database");

        let cfg = AppConfig::new(
            db_url,
            "test_secret_key_for_testing_purposes_only_32chars".to_string(),
            3600,
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );

        let services = AppServices::new(db.clone(), &cfg);

        let state = AppState {
            db,
            config: cfg,
            services,
        };

        let admin_ctx = RequestContext {
            user_id: admin.id,
            name: admin.name.clone(),
            role: Role::SystemAdmin,
            unit_id: None,
            ip_address: None,
        };

        let unit = state
            .services
            .units
            .create(
                &admin_ctx,
                fuelops_api::services::units::CreateUnitRequest {
                    name: "First Logistics".to_string(),
                    code: Some("LOG1".to_string()),
                },
            )
            .await
            .expect("seed unit");

        let manager_id = seed_user(
            &state,
            &admin_ctx,
            "manager",
            MANAGER_PASSWORD,
            "Duty Manager",
            Role::SystemManager,
            None,
        )
        .await;
        let ops_id = seed_user(
            &state,
            &admin_ctx,
            "ops1",
            OPS_PASSWORD,
            "Operations Officer",
            Role::OperationsDuty,
            Some(unit.id),
        )
        .await;
        let fuel_id = seed_user(
            &state,
            &admin_ctx,
            "fuel1",
            FUEL_PASSWORD,
            "Fuel Officer",
            Role::FuelDuty,
            Some(unit.id),
        )
        .await;

        let auth_service = state.services.auth.clone();
        let router = Router::new()
            .nest("/api/v1", fuelops_api::api_v1_routes())
            .nest("/auth", fuelops_api::auth::auth_routes())
            .layer(axum::middleware::from_fn_with_state(
                auth_service,
                |axum::extract::State(auth): axum::extract::State<
                    Arc<fuelops_api::auth::AuthService>,
                >,
                 mut req: axum::http::Request<Body>,
                 next: axum::middleware::Next| async move {
                    req.extensions_mut().insert(auth);
                    next.run(req).await
                },
            ))
            .layer(axum::middleware::from_fn(
                fuelops_api::middleware_helpers::request_id::request_id_middleware,
            ))
            .with_state(state.clone());

        Self {
            state,
            router,
            unit,
            admin_id: admin.id,
            manager_id,
            ops_id,
            fuel_id,
            _tmp: tmp,
        }
    }

    pub fn ctx(&self, role: Role) -> RequestContext {
        let (user_id, name) = match role {
            Role::SystemAdmin => (self.admin_id, "System Administrator"),
            Role::SystemManager => (self.manager_id, "Duty Manager"),
            Role::OperationsDuty => (self.ops_id, "Operations Officer"),
            Role::FuelDuty => (self.fuel_id, "Fuel Officer"),
        };
        RequestContext {
            user_id,
            name: name.to_string(),
            role,
            unit_id: (role == Role::OperationsDuty || role == Role::FuelDuty)
                .then_some(self.unit.id),
            ip_address: Some("127.0.0.1".to_string()),
        }
    }

    pub async fn login(&self, username: &str, password: &str) -> TokenResponse {
        self.state
            .services
            .auth
            .login(username, password, Some("127.0.0.1".to_string()))
            .await
            .expect("login should succeed")
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&json).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.router.clone().oneshot(request).await.unwrap()
    }
}

async fn seed_user(
    state: &AppState,
    admin_ctx: &RequestContext,
    username: &str,
    password: &str,
    name: &str,
    role: Role,
    unit_id: Option<i32>,
) -> i64 {
    state
        .services
        .users
        .create(
            admin_ctx,
            CreateUserRequest {
                username: username.to_string(),
                password: password.to_string(),
                name: name.to_string(),
                role,
                unit_id,
            },
        )
        .await
        .expect("seed user")
        .id
}

pub async fn response_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}
