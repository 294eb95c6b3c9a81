pub mod activity_log;
pub mod operations;
pub mod reference;
pub mod reports;
pub mod units;
pub mod users;

use std::sync::Arc;
use std::time::Duration;

use crate::auth::{AuthConfig, AuthService};
use crate::config::AppConfig;
use crate::db::DbPool;

/// Services layer that encapsulates business logic used by HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub auth: Arc<AuthService>,
    pub operations: Arc<operations::FuelOperationService>,
    pub reports: Arc<reports::ReportsService>,
    pub users: Arc<users::UserService>,
    pub units: Arc<units::UnitService>,
    pub reference: Arc<reference::ReferenceDataService>,
    pub activity: activity_log::ActivityLogService,
}

impl AppServices {
    /// Builds the service container over one shared connection pool.
    pub fn new(db: Arc<DbPool>, cfg: &AppConfig) -> Self {
        let activity = activity_log::ActivityLogService::new(db.clone());

        let auth_config = AuthConfig::new(
            cfg.jwt_secret.clone(),
            cfg.auth_issuer.clone(),
            cfg.auth_audience.clone(),
            Duration::from_secs(cfg.jwt_expiration as u64),
        );
        let auth = Arc::new(AuthService::new(auth_config, db.clone(), activity.clone()));

        let operations = Arc::new(operations::FuelOperationService::new(
            db.clone(),
            activity.clone(),
        ));
        let reports = Arc::new(reports::ReportsService::new(db.clone(), activity.clone()));
        let users = Arc::new(users::UserService::new(db.clone(), activity.clone()));
        let units = Arc::new(units::UnitService::new(db.clone(), activity.clone()));
        let reference = Arc::new(reference::ReferenceDataService::new(db, activity.clone()));

        Self {
            auth,
            operations,
            reports,
            users,
            units,
            reference,
            activity,
        }
    }
}
