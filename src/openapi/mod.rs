use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "FuelOps API",
        version = "0.1.0",
        description = r#"
# Fuel Operations API

Role-based backend for tracking fuel dispensing operations across
organizational units: recording dispensing requests, tracking their
receipt status, and producing consumption reports.

## Authentication

Authenticate via `POST /auth/login` and send the returned token in the
Authorization header:

```
Authorization: Bearer <your-jwt-token>
```

## Roles

- **system_admin**: full access to every endpoint
- **system_manager**: dashboards, reports, and the activity log
- **operations_duty**: records and edits dispensing requests
- **fuel_duty**: dispenses pending receipts

## Error Handling

Failures use consistent JSON bodies with the matching HTTP status code:
400 validation, 401 unauthenticated, 403 forbidden, 404 not found,
409 conflict, 500 unexpected.
        "#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    paths(
        crate::auth::login_handler,
        crate::auth::logout_handler,
        crate::auth::me_handler,
        crate::handlers::operations::list_operations,
        crate::handlers::operations::get_operation,
        crate::handlers::operations::create_operation,
        crate::handlers::operations::update_operation,
        crate::handlers::operations::dispense_operation,
        crate::handlers::operations::delete_operation,
        crate::handlers::operations::list_months,
        crate::handlers::reports::get_overview,
        crate::handlers::reports::get_today_stats,
        crate::handlers::reports::get_daily_consumption,
        crate::handlers::reports::get_monthly_consumption,
        crate::handlers::reports::get_unit_consumption,
        crate::handlers::reports::get_status_distribution,
        crate::handlers::reports::get_dispense_type_stats,
        crate::handlers::reports::get_active_users,
        crate::handlers::activity::list_activity,
        crate::handlers::users::list_users,
        crate::handlers::users::create_user,
        crate::handlers::units::list_units,
        crate::handlers::reference::list_dispense_types,
        crate::handlers::reference::list_receipt_statuses,
    ),
    tags(
        (name = "Operations", description = "Fuel operation lifecycle"),
        (name = "Reports", description = "Consumption and status aggregates"),
        (name = "Activity", description = "Audit trail"),
        (name = "Users", description = "Account administration"),
        (name = "Units", description = "Organizational units"),
        (name = "Reference", description = "Lookup data"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "Bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// Swagger UI served at `/docs`, backed by the generated document.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_builds_and_lists_core_paths() {
        let doc = ApiDoc::openapi();
        let paths = doc.paths.paths;
        assert!(paths.contains_key("/api/v1/operations"));
        assert!(paths.contains_key("/api/v1/operations/{id}/dispense"));
        assert!(paths.contains_key("/auth/login"));
    }
}
