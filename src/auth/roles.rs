use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use utoipa::ToSchema;

/// Closed enumeration of the four account roles.
///
/// The system administrator is the designated super-role: it passes every
/// role gate. Ownership checks are separate and are never bypassed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter, ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SystemAdmin,
    SystemManager,
    OperationsDuty,
    FuelDuty,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SystemAdmin => "system_admin",
            Role::SystemManager => "system_manager",
            Role::OperationsDuty => "operations_duty",
            Role::FuelDuty => "fuel_duty",
        }
    }
}

/// Role gate with the admin bypass.
pub fn can_access(role: Role, required: Role) -> bool {
    role == Role::SystemAdmin || role == required
}
