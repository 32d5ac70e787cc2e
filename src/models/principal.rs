use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The sentinel `reportedById` used for unauthenticated citizen reports.
pub const ANONYMOUS_SENTINEL: Uuid = Uuid::nil();

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    StationStaff,
    StationAdmin,
    SuperAdmin,
    MainAdmin,
    Citizen,
}

impl Role {
    /// Authority level used by the escalation hierarchy.
    /// `Citizen` never appears on an escalation path and has no level.
    pub fn escalation_level(self) -> Option<u8> {
        match self {
            Role::StationStaff => Some(0),
            Role::StationAdmin => Some(1),
            Role::SuperAdmin => Some(2),
            Role::MainAdmin => Some(3),
            Role::Citizen => None,
        }
    }

    pub fn from_escalation_level(level: u8) -> Option<Role> {
        match level {
            0 => Some(Role::StationStaff),
            1 => Some(Role::StationAdmin),
            2 => Some(Role::SuperAdmin),
            3 => Some(Role::MainAdmin),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::StationStaff => "station_staff",
            Role::StationAdmin => "station_admin",
            Role::SuperAdmin => "super_admin",
            Role::MainAdmin => "main_admin",
            Role::Citizen => "citizen",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "station_staff" => Some(Role::StationStaff),
            "station_admin" => Some(Role::StationAdmin),
            "super_admin" => Some(Role::SuperAdmin),
            "main_admin" => Some(Role::MainAdmin),
            "citizen" => Some(Role::Citizen),
            _ => None,
        }
    }
}

/// A validated principal, as handed to the core by the auth layer. Every
/// service entry point that enforces scoping and role checks takes one of
/// these rather than re-deriving identity from a token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: Uuid,
    pub role: Role,
    pub organisation_id: Option<Uuid>,
    pub station_id: Option<Uuid>,
}

impl Principal {
    pub fn anonymous() -> Self {
        Self {
            user_id: ANONYMOUS_SENTINEL,
            role: Role::Citizen,
            organisation_id: None,
            station_id: None,
        }
    }
}
