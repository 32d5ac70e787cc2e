use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::_entities::invitations;
use crate::models::principal::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    Created,
    Accepted,
    Expired,
    Revoked,
}

impl InvitationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            InvitationStatus::Created => "created",
            InvitationStatus::Accepted => "accepted",
            InvitationStatus::Expired => "expired",
            InvitationStatus::Revoked => "revoked",
        }
    }

    pub fn parse(s: &str) -> Option<InvitationStatus> {
        match s {
            "created" => Some(InvitationStatus::Created),
            "accepted" => Some(InvitationStatus::Accepted),
            "expired" => Some(InvitationStatus::Expired),
            "revoked" => Some(InvitationStatus::Revoked),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, InvitationStatus::Accepted | InvitationStatus::Expired | InvitationStatus::Revoked)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invitation {
    pub id: Uuid,
    pub token: String,
    pub email: String,
    pub role: Role,
    pub organisation_id: Option<Uuid>,
    pub station_id: Option<Uuid>,
    pub status: InvitationStatus,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<invitations::Model> for Invitation {
    fn from(m: invitations::Model) -> Self {
        Self {
            id: m.id,
            token: m.token,
            email: m.email,
            role: Role::parse(&m.role).unwrap_or(Role::StationStaff),
            organisation_id: m.organisation_id,
            station_id: m.station_id,
            status: InvitationStatus::parse(&m.status).unwrap_or(InvitationStatus::Created),
            expires_at: DateTime::from_naive_utc_and_offset(m.expires_at, Utc),
            created_at: DateTime::from_naive_utc_and_offset(m.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(m.updated_at, Utc),
        }
    }
}

impl Invitation {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
