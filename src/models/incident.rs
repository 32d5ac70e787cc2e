use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::_entities::incidents;
use crate::models::organization::CategoryTag;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }

    pub fn parse(s: &str) -> Option<Priority> {
        match s {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            "critical" => Some(Priority::Critical),
            _ => None,
        }
    }

    /// Multiplier applied to ETA during station selection.
    pub fn urgency_multiplier(self) -> f64 {
        match self {
            Priority::Critical => 0.6,
            Priority::High => 0.75,
            Priority::Medium => 0.9,
            Priority::Low => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentStatus {
    Reported,
    Assigned,
    InProgress,
    Resolved,
    Escalated,
}

impl IncidentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            IncidentStatus::Reported => "reported",
            IncidentStatus::Assigned => "assigned",
            IncidentStatus::InProgress => "in_progress",
            IncidentStatus::Resolved => "resolved",
            IncidentStatus::Escalated => "escalated",
        }
    }

    pub fn parse(s: &str) -> Option<IncidentStatus> {
        match s {
            "reported" => Some(IncidentStatus::Reported),
            "assigned" => Some(IncidentStatus::Assigned),
            "in_progress" => Some(IncidentStatus::InProgress),
            "resolved" => Some(IncidentStatus::Resolved),
            "escalated" => Some(IncidentStatus::Escalated),
            _ => None,
        }
    }

    /// Active statuses the escalation scheduler scans.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            IncidentStatus::Reported | IncidentStatus::Assigned | IncidentStatus::InProgress
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Incident {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub incident_type: String,
    pub priority: Priority,
    pub status: IncidentStatus,
    pub location: Location,
    pub station_id: Option<Uuid>,
    pub organisation_id: Option<Uuid>,
    pub reported_by_id: Uuid,
    pub reporter_email: Option<String>,
    pub reporter_phone: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub assigned_by: Option<Uuid>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<Uuid>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolution: Option<String>,
    pub escalation_level: u8,
    pub escalated_by: Option<Uuid>,
    pub escalated_at: Option<DateTime<Utc>>,
    pub escalation_reason: Option<String>,
    pub status_updated_at: Option<DateTime<Utc>>,
    pub upvote_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<incidents::Model> for Incident {
    fn from(m: incidents::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            description: m.description,
            incident_type: m.incident_type,
            priority: Priority::parse(&m.priority).unwrap_or(Priority::Medium),
            status: IncidentStatus::parse(&m.status).unwrap_or(IncidentStatus::Reported),
            location: Location {
                lat: m.location_lat,
                lng: m.location_lng,
                address: m.location_address,
            },
            station_id: m.station_id,
            organisation_id: m.organisation_id,
            reported_by_id: m.reported_by_id,
            reporter_email: m.reporter_email,
            reporter_phone: m.reporter_phone,
            assigned_to: m.assigned_to,
            assigned_by: m.assigned_by,
            assigned_at: m.assigned_at.map(|d| DateTime::from_naive_utc_and_offset(d, Utc)),
            resolved_by: m.resolved_by,
            resolved_at: m.resolved_at.map(|d| DateTime::from_naive_utc_and_offset(d, Utc)),
            resolution: m.resolution,
            escalation_level: m.escalation_level.clamp(0, 3) as u8,
            escalated_by: m.escalated_by,
            escalated_at: m.escalated_at.map(|d| DateTime::from_naive_utc_and_offset(d, Utc)),
            escalation_reason: m.escalation_reason,
            status_updated_at: m.status_updated_at.map(|d| DateTime::from_naive_utc_and_offset(d, Utc)),
            upvote_count: m.upvote_count,
            created_at: DateTime::from_naive_utc_and_offset(m.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(m.updated_at, Utc),
        }
    }
}

impl Incident {
    /// The escalation clock: most recent of status update, assignment, creation.
    pub fn escalation_clock(&self) -> DateTime<Utc> {
        [self.status_updated_at, self.assigned_at, Some(self.created_at)]
            .into_iter()
            .flatten()
            .max()
            .unwrap_or(self.created_at)
    }
}

// ---- Request DTOs -------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCitizenReportRequest {
    pub title: String,
    pub description: String,
    pub location_address: String,
    pub priority: Option<Priority>,
    pub location_lat: Option<f64>,
    pub location_lng: Option<f64>,
    pub reporter_email: Option<String>,
    pub reporter_phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAuthenticatedIncidentRequest {
    pub title: String,
    pub description: String,
    pub location_address: Option<String>,
    pub location_lat: Option<f64>,
    pub location_lng: Option<f64>,
    pub priority: Option<Priority>,
    pub station_id: Option<Uuid>,
    pub organisation_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssignRequest {
    pub assigned_to_id: Uuid,
    pub priority: Option<Priority>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
    pub resolution: Option<String>,
    pub notes: Option<String>,
    /// Required when reopening a `resolved` incident back to `assigned`.
    pub reopen_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePriorityRequest {
    pub priority: Priority,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EscalateRequest {
    pub reason: String,
    pub target_level: Option<u8>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FollowUpRequest {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub notification_preference: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscribeRequest {
    pub push_token: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub notification_preferences: Option<NotificationPreferencesDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationPreferencesDto {
    pub push: Option<bool>,
    pub email: Option<bool>,
    pub sms: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProgressUpdateRequest {
    pub status: String,
    pub message: String,
    pub priority: Option<Priority>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResolveRequest {
    pub resolution_summary: String,
    pub actions_taken: Vec<String>,
    pub time_to_resolution: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct IncidentListQuery {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub search: Option<String>,
}

// ---- Response DTOs -------------------------------------------------------

/// Canonical `/api/incidents/public` projection — no reporter contact
/// fields, no assignee identity.
#[derive(Debug, Clone, Serialize)]
pub struct PublicIncidentProjection {
    pub id: Uuid,
    pub title: String,
    #[serde(rename = "type")]
    pub incident_type: String,
    pub priority: Priority,
    pub status: IncidentStatus,
    pub location: Location,
    pub created_at: DateTime<Utc>,
    pub upvotes: i32,
}

impl From<&Incident> for PublicIncidentProjection {
    fn from(i: &Incident) -> Self {
        Self {
            id: i.id,
            title: i.title.clone(),
            incident_type: i.incident_type.clone(),
            priority: i.priority,
            status: i.status,
            location: i.location.clone(),
            created_at: i.created_at,
            upvotes: i.upvote_count,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UpvoteResponse {
    pub incident_id: Uuid,
    pub upvotes: i32,
}

/// The output of [`crate::services::classifier::Classifier::classify`].
#[derive(Debug, Clone, Serialize)]
pub struct Classification {
    pub category: CategoryTag,
    pub confidence: u8,
    pub matched_keywords: Vec<String>,
}
