pub mod sea_orm_store;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::citizen_subscription::{CitizenSubscription, NotificationPreferences};
use crate::models::incident::{Incident, IncidentListQuery, IncidentStatus, Priority};
use crate::models::invitation::Invitation;
use crate::models::notification::Notification;
use crate::models::organization::Organization;
use crate::models::station::Station;
use crate::models::user::User;

/// Server-side visibility filter derived by the authorization gate. The
/// store's list/find methods take one of these rather than trusting a
/// caller-supplied filter.
#[derive(Debug, Clone)]
pub enum Scope {
    All,
    Organisation(Uuid),
    Station(Uuid),
    PublicFeed,
}

#[derive(Debug, Clone, Default)]
pub struct IncidentFilter {
    pub scope: Option<Scope>,
    pub status: Option<IncidentStatus>,
    pub priority: Option<Priority>,
    pub search: Option<String>,
}

impl From<IncidentListQuery> for IncidentFilter {
    fn from(q: IncidentListQuery) -> Self {
        Self {
            scope: None,
            status: q.status.as_deref().and_then(IncidentStatus::parse),
            priority: q.priority.as_deref().and_then(Priority::parse),
            search: q.search,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewIncident {
    pub title: String,
    pub description: String,
    pub incident_type: String,
    pub priority: Priority,
    pub status: IncidentStatus,
    pub location_lat: Option<f64>,
    pub location_lng: Option<f64>,
    pub location_address: Option<String>,
    pub station_id: Option<Uuid>,
    pub organisation_id: Option<Uuid>,
    pub reported_by_id: Uuid,
    pub reporter_email: Option<String>,
    pub reporter_phone: Option<String>,
}

/// Sparse patch applied to an incident row. `None` fields are left
/// untouched; the enumerated shape matches the update-struct-per-operation
/// design note (no ad-hoc partial JSON objects).
#[derive(Debug, Clone, Default)]
pub struct IncidentPatch {
    pub status: Option<IncidentStatus>,
    pub priority: Option<Priority>,
    pub assigned_to: Option<Uuid>,
    pub assigned_by: Option<Uuid>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<Uuid>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolution: Option<String>,
    pub escalation_level: Option<u8>,
    pub escalated_by: Option<Option<Uuid>>,
    pub escalated_at: Option<DateTime<Utc>>,
    pub escalation_reason: Option<String>,
    pub status_updated_at: Option<DateTime<Utc>>,
    pub upvote_count: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub related_entity_type: Option<String>,
    pub related_entity_id: Option<Uuid>,
    pub action_required: bool,
}

#[derive(Debug, Clone)]
pub struct NewCitizenSubscription {
    pub incident_id: Uuid,
    pub push_token: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub preferences: NotificationPreferences,
}

/// Versioned envelope persisted to `audit_logs.details`. Keeps the column
/// opaque-but-structured rather than free-form JSON.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEnvelope {
    pub v: u8,
    pub kind: String,
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct NewAuditLog {
    pub user_id: Option<Uuid>,
    pub entity_type: String,
    pub entity_id: Option<Uuid>,
    pub action: String,
    pub envelope: AuditEnvelope,
}

/// A station paired with the organization it belongs to, as read by the
/// routing engine when selecting candidates for a category.
#[derive(Debug, Clone)]
pub struct StationWithOrg {
    pub station: Station,
    pub organisation: Organization,
}

/// Capability boundary over relational storage. Every mutation the pipeline
/// performs and every query the authorization-scoped reads need is named
/// here; nothing else in the crate touches `sea-orm` entities directly
/// except the implementation of this trait.
#[async_trait]
pub trait Store: Send + Sync {
    async fn create_incident(&self, new: NewIncident, audit: NewAuditLog) -> AppResult<Incident>;
    async fn find_incident(&self, id: Uuid) -> AppResult<Option<Incident>>;
    async fn list_incidents(&self, filter: IncidentFilter) -> AppResult<Vec<Incident>>;
    async fn update_incident(&self, id: Uuid, patch: IncidentPatch, audit: NewAuditLog) -> AppResult<Incident>;

    /// Candidate stations whose organization's `org_type` matches `category`.
    async fn stations_for_category(&self, category: &str) -> AppResult<Vec<StationWithOrg>>;
    async fn find_station(&self, id: Uuid) -> AppResult<Option<Station>>;
    async fn find_organization(&self, id: Uuid) -> AppResult<Option<Organization>>;

    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>>;
    /// Verifies a login attempt against the stored password hash. The hash
    /// itself never leaves this trait's implementation.
    async fn verify_credentials(&self, email: &str, password: &str) -> AppResult<Option<User>>;
    /// Users matching a role, scoped to an organisation or station — used to
    /// compute notification audiences.
    async fn users_with_role_in_scope(&self, role: crate::models::principal::Role, scope: Scope) -> AppResult<Vec<User>>;

    /// Idempotent insert keyed on `(incident_id, actor_key)`. Returns the
    /// incident's authoritative upvote count after the (no-)op.
    async fn record_upvote(&self, incident_id: Uuid, actor_key: &str) -> AppResult<i32>;

    async fn create_notification(&self, new: NewNotification) -> AppResult<Notification>;

    async fn create_subscription(&self, new: NewCitizenSubscription) -> AppResult<CitizenSubscription>;
    async fn deactivate_subscription(&self, id: Uuid) -> AppResult<()>;
    async fn subscriptions_for_incident(&self, incident_id: Uuid) -> AppResult<Vec<CitizenSubscription>>;

    async fn find_invitation_by_token(&self, token: &str) -> AppResult<Option<Invitation>>;
    async fn find_invitation(&self, id: Uuid) -> AppResult<Option<Invitation>>;
    async fn revoke_invitation(&self, id: Uuid) -> AppResult<()>;
}
