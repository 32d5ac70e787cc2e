use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::_entities::notifications;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    IncidentCreated,
    IncidentAssigned,
    IncidentSelfAssigned,
    IncidentUpdated,
    IncidentEscalated,
    IncidentResolved,
    OrgStationChanged,
}

impl NotificationType {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationType::IncidentCreated => "incident_created",
            NotificationType::IncidentAssigned => "incident_assigned",
            NotificationType::IncidentSelfAssigned => "incident_self_assigned",
            NotificationType::IncidentUpdated => "incident_updated",
            NotificationType::IncidentEscalated => "incident_escalated",
            NotificationType::IncidentResolved => "incident_resolved",
            NotificationType::OrgStationChanged => "org_station_changed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub related_entity_type: Option<String>,
    pub related_entity_id: Option<Uuid>,
    pub action_required: bool,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<notifications::Model> for Notification {
    fn from(m: notifications::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            notification_type: m.notification_type,
            title: m.title,
            message: m.message,
            related_entity_type: m.related_entity_type,
            related_entity_id: m.related_entity_id,
            action_required: m.action_required,
            is_read: m.is_read,
            created_at: DateTime::from_naive_utc_and_offset(m.created_at, Utc),
        }
    }
}

/// Frame pushed to a live connection when a notification is created.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    NewNotification { notification: Notification },
    Ping,
}
