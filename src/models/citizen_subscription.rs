use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::_entities::citizen_subscriptions;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct NotificationPreferences {
    pub push: bool,
    pub email: bool,
    pub sms: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitizenSubscription {
    pub id: Uuid,
    pub incident_id: Uuid,
    pub push_token: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub preferences: NotificationPreferences,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<citizen_subscriptions::Model> for CitizenSubscription {
    fn from(m: citizen_subscriptions::Model) -> Self {
        Self {
            id: m.id,
            incident_id: m.incident_id,
            push_token: m.push_token,
            email: m.email,
            phone: m.phone,
            preferences: NotificationPreferences {
                push: m.pref_push,
                email: m.pref_email,
                sms: m.pref_sms,
            },
            is_active: m.is_active,
            created_at: DateTime::from_naive_utc_and_offset(m.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(m.updated_at, Utc),
        }
    }
}
