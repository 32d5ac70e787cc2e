use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use crate::models::citizen_subscription::CitizenSubscription;
use crate::models::incident::Incident;
use crate::models::notification::ServerFrame;
use crate::models::principal::Role;
use crate::services::message_sender::MessageSender;
use crate::store::{NewNotification, Scope, Store};

const LIVE_CHANNEL_BUFFER: usize = 32;

/// Lifecycle events the pipeline raises. One `Publish` call per mutation,
/// in the order the mutation performed them, preserving per-recipient FIFO.
pub enum NotificationEvent<'a> {
    IncidentCreated { incident: &'a Incident },
    IncidentAssigned { incident: &'a Incident, self_assigned: bool, actor: Uuid },
    IncidentUpdated { incident: &'a Incident, actor: Uuid },
    IncidentEscalated { incident: &'a Incident, level: u8, actor: Option<Uuid> },
}

/// In-process pub/sub. Owns the live-connection table and its lock; never
/// global or module-level state — constructed once and injected into
/// handlers and the escalation scheduler.
pub struct NotificationBus {
    store: Arc<dyn Store>,
    sender: Arc<dyn MessageSender>,
    connections: RwLock<HashMap<Uuid, mpsc::Sender<ServerFrame>>>,
}

impl NotificationBus {
    pub fn new(store: Arc<dyn Store>, sender: Arc<dyn MessageSender>) -> Self {
        Self {
            store,
            sender,
            connections: RwLock::new(HashMap::new()),
        }
    }

    pub async fn register(&self, user_id: Uuid) -> mpsc::Receiver<ServerFrame> {
        let (tx, rx) = mpsc::channel(LIVE_CHANNEL_BUFFER);
        self.connections.write().await.insert(user_id, tx);
        rx
    }

    pub async fn unregister(&self, user_id: Uuid) {
        self.connections.write().await.remove(&user_id);
    }

    async fn deliver(&self, recipients: &[Uuid], notification_type: &str, title: &str, message: &str, incident_id: Uuid) {
        for recipient in recipients {
            let new_notification = NewNotification {
                user_id: *recipient,
                notification_type: notification_type.to_string(),
                title: title.to_string(),
                message: message.to_string(),
                related_entity_type: Some("incident".to_string()),
                related_entity_id: Some(incident_id),
                action_required: false,
            };
            let notification = match self.store.create_notification(new_notification).await {
                Ok(n) => n,
                Err(err) => {
                    tracing::warn!(recipient = %recipient, error = %err, "failed to persist notification, skipping delivery");
                    continue;
                }
            };

            let connections = self.connections.read().await;
            if let Some(tx) = connections.get(recipient) {
                let frame = ServerFrame::NewNotification { notification };
                // best-effort: a dropped frame is not retried, the persisted
                // record above is authoritative.
                let _ = tx.try_send(frame);
            }
        }
    }

    /// Publish a lifecycle event. Errors are logged and swallowed — they
    /// never fail the triggering mutation.
    pub async fn publish(&self, event: NotificationEvent<'_>) {
        if let Err(err) = self.publish_inner(event).await {
            tracing::error!(error = %err, "notification publish failed");
        }
    }

    async fn publish_inner(&self, event: NotificationEvent<'_>) -> Result<(), crate::error::AppError> {
        match event {
            NotificationEvent::IncidentCreated { incident } => {
                let Some(station_id) = incident.station_id else { return Ok(()) };
                let admins = self
                    .store
                    .users_with_role_in_scope(Role::StationAdmin, Scope::Station(station_id))
                    .await?;
                let recipients: Vec<Uuid> = admins.into_iter().map(|u| u.id).collect();
                self.deliver(
                    &recipients,
                    "incident_created",
                    "New incident reported",
                    &format!("A new {} incident was reported: {}", incident.priority.as_str(), incident.title),
                    incident.id,
                )
                .await;
            }
            NotificationEvent::IncidentAssigned { incident, self_assigned, actor } => {
                if self_assigned {
                    let Some(station_id) = incident.station_id else { return Ok(()) };
                    let admins = self
                        .store
                        .users_with_role_in_scope(Role::StationAdmin, Scope::Station(station_id))
                        .await?;
                    let recipients: Vec<Uuid> = admins.into_iter().map(|u| u.id).filter(|id| *id != actor).collect();
                    self.deliver(
                        &recipients,
                        "incident_self_assigned",
                        "Incident self-assigned",
                        &format!("Incident \"{}\" was self-assigned", incident.title),
                        incident.id,
                    )
                    .await;
                } else if let Some(assignee) = incident.assigned_to {
                    self.deliver(
                        &[assignee],
                        "incident_assigned",
                        "Incident assigned to you",
                        &format!("You were assigned incident \"{}\"", incident.title),
                        incident.id,
                    )
                    .await;
                }
            }
            NotificationEvent::IncidentUpdated { incident, actor } => {
                let mut recipients: Vec<Uuid> = Vec::new();
                if let Some(assignee) = incident.assigned_to {
                    recipients.push(assignee);
                }
                if let Some(station_id) = incident.station_id {
                    let admins = self
                        .store
                        .users_with_role_in_scope(Role::StationAdmin, Scope::Station(station_id))
                        .await?;
                    recipients.extend(admins.into_iter().map(|u| u.id));
                }
                recipients.retain(|id| *id != actor);
                recipients.sort();
                recipients.dedup();
                self.deliver(
                    &recipients,
                    "incident_updated",
                    "Incident updated",
                    &format!("Incident \"{}\" status is now {}", incident.title, incident.status.as_str()),
                    incident.id,
                )
                .await;
            }
            NotificationEvent::IncidentEscalated { incident, level, actor: _ } => {
                let Some(role) = crate::models::principal::Role::from_escalation_level(level) else {
                    return Ok(());
                };
                let scope = if let Some(station_id) = incident.station_id {
                    Scope::Station(station_id)
                } else if let Some(org_id) = incident.organisation_id {
                    Scope::Organisation(org_id)
                } else {
                    Scope::All
                };
                let holders = self.store.users_with_role_in_scope(role, scope).await?;
                let recipients: Vec<Uuid> = holders.into_iter().map(|u| u.id).collect();
                self.deliver(
                    &recipients,
                    "incident_escalated",
                    "Incident escalated",
                    &format!(
                        "Incident \"{}\" escalated to level {}: {}",
                        incident.title,
                        level,
                        incident.escalation_reason.as_deref().unwrap_or("")
                    ),
                    incident.id,
                )
                .await;
            }
        }
        Ok(())
    }

    /// Dispatches a resolution (or other incident update) to citizen
    /// subscribers via their preferred channels.
    pub async fn publish_to_subscribers(&self, incident: &Incident, subject: &str, body: &str) {
        let subscriptions = match self.store.subscriptions_for_incident(incident.id).await {
            Ok(s) => s,
            Err(err) => {
                tracing::warn!(error = %err, incident_id = %incident.id, "failed to load subscriptions");
                return;
            }
        };
        for sub in subscriptions {
            self.dispatch_to_subscriber(&sub, subject, body).await;
        }
    }

    async fn dispatch_to_subscriber(&self, sub: &CitizenSubscription, subject: &str, body: &str) {
        if sub.preferences.push {
            if let Some(token) = &sub.push_token {
                self.sender.send_push(token, subject, body).await;
            }
        }
        if sub.preferences.email {
            if let Some(email) = &sub.email {
                self.sender.send_email(email, subject, body).await;
            }
        }
        if sub.preferences.sms {
            if let Some(phone) = &sub.phone {
                self.sender.send_sms(phone, body).await;
            }
        }
    }
}
