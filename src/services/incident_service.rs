use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::citizen_subscription::NotificationPreferences;
use crate::models::incident::{
    AssignRequest, CreateAuthenticatedIncidentRequest, CreateCitizenReportRequest, EscalateRequest,
    Incident, IncidentStatus, Priority, ProgressUpdateRequest, ResolveRequest, UpdatePriorityRequest,
    UpdateStatusRequest,
};
use crate::models::principal::{Principal, Role, ANONYMOUS_SENTINEL};
use crate::models::station::GeoPoint;
use crate::services::authorization::{can_mutate, MutationOp};
use crate::services::classifier::Classifier;
use crate::services::notification_bus::{NotificationBus, NotificationEvent};
use crate::services::routing::RoutingEngine;
use crate::store::{AuditEnvelope, IncidentPatch, NewAuditLog, NewCitizenSubscription, NewIncident, Store};

/// Implements the incident lifecycle state machine and every operation
/// that mutates an incident. Authorization is delegated to
/// [`crate::services::authorization`]; classification and routing are
/// delegated to the [`Classifier`] and [`RoutingEngine`].
pub struct IncidentService {
    store: Arc<dyn Store>,
    routing: Arc<RoutingEngine>,
    notifications: Arc<NotificationBus>,
}

impl IncidentService {
    pub fn new(store: Arc<dyn Store>, routing: Arc<RoutingEngine>, notifications: Arc<NotificationBus>) -> Self {
        Self { store, routing, notifications }
    }

    async fn classify_and_route(
        &self,
        title: &str,
        description: &str,
        lat: Option<f64>,
        lng: Option<f64>,
        address: Option<&str>,
        priority: Priority,
    ) -> (String, Option<Uuid>, Option<Uuid>) {
        let classification = Classifier::classify(title, description);
        let category = classification.category.as_str();

        let point = match (lat, lng) {
            (Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
            _ => match address {
                Some(address) if !address.trim().is_empty() => self.routing.geocode(address).await,
                _ => None,
            },
        };
        let Some(point) = point else {
            return (category.to_string(), None, None);
        };

        let candidates = match self.store.stations_for_category(category).await {
            Ok(c) => c,
            Err(err) => {
                tracing::warn!(error = %err, "failed to load candidate stations");
                return (category.to_string(), None, None);
            }
        };

        match self.routing.select_optimal_station(candidates, point, priority).await {
            Ok(selected) => {
                let station = match self.store.find_station(selected.station_id).await {
                    Ok(s) => s,
                    Err(_) => None,
                };
                let organisation_id = station.map(|s| s.organisation_id);
                (category.to_string(), Some(selected.station_id), organisation_id)
            }
            Err(err) => {
                tracing::warn!(error = %err, category, "station selection failed, leaving incident unrouted");
                (category.to_string(), None, None)
            }
        }
    }

    pub async fn create_from_citizen(&self, payload: CreateCitizenReportRequest) -> AppResult<Incident> {
        if payload.title.trim().is_empty() {
            return Err(AppError::invalid("title", "title is required"));
        }
        if payload.description.trim().is_empty() {
            return Err(AppError::invalid("description", "description is required"));
        }
        if payload.location_address.trim().is_empty() {
            return Err(AppError::invalid("location_address", "location_address is required"));
        }

        let priority = payload.priority.unwrap_or(Priority::Medium);
        let (category, station_id, organisation_id) = self
            .classify_and_route(
                &payload.title,
                &payload.description,
                payload.location_lat,
                payload.location_lng,
                Some(&payload.location_address),
                priority,
            )
            .await;

        let new = NewIncident {
            title: payload.title,
            description: payload.description,
            incident_type: category,
            priority,
            status: IncidentStatus::Reported,
            location_lat: payload.location_lat,
            location_lng: payload.location_lng,
            location_address: Some(payload.location_address),
            station_id,
            organisation_id,
            reported_by_id: ANONYMOUS_SENTINEL,
            reporter_email: payload.reporter_email,
            reporter_phone: payload.reporter_phone,
        };

        let incident = self
            .store
            .create_incident(
                new,
                NewAuditLog {
                    user_id: None,
                    entity_type: "incident".to_string(),
                    entity_id: None,
                    action: "incident_created".to_string(),
                    envelope: AuditEnvelope {
                        v: 1,
                        kind: "incident_created".to_string(),
                        payload: serde_json::json!({ "source": "citizen" }),
                    },
                },
            )
            .await?;

        self.notifications.publish(NotificationEvent::IncidentCreated { incident: &incident }).await;
        Ok(incident)
    }

    pub async fn create_authenticated(
        &self,
        principal: &Principal,
        payload: CreateAuthenticatedIncidentRequest,
    ) -> AppResult<Incident> {
        if payload.title.trim().is_empty() {
            return Err(AppError::invalid("title", "title is required"));
        }
        if payload.description.trim().is_empty() {
            return Err(AppError::invalid("description", "description is required"));
        }

        let priority = payload.priority.unwrap_or(Priority::Medium);
        let (category, routed_station_id, routed_org_id) = self
            .classify_and_route(
                &payload.title,
                &payload.description,
                payload.location_lat,
                payload.location_lng,
                payload.location_address.as_deref(),
                priority,
            )
            .await;

        let station_id = payload.station_id.or(principal.station_id).or(routed_station_id);
        let organisation_id = payload.organisation_id.or(principal.organisation_id).or(routed_org_id);

        let new = NewIncident {
            title: payload.title,
            description: payload.description,
            incident_type: category,
            priority,
            status: IncidentStatus::Reported,
            location_lat: payload.location_lat,
            location_lng: payload.location_lng,
            location_address: payload.location_address,
            station_id,
            organisation_id,
            reported_by_id: principal.user_id,
            reporter_email: None,
            reporter_phone: None,
        };

        let incident = self
            .store
            .create_incident(
                new,
                NewAuditLog {
                    user_id: Some(principal.user_id),
                    entity_type: "incident".to_string(),
                    entity_id: None,
                    action: "incident_created".to_string(),
                    envelope: AuditEnvelope {
                        v: 1,
                        kind: "incident_created".to_string(),
                        payload: serde_json::json!({ "source": "authenticated" }),
                    },
                },
            )
            .await?;

        self.notifications.publish(NotificationEvent::IncidentCreated { incident: &incident }).await;
        Ok(incident)
    }

    async fn load(&self, incident_id: Uuid) -> AppResult<Incident> {
        self.store
            .find_incident(incident_id)
            .await?
            .ok_or_else(|| AppError::NotFound("incident not found".to_string()))
    }

    pub async fn assign(&self, principal: &Principal, incident_id: Uuid, req: AssignRequest) -> AppResult<Incident> {
        let incident = self.load(incident_id).await?;

        if principal.role == Role::StationStaff && req.assigned_to_id != principal.user_id {
            return Err(AppError::Forbidden("station staff may only self-assign".to_string()));
        }
        can_mutate(principal, &incident, MutationOp::Assign)?;

        if incident.status != IncidentStatus::Reported {
            return Err(AppError::Conflict(format!(
                "cannot assign an incident in status {}",
                incident.status.as_str()
            )));
        }

        let now = Utc::now();
        let patch = IncidentPatch {
            status: Some(IncidentStatus::Assigned),
            priority: req.priority,
            assigned_to: Some(req.assigned_to_id),
            assigned_by: Some(principal.user_id),
            assigned_at: Some(now),
            status_updated_at: Some(now),
            ..Default::default()
        };

        let updated = self
            .store
            .update_incident(
                incident_id,
                patch,
                NewAuditLog {
                    user_id: Some(principal.user_id),
                    entity_type: "incident".to_string(),
                    entity_id: Some(incident_id),
                    action: "incident_assigned".to_string(),
                    envelope: AuditEnvelope {
                        v: 1,
                        kind: "incident_assigned".to_string(),
                        payload: serde_json::json!({ "assigned_to": req.assigned_to_id, "notes": req.notes }),
                    },
                },
            )
            .await?;

        let self_assigned = req.assigned_to_id == principal.user_id;
        self.notifications
            .publish(NotificationEvent::IncidentAssigned { incident: &updated, self_assigned, actor: principal.user_id })
            .await;
        Ok(updated)
    }

    /// Administrative priority correction, independent of the state
    /// machine — does not touch `status`.
    pub async fn update_priority(
        &self,
        principal: &Principal,
        incident_id: Uuid,
        req: UpdatePriorityRequest,
    ) -> AppResult<Incident> {
        let incident = self.load(incident_id).await?;
        can_mutate(principal, &incident, MutationOp::UpdateStatus)?;

        let updated = self
            .store
            .update_incident(
                incident_id,
                IncidentPatch { priority: Some(req.priority), ..Default::default() },
                NewAuditLog {
                    user_id: Some(principal.user_id),
                    entity_type: "incident".to_string(),
                    entity_id: Some(incident_id),
                    action: "incident_priority_changed".to_string(),
                    envelope: AuditEnvelope {
                        v: 1,
                        kind: "incident_priority_changed".to_string(),
                        payload: serde_json::json!({ "priority": req.priority.as_str() }),
                    },
                },
            )
            .await?;

        self.notifications
            .publish(NotificationEvent::IncidentUpdated { incident: &updated, actor: principal.user_id })
            .await;
        Ok(updated)
    }

    pub async fn update_status(
        &self,
        principal: &Principal,
        incident_id: Uuid,
        req: UpdateStatusRequest,
    ) -> AppResult<Incident> {
        let incident = self.load(incident_id).await?;
        can_mutate(principal, &incident, MutationOp::UpdateStatus)?;

        let new_status = IncidentStatus::parse(&req.status)
            .ok_or_else(|| AppError::invalid("status", "unrecognized status value"))?;

        validate_transition(incident.status, new_status)?;

        if new_status == IncidentStatus::Resolved && req.resolution.as_deref().map(str::trim).unwrap_or("").is_empty() {
            return Err(AppError::invalid("resolution", "resolution text is required to resolve an incident"));
        }
        let is_reopen = new_status == IncidentStatus::Assigned && incident.status == IncidentStatus::Resolved;
        if is_reopen && principal.role == Role::StationStaff {
            return Err(AppError::Forbidden("reopening an incident requires station_admin or above".to_string()));
        }
        if is_reopen && req.reopen_reason.as_deref().map(str::trim).unwrap_or("").is_empty() {
            return Err(AppError::invalid("reopen_reason", "a reason is required to reopen a resolved incident"));
        }

        let now = Utc::now();
        let mut patch = IncidentPatch {
            status: Some(new_status),
            status_updated_at: Some(now),
            ..Default::default()
        };
        if new_status == IncidentStatus::Resolved {
            patch.resolved_by = Some(principal.user_id);
            patch.resolved_at = Some(now);
            patch.resolution = req.resolution.clone();
        }

        let updated = self
            .store
            .update_incident(
                incident_id,
                patch,
                NewAuditLog {
                    user_id: Some(principal.user_id),
                    entity_type: "incident".to_string(),
                    entity_id: Some(incident_id),
                    action: "incident_status_changed".to_string(),
                    envelope: AuditEnvelope {
                        v: 1,
                        kind: "incident_status_changed".to_string(),
                        payload: serde_json::json!({
                            "new_status": new_status.as_str(),
                            "notes": req.notes,
                            "reopen_reason": req.reopen_reason,
                        }),
                    },
                },
            )
            .await?;

        self.notifications
            .publish(NotificationEvent::IncidentUpdated { incident: &updated, actor: principal.user_id })
            .await;
        Ok(updated)
    }

    pub async fn escalate(&self, principal: &Principal, incident_id: Uuid, req: EscalateRequest) -> AppResult<Incident> {
        let incident = self.load(incident_id).await?;
        can_mutate(principal, &incident, MutationOp::Escalate)?;

        if req.reason.trim().is_empty() {
            return Err(AppError::invalid("reason", "reason is required to escalate an incident"));
        }

        let current_level = incident.escalation_level;
        let new_level = match req.target_level {
            Some(target) => {
                if target <= current_level {
                    return Err(AppError::Conflict(format!(
                        "incident is already at escalation level {}",
                        current_level
                    )));
                }
                target.min(3)
            }
            None => {
                if current_level >= 3 {
                    return Err(AppError::Conflict("incident is already at the maximum escalation level".to_string()));
                }
                current_level + 1
            }
        };

        let principal_level = principal.role.escalation_level().unwrap_or(0);
        if principal_level >= new_level {
            return Err(AppError::Forbidden(
                "principal's role authority must be strictly below the target escalation level".to_string(),
            ));
        }

        let now = Utc::now();
        let patch = IncidentPatch {
            status: Some(IncidentStatus::Escalated),
            escalation_level: Some(new_level),
            escalated_by: Some(Some(principal.user_id)),
            escalated_at: Some(now),
            escalation_reason: Some(req.reason.clone()),
            status_updated_at: Some(now),
            ..Default::default()
        };

        let updated = self
            .store
            .update_incident(
                incident_id,
                patch,
                NewAuditLog {
                    user_id: Some(principal.user_id),
                    entity_type: "incident".to_string(),
                    entity_id: Some(incident_id),
                    action: "incident_escalated".to_string(),
                    envelope: AuditEnvelope {
                        v: 1,
                        kind: "incident_escalated".to_string(),
                        payload: serde_json::json!({ "level": new_level, "reason": req.reason }),
                    },
                },
            )
            .await?;

        self.notifications
            .publish(NotificationEvent::IncidentEscalated { incident: &updated, level: new_level, actor: Some(principal.user_id) })
            .await;
        Ok(updated)
    }

    /// Called by the escalation scheduler on an elapsed-threshold tick.
    /// `escalated_by` is `None` — the system, not a principal.
    pub async fn auto_escalate(
        &self,
        incident_id: Uuid,
        from_status: IncidentStatus,
        minutes_elapsed: i64,
        priority: Priority,
    ) -> AppResult<Incident> {
        let incident = self.load(incident_id).await?;
        if incident.escalation_level >= 3 {
            return Ok(incident);
        }

        let new_level = (incident.escalation_level + 1).min(3);
        let reason = format!(
            "Auto-escalated: {} for {} minutes ({} priority)",
            from_status.as_str(),
            minutes_elapsed,
            priority.as_str()
        );
        let now = Utc::now();

        let patch = IncidentPatch {
            status: Some(IncidentStatus::Escalated),
            escalation_level: Some(new_level),
            escalated_by: Some(None),
            escalated_at: Some(now),
            escalation_reason: Some(reason.clone()),
            status_updated_at: Some(now),
            ..Default::default()
        };

        let updated = self
            .store
            .update_incident(
                incident_id,
                patch,
                NewAuditLog {
                    user_id: None,
                    entity_type: "incident".to_string(),
                    entity_id: Some(incident_id),
                    action: "incident_escalated".to_string(),
                    envelope: AuditEnvelope {
                        v: 1,
                        kind: "incident_escalated".to_string(),
                        payload: serde_json::json!({ "level": new_level, "reason": reason, "auto": true }),
                    },
                },
            )
            .await?;

        self.notifications
            .publish(NotificationEvent::IncidentEscalated { incident: &updated, level: new_level, actor: None })
            .await;
        Ok(updated)
    }

    /// Idempotent: duplicate `(actorKey, incidentId)` pairs silently no-op.
    pub async fn upvote(&self, incident_id: Uuid, actor_key: &str) -> AppResult<i32> {
        self.load(incident_id).await?;
        self.store.record_upvote(incident_id, actor_key).await
    }

    /// Persists the citizen's follow-up contact as a (push-token-less)
    /// subscription, the same storage `SubscriptionRegistry` uses for
    /// `Subscribe` — a follow-up registration is a subscription whose
    /// audience is exactly the reporter who asked to be kept informed.
    pub async fn register_follow_up(
        &self,
        incident_id: Uuid,
        email: Option<String>,
        phone: Option<String>,
        notification_preference: Option<String>,
    ) -> AppResult<()> {
        self.load(incident_id).await?;
        if email.is_none() && phone.is_none() {
            return Err(AppError::invalid("contact", "at least one of email or phone is required"));
        }

        let preferences = NotificationPreferences {
            push: notification_preference.as_deref() == Some("push"),
            email: email.is_some() && notification_preference.as_deref() != Some("sms"),
            sms: phone.is_some() && notification_preference.as_deref() != Some("email"),
        };

        self.store
            .create_subscription(NewCitizenSubscription {
                incident_id,
                push_token: None,
                email,
                phone,
                preferences,
            })
            .await?;
        Ok(())
    }

    pub async fn progress_update(
        &self,
        principal: &Principal,
        incident_id: Uuid,
        req: ProgressUpdateRequest,
    ) -> AppResult<Incident> {
        self.update_status(
            principal,
            incident_id,
            UpdateStatusRequest {
                status: req.status,
                resolution: None,
                notes: Some(req.message),
                reopen_reason: None,
            },
        )
        .await
    }

    pub async fn resolve(&self, principal: &Principal, incident_id: Uuid, req: ResolveRequest) -> AppResult<Incident> {
        let updated = self
            .update_status(
                principal,
                incident_id,
                UpdateStatusRequest {
                    status: "resolved".to_string(),
                    resolution: Some(req.resolution_summary.clone()),
                    notes: None,
                    reopen_reason: None,
                },
            )
            .await?;

        let time_to_resolution = req
            .time_to_resolution
            .unwrap_or_else(|| format!("{} minutes", (Utc::now() - updated.created_at).num_minutes()));
        let resolver = self.store.find_user(principal.user_id).await.ok().flatten();
        let resolver_name = resolver
            .map(|u| u.email)
            .unwrap_or_else(|| "a dispatcher".to_string());
        let actions = if req.actions_taken.is_empty() {
            "No specific actions listed.".to_string()
        } else {
            req.actions_taken.join(", ")
        };
        let body = format!(
            "Incident \"{}\" has been resolved by {} in {}.\nActions taken: {}\nSummary: {}",
            updated.title, resolver_name, time_to_resolution, actions, req.resolution_summary
        );
        let subject = format!("Resolved: {}", updated.title);
        self.notifications.publish_to_subscribers(&updated, &subject, &body).await;

        Ok(updated)
    }
}

fn validate_transition(from: IncidentStatus, to: IncidentStatus) -> AppResult<()> {
    use IncidentStatus::*;
    let allowed = match (from, to) {
        (Reported, Assigned) => true,
        (Reported, Escalated) | (Assigned, Escalated) | (InProgress, Escalated) => true,
        (Assigned, InProgress) => true,
        (Assigned, Resolved) | (InProgress, Resolved) => true,
        (Resolved, Assigned) => true,
        (a, b) if a == b => true,
        _ => false,
    };
    if allowed {
        Ok(())
    } else {
        Err(AppError::Conflict(format!(
            "cannot transition from {} to {}",
            from.as_str(),
            to.as_str()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reported_to_assigned_is_allowed() {
        assert!(validate_transition(IncidentStatus::Reported, IncidentStatus::Assigned).is_ok());
    }

    #[test]
    fn resolved_to_in_progress_is_rejected() {
        assert!(validate_transition(IncidentStatus::Resolved, IncidentStatus::InProgress).is_err());
    }

    #[test]
    fn resolved_to_assigned_reopen_is_allowed() {
        assert!(validate_transition(IncidentStatus::Resolved, IncidentStatus::Assigned).is_ok());
    }
}
