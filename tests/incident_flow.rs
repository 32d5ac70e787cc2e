//! End-to-end scenarios driven against an in-memory `Store`, exercising the
//! full `IncidentService` lifecycle without a database.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use dispatch_backend::error::{AppError, AppResult};
use dispatch_backend::models::citizen_subscription::{CitizenSubscription, NotificationPreferences};
use dispatch_backend::models::incident::{
    AssignRequest, CreateAuthenticatedIncidentRequest, CreateCitizenReportRequest, EscalateRequest, Incident,
    IncidentStatus, Location, Priority, ResolveRequest, UpdateStatusRequest,
};
use dispatch_backend::models::invitation::Invitation;
use dispatch_backend::models::notification::Notification;
use dispatch_backend::models::organization::Organization;
use dispatch_backend::models::principal::{Principal, Role};
use dispatch_backend::models::station::Station;
use dispatch_backend::models::user::User;
use dispatch_backend::services::incident_service::IncidentService;
use dispatch_backend::services::message_sender::LoggingMessageSender;
use dispatch_backend::services::notification_bus::NotificationBus;
use dispatch_backend::services::routing::RoutingEngine;
use dispatch_backend::services::subscription_registry::SubscriptionRegistry;
use dispatch_backend::store::{
    IncidentFilter, IncidentPatch, NewAuditLog, NewCitizenSubscription, NewIncident, NewNotification, Scope,
    StationWithOrg, Store,
};

#[derive(Default)]
struct FakeStore {
    incidents: Mutex<HashMap<Uuid, Incident>>,
    stations: Mutex<HashMap<Uuid, Station>>,
    organizations: Mutex<HashMap<Uuid, Organization>>,
    users: Mutex<HashMap<Uuid, User>>,
    upvotes: Mutex<HashMap<(Uuid, String), ()>>,
    subscriptions: Mutex<HashMap<Uuid, CitizenSubscription>>,
    invitations: Mutex<HashMap<Uuid, Invitation>>,
}

#[async_trait]
impl Store for FakeStore {
    async fn create_incident(&self, new: NewIncident, _audit: NewAuditLog) -> AppResult<Incident> {
        let now = Utc::now();
        let incident = Incident {
            id: Uuid::new_v4(),
            title: new.title,
            description: new.description,
            incident_type: new.incident_type,
            priority: new.priority,
            status: new.status,
            location: Location { lat: new.location_lat, lng: new.location_lng, address: new.location_address },
            station_id: new.station_id,
            organisation_id: new.organisation_id,
            reported_by_id: new.reported_by_id,
            reporter_email: new.reporter_email,
            reporter_phone: new.reporter_phone,
            assigned_to: None,
            assigned_by: None,
            assigned_at: None,
            resolved_by: None,
            resolved_at: None,
            resolution: None,
            escalation_level: 0,
            escalated_by: None,
            escalated_at: None,
            escalation_reason: None,
            status_updated_at: None,
            upvote_count: 0,
            created_at: now,
            updated_at: now,
        };
        self.incidents.lock().unwrap().insert(incident.id, incident.clone());
        Ok(incident)
    }

    async fn find_incident(&self, id: Uuid) -> AppResult<Option<Incident>> {
        Ok(self.incidents.lock().unwrap().get(&id).cloned())
    }

    async fn list_incidents(&self, filter: IncidentFilter) -> AppResult<Vec<Incident>> {
        let incidents = self.incidents.lock().unwrap();
        Ok(incidents
            .values()
            .filter(|i| match &filter.scope {
                Some(Scope::All) | None => true,
                Some(Scope::PublicFeed) => i.status.is_active(),
                Some(Scope::Organisation(org)) => i.organisation_id == Some(*org),
                Some(Scope::Station(station)) => i.station_id == Some(*station),
            })
            .cloned()
            .collect())
    }

    async fn update_incident(&self, id: Uuid, patch: IncidentPatch, _audit: NewAuditLog) -> AppResult<Incident> {
        let mut incidents = self.incidents.lock().unwrap();
        let incident = incidents.get_mut(&id).ok_or_else(|| AppError::NotFound("incident not found".to_string()))?;

        if let Some(status) = patch.status {
            incident.status = status;
        }
        if let Some(priority) = patch.priority {
            incident.priority = priority;
        }
        if let Some(assigned_to) = patch.assigned_to {
            incident.assigned_to = Some(assigned_to);
        }
        if let Some(assigned_by) = patch.assigned_by {
            incident.assigned_by = Some(assigned_by);
        }
        if let Some(assigned_at) = patch.assigned_at {
            incident.assigned_at = Some(assigned_at);
        }
        if let Some(resolved_by) = patch.resolved_by {
            incident.resolved_by = Some(resolved_by);
        }
        if let Some(resolved_at) = patch.resolved_at {
            incident.resolved_at = Some(resolved_at);
        }
        if let Some(resolution) = patch.resolution {
            incident.resolution = Some(resolution);
        }
        if let Some(level) = patch.escalation_level {
            incident.escalation_level = level;
        }
        if let Some(escalated_by) = patch.escalated_by {
            incident.escalated_by = escalated_by;
        }
        if let Some(escalated_at) = patch.escalated_at {
            incident.escalated_at = Some(escalated_at);
        }
        if let Some(reason) = patch.escalation_reason {
            incident.escalation_reason = Some(reason);
        }
        if let Some(status_updated_at) = patch.status_updated_at {
            incident.status_updated_at = Some(status_updated_at);
        }
        if let Some(upvotes) = patch.upvote_count {
            incident.upvote_count = upvotes;
        }
        incident.updated_at = Utc::now();
        Ok(incident.clone())
    }

    async fn stations_for_category(&self, category: &str) -> AppResult<Vec<StationWithOrg>> {
        let stations = self.stations.lock().unwrap();
        let organizations = self.organizations.lock().unwrap();
        Ok(stations
            .values()
            .filter_map(|s| {
                let org = organizations.get(&s.organisation_id)?;
                (org.org_type == category).then(|| StationWithOrg { station: s.clone(), organisation: org.clone() })
            })
            .collect())
    }

    async fn find_station(&self, id: Uuid) -> AppResult<Option<Station>> {
        Ok(self.stations.lock().unwrap().get(&id).cloned())
    }

    async fn find_organization(&self, id: Uuid) -> AppResult<Option<Organization>> {
        Ok(self.organizations.lock().unwrap().get(&id).cloned())
    }

    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self.users.lock().unwrap().values().find(|u| u.email == email).cloned())
    }

    async fn verify_credentials(&self, _email: &str, _password: &str) -> AppResult<Option<User>> {
        unimplemented!("not exercised by these scenarios")
    }

    async fn users_with_role_in_scope(&self, role: Role, scope: Scope) -> AppResult<Vec<User>> {
        let users = self.users.lock().unwrap();
        Ok(users
            .values()
            .filter(|u| u.role == role)
            .filter(|u| match scope {
                Scope::All => true,
                Scope::Organisation(org) => u.organisation_id == Some(org),
                Scope::Station(station) => u.station_id == Some(station),
                Scope::PublicFeed => false,
            })
            .cloned()
            .collect())
    }

    async fn record_upvote(&self, incident_id: Uuid, actor_key: &str) -> AppResult<i32> {
        let mut upvotes = self.upvotes.lock().unwrap();
        let key = (incident_id, actor_key.to_string());
        let is_new = upvotes.insert(key, ()).is_none();

        let mut incidents = self.incidents.lock().unwrap();
        let incident = incidents.get_mut(&incident_id).ok_or_else(|| AppError::NotFound("incident not found".to_string()))?;
        if is_new {
            incident.upvote_count += 1;
        }
        Ok(incident.upvote_count)
    }

    async fn create_notification(&self, new: NewNotification) -> AppResult<Notification> {
        Ok(Notification {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            notification_type: new.notification_type,
            title: new.title,
            message: new.message,
            related_entity_type: new.related_entity_type,
            related_entity_id: new.related_entity_id,
            action_required: new.action_required,
            is_read: false,
            created_at: Utc::now(),
        })
    }

    async fn create_subscription(&self, new: NewCitizenSubscription) -> AppResult<CitizenSubscription> {
        let now = Utc::now();
        let subscription = CitizenSubscription {
            id: Uuid::new_v4(),
            incident_id: new.incident_id,
            push_token: new.push_token,
            email: new.email,
            phone: new.phone,
            preferences: new.preferences,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.subscriptions.lock().unwrap().insert(subscription.id, subscription.clone());
        Ok(subscription)
    }

    async fn deactivate_subscription(&self, id: Uuid) -> AppResult<()> {
        if let Some(sub) = self.subscriptions.lock().unwrap().get_mut(&id) {
            sub.is_active = false;
        }
        Ok(())
    }

    async fn subscriptions_for_incident(&self, incident_id: Uuid) -> AppResult<Vec<CitizenSubscription>> {
        Ok(self
            .subscriptions
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.incident_id == incident_id && s.is_active)
            .cloned()
            .collect())
    }

    async fn find_invitation_by_token(&self, token: &str) -> AppResult<Option<Invitation>> {
        Ok(self.invitations.lock().unwrap().values().find(|i| i.token == token).cloned())
    }

    async fn find_invitation(&self, id: Uuid) -> AppResult<Option<Invitation>> {
        Ok(self.invitations.lock().unwrap().get(&id).cloned())
    }

    async fn revoke_invitation(&self, _id: Uuid) -> AppResult<()> {
        Ok(())
    }
}

fn harness() -> (Arc<FakeStore>, Arc<IncidentService>) {
    let store = Arc::new(FakeStore::default());
    let store_dyn: Arc<dyn Store> = store.clone();
    let routing = Arc::new(RoutingEngine::new(Vec::new()));
    let notifications = Arc::new(NotificationBus::new(store_dyn.clone(), Arc::new(LoggingMessageSender)));
    let incidents = Arc::new(IncidentService::new(store_dyn, routing, notifications));
    (store, incidents)
}

fn station_staff(station_id: Uuid) -> Principal {
    Principal { user_id: Uuid::new_v4(), role: Role::StationStaff, organisation_id: None, station_id: Some(station_id) }
}

fn main_admin() -> Principal {
    Principal { user_id: Uuid::new_v4(), role: Role::MainAdmin, organisation_id: None, station_id: None }
}

#[tokio::test]
async fn citizen_report_is_created_and_visible_on_public_feed() {
    let (store, incidents) = harness();

    let incident = incidents
        .create_from_citizen(CreateCitizenReportRequest {
            title: "Armed robbery in progress".to_string(),
            description: "Suspect with a weapon at the corner store".to_string(),
            location_address: "123 Main St".to_string(),
            priority: None,
            location_lat: None,
            location_lng: None,
            reporter_email: None,
            reporter_phone: None,
        })
        .await
        .expect("citizen report should be accepted");

    assert_eq!(incident.status, IncidentStatus::Reported);
    assert_eq!(incident.incident_type, "police");

    let public = store.list_incidents(IncidentFilter { scope: Some(Scope::PublicFeed), ..Default::default() }).await.unwrap();
    assert!(public.iter().any(|i| i.id == incident.id));
}

#[tokio::test]
async fn station_staff_cannot_update_status_of_an_incident_outside_their_station() {
    let (store, incidents) = harness();
    let own_station = Uuid::new_v4();
    let other_station = Uuid::new_v4();

    let incident = store
        .create_incident(
            NewIncident {
                title: "Break-in".to_string(),
                description: "Back door forced open".to_string(),
                incident_type: "police".to_string(),
                priority: Priority::Medium,
                status: IncidentStatus::Assigned,
                location_lat: None,
                location_lng: None,
                location_address: None,
                station_id: Some(other_station),
                organisation_id: None,
                reported_by_id: Uuid::new_v4(),
                reporter_email: None,
                reporter_phone: None,
            },
            dummy_audit(),
        )
        .await
        .unwrap();

    let staff = station_staff(own_station);
    let result = incidents
        .update_status(
            &staff,
            incident.id,
            UpdateStatusRequest { status: "in_progress".to_string(), resolution: None, notes: None, reopen_reason: None },
        )
        .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn escalating_without_a_reason_is_rejected() {
    let (store, incidents) = harness();
    let station_id = Uuid::new_v4();

    let incident = store
        .create_incident(
            NewIncident {
                title: "Structure fire".to_string(),
                description: "Smoke visible from the street".to_string(),
                incident_type: "health".to_string(),
                priority: Priority::Critical,
                status: IncidentStatus::Reported,
                location_lat: None,
                location_lng: None,
                location_address: None,
                station_id: Some(station_id),
                organisation_id: None,
                reported_by_id: Uuid::new_v4(),
                reporter_email: None,
                reporter_phone: None,
            },
            dummy_audit(),
        )
        .await
        .unwrap();

    let admin = main_admin();
    let result = incidents
        .escalate(&admin, incident.id, EscalateRequest { reason: "   ".to_string(), target_level: None })
        .await;

    assert!(matches!(result, Err(AppError::Invalid(_))));
}

#[tokio::test]
async fn auto_escalation_bumps_the_level_and_marks_the_system_as_actor() {
    let (store, incidents) = harness();

    let incident = store
        .create_incident(
            NewIncident {
                title: "Unattended welfare check".to_string(),
                description: "Neighbor hasn't been seen in days".to_string(),
                incident_type: "health".to_string(),
                priority: Priority::High,
                status: IncidentStatus::Reported,
                location_lat: None,
                location_lng: None,
                location_address: None,
                station_id: None,
                organisation_id: None,
                reported_by_id: Uuid::new_v4(),
                reporter_email: None,
                reporter_phone: None,
            },
            dummy_audit(),
        )
        .await
        .unwrap();

    let escalated = incidents.auto_escalate(incident.id, IncidentStatus::Reported, 35, Priority::High).await.unwrap();

    assert_eq!(escalated.status, IncidentStatus::Escalated);
    assert_eq!(escalated.escalation_level, 1);
    assert_eq!(escalated.escalated_by, None);
}

#[tokio::test]
async fn double_upvote_from_the_same_actor_is_idempotent() {
    let (_store, incidents) = harness();

    let incident = incidents
        .create_from_citizen(CreateCitizenReportRequest {
            title: "Pothole on 5th Ave".to_string(),
            description: "Large pothole damaging cars".to_string(),
            location_address: "5th Ave & Main".to_string(),
            priority: None,
            location_lat: None,
            location_lng: None,
            reporter_email: None,
            reporter_phone: None,
        })
        .await
        .unwrap();

    let first = incidents.upvote(incident.id, "ip:203.0.113.5").await.unwrap();
    let second = incidents.upvote(incident.id, "ip:203.0.113.5").await.unwrap();
    let third = incidents.upvote(incident.id, "ip:198.51.100.9").await.unwrap();

    assert_eq!(first, 1);
    assert_eq!(second, 1);
    assert_eq!(third, 2);
}

#[tokio::test]
async fn resolving_an_incident_notifies_its_subscribers() {
    let (store, incidents) = harness();
    let station_id = Uuid::new_v4();
    let assignee = Uuid::new_v4();

    let incident = store
        .create_incident(
            NewIncident {
                title: "Flooded basement".to_string(),
                description: "Water rising fast".to_string(),
                incident_type: "health".to_string(),
                priority: Priority::Medium,
                status: IncidentStatus::Assigned,
                location_lat: None,
                location_lng: None,
                location_address: None,
                station_id: Some(station_id),
                organisation_id: None,
                reported_by_id: Uuid::new_v4(),
                reporter_email: None,
                reporter_phone: None,
            },
            dummy_audit(),
        )
        .await
        .unwrap();

    store
        .create_subscription(NewCitizenSubscription {
            incident_id: incident.id,
            push_token: None,
            email: Some("neighbor@example.com".to_string()),
            phone: None,
            preferences: NotificationPreferences { push: false, email: true, sms: false },
        })
        .await
        .unwrap();

    store
        .update_incident(incident.id, IncidentPatch { assigned_to: Some(assignee), ..Default::default() }, dummy_audit())
        .await
        .unwrap();

    let principal = station_staff(station_id);
    let resolved = incidents
        .resolve(
            &Principal { user_id: assignee, ..principal },
            incident.id,
            ResolveRequest {
                resolution_summary: "Pump dispatched, water cleared".to_string(),
                actions_taken: vec!["Dispatched pump crew".to_string()],
                time_to_resolution: Some("40 minutes".to_string()),
            },
        )
        .await
        .unwrap();

    assert_eq!(resolved.status, IncidentStatus::Resolved);
    assert!(resolved.resolution.is_some());

    let subs = store.subscriptions_for_incident(incident.id).await.unwrap();
    assert_eq!(subs.len(), 1);
}

#[tokio::test]
async fn authenticated_report_inherits_the_reporter_principal_scope() {
    let (_store, incidents) = harness();
    let station_id = Uuid::new_v4();
    let org_id = Uuid::new_v4();
    let principal = Principal { user_id: Uuid::new_v4(), role: Role::StationStaff, organisation_id: Some(org_id), station_id: Some(station_id) };

    let incident = incidents
        .create_authenticated(
            &principal,
            CreateAuthenticatedIncidentRequest {
                title: "Suspicious package".to_string(),
                description: "Unattended bag near the entrance".to_string(),
                location_address: None,
                location_lat: None,
                location_lng: None,
                priority: Some(Priority::High),
                station_id: None,
                organisation_id: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(incident.station_id, Some(station_id));
    assert_eq!(incident.organisation_id, Some(org_id));
    assert_eq!(incident.reported_by_id, principal.user_id);
}

#[tokio::test]
async fn assignment_routes_through_the_station_registry() {
    let (store, incidents) = harness();
    let station_id = Uuid::new_v4();

    let incident = store
        .create_incident(
            NewIncident {
                title: "Noise complaint".to_string(),
                description: "Loud party past midnight".to_string(),
                incident_type: "police".to_string(),
                priority: Priority::Low,
                status: IncidentStatus::Reported,
                location_lat: None,
                location_lng: None,
                location_address: None,
                station_id: Some(station_id),
                organisation_id: None,
                reported_by_id: Uuid::new_v4(),
                reporter_email: None,
                reporter_phone: None,
            },
            dummy_audit(),
        )
        .await
        .unwrap();

    let officer = station_staff(station_id);
    let assigned = incidents
        .assign(&officer, incident.id, AssignRequest { assigned_to_id: officer.user_id, priority: None, notes: None })
        .await
        .unwrap();

    assert_eq!(assigned.status, IncidentStatus::Assigned);
    assert_eq!(assigned.assigned_to, Some(officer.user_id));

    let second_attempt = incidents
        .assign(&officer, incident.id, AssignRequest { assigned_to_id: officer.user_id, priority: None, notes: None })
        .await;
    assert!(matches!(second_attempt, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn reopening_a_resolved_incident_requires_a_reason() {
    let (store, incidents) = harness();
    let station_id = Uuid::new_v4();

    let incident = store
        .create_incident(
            NewIncident {
                title: "Gas leak".to_string(),
                description: "Smell reported near the intersection".to_string(),
                incident_type: "health".to_string(),
                priority: Priority::High,
                status: IncidentStatus::Resolved,
                location_lat: None,
                location_lng: None,
                location_address: None,
                station_id: Some(station_id),
                organisation_id: None,
                reported_by_id: Uuid::new_v4(),
                reporter_email: None,
                reporter_phone: None,
            },
            dummy_audit(),
        )
        .await
        .unwrap();

    let admin = Principal { user_id: Uuid::new_v4(), role: Role::MainAdmin, organisation_id: None, station_id: None };

    let missing_reason = incidents
        .update_status(
            &admin,
            incident.id,
            UpdateStatusRequest { status: "assigned".to_string(), resolution: None, notes: None, reopen_reason: None },
        )
        .await;
    assert!(matches!(missing_reason, Err(AppError::Invalid(_))));

    let reopened = incidents
        .update_status(
            &admin,
            incident.id,
            UpdateStatusRequest {
                status: "assigned".to_string(),
                resolution: None,
                notes: None,
                reopen_reason: Some("New evidence surfaced".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(reopened.status, IncidentStatus::Assigned);
}

#[tokio::test]
async fn unsubscribing_stops_further_delivery() {
    let (store, _incidents) = harness();
    let station_id = Uuid::new_v4();

    let incident = store
        .create_incident(
            NewIncident {
                title: "Downed power line".to_string(),
                description: "Wire sparking across the sidewalk".to_string(),
                incident_type: "health".to_string(),
                priority: Priority::High,
                status: IncidentStatus::Reported,
                location_lat: None,
                location_lng: None,
                location_address: None,
                station_id: Some(station_id),
                organisation_id: None,
                reported_by_id: Uuid::new_v4(),
                reporter_email: None,
                reporter_phone: None,
            },
            dummy_audit(),
        )
        .await
        .unwrap();

    let subscriptions = SubscriptionRegistry::new(store.clone());
    let subscription = subscriptions
        .subscribe(
            incident.id,
            None,
            Some("bystander@example.com".to_string()),
            None,
            NotificationPreferences { push: false, email: true, sms: false },
        )
        .await
        .unwrap();

    assert_eq!(store.subscriptions_for_incident(incident.id).await.unwrap().len(), 1);

    subscriptions.unsubscribe(incident.id, subscription.id).await.unwrap();

    let active = store.subscriptions_for_incident(incident.id).await.unwrap();
    assert!(active.is_empty(), "publish_to_subscribers reads this same list, so an inactive subscription never receives a later publish");
}

fn dummy_audit() -> NewAuditLog {
    use dispatch_backend::store::AuditEnvelope;
    NewAuditLog {
        user_id: None,
        entity_type: "incident".to_string(),
        entity_id: None,
        action: "test_fixture".to_string(),
        envelope: AuditEnvelope { v: 1, kind: "test_fixture".to_string(), payload: serde_json::json!({}) },
    }
}
