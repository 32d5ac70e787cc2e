use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::_entities::{
    audit_logs, citizen_subscriptions, incidents, invitations, notifications, organizations,
    stations, upvotes, users,
};
use crate::models::citizen_subscription::CitizenSubscription;
use crate::models::incident::{Incident, IncidentStatus, Priority};
use crate::models::invitation::Invitation;
use crate::models::notification::Notification;
use crate::models::organization::Organization;
use crate::models::principal::Role;
use crate::models::station::Station;
use crate::models::user::User;

use super::{
    IncidentFilter, IncidentPatch, NewAuditLog, NewCitizenSubscription, NewIncident,
    NewNotification, Scope, StationWithOrg, Store,
};

/// `Store` implementation backed by the application's `sea-orm` connection
/// pool. Every method here is the only place the rest of the crate's
/// business logic is allowed to reach a `sea_orm` entity.
pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn apply_incident_scope(
    mut query: sea_orm::Select<incidents::Entity>,
    scope: &Scope,
) -> sea_orm::Select<incidents::Entity> {
    query = match scope {
        Scope::All => query,
        Scope::Organisation(org_id) => query.filter(incidents::Column::OrganisationId.eq(*org_id)),
        Scope::Station(station_id) => query.filter(incidents::Column::StationId.eq(*station_id)),
        Scope::PublicFeed => query.filter(
            Condition::any()
                .add(incidents::Column::Status.eq("reported"))
                .add(incidents::Column::Status.eq("assigned"))
                .add(incidents::Column::Status.eq("in_progress")),
        ),
    };
    query
}

#[async_trait]
impl Store for SeaOrmStore {
    async fn create_incident(&self, new: NewIncident, audit: NewAuditLog) -> AppResult<Incident> {
        let txn = self.db.begin().await?;

        let now = Utc::now().naive_utc();
        let model = incidents::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(new.title),
            description: Set(new.description),
            incident_type: Set(new.incident_type),
            priority: Set(new.priority.as_str().to_string()),
            status: Set(new.status.as_str().to_string()),
            location_lat: Set(new.location_lat),
            location_lng: Set(new.location_lng),
            location_address: Set(new.location_address),
            station_id: Set(new.station_id),
            organisation_id: Set(new.organisation_id),
            reported_by_id: Set(new.reported_by_id),
            reporter_email: Set(new.reporter_email),
            reporter_phone: Set(new.reporter_phone),
            assigned_to: Set(None),
            assigned_by: Set(None),
            assigned_at: Set(None),
            resolved_by: Set(None),
            resolved_at: Set(None),
            resolution: Set(None),
            escalation_level: Set(0),
            escalated_by: Set(None),
            escalated_at: Set(None),
            escalation_reason: Set(None),
            status_updated_at: Set(Some(now)),
            upvote_count: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let inserted = model.insert(&txn).await?;
        insert_audit_log(&txn, audit, Some(inserted.id)).await?;

        txn.commit().await?;
        Ok(inserted.into())
    }

    async fn find_incident(&self, id: Uuid) -> AppResult<Option<Incident>> {
        let found = incidents::Entity::find_by_id(id).one(&self.db).await?;
        Ok(found.map(Into::into))
    }

    async fn list_incidents(&self, filter: IncidentFilter) -> AppResult<Vec<Incident>> {
        let mut query = incidents::Entity::find();
        if let Some(scope) = &filter.scope {
            query = apply_incident_scope(query, scope);
        }
        if let Some(status) = filter.status {
            query = query.filter(incidents::Column::Status.eq(status.as_str()));
        }
        if let Some(priority) = filter.priority {
            query = query.filter(incidents::Column::Priority.eq(priority.as_str()));
        }
        if let Some(search) = filter.search {
            query = query.filter(
                Condition::any()
                    .add(incidents::Column::Title.contains(search.as_str()))
                    .add(incidents::Column::Description.contains(search.as_str())),
            );
        }
        let rows = query
            .order_by_desc(incidents::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update_incident(&self, id: Uuid, patch: IncidentPatch, audit: NewAuditLog) -> AppResult<Incident> {
        let txn = self.db.begin().await?;

        let row = incidents::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("incident not found".to_string()))?;
        let mut active: incidents::ActiveModel = row.into();

        if let Some(status) = patch.status {
            active.status = Set(status.as_str().to_string());
        }
        if let Some(priority) = patch.priority {
            active.priority = Set(priority.as_str().to_string());
        }
        if let Some(assigned_to) = patch.assigned_to {
            active.assigned_to = Set(Some(assigned_to));
        }
        if let Some(assigned_by) = patch.assigned_by {
            active.assigned_by = Set(Some(assigned_by));
        }
        if let Some(assigned_at) = patch.assigned_at {
            active.assigned_at = Set(Some(assigned_at.naive_utc()));
        }
        if let Some(resolved_by) = patch.resolved_by {
            active.resolved_by = Set(Some(resolved_by));
        }
        if let Some(resolved_at) = patch.resolved_at {
            active.resolved_at = Set(Some(resolved_at.naive_utc()));
        }
        if let Some(resolution) = patch.resolution {
            active.resolution = Set(Some(resolution));
        }
        if let Some(level) = patch.escalation_level {
            active.escalation_level = Set(level as i32);
        }
        if let Some(escalated_by) = patch.escalated_by {
            active.escalated_by = Set(escalated_by);
        }
        if let Some(escalated_at) = patch.escalated_at {
            active.escalated_at = Set(Some(escalated_at.naive_utc()));
        }
        if let Some(reason) = patch.escalation_reason {
            active.escalation_reason = Set(Some(reason));
        }
        if let Some(status_updated_at) = patch.status_updated_at {
            active.status_updated_at = Set(Some(status_updated_at.naive_utc()));
        }
        if let Some(upvote_count) = patch.upvote_count {
            active.upvote_count = Set(upvote_count);
        }
        active.updated_at = Set(Utc::now().naive_utc());

        let updated = active.update(&txn).await?;
        insert_audit_log(&txn, audit, Some(updated.id)).await?;

        txn.commit().await?;
        Ok(updated.into())
    }

    async fn stations_for_category(&self, category: &str) -> AppResult<Vec<StationWithOrg>> {
        let orgs = organizations::Entity::find()
            .filter(organizations::Column::OrgType.eq(category))
            .filter(organizations::Column::IsActive.eq(true))
            .all(&self.db)
            .await?;

        let mut out = Vec::new();
        for org in orgs {
            let org_stations = stations::Entity::find()
                .filter(stations::Column::OrganisationId.eq(org.id))
                .filter(stations::Column::IsActive.eq(true))
                .all(&self.db)
                .await?;
            for station in org_stations {
                out.push(StationWithOrg {
                    station: station.into(),
                    organisation: org.clone().into(),
                });
            }
        }
        Ok(out)
    }

    async fn find_station(&self, id: Uuid) -> AppResult<Option<Station>> {
        Ok(stations::Entity::find_by_id(id).one(&self.db).await?.map(Into::into))
    }

    async fn find_organization(&self, id: Uuid) -> AppResult<Option<Organization>> {
        Ok(organizations::Entity::find_by_id(id).one(&self.db).await?.map(Into::into))
    }

    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(users::Entity::find_by_id(id).one(&self.db).await?.map(Into::into))
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await?
            .map(Into::into))
    }

    async fn verify_credentials(&self, email: &str, password: &str) -> AppResult<Option<User>> {
        let Some(row) = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .filter(users::Column::IsActive.eq(true))
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        if crate::models::user::verify_password(password, &row.password)? {
            Ok(Some(row.into()))
        } else {
            Ok(None)
        }
    }

    async fn users_with_role_in_scope(&self, role: Role, scope: Scope) -> AppResult<Vec<User>> {
        let mut query = users::Entity::find().filter(users::Column::Role.eq(role.as_str()));
        query = match scope {
            Scope::All => query,
            Scope::Organisation(org_id) => query.filter(users::Column::OrganisationId.eq(org_id)),
            Scope::Station(station_id) => query.filter(users::Column::StationId.eq(station_id)),
            Scope::PublicFeed => query,
        };
        let rows = query.filter(users::Column::IsActive.eq(true)).all(&self.db).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn record_upvote(&self, incident_id: Uuid, actor_key: &str) -> AppResult<i32> {
        let txn = self.db.begin().await?;

        let existing = upvotes::Entity::find()
            .filter(upvotes::Column::IncidentId.eq(incident_id))
            .filter(upvotes::Column::ActorKey.eq(actor_key))
            .one(&txn)
            .await?;

        if existing.is_none() {
            let model = upvotes::ActiveModel {
                id: Set(Uuid::new_v4()),
                incident_id: Set(incident_id),
                actor_key: Set(actor_key.to_string()),
                created_at: Set(Utc::now().naive_utc()),
            };
            model.insert(&txn).await?;

            let count = upvotes::Entity::find()
                .filter(upvotes::Column::IncidentId.eq(incident_id))
                .count(&txn)
                .await? as i32;

            let row = incidents::Entity::find_by_id(incident_id)
                .one(&txn)
                .await?
                .ok_or_else(|| AppError::NotFound("incident not found".to_string()))?;
            let mut active: incidents::ActiveModel = row.into();
            active.upvote_count = Set(count);
            active.update(&txn).await?;

            txn.commit().await?;
            return Ok(count);
        }

        let row = incidents::Entity::find_by_id(incident_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("incident not found".to_string()))?;
        txn.commit().await?;
        Ok(row.upvote_count)
    }

    async fn create_notification(&self, new: NewNotification) -> AppResult<Notification> {
        let model = notifications::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(new.user_id),
            notification_type: Set(new.notification_type),
            title: Set(new.title),
            message: Set(new.message),
            related_entity_type: Set(new.related_entity_type),
            related_entity_id: Set(new.related_entity_id),
            action_required: Set(new.action_required),
            is_read: Set(false),
            created_at: Set(Utc::now().naive_utc()),
        };
        let inserted = model.insert(&self.db).await?;
        Ok(inserted.into())
    }

    async fn create_subscription(&self, new: NewCitizenSubscription) -> AppResult<CitizenSubscription> {
        let existing = if let Some(token) = &new.push_token {
            citizen_subscriptions::Entity::find()
                .filter(citizen_subscriptions::Column::IncidentId.eq(new.incident_id))
                .filter(citizen_subscriptions::Column::PushToken.eq(token.as_str()))
                .one(&self.db)
                .await?
        } else {
            None
        };

        if let Some(existing) = existing {
            let mut active: citizen_subscriptions::ActiveModel = existing.into();
            active.is_active = Set(true);
            active.pref_push = Set(new.preferences.push);
            active.pref_email = Set(new.preferences.email);
            active.pref_sms = Set(new.preferences.sms);
            active.email = Set(new.email);
            active.phone = Set(new.phone);
            active.updated_at = Set(Utc::now().naive_utc());
            let updated = active.update(&self.db).await?;
            return Ok(updated.into());
        }

        let now = Utc::now().naive_utc();
        let model = citizen_subscriptions::ActiveModel {
            id: Set(Uuid::new_v4()),
            incident_id: Set(new.incident_id),
            push_token: Set(new.push_token),
            email: Set(new.email),
            phone: Set(new.phone),
            pref_push: Set(new.preferences.push),
            pref_email: Set(new.preferences.email),
            pref_sms: Set(new.preferences.sms),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let inserted = model.insert(&self.db).await?;
        Ok(inserted.into())
    }

    async fn deactivate_subscription(&self, id: Uuid) -> AppResult<()> {
        let row = citizen_subscriptions::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("subscription not found".to_string()))?;
        let mut active: citizen_subscriptions::ActiveModel = row.into();
        active.is_active = Set(false);
        active.updated_at = Set(Utc::now().naive_utc());
        active.update(&self.db).await?;
        Ok(())
    }

    async fn subscriptions_for_incident(&self, incident_id: Uuid) -> AppResult<Vec<CitizenSubscription>> {
        let rows = citizen_subscriptions::Entity::find()
            .filter(citizen_subscriptions::Column::IncidentId.eq(incident_id))
            .filter(citizen_subscriptions::Column::IsActive.eq(true))
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_invitation_by_token(&self, token: &str) -> AppResult<Option<Invitation>> {
        Ok(invitations::Entity::find()
            .filter(invitations::Column::Token.eq(token))
            .one(&self.db)
            .await?
            .map(Into::into))
    }

    async fn find_invitation(&self, id: Uuid) -> AppResult<Option<Invitation>> {
        Ok(invitations::Entity::find_by_id(id).one(&self.db).await?.map(Into::into))
    }

    async fn revoke_invitation(&self, id: Uuid) -> AppResult<()> {
        let row = invitations::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("invitation not found".to_string()))?;
        let mut active: invitations::ActiveModel = row.into();
        active.status = Set("revoked".to_string());
        active.updated_at = Set(Utc::now().naive_utc());
        active.update(&self.db).await?;
        Ok(())
    }
}

async fn insert_audit_log(
    txn: &sea_orm::DatabaseTransaction,
    audit: NewAuditLog,
    entity_id: Option<Uuid>,
) -> Result<(), DbErr> {
    let details = serde_json::json!({
        "v": audit.envelope.v,
        "kind": audit.envelope.kind,
        "payload": audit.envelope.payload,
    });
    let model = audit_logs::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(audit.user_id),
        entity_type: Set(audit.entity_type),
        entity_id: Set(entity_id.or(audit.entity_id)),
        action: Set(audit.action),
        details: Set(details),
        created_at: Set(Utc::now().naive_utc()),
    };
    model.insert(txn).await?;
    Ok(())
}
