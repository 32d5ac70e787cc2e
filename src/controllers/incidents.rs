use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Path, Query};
use axum::http::StatusCode;
use axum::Extension;
use loco_rs::prelude::*;
use uuid::Uuid;

use crate::controllers::{rate_limited, with_state};
use crate::error::AppError;
use crate::middleware::rate_limit::RouteClass;
use crate::models::citizen_subscription::{CitizenSubscription, NotificationPreferences};
use crate::models::incident::{
    AssignRequest, CreateAuthenticatedIncidentRequest, CreateCitizenReportRequest, EscalateRequest,
    FollowUpRequest, Incident, IncidentListQuery, ProgressUpdateRequest, PublicIncidentProjection,
    ResolveRequest, SubscribeRequest, UpdatePriorityRequest, UpdateStatusRequest, UpvoteResponse,
};
use crate::models::principal::Principal;
use crate::services::authorization::visibility_scope;
use crate::state::AppState;
use crate::store::{IncidentFilter, Scope};

pub fn routes(state: Arc<AppState>) -> Routes {
    Routes::new()
        .prefix("incidents")
        .add("/citizen", rate_limited(post(create_from_citizen), &state, RouteClass::Write))
        .add("/public", with_state(get(list_public), &state))
        .add("/", with_state(get(list), &state))
        .add("/", rate_limited(post(create_authenticated), &state, RouteClass::Write))
        .add("/:id", rate_limited(put(update_priority), &state, RouteClass::Write))
        .add("/:id/upvote", rate_limited(post(upvote), &state, RouteClass::Write))
        .add("/:id/assign", rate_limited(put(assign), &state, RouteClass::Write))
        .add("/:id/status", rate_limited(put(update_status), &state, RouteClass::Write))
        .add("/:id/escalate", rate_limited(post(escalate), &state, RouteClass::Write))
        .add("/:id/follow-up", rate_limited(post(follow_up), &state, RouteClass::Write))
        .add("/:id/subscribe", rate_limited(post(subscribe), &state, RouteClass::Write))
        .add("/:id/subscribe/:subscription_id", rate_limited(delete(unsubscribe), &state, RouteClass::Write))
        .add("/:id/progress-update", rate_limited(post(progress_update), &state, RouteClass::Write))
        .add("/:id/resolve", rate_limited(post(resolve), &state, RouteClass::Write))
}

async fn create_from_citizen(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<CreateCitizenReportRequest>,
) -> std::result::Result<(StatusCode, Json<Incident>), AppError> {
    let incident = state.incidents.create_from_citizen(payload).await?;
    Ok((StatusCode::CREATED, Json(incident)))
}

async fn list_public(
    Extension(state): Extension<Arc<AppState>>,
) -> std::result::Result<Json<Vec<PublicIncidentProjection>>, AppError> {
    let incidents = state
        .store
        .list_incidents(IncidentFilter { scope: Some(Scope::PublicFeed), ..Default::default() })
        .await?;
    Ok(Json(incidents.iter().map(PublicIncidentProjection::from).collect()))
}

async fn list(
    Extension(state): Extension<Arc<AppState>>,
    principal: Principal,
    Query(query): Query<IncidentListQuery>,
) -> std::result::Result<Json<Vec<Incident>>, AppError> {
    let mut filter: IncidentFilter = query.into();
    filter.scope = Some(visibility_scope(&principal));
    let incidents = state.store.list_incidents(filter).await?;
    Ok(Json(incidents))
}

async fn create_authenticated(
    Extension(state): Extension<Arc<AppState>>,
    principal: Principal,
    Json(payload): Json<CreateAuthenticatedIncidentRequest>,
) -> std::result::Result<(StatusCode, Json<Incident>), AppError> {
    let incident = state.incidents.create_authenticated(&principal, payload).await?;
    Ok((StatusCode::CREATED, Json(incident)))
}

async fn update_priority(
    Extension(state): Extension<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePriorityRequest>,
) -> std::result::Result<Json<Incident>, AppError> {
    let incident = state.incidents.update_priority(&principal, id, payload).await?;
    Ok(Json(incident))
}

async fn upvote(
    Extension(state): Extension<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Path(id): Path<Uuid>,
) -> std::result::Result<Json<UpvoteResponse>, AppError> {
    let actor_key = format!("ip:{}", addr.ip());
    let upvotes = state.incidents.upvote(id, &actor_key).await?;
    Ok(Json(UpvoteResponse { incident_id: id, upvotes }))
}

async fn assign(
    Extension(state): Extension<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignRequest>,
) -> std::result::Result<Json<Incident>, AppError> {
    let incident = state.incidents.assign(&principal, id, payload).await?;
    Ok(Json(incident))
}

async fn update_status(
    Extension(state): Extension<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> std::result::Result<Json<Incident>, AppError> {
    let incident = state.incidents.update_status(&principal, id, payload).await?;
    Ok(Json(incident))
}

async fn escalate(
    Extension(state): Extension<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<Uuid>,
    Json(payload): Json<EscalateRequest>,
) -> std::result::Result<Json<Incident>, AppError> {
    let incident = state.incidents.escalate(&principal, id, payload).await?;
    Ok(Json(incident))
}

async fn follow_up(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<FollowUpRequest>,
) -> std::result::Result<Json<serde_json::Value>, AppError> {
    state
        .incidents
        .register_follow_up(id, payload.email, payload.phone, payload.notification_preference)
        .await?;
    Ok(Json(serde_json::json!({ "status": "registered" })))
}

async fn subscribe(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SubscribeRequest>,
) -> std::result::Result<(StatusCode, Json<CitizenSubscription>), AppError> {
    let preferences = payload
        .notification_preferences
        .map(|p| NotificationPreferences {
            push: p.push.unwrap_or(false),
            email: p.email.unwrap_or(false),
            sms: p.sms.unwrap_or(false),
        })
        .unwrap_or_default();

    let subscription = state
        .subscriptions
        .subscribe(id, payload.push_token, payload.email, payload.phone, preferences)
        .await?;
    Ok((StatusCode::CREATED, Json(subscription)))
}

async fn unsubscribe(
    Extension(state): Extension<Arc<AppState>>,
    Path((id, subscription_id)): Path<(Uuid, Uuid)>,
) -> std::result::Result<StatusCode, AppError> {
    state.subscriptions.unsubscribe(id, subscription_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn progress_update(
    Extension(state): Extension<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProgressUpdateRequest>,
) -> std::result::Result<Json<Incident>, AppError> {
    let incident = state.incidents.progress_update(&principal, id, payload).await?;
    Ok(Json(incident))
}

async fn resolve(
    Extension(state): Extension<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<Uuid>,
    Json(payload): Json<ResolveRequest>,
) -> std::result::Result<Json<Incident>, AppError> {
    let incident = state.incidents.resolve(&principal, id, payload).await?;
    Ok(Json(incident))
}
