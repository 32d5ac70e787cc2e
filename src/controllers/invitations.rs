use std::sync::Arc;

use axum::extract::Path;
use axum::Extension;
use loco_rs::prelude::*;
use uuid::Uuid;

use crate::controllers::with_state;
use crate::error::AppError;
use crate::models::principal::{Principal, Role};
use crate::state::AppState;

pub fn routes(state: Arc<AppState>) -> Routes {
    Routes::new().prefix("invitations").add("/:id", with_state(delete(revoke), &state))
}

/// Revokes a pending invitation. Gated to station_admin and above, scoped
/// to the invitation's own organisation/station — the one mutation this
/// core exposes over invitations, everything else about the invite flow
/// (creation, acceptance) lives upstream.
async fn revoke(
    Extension(state): Extension<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> std::result::Result<Json<serde_json::Value>, AppError> {
    if matches!(principal.role, Role::StationStaff | Role::Citizen) {
        return Err(AppError::Forbidden("revoking an invitation requires station_admin or above".to_string()));
    }

    let invitation = state
        .store
        .find_invitation(id)
        .await?
        .ok_or_else(|| AppError::NotFound("invitation not found".to_string()))?;

    let in_scope = match principal.role {
        Role::MainAdmin => true,
        Role::SuperAdmin => invitation.organisation_id == principal.organisation_id,
        Role::StationAdmin => invitation.station_id == principal.station_id,
        Role::StationStaff | Role::Citizen => false,
    };
    if !in_scope {
        return Err(AppError::Forbidden("invitation is outside this principal's scope".to_string()));
    }

    state.store.revoke_invitation(id).await?;
    Ok(Json(serde_json::json!({ "id": id, "status": "revoked" })))
}
