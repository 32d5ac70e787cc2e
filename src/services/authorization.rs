use crate::error::AppError;
use crate::models::incident::Incident;
use crate::models::principal::{Principal, Role};
use crate::store::Scope;

/// Derives the server-side visibility filter for incident reads from a
/// principal's role and scope.
pub fn visibility_scope(principal: &Principal) -> Scope {
    match principal.role {
        Role::MainAdmin => Scope::All,
        Role::SuperAdmin => principal.organisation_id.map(Scope::Organisation).unwrap_or(Scope::PublicFeed),
        Role::StationAdmin | Role::StationStaff => {
            principal.station_id.map(Scope::Station).unwrap_or(Scope::PublicFeed)
        }
        Role::Citizen => Scope::PublicFeed,
    }
}

pub fn can_view(principal: &Principal, incident: &Incident) -> bool {
    match principal.role {
        Role::MainAdmin => true,
        Role::SuperAdmin => incident.organisation_id == principal.organisation_id,
        Role::StationAdmin | Role::StationStaff => incident.station_id == principal.station_id,
        Role::Citizen => incident.status.is_active(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOp {
    Assign,
    UpdateStatus,
    Escalate,
    Resolve,
}

/// Gates a mutation by role/scope and returns `Forbidden` on denial. Does
/// not itself validate preconditions of `IncidentService`'s state machine
/// (those are separate, state-dependent checks).
pub fn can_mutate(principal: &Principal, incident: &Incident, op: MutationOp) -> Result<(), AppError> {
    if principal.role == Role::Citizen {
        return Err(AppError::Forbidden("citizens lack permission to mutate incidents".to_string()));
    }

    let in_scope = match principal.role {
        Role::MainAdmin => true,
        Role::SuperAdmin => incident.organisation_id == principal.organisation_id,
        Role::StationAdmin | Role::StationStaff => incident.station_id == principal.station_id,
        Role::Citizen => false,
    };
    if !in_scope {
        return Err(AppError::Forbidden("insufficient permission for this incident's scope".to_string()));
    }

    match op {
        MutationOp::Assign => {
            if principal.role == Role::StationStaff {
                // station_staff may only self-assign; enforced by the caller
                // comparing target_user_id == principal.user_id before this
                // check, since that comparison needs the request payload.
                return Ok(());
            }
            Ok(())
        }
        MutationOp::UpdateStatus => {
            if principal.role == Role::StationStaff && incident.assigned_to != Some(principal.user_id) {
                return Err(AppError::Forbidden("only the assignee has permission to update this incident's status".to_string()));
            }
            Ok(())
        }
        MutationOp::Escalate => Ok(()),
        MutationOp::Resolve => {
            if principal.role == Role::StationStaff && incident.assigned_to != Some(principal.user_id) {
                return Err(AppError::Forbidden("only the assignee has permission to resolve this incident".to_string()));
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::incident::{IncidentStatus, Location, Priority};
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_incident(station_id: Option<Uuid>, organisation_id: Option<Uuid>) -> Incident {
        Incident {
            id: Uuid::new_v4(),
            title: "t".into(),
            description: "d".into(),
            incident_type: "police".into(),
            priority: Priority::Medium,
            status: IncidentStatus::Reported,
            location: Location { lat: None, lng: None, address: None },
            station_id,
            organisation_id,
            reported_by_id: Uuid::nil(),
            reporter_email: None,
            reporter_phone: None,
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
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn station_staff_out_of_scope_is_forbidden() {
        let station = Uuid::new_v4();
        let other_station = Uuid::new_v4();
        let principal = Principal {
            user_id: Uuid::new_v4(),
            role: Role::StationStaff,
            organisation_id: None,
            station_id: Some(station),
        };
        let incident = sample_incident(Some(other_station), None);
        assert!(can_mutate(&principal, &incident, MutationOp::UpdateStatus).is_err());
    }

    #[test]
    fn main_admin_can_mutate_anything() {
        let principal = Principal {
            user_id: Uuid::new_v4(),
            role: Role::MainAdmin,
            organisation_id: None,
            station_id: None,
        };
        let incident = sample_incident(Some(Uuid::new_v4()), Some(Uuid::new_v4()));
        assert!(can_mutate(&principal, &incident, MutationOp::Escalate).is_ok());
    }

    #[test]
    fn citizen_can_view_only_active_statuses() {
        let principal = Principal::anonymous();
        let mut incident = sample_incident(None, None);
        incident.status = IncidentStatus::Resolved;
        assert!(!can_view(&principal, &incident));
        incident.status = IncidentStatus::Assigned;
        assert!(can_view(&principal, &incident));
    }
}
