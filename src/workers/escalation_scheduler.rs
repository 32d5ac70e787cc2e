use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::models::incident::{IncidentStatus, Priority};
use crate::services::incident_service::IncidentService;
use crate::store::{IncidentFilter, Scope, Store};

/// {priority, fromStatus, thresholdMinutes}. `escalateToRole` is implied by
/// the level the scheduler bumps to, not carried on the rule itself, since
/// `IncidentService::auto_escalate` derives the new level from the
/// incident's current level.
#[derive(Debug, Clone, Copy)]
pub struct EscalationRule {
    pub priority: Priority,
    pub from_status: IncidentStatus,
    pub threshold_minutes: i64,
}

const RULES: &[EscalationRule] = &[
    EscalationRule { priority: Priority::Critical, from_status: IncidentStatus::Reported, threshold_minutes: 15 },
    EscalationRule { priority: Priority::High, from_status: IncidentStatus::Reported, threshold_minutes: 30 },
    EscalationRule { priority: Priority::Critical, from_status: IncidentStatus::Assigned, threshold_minutes: 20 },
    EscalationRule { priority: Priority::High, from_status: IncidentStatus::Assigned, threshold_minutes: 45 },
    EscalationRule { priority: Priority::Medium, from_status: IncidentStatus::Assigned, threshold_minutes: 120 },
    EscalationRule { priority: Priority::Critical, from_status: IncidentStatus::InProgress, threshold_minutes: 60 },
    EscalationRule { priority: Priority::High, from_status: IncidentStatus::InProgress, threshold_minutes: 120 },
    EscalationRule { priority: Priority::Medium, from_status: IncidentStatus::InProgress, threshold_minutes: 240 },
];

const INCIDENT_WINDOW_HOURS: i64 = 24;
const TICK_BUDGET: Duration = Duration::from_secs(60);

fn applicable_rule(status: IncidentStatus, priority: Priority) -> Option<&'static EscalationRule> {
    RULES.iter().find(|r| r.from_status == status && r.priority == priority)
}

/// Cooperative periodic task. Generalizes the teacher's plain
/// `tokio::spawn` + sleep loop with an explicit `CancellationToken` so the
/// scheduler can be stopped cleanly from `app.rs` instead of living as a
/// detached singleton.
pub struct EscalationScheduler {
    store: Arc<dyn Store>,
    incidents: Arc<IncidentService>,
    tick_interval: Duration,
}

impl EscalationScheduler {
    pub fn new(store: Arc<dyn Store>, incidents: Arc<IncidentService>, tick_interval: Duration) -> Self {
        Self { store, incidents, tick_interval }
    }

    pub fn spawn(self: Arc<Self>, shutdown: CancellationToken) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        tracing::info!("escalation scheduler shutting down");
                        break;
                    }
                    _ = tokio::time::sleep(self.tick_interval) => {
                        if let Err(err) = tokio::time::timeout(TICK_BUDGET, self.tick()).await {
                            tracing::warn!(error = %err, "escalation scheduler tick exceeded its time budget");
                        }
                    }
                }
            }
        })
    }

    async fn tick(&self) {
        let cutoff = Utc::now() - chrono::Duration::hours(INCIDENT_WINDOW_HOURS);

        for status in [IncidentStatus::Reported, IncidentStatus::Assigned, IncidentStatus::InProgress] {
            let incidents = match self
                .store
                .list_incidents(IncidentFilter {
                    scope: Some(Scope::All),
                    status: Some(status),
                    priority: None,
                    search: None,
                })
                .await
            {
                Ok(rows) => rows,
                Err(err) => {
                    tracing::error!(error = %err, "escalation scheduler failed to list incidents");
                    continue;
                }
            };

            for incident in incidents {
                if incident.created_at < cutoff {
                    continue;
                }
                let Some(rule) = applicable_rule(incident.status, incident.priority) else { continue };

                // Re-read before applying so two incidents racing the same
                // tick never double-escalate.
                let current = match self.store.find_incident(incident.id).await {
                    Ok(Some(i)) => i,
                    _ => continue,
                };
                if current.status != status {
                    continue;
                }

                let clock = current.escalation_clock();
                let minutes_elapsed = (Utc::now() - clock).num_minutes();
                if minutes_elapsed >= rule.threshold_minutes {
                    if let Err(err) = self
                        .incidents
                        .auto_escalate(current.id, status, minutes_elapsed, current.priority)
                        .await
                    {
                        tracing::error!(error = %err, incident_id = %current.id, "auto-escalation failed");
                    }
                }
            }
        }
    }
}
