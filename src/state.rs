use std::sync::Arc;

use crate::middleware::auth::AuthConfig;
use crate::middleware::rate_limit::RateLimiter;
use crate::services::incident_service::IncidentService;
use crate::services::notification_bus::NotificationBus;
use crate::services::subscription_registry::SubscriptionRegistry;
use crate::store::Store;

/// Shared application services, constructed once in `app.rs` and injected
/// into every controller via `axum::Extension`.
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub incidents: Arc<IncidentService>,
    pub notifications: Arc<NotificationBus>,
    pub subscriptions: Arc<SubscriptionRegistry>,
    pub auth_config: AuthConfig,
    pub rate_limiter: RateLimiter,
}
