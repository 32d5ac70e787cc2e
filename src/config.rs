use loco_rs::config::Config;

use crate::middleware::auth::AuthConfig;

/// Extension trait for reading JWT configuration off loco's own `Config`,
/// falling back to environment variables the way the teacher's config.rs
/// already did for `JWT_SECRET`.
pub trait JwtConfig {
    fn get_jwt_secret(&self) -> Option<String>;
    fn get_jwt_expiration(&self) -> Option<u64>;
}

impl JwtConfig for Config {
    fn get_jwt_secret(&self) -> Option<String> {
        std::env::var("JWT_SECRET").ok().or_else(|| Some("development-secret-key-change-in-production".to_string()))
    }

    fn get_jwt_expiration(&self) -> Option<u64> {
        std::env::var("JWT_EXPIRATION_SECS").ok().and_then(|v| v.parse().ok()).or(Some(86_400))
    }
}

pub fn load_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: std::env::var("JWT_SECRET").unwrap_or_else(|_| "development-secret-key-change-in-production".to_string()),
        token_expiration_secs: std::env::var("JWT_EXPIRATION_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(86_400),
    }
}

/// API keys/base URLs for the three routing vendors. A missing key degrades
/// that provider to `ProviderError::Unavailable` rather than panicking at
/// boot, so the fallback great-circle estimate stays meaningful without any
/// vendor configured in development.
#[derive(Debug, Clone, Default)]
pub struct RoutingProviderConfig {
    pub google_maps_api_key: Option<String>,
    pub osrm_base_url: Option<String>,
    pub mapbox_api_key: Option<String>,
}

impl RoutingProviderConfig {
    pub fn from_env() -> Self {
        Self {
            google_maps_api_key: non_empty_env("GOOGLE_MAPS_API_KEY"),
            osrm_base_url: non_empty_env("OSRM_BASE_URL"),
            mapbox_api_key: non_empty_env("MAPBOX_API_KEY"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EscalationConfig {
    pub tick_interval_secs: u64,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self { tick_interval_secs: 300 }
    }
}

impl EscalationConfig {
    pub fn from_env() -> Self {
        Self {
            tick_interval_secs: std::env::var("ESCALATION_TICK_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
        }
    }
}

/// Per-channel enablement for the `MessageSender` implementation. Disabled
/// channels are no-ops at the sender, not at `NotificationBus` — subscribers
/// still get recorded, they just don't receive dispatch on that channel.
#[derive(Debug, Clone)]
pub struct NotificationConfig {
    pub push_enabled: bool,
    pub email_enabled: bool,
    pub sms_enabled: bool,
    pub frontend_url: String,
    pub allowed_origins: Vec<String>,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            push_enabled: true,
            email_enabled: true,
            sms_enabled: true,
            frontend_url: "http://localhost:3000".to_string(),
            allowed_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

impl NotificationConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            push_enabled: bool_env("PUSH_NOTIFICATIONS_ENABLED", defaults.push_enabled),
            email_enabled: bool_env("EMAIL_NOTIFICATIONS_ENABLED", defaults.email_enabled),
            sms_enabled: bool_env("SMS_NOTIFICATIONS_ENABLED", defaults.sms_enabled),
            frontend_url: std::env::var("FRONTEND_URL").unwrap_or(defaults.frontend_url),
            allowed_origins: std::env::var("ALLOWED_ORIGINS")
                .ok()
                .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.allowed_origins),
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn bool_env(key: &str, default: bool) -> bool {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
