use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use tokio::sync::Mutex;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteClass {
    Auth,
    Write,
    Upload,
    PasswordReset,
}

impl RouteClass {
    fn window(self) -> (u32, Duration) {
        match self {
            RouteClass::Auth => (5, Duration::from_secs(15 * 60)),
            RouteClass::Write => (100, Duration::from_secs(15 * 60)),
            RouteClass::Upload => (20, Duration::from_secs(60 * 60)),
            RouteClass::PasswordReset => (3, Duration::from_secs(60 * 60)),
        }
    }
}

#[derive(Debug, Clone)]
struct Window {
    count: u32,
    started_at: Instant,
}

/// In-process sliding-window rate limiter keyed by `(ip, route_class)`. No
/// Redis dependency — the smallest implementation that satisfies the write
/// quotas without pulling in a cache the application doesn't otherwise use.
#[derive(Clone, Default)]
pub struct RateLimiter {
    windows: Arc<Mutex<HashMap<(IpAddr, RouteClass), Window>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn check(&self, ip: IpAddr, class: RouteClass) -> Result<(), AppError> {
        let (limit, window_duration) = class.window();
        let mut windows = self.windows.lock().await;
        let entry = windows.entry((ip, class)).or_insert_with(|| Window {
            count: 0,
            started_at: Instant::now(),
        });

        if entry.started_at.elapsed() >= window_duration {
            entry.count = 0;
            entry.started_at = Instant::now();
        }

        entry.count += 1;
        if entry.count > limit {
            let retry_after = window_duration.saturating_sub(entry.started_at.elapsed()).as_secs();
            return Err(AppError::RateLimited { retry_after_secs: retry_after.max(1) });
        }
        Ok(())
    }
}

pub async fn rate_limit_middleware(
    State((limiter, class)): State<(RateLimiter, RouteClass)>,
    ConnectInfo(addr): ConnectInfo<std::net::SocketAddr>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    limiter.check(addr.ip(), class).await?;
    Ok(next.run(request).await)
}
