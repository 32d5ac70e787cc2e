pub mod auth;
pub mod incidents;
pub mod invitations;
pub mod system;
pub mod ws;

use std::sync::Arc;

use axum::routing::MethodRouter;
use axum::{middleware, Extension};

use crate::middleware::auth_middleware;
use crate::middleware::rate_limit::{rate_limit_middleware, RouteClass};
use crate::state::AppState;

/// Attaches the shared `AppState` and the (non-rejecting) auth probe to a
/// route. Every controller route goes through this — routes that actually
/// require a caller use the `Principal` extractor, which rejects on its own.
pub fn with_state(mr: MethodRouter, state: &Arc<AppState>) -> MethodRouter {
    mr.layer(Extension(state.clone()))
        .layer(middleware::from_fn_with_state(state.auth_config.clone(), auth_middleware))
}

/// As `with_state`, plus a per-IP rate limit for the given class.
pub fn rate_limited(mr: MethodRouter, state: &Arc<AppState>, class: RouteClass) -> MethodRouter {
    with_state(mr, state).layer(middleware::from_fn_with_state(
        (state.rate_limiter.clone(), class),
        rate_limit_middleware,
    ))
}
