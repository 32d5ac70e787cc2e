use std::sync::Arc;

use axum::Extension;
use loco_rs::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::controllers::rate_limited;
use crate::error::AppError;
use crate::middleware::rate_limit::RouteClass;
use crate::middleware::generate_jwt_token;
use crate::state::AppState;

pub fn routes(state: Arc<AppState>) -> Routes {
    Routes::new()
        .prefix("auth")
        .add("/login", rate_limited(post(login), &state, RouteClass::Auth))
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct LoginUser {
    id: Uuid,
    email: String,
    role: String,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    token: String,
    user: LoginUser,
}

/// Authenticates a login attempt against the stored password hash and
/// mints a JWT. The only token-minting surface the core exposes;
/// registration and password reset live upstream of the dispatch pipeline.
async fn login(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> std::result::Result<Json<LoginResponse>, AppError> {
    let user = state
        .store
        .verify_credentials(&payload.email, &payload.password)
        .await?
        .ok_or_else(|| AppError::invalid("email", "invalid email or password"))?;

    let principal = user.to_principal();
    let token = generate_jwt_token(&principal, &state.auth_config)?;

    Ok(Json(LoginResponse {
        token,
        user: LoginUser { id: user.id, email: user.email, role: principal.role.as_str().to_string() },
    }))
}
