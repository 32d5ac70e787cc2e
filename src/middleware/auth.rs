use axum::{
    extract::{FromRequestParts, Request},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::principal::{Principal, Role};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: String,
    pub organisation_id: Option<Uuid>,
    pub station_id: Option<Uuid>,
    pub exp: usize,
    pub iat: usize,
    pub jti: String,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_expiration_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "development-secret-key-change-in-production".to_string(),
            token_expiration_secs: 86_400,
        }
    }
}

pub fn generate_jwt_token(principal: &Principal, config: &AuthConfig) -> Result<String, AppError> {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() as usize;
    let claims = Claims {
        sub: principal.user_id,
        role: principal.role.as_str().to_string(),
        organisation_id: principal.organisation_id,
        station_id: principal.station_id,
        exp: now + config.token_expiration_secs as usize,
        iat: now,
        jti: Uuid::new_v4().to_string(),
    };
    let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
    encode(&Header::default(), &claims, &encoding_key).map_err(AppError::from)
}

pub fn validate_jwt_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::default();
    validation.validate_exp = true;
    let token_data = decode::<Claims>(token, &decoding_key, &validation)?;
    Ok(token_data.claims)
}

impl Claims {
    pub fn to_principal(&self) -> Principal {
        Principal {
            user_id: self.sub,
            role: Role::parse(&self.role).unwrap_or(Role::Citizen),
            organisation_id: self.organisation_id,
            station_id: self.station_id,
        }
    }
}

/// Validates the bearer token (if present) and inserts the resulting
/// `Principal` into request extensions. Routes that require authentication
/// use the `Principal` extractor below, which rejects when absent; public
/// routes that merely benefit from knowing the caller read it as
/// `Option<Principal>`.
pub async fn auth_middleware(auth_config: axum::extract::State<AuthConfig>, mut request: Request, next: Next) -> Response {
    if let Some(token) = extract_bearer_token_from_request(&request) {
        if let Ok(claims) = validate_jwt_token(&token, &auth_config.jwt_secret) {
            request.extensions_mut().insert(claims.to_principal());
        }
    }
    next.run(request).await
}

fn extract_bearer_token_from_request(request: &Request) -> Option<String> {
    let raw = request.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    raw.strip_prefix("Bearer ").map(|s| s.to_string())
}

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or(AppError::Unauthenticated)
    }
}

/// Marker extractor for routes that are public but still propagate the
/// principal when a valid token was presented (e.g. citizen endpoints that
/// behave slightly differently for logged-in staff).
pub struct OptionalPrincipal(pub Option<Principal>);

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for OptionalPrincipal
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalPrincipal(parts.extensions.get::<Principal>().cloned()))
    }
}
