pub mod auth;
pub mod cors;
pub mod rate_limit;

pub use auth::{
    auth_middleware, generate_jwt_token, validate_jwt_token, AuthConfig, Claims, OptionalPrincipal,
};
pub use cors::{cors_middleware, create_cors_config, CorsConfig};
pub use rate_limit::{rate_limit_middleware, RateLimiter, RouteClass};
