use loco_rs::prelude::*;
use serde::Serialize;

pub fn routes() -> Routes {
    Routes::new().prefix("system").add("/health", get(health)).add("/version", get(version))
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health() -> Result<Json<HealthResponse>> {
    format::json(HealthResponse { status: "ok" })
}

#[derive(Debug, Serialize)]
struct VersionResponse {
    version: &'static str,
}

async fn version() -> Result<Json<VersionResponse>> {
    format::json(VersionResponse { version: env!("CARGO_PKG_VERSION") })
}
