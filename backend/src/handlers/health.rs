//! Health check handler

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub database: DatabaseHealth,
}

#[derive(Serialize)]
pub struct DatabaseHealth {
    pub reachable: bool,
    pub pool_connections: u32,
    pub pool_idle: usize,
}

/// Liveness plus a database round trip
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let reachable = sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&state.db)
        .await
        .is_ok();

    Json(HealthResponse {
        status: if reachable { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        database: DatabaseHealth {
            reachable,
            pool_connections: state.db.size(),
            pool_idle: state.db.num_idle(),
        },
    })
}
