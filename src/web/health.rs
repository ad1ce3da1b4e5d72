use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::error;

use crate::web::AppState;

#[derive(Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub database: &'static str,
}

/// GET /health
///
/// Process liveness plus a `SELECT 1` probe against the database. Always
/// answers 200; monitoring reads the `status` field.
pub async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    let database = match sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(state.pool_ref())
        .await
    {
        Ok(_) => "connected",
        Err(err) => {
            error!(?err, "health check database probe failed");
            "disconnected"
        }
    };

    Json(HealthStatus {
        status: if database == "connected" {
            "healthy"
        } else {
            "unhealthy"
        },
        timestamp: Utc::now(),
        database,
    })
}
