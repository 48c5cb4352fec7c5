use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::ApiResponse;

#[derive(Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}

/// GET /api/health
pub async fn health() -> Json<ApiResponse<HealthStatus>> {
    ApiResponse::new(
        "Server is healthy",
        HealthStatus {
            status: "ok",
            timestamp: Utc::now(),
        },
    )
}
