//! Health check endpoints.

use std::sync::Arc;

use actix_web::{HttpResponse, get, web};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::services::DashboardService;

/// Health check response.
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    status: &'static str,
    timestamp: String,
}

/// Refresh status response.
#[derive(Serialize, ToSchema)]
pub struct StatusResponse {
    builds: usize,
    config_version: u64,
    /// Generation of the last published refresh
    last_generation: Option<u64>,
    last_refresh: Option<DateTime<Utc>>,
    has_session: bool,
}

/// Health check endpoint.
///
/// Returns 200 if the service is running.
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy",
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Refresh status endpoint.
///
/// Reports the tracked build count and when the dashboard was last refreshed.
#[utoipa::path(
    get,
    path = "/api/v1/status",
    tag = "Health",
    responses(
        (status = 200, description = "Refresh status", body = StatusResponse)
    )
)]
#[get("/status")]
pub async fn status(service: web::Data<Arc<DashboardService>>) -> HttpResponse {
    let list = service.registry().snapshot().await;
    let latest = service.latest().await;
    HttpResponse::Ok().json(StatusResponse {
        builds: list.builds.len(),
        config_version: list.version,
        last_generation: latest.as_ref().map(|s| s.generation),
        last_refresh: latest.as_ref().map(|s| s.completed_at),
        has_session: service.connection_info().await.has_session,
    })
}

/// Configure health routes.
pub fn configure_health_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health).service(status);
}
