//! Dashboard API handlers: build records plus derived trend, flakiness and
//! environment views.

use std::sync::Arc;

use actix_web::{HttpResponse, web};

use crate::error::AppResult;
use crate::models::DashboardSnapshot;
use crate::services::DashboardService;

/// Get the dashboard.
///
/// Returns the latest snapshot, refreshing first when none exists or the
/// build list changed since it was taken.
#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Latest dashboard snapshot", body = DashboardSnapshot),
        (status = 409, description = "Refresh superseded by a newer one", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_dashboard(service: web::Data<Arc<DashboardService>>) -> AppResult<HttpResponse> {
    let snapshot = service.current().await?;
    Ok(HttpResponse::Ok().json(snapshot.as_ref()))
}

/// Refresh the dashboard now.
#[utoipa::path(
    post,
    path = "/api/v1/dashboard/refresh",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Fresh dashboard snapshot", body = DashboardSnapshot),
        (status = 409, description = "Refresh superseded by a newer one", body = crate::error::ErrorResponse)
    )
)]
pub async fn refresh_dashboard(
    service: web::Data<Arc<DashboardService>>,
) -> AppResult<HttpResponse> {
    let snapshot = service.refresh().await?;
    Ok(HttpResponse::Ok().json(snapshot.as_ref()))
}

/// Configure dashboard routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/dashboard").route(web::get().to(get_dashboard)))
        .service(web::resource("/dashboard/refresh").route(web::post().to(refresh_dashboard)));
}
