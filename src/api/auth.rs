//! Jenkins session API handlers.
//!
//! The session credential is accepted here and never echoed back.

use std::sync::Arc;

use actix_web::{HttpResponse, web};
use tracing::{info, warn};

use crate::error::{AppError, AppResult, FetchError};
use crate::models::{AuthenticationConfig, ConnectionInfo, ProbeResponse};
use crate::services::{DashboardService, JenkinsConnection};

/// Get the current Jenkins connection.
#[utoipa::path(
    get,
    path = "/api/v1/auth/session",
    tag = "Auth",
    responses(
        (status = 200, description = "Current connection, without credential", body = ConnectionInfo)
    )
)]
pub async fn get_session(service: web::Data<Arc<DashboardService>>) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(service.connection_info().await))
}

/// Set the Jenkins session and base URL.
///
/// Refreshes already in flight finish with the previous session.
#[utoipa::path(
    put,
    path = "/api/v1/auth/session",
    tag = "Auth",
    request_body = AuthenticationConfig,
    responses(
        (status = 200, description = "Session updated", body = ConnectionInfo),
        (status = 400, description = "Invalid base URL", body = crate::error::ErrorResponse)
    )
)]
pub async fn set_session(
    service: web::Data<Arc<DashboardService>>,
    body: web::Json<AuthenticationConfig>,
) -> AppResult<HttpResponse> {
    let auth = body.into_inner();
    let base_url = auth.jenkins_base_url.trim();
    reqwest::Url::parse(base_url).map_err(|e| {
        AppError::InvalidInput(format!("jenkinsBaseUrl '{}' is not a URL: {}", base_url, e))
    })?;

    service
        .update_connection(JenkinsConnection::new(base_url, Some(auth.jsession_id)))
        .await;

    Ok(HttpResponse::Ok().json(service.connection_info().await))
}

/// Check connectivity and authentication against Jenkins.
#[utoipa::path(
    get,
    path = "/api/v1/auth/probe",
    tag = "Auth",
    responses(
        (status = 200, description = "Jenkins reachable with the current session", body = ProbeResponse),
        (status = 401, description = "Session rejected; re-authenticate", body = crate::error::ErrorResponse),
        (status = 502, description = "Jenkins unreachable or answered unexpectedly", body = crate::error::ErrorResponse)
    )
)]
pub async fn probe(service: web::Data<Arc<DashboardService>>) -> AppResult<HttpResponse> {
    let info = service.connection_info().await;
    match service.probe().await {
        Ok(jobs) => {
            info!(
                "Jenkins probe ok: {} jobs visible at {}",
                jobs.len(),
                info.jenkins_base_url
            );
            Ok(HttpResponse::Ok().json(ProbeResponse {
                connected: true,
                jenkins_base_url: info.jenkins_base_url,
                jobs,
            }))
        }
        Err(e) => {
            if e == FetchError::AuthRejected {
                warn!("Jenkins probe rejected the session at {}", info.jenkins_base_url);
            } else {
                warn!("Jenkins probe failed at {}: {}", info.jenkins_base_url, e);
            }
            Err(e.into())
        }
    }
}

/// Configure auth routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/auth/session")
            .route(web::get().to(get_session))
            .route(web::put().to(set_session)),
    )
    .service(web::resource("/auth/probe").route(web::get().to(probe)));
}
