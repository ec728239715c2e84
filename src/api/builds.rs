//! Build configuration API handlers.

use std::sync::Arc;

use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppResult;
use crate::models::{BuildConfig, BuildIdentity, NewBuildConfig};
use crate::services::{BuildListSnapshot, DashboardService};

/// Tracked build list.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BuildListResponse {
    /// Incremented on every change to the list
    pub version: u64,
    #[schema(value_type = Vec<BuildConfig>)]
    pub builds: Vec<Arc<BuildConfig>>,
}

impl From<BuildListSnapshot> for BuildListResponse {
    fn from(snapshot: BuildListSnapshot) -> Self {
        Self {
            version: snapshot.version,
            builds: snapshot.builds,
        }
    }
}

/// List tracked builds.
#[utoipa::path(
    get,
    path = "/api/v1/builds",
    tag = "Builds",
    responses(
        (status = 200, description = "Tracked builds in display order", body = BuildListResponse)
    )
)]
pub async fn list_builds(service: web::Data<Arc<DashboardService>>) -> AppResult<HttpResponse> {
    let snapshot = service.registry().snapshot().await;
    Ok(HttpResponse::Ok().json(BuildListResponse::from(snapshot)))
}

/// Track a new build.
#[utoipa::path(
    post,
    path = "/api/v1/builds",
    tag = "Builds",
    request_body = NewBuildConfig,
    responses(
        (status = 201, description = "Build added", body = BuildConfig),
        (status = 400, description = "Build URL not recognized", body = crate::error::ErrorResponse),
        (status = 409, description = "Build already tracked", body = crate::error::ErrorResponse)
    )
)]
pub async fn add_build(
    service: web::Data<Arc<DashboardService>>,
    body: web::Json<NewBuildConfig>,
) -> AppResult<HttpResponse> {
    let config = service.registry().add(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(config))
}

/// Replace the whole build list.
#[utoipa::path(
    put,
    path = "/api/v1/builds",
    tag = "Builds",
    request_body = Vec<NewBuildConfig>,
    responses(
        (status = 200, description = "Build list replaced", body = BuildListResponse),
        (status = 400, description = "A build URL was not recognized", body = crate::error::ErrorResponse),
        (status = 409, description = "Two entries point at the same build", body = crate::error::ErrorResponse)
    )
)]
pub async fn replace_builds(
    service: web::Data<Arc<DashboardService>>,
    body: web::Json<Vec<NewBuildConfig>>,
) -> AppResult<HttpResponse> {
    let snapshot = service.registry().replace_all(body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(BuildListResponse::from(snapshot)))
}

/// Stop tracking a build.
#[utoipa::path(
    delete,
    path = "/api/v1/builds/{job_name}/{build_number}",
    tag = "Builds",
    params(
        ("job_name" = String, Path, description = "Job name as it appears in the build URL"),
        ("build_number" = u64, Path, description = "Build number")
    ),
    responses(
        (status = 204, description = "Build removed"),
        (status = 404, description = "Build not tracked", body = crate::error::ErrorResponse)
    )
)]
pub async fn remove_build(
    service: web::Data<Arc<DashboardService>>,
    path: web::Path<(String, u64)>,
) -> AppResult<HttpResponse> {
    let (job_name, build_number) = path.into_inner();
    let identity = BuildIdentity::new(job_name, build_number);
    service.registry().remove(&identity).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Configure build routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/builds")
            .route(web::get().to(list_builds))
            .route(web::post().to(add_build))
            .route(web::put().to(replace_builds)),
    )
    .service(
        web::resource("/builds/{job_name}/{build_number}").route(web::delete().to(remove_build)),
    );
}
