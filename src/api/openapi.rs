//! OpenAPI documentation configuration.

use utoipa::OpenApi;

use crate::{api, error, models};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Allure Dashboard",
        version = "0.1.0",
        description = "Jenkins build dashboard: Allure report records with trend, flakiness and environment metrics"
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    paths(
        // Health endpoints
        api::health::health,
        api::health::status,
        // Build endpoints
        api::builds::list_builds,
        api::builds::add_build,
        api::builds::replace_builds,
        api::builds::remove_build,
        // Dashboard endpoints
        api::dashboard::get_dashboard,
        api::dashboard::refresh_dashboard,
        // Auth endpoints
        api::auth::get_session,
        api::auth::set_session,
        api::auth::probe,
    ),
    components(
        schemas(
            // Common
            error::ErrorResponse,
            // Health
            api::health::HealthResponse,
            api::health::StatusResponse,
            // Builds
            models::BuildConfig,
            models::NewBuildConfig,
            models::BuildIdentity,
            models::BuildLinks,
            api::builds::BuildListResponse,
            // Reports
            models::TestStatus,
            models::TestOutcome,
            models::ReportSummary,
            models::RecordStatus,
            models::RecordErrorKind,
            models::ReportRecord,
            // Metrics
            models::DerivedTrendPoint,
            models::FlakyTestEntry,
            models::EnvironmentRollup,
            models::DashboardSnapshot,
            // Auth
            models::AuthenticationConfig,
            models::ConnectionInfo,
            models::ProbeResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health and refresh status"),
        (name = "Builds", description = "Tracked Jenkins builds"),
        (name = "Dashboard", description = "Build records and derived metrics"),
        (name = "Auth", description = "Jenkins session management")
    )
)]
pub struct ApiDoc;
