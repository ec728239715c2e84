//! Domain models for the Allure dashboard.

pub mod auth;
pub mod build_config;
pub mod dashboard;
pub mod metrics;
pub mod report;
pub mod report_stats;
pub mod test_result;

// Re-export commonly used types
pub use auth::{AuthenticationConfig, ConnectionInfo, ProbeResponse};
pub use build_config::{
    BuildConfig, BuildIdentity, BuildLinks, DEFAULT_ENVIRONMENT, NewBuildConfig,
};
pub use dashboard::DashboardSnapshot;
pub use metrics::{DerivedTrendPoint, EnvironmentRollup, FlakyTestEntry};
pub use report::{RecordError, RecordErrorKind, RecordStatus, ReportRecord};
pub use report_stats::ReportSummary;
pub use test_result::{TestOutcome, TestStatus};
