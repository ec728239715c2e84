//! Business logic services.

pub mod batch;
pub mod build_registry;
pub mod dashboard;
pub mod jenkins_client;
pub mod metrics;
pub mod report_fetcher;
pub mod url_resolver;

pub use batch::{RetryPolicy, fetch_all};
pub use build_registry::{BuildListSnapshot, BuildRegistry, RegistryError};
pub use dashboard::{DashboardService, HttpJenkinsBackend, JenkinsBackend, start_refresh_task};
pub use jenkins_client::{AllureApi, JenkinsClient, JenkinsConnection};
pub use report_fetcher::{ReportFetcher, ReportSource};
