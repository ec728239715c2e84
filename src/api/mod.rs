//! API endpoint modules.

pub mod auth;
pub mod builds;
pub mod dashboard;
pub mod health;
pub mod openapi;

pub use auth::configure_routes as configure_auth_routes;
pub use builds::configure_routes as configure_build_routes;
pub use dashboard::configure_routes as configure_dashboard_routes;
pub use health::configure_health_routes;
pub use openapi::ApiDoc;
