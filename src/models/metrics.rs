//! Derived metric views. Recomputed from scratch on every refresh.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Pass/fail totals for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DerivedTrendPoint {
    /// UTC calendar day, `YYYY-MM-DD`
    pub date_key: String,
    pub total: u64,
    pub passed: u64,
    pub failed: u64,
    pub success_rate_percent: f64,
}

/// A test that failed at least once across the fetched builds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FlakyTestEntry {
    pub test_name: String,
    /// Job of the most recent failing run
    pub job_name: String,
    pub failure_rate_percent: f64,
    pub total_runs: u64,
    pub failed_runs: u64,
    pub last_failure_millis: i64,
}

/// Pass/fail totals for one environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentRollup {
    pub environment: String,
    pub total: u64,
    pub passed: u64,
    pub failed: u64,
    pub success_rate_percent: f64,
}
