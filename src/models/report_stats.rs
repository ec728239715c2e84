//! Report summary model.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Aggregate Allure counts for one build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total: u64,
    pub passed: u64,
    pub failed: u64,
    pub broken: u64,
    pub skipped: u64,
    /// Total duration in milliseconds
    pub duration_millis: i64,
    /// Test run start time (epoch milliseconds)
    pub start_millis: i64,
    /// Test run end time (epoch milliseconds)
    pub end_millis: i64,
}

impl ReportSummary {
    /// Whether `total` equals the sum of the per-status counts.
    ///
    /// Upstream does not guarantee this, so a mismatch is reported as a
    /// data-quality signal rather than rejected.
    pub fn is_consistent(&self) -> bool {
        self.passed
            .checked_add(self.failed)
            .and_then(|n| n.checked_add(self.broken))
            .and_then(|n| n.checked_add(self.skipped))
            == Some(self.total)
    }
}
