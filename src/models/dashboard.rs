//! Dashboard snapshot: one completed refresh with its derived views.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::metrics::{DerivedTrendPoint, EnvironmentRollup, FlakyTestEntry};
use super::report::{RecordErrorKind, ReportRecord};

/// Result of one refresh cycle.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    /// Refresh generation that produced this snapshot
    pub generation: u64,
    /// Build list version the refresh started from
    pub config_version: u64,
    pub completed_at: DateTime<Utc>,
    /// One record per configured build, in configuration order
    pub records: Vec<ReportRecord>,
    pub trend: Vec<DerivedTrendPoint>,
    pub flaky_tests: Vec<FlakyTestEntry>,
    pub environments: Vec<EnvironmentRollup>,
    /// At least one build was rejected for authentication
    pub reauthenticate_required: bool,
}

impl DashboardSnapshot {
    pub fn requires_reauthentication(records: &[ReportRecord]) -> bool {
        records
            .iter()
            .any(|r| r.error_kind == Some(RecordErrorKind::AuthRejected))
    }

    pub fn ok_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_ok()).count()
    }

    pub fn error_count(&self) -> usize {
        self.records.len() - self.ok_count()
    }
}
