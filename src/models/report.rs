//! Report record: one build's fetch outcome for a single refresh cycle.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::build_config::{BuildConfig, BuildIdentity, BuildLinks};
use super::report_stats::ReportSummary;
use super::test_result::TestOutcome;

/// Record status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Ok,
    Error,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classification of a failed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RecordErrorKind {
    /// The build URL could not be resolved to a job and build number
    Resolution,
    /// Jenkins rejected the session credential
    AuthRejected,
    /// Both reads failed for another reason (timeout, status, body)
    Fetch,
}

/// One build's fetch outcome.
///
/// Created fresh on every cycle and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportRecord {
    /// Back-reference to the configuration this record was fetched for
    #[schema(value_type = BuildConfig)]
    pub build_config: Arc<BuildConfig>,
    /// Identity resolved from the build URL at fetch time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<BuildIdentity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<ReportSummary>,
    pub outcomes: Vec<TestOutcome>,
    /// Allure report link (derived, not fetched)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<BuildLinks>,
    pub fetched_at_millis: i64,
    pub status: RecordStatus,
    /// Present iff `status` is `error`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
    /// Present iff `status` is `error`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<RecordErrorKind>,
    /// Summary counts do not add up to its total
    #[serde(default)]
    pub summary_mismatch: bool,
    /// The failure may clear on another attempt (timeout, 5xx, 429, network)
    #[serde(default)]
    pub transient: bool,
}

/// Why a resolved build produced no data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordError {
    pub kind: RecordErrorKind,
    pub detail: String,
    pub transient: bool,
}

impl ReportRecord {
    /// Record for a build whose URL could not be resolved.
    pub fn unresolved(
        build_config: Arc<BuildConfig>,
        detail: String,
        fetched_at_millis: i64,
    ) -> Self {
        ReportRecord {
            build_config,
            identity: None,
            summary: None,
            outcomes: Vec::new(),
            report_url: None,
            links: None,
            fetched_at_millis,
            status: RecordStatus::Error,
            error_detail: Some(detail),
            error_kind: Some(RecordErrorKind::Resolution),
            summary_mismatch: false,
            transient: false,
        }
    }

    /// Record for a resolved build, with whatever data the reads produced.
    ///
    /// `error` must be `Some` only when neither read produced data.
    pub fn fetched(
        build_config: Arc<BuildConfig>,
        identity: BuildIdentity,
        base_url: &str,
        summary: Option<ReportSummary>,
        outcomes: Vec<TestOutcome>,
        fetched_at_millis: i64,
        error: Option<RecordError>,
    ) -> Self {
        let links = BuildLinks::derive(&identity, base_url);
        let summary_mismatch = summary.is_some_and(|s| !s.is_consistent());
        let (status, error_kind, error_detail, transient) = match error {
            Some(e) => (RecordStatus::Error, Some(e.kind), Some(e.detail), e.transient),
            None => (RecordStatus::Ok, None, None, false),
        };

        ReportRecord {
            build_config,
            identity: Some(identity),
            summary,
            outcomes,
            report_url: Some(links.report.clone()),
            links: Some(links),
            fetched_at_millis,
            status,
            error_detail,
            error_kind,
            summary_mismatch,
            transient,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == RecordStatus::Ok
    }

    /// Job name for grouping: the resolved one, else the cached one.
    pub fn job_name(&self) -> &str {
        self.identity
            .as_ref()
            .map(|i| i.job_name.as_str())
            .unwrap_or(&self.build_config.job_name)
    }
}
