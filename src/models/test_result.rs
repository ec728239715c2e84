//! Test outcome model representing one executed Allure test case.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Test execution status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Passed,
    Failed,
    Broken,
    Skipped,
}

impl TestStatus {
    /// Convert to the Allure string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Broken => "broken",
            Self::Skipped => "skipped",
        }
    }

    /// Parse an Allure status string.
    ///
    /// Allure's `unknown` status is folded into `Broken`. Anything else
    /// unrecognized returns `None` so the caller can reject the payload.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "passed" => Some(Self::Passed),
            "failed" => Some(Self::Failed),
            "broken" | "unknown" => Some(Self::Broken),
            "skipped" => Some(Self::Skipped),
            _ => None,
        }
    }

    /// Failed and broken runs both count against a test.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed | Self::Broken)
    }
}

impl std::fmt::Display for TestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One executed test case from a build's Allure results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TestOutcome {
    /// Test name as reported by Allure
    pub name: String,
    /// Execution status
    pub status: TestStatus,
    /// Execution duration in milliseconds
    pub duration_millis: i64,
    /// Execution start time (epoch milliseconds)
    pub timestamp_millis: i64,
}

impl TestOutcome {
    /// Create a new test outcome.
    pub fn new(
        name: impl Into<String>,
        status: TestStatus,
        duration_millis: i64,
        timestamp_millis: i64,
    ) -> Self {
        TestOutcome {
            name: name.into(),
            status,
            duration_millis,
            timestamp_millis,
        }
    }
}
