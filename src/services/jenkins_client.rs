//! Jenkins / Allure HTTP client.
//!
//! Reads the Allure export endpoints of a build and probes Jenkins for
//! connectivity. Every request carries the session cookie of the connection
//! snapshot it was built with.
//!
//! Raw payloads are parsed into typed wire structs here; any shape mismatch
//! becomes `FetchError::MalformedBody` and never reaches the rest of the core.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{COOKIE, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::FetchError;
use crate::models::{BuildIdentity, ReportSummary, TestOutcome, TestStatus};

/// Default per-read timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

const SUMMARY_PATH: &str = "allure-results/api/rs/allure2/export/summary.json";
const RESULTS_PATH: &str = "allure-results/api/rs/allure2/export/testresult.json";
const PROBE_PATH: &str = "api/json";
const PROBE_TREE: &str = "jobs[name]";

/// Base URL plus session credential. Immutable; swapped as a whole on re-authentication.
#[derive(Clone)]
pub struct JenkinsConnection {
    base_url: String,
    session: Option<SecretString>,
}

impl JenkinsConnection {
    pub fn new(base_url: impl Into<String>, session: Option<SecretString>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, session }
    }

    /// Base URL without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Cookie header for the session.
    ///
    /// A bare value is sent as `JSESSIONID=<value>`; a value that already
    /// contains `=` is sent as-is so suffixed cookie names work.
    fn cookie_header(&self) -> Option<HeaderValue> {
        let session = self.session.as_ref()?;
        let raw = session.expose_secret().trim();
        if raw.is_empty() {
            return None;
        }
        let cookie = if raw.contains('=') {
            raw.to_string()
        } else {
            format!("JSESSIONID={}", raw)
        };
        match HeaderValue::from_str(&cookie) {
            Ok(mut value) => {
                value.set_sensitive(true);
                Some(value)
            }
            Err(_) => {
                warn!("Session credential contains characters not valid in a cookie header; sending none");
                None
            }
        }
    }
}

impl std::fmt::Debug for JenkinsConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JenkinsConnection")
            .field("base_url", &self.base_url)
            .field("has_session", &self.has_session())
            .finish()
    }
}

/// The two Allure reads the report fetcher needs.
#[async_trait]
pub trait AllureApi: Send + Sync {
    /// Base URL used to derive display links.
    fn base_url(&self) -> &str;

    async fn fetch_summary(&self, identity: &BuildIdentity) -> Result<ReportSummary, FetchError>;

    async fn fetch_results(&self, identity: &BuildIdentity)
    -> Result<Vec<TestOutcome>, FetchError>;
}

// ============================================================================
// Allure wire shapes
// ============================================================================

#[derive(Debug, Deserialize)]
struct AllureSummary {
    statistic: AllureStatistic,
    #[serde(default)]
    time: AllureTime,
}

#[derive(Debug, Deserialize)]
struct AllureStatistic {
    #[serde(default)]
    passed: u64,
    #[serde(default)]
    failed: u64,
    #[serde(default)]
    broken: u64,
    #[serde(default)]
    skipped: u64,
    #[serde(default)]
    unknown: u64,
    total: u64,
}

#[derive(Debug, Default, Deserialize)]
struct AllureTime {
    #[serde(default)]
    start: Option<i64>,
    #[serde(default)]
    stop: Option<i64>,
    #[serde(default)]
    duration: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct AllureTestResult {
    name: String,
    status: String,
    #[serde(default)]
    time: AllureTime,
}

#[derive(Debug, Deserialize)]
struct JobListResponse {
    #[serde(default)]
    jobs: Vec<JobEntry>,
}

#[derive(Debug, Deserialize)]
struct JobEntry {
    name: String,
}

fn overflow(what: &str) -> FetchError {
    FetchError::MalformedBody(format!("{} is out of range", what))
}

impl TryFrom<AllureSummary> for ReportSummary {
    type Error = FetchError;

    fn try_from(raw: AllureSummary) -> Result<Self, Self::Error> {
        let start = raw.time.start.unwrap_or(0);
        let end = raw.time.stop.unwrap_or(start);
        let broken = raw
            .statistic
            .broken
            .checked_add(raw.statistic.unknown)
            .ok_or_else(|| overflow("summary broken count"))?;
        let duration_millis = match raw.time.duration {
            Some(duration) => duration,
            None => end
                .checked_sub(start)
                .ok_or_else(|| overflow("summary duration"))?,
        };
        Ok(ReportSummary {
            total: raw.statistic.total,
            passed: raw.statistic.passed,
            failed: raw.statistic.failed,
            broken,
            skipped: raw.statistic.skipped,
            duration_millis,
            start_millis: start,
            end_millis: end,
        })
    }
}

impl TryFrom<AllureTestResult> for TestOutcome {
    type Error = FetchError;

    fn try_from(raw: AllureTestResult) -> Result<Self, Self::Error> {
        let status = TestStatus::parse(&raw.status).ok_or_else(|| {
            FetchError::MalformedBody(format!(
                "unknown status '{}' for test '{}'",
                raw.status, raw.name
            ))
        })?;
        let timestamp = raw.time.start.or(raw.time.stop).unwrap_or(0);
        let duration = match (raw.time.duration, raw.time.start, raw.time.stop) {
            (Some(duration), _, _) => duration,
            (None, Some(start), Some(stop)) => stop
                .checked_sub(start)
                .ok_or_else(|| overflow(&format!("duration of test '{}'", raw.name)))?,
            _ => 0,
        };
        Ok(TestOutcome::new(raw.name, status, duration, timestamp))
    }
}

/// Parse a summary.json body.
pub fn parse_summary(body: &[u8]) -> Result<ReportSummary, FetchError> {
    let raw: AllureSummary = serde_json::from_slice(body)
        .map_err(|e| FetchError::MalformedBody(format!("summary.json: {}", e)))?;
    ReportSummary::try_from(raw)
}

/// Parse a testresult.json body.
pub fn parse_results(body: &[u8]) -> Result<Vec<TestOutcome>, FetchError> {
    let raw: Vec<AllureTestResult> = serde_json::from_slice(body)
        .map_err(|e| FetchError::MalformedBody(format!("testresult.json: {}", e)))?;
    raw.into_iter().map(TestOutcome::try_from).collect()
}

// ============================================================================
// HTTP client
// ============================================================================

/// Jenkins client bound to one connection snapshot.
#[derive(Clone)]
pub struct JenkinsClient {
    http_client: reqwest::Client,
    connection: Arc<JenkinsConnection>,
    request_timeout: Duration,
}

impl JenkinsClient {
    pub fn new(
        http_client: reqwest::Client,
        connection: Arc<JenkinsConnection>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            http_client,
            connection,
            request_timeout,
        }
    }

    /// Build the shared reqwest client.
    pub fn build_http_client(connect_timeout: Duration) -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
    }

    pub fn connection(&self) -> &JenkinsConnection {
        &self.connection
    }

    pub fn summary_url(&self, identity: &BuildIdentity) -> String {
        format!(
            "{}/{}",
            identity.build_path(self.connection.base_url()),
            SUMMARY_PATH
        )
    }

    pub fn results_url(&self, identity: &BuildIdentity) -> String {
        format!(
            "{}/{}",
            identity.build_path(self.connection.base_url()),
            RESULTS_PATH
        )
    }

    /// Connectivity and authentication probe. Returns the top-level job names.
    pub async fn probe(&self) -> Result<Vec<String>, FetchError> {
        let url = format!(
            "{}/{}?tree={}",
            self.connection.base_url(),
            PROBE_PATH,
            urlencoding::encode(PROBE_TREE)
        );
        let body = self.get_bytes(&url).await?;
        let jobs: JobListResponse = serde_json::from_slice(&body)
            .map_err(|e| FetchError::MalformedBody(format!("job list: {}", e)))?;
        Ok(jobs.jobs.into_iter().map(|j| j.name).collect())
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        debug!("GET {}", url);

        let mut request = self.http_client.get(url).timeout(self.request_timeout);
        if let Some(cookie) = self.connection.cookie_header() {
            request = request.header(COOKIE, cookie);
        }

        let response = request.send().await.map_err(map_transport_error)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(FetchError::AuthRejected);
        }
        // An expired session is redirected to the login page, which answers 200.
        if response.url().path().ends_with("/login") {
            return Err(FetchError::AuthRejected);
        }
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let body = response.bytes().await.map_err(map_transport_error)?;
        Ok(body.to_vec())
    }
}

fn map_transport_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else if let Some(status) = err.status() {
        FetchError::HttpStatus(status.as_u16())
    } else {
        FetchError::Network(err.to_string())
    }
}

#[async_trait]
impl AllureApi for JenkinsClient {
    fn base_url(&self) -> &str {
        self.connection.base_url()
    }

    async fn fetch_summary(&self, identity: &BuildIdentity) -> Result<ReportSummary, FetchError> {
        let body = self.get_bytes(&self.summary_url(identity)).await?;
        parse_summary(&body)
    }

    async fn fetch_results(
        &self,
        identity: &BuildIdentity,
    ) -> Result<Vec<TestOutcome>, FetchError> {
        let body = self.get_bytes(&self.results_url(identity)).await?;
        parse_results(&body)
    }
}
