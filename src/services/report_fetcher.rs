//! Report fetcher: one build's two Allure reads merged into a `ReportRecord`.
//!
//! Each read fails independently. A build only becomes an error record when
//! its URL cannot be resolved or when both reads fail; otherwise whatever
//! data arrived is kept, even if partial.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, warn};

use crate::error::FetchError;
use crate::models::{BuildConfig, RecordError, RecordErrorKind, ReportRecord};
use crate::services::jenkins_client::AllureApi;
use crate::services::url_resolver;

/// Anything that can turn a build configuration into a report record.
#[async_trait]
pub trait ReportSource: Send + Sync {
    /// Fetch one build. Never fails; failures are captured in the record.
    async fn fetch(&self, config: &Arc<BuildConfig>) -> ReportRecord;
}

/// Report fetcher over an Allure API.
pub struct ReportFetcher<A> {
    api: A,
}

impl<A: AllureApi> ReportFetcher<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }
}

#[async_trait]
impl<A: AllureApi> ReportSource for ReportFetcher<A> {
    async fn fetch(&self, config: &Arc<BuildConfig>) -> ReportRecord {
        let identity = match url_resolver::resolve(&config.build_url) {
            Ok(identity) => identity,
            Err(e) => {
                warn!("Build '{}' has an unusable URL: {}", config.name, e);
                return ReportRecord::unresolved(
                    Arc::clone(config),
                    e.to_string(),
                    Utc::now().timestamp_millis(),
                );
            }
        };

        let (summary, results) = tokio::join!(
            self.api.fetch_summary(&identity),
            self.api.fetch_results(&identity)
        );
        let fetched_at = Utc::now().timestamp_millis();

        let error = match (&summary, &results) {
            (Err(summary_err), Err(results_err)) => {
                warn!(
                    "Both reads failed for {}: summary: {}; results: {}",
                    identity, summary_err, results_err
                );
                Some(combined_error(summary_err, results_err))
            }
            _ => None,
        };

        let summary = summary
            .inspect_err(|e| debug!("Summary unavailable for {}: {}", identity, e))
            .ok();
        let outcomes = results
            .inspect_err(|e| debug!("Results unavailable for {}: {}", identity, e))
            .unwrap_or_default();

        if summary.is_some_and(|s| !s.is_consistent()) {
            warn!(
                "Summary counts for {} do not add up to the reported total",
                identity
            );
        }

        ReportRecord::fetched(
            Arc::clone(config),
            identity,
            self.api.base_url(),
            summary,
            outcomes,
            fetched_at,
            error,
        )
    }
}

fn combined_error(summary_err: &FetchError, results_err: &FetchError) -> RecordError {
    let kind = if *summary_err == FetchError::AuthRejected || *results_err == FetchError::AuthRejected
    {
        RecordErrorKind::AuthRejected
    } else {
        RecordErrorKind::Fetch
    };
    RecordError {
        kind,
        detail: format!("summary: {}; results: {}", summary_err, results_err),
        // Retrying only helps if some read could succeed next time.
        transient: summary_err.is_transient() || results_err.is_transient(),
    }
}
