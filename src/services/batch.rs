//! Batch aggregator: fans the report fetcher out over every configured build.
//!
//! All fetches start together and the batch waits for every one of them to
//! settle. A failing build becomes an error record; it never cancels or hides
//! the others. Output order always equals input order.

use std::collections::HashSet;
use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use crate::error::AggregationError;
use crate::models::{BuildConfig, RecordErrorKind, ReportRecord};
use crate::services::report_fetcher::ReportSource;

/// Batch-level retry policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts for a build whose record failed with a transient fetch error.
    pub attempts: u32,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self { attempts: 0 }
    }

    pub fn with_attempts(attempts: u32) -> Self {
        Self { attempts }
    }

    /// Resolution, auth and permanent HTTP failures will not change on retry.
    fn should_retry(record: &ReportRecord) -> bool {
        record.error_kind == Some(RecordErrorKind::Fetch) && record.transient
    }
}

/// Reject lists where two entries point at the same build.
pub fn validate_configs(configs: &[Arc<BuildConfig>]) -> Result<(), AggregationError> {
    let mut seen = HashSet::with_capacity(configs.len());
    for config in configs {
        let identity = config.identity();
        if !seen.insert(identity.clone()) {
            return Err(AggregationError::DuplicateBuild(identity));
        }
    }
    Ok(())
}

/// Fetch every build concurrently and return one record per input, in input order.
pub async fn fetch_all<S>(
    source: &S,
    configs: &[Arc<BuildConfig>],
    retry: RetryPolicy,
) -> Result<Vec<ReportRecord>, AggregationError>
where
    S: ReportSource + ?Sized,
{
    validate_configs(configs)?;

    let span = info_span!("batch", batch_id = %Uuid::now_v7(), builds = configs.len());

    async move {
        info!("Fetching {} builds", configs.len());

        let records = join_all(
            configs
                .iter()
                .map(|config| fetch_with_retry(source, config, retry)),
        )
        .await;

        let failed = records.iter().filter(|r| !r.is_ok()).count();
        if failed > 0 {
            warn!(
                "Batch finished with {} of {} builds in error",
                failed,
                records.len()
            );
        } else {
            info!("Batch finished, all {} builds ok", records.len());
        }

        Ok(records)
    }
    .instrument(span)
    .await
}

async fn fetch_with_retry<S>(source: &S, config: &Arc<BuildConfig>, retry: RetryPolicy) -> ReportRecord
where
    S: ReportSource + ?Sized,
{
    let mut record = source.fetch(config).await;
    let mut attempt = 0;
    while attempt < retry.attempts && RetryPolicy::should_retry(&record) {
        attempt += 1;
        info!(
            "Retrying '{}' (attempt {}/{})",
            config.name, attempt, retry.attempts
        );
        record = source.fetch(config).await;
    }
    record
}
