//! Metrics deriver: trend, flakiness and environment views over a batch.
//!
//! All three functions are pure. Grouping uses ordered maps so that two
//! calls on the same input produce identical output.

use std::collections::BTreeMap;

use chrono::DateTime;

use crate::models::{
    DerivedTrendPoint, EnvironmentRollup, FlakyTestEntry, ReportRecord, ReportSummary,
};

/// Number of entries kept in the flakiness ranking.
pub const FLAKY_TOP_N: usize = 10;

/// `numerator / denominator * 100`, rounded to 2 decimals; 0 when denominator is 0.
pub fn percent(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    let raw = numerator as f64 / denominator as f64 * 100.0;
    (raw * 100.0).round() / 100.0
}

#[derive(Default)]
struct Counts {
    total: u64,
    passed: u64,
    failed: u64,
}

impl Counts {
    fn add(&mut self, summary: Option<&ReportSummary>) {
        if let Some(s) = summary {
            self.total = self.total.saturating_add(s.total);
            self.passed = self.passed.saturating_add(s.passed);
            self.failed = self.failed.saturating_add(s.failed);
        }
    }
}

/// UTC calendar day of an epoch-millisecond timestamp.
fn date_key(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.date_naive().format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "invalid-date".to_string())
}

/// Daily pass/fail totals, ascending by date.
///
/// Records without a summary contribute zero counts, but their day still appears.
pub fn trend(records: &[ReportRecord]) -> Vec<DerivedTrendPoint> {
    let mut by_day: BTreeMap<String, Counts> = BTreeMap::new();
    for record in records {
        by_day
            .entry(date_key(record.fetched_at_millis))
            .or_default()
            .add(record.summary.as_ref());
    }

    by_day
        .into_iter()
        .map(|(date_key, c)| DerivedTrendPoint {
            date_key,
            total: c.total,
            passed: c.passed,
            failed: c.failed,
            success_rate_percent: percent(c.passed, c.total),
        })
        .collect()
}

#[derive(Default)]
struct TestRuns<'a> {
    runs: u64,
    failures: u64,
    last_failure_millis: Option<i64>,
    last_failure_job: Option<&'a str>,
}

/// Tests that failed at least once, worst first, at most [`FLAKY_TOP_N`].
///
/// Ranked by failure rate, then by number of runs, then by name.
pub fn flaky_tests(records: &[ReportRecord]) -> Vec<FlakyTestEntry> {
    let mut by_test: BTreeMap<&str, TestRuns<'_>> = BTreeMap::new();
    for record in records {
        let job = record.job_name();
        for outcome in &record.outcomes {
            let runs = by_test.entry(outcome.name.as_str()).or_default();
            runs.runs += 1;
            if outcome.status.is_failure() {
                runs.failures += 1;
                // Ties keep the first job seen.
                if runs
                    .last_failure_millis
                    .is_none_or(|last| outcome.timestamp_millis > last)
                {
                    runs.last_failure_millis = Some(outcome.timestamp_millis);
                    runs.last_failure_job = Some(job);
                }
            }
        }
    }

    let mut entries: Vec<FlakyTestEntry> = by_test
        .into_iter()
        .filter(|(_, runs)| runs.failures > 0)
        .map(|(name, runs)| FlakyTestEntry {
            test_name: name.to_string(),
            job_name: runs.last_failure_job.unwrap_or_default().to_string(),
            failure_rate_percent: percent(runs.failures, runs.runs),
            total_runs: runs.runs,
            failed_runs: runs.failures,
            last_failure_millis: runs.last_failure_millis.unwrap_or_default(),
        })
        .collect();

    // Compare exact ratios; the rounded percentages can tie.
    entries.sort_by(|a, b| {
        let a_rate = u128::from(a.failed_runs) * u128::from(b.total_runs);
        let b_rate = u128::from(b.failed_runs) * u128::from(a.total_runs);
        b_rate
            .cmp(&a_rate)
            .then_with(|| b.total_runs.cmp(&a.total_runs))
            .then_with(|| a.test_name.cmp(&b.test_name))
    });
    entries.truncate(FLAKY_TOP_N);
    entries
}

/// Totals per environment, sorted by environment name.
pub fn environment_rollup(records: &[ReportRecord]) -> Vec<EnvironmentRollup> {
    let mut by_env: BTreeMap<&str, Counts> = BTreeMap::new();
    for record in records {
        by_env
            .entry(record.build_config.environment_key())
            .or_default()
            .add(record.summary.as_ref());
    }

    by_env
        .into_iter()
        .map(|(environment, c)| EnvironmentRollup {
            environment: environment.to_string(),
            total: c.total,
            passed: c.passed,
            failed: c.failed,
            success_rate_percent: percent(c.passed, c.total),
        })
        .collect()
}
