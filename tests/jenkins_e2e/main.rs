//! Jenkins E2E test suite.
//!
//! Runs the real HTTP client, fetcher and dashboard service against an
//! in-process mock Jenkins serving Allure export endpoints.
//!
//! Run with: cargo test --test jenkins_e2e

mod mock_jenkins;

mod test_api;
mod test_batch;
