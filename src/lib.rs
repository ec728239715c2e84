//! Allure dashboard library.
//!
//! Tracks a list of Jenkins builds, fetches their Allure reports concurrently
//! and derives trend, flakiness and environment views from the results.

pub mod api;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
