//! Monitoring API integration module.
//!
//! This module provides the trait the reconciliation engine talks to and the
//! Datadog HTTP implementation of it.

mod client;
mod store;
mod types;

pub use client::{DEFAULT_API_URL, DatadogClient};
pub use store::{MonitoringApi, fetch_takeovers, list_all};

#[cfg(test)]
pub use store::MockMonitoringApi;
