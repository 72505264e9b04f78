//! Fetch layer for the remote monitoring API.
//!
//! This module provides typed request functions for the public dashboard
//! endpoints (fleet status, per-probe stats, aggregated history) and the
//! admin endpoints (monitor CRUD, retention settings).

mod client;
mod error;
mod types;

pub use client::{encode_segment, ApiClient, ApiClientBuilder};
pub use error::ApiError;
pub use types::{
    AggregatedMonitorMetric, ListQuery, MetricsConfig, MonitorStats, MonitorStatus, MonitorTask,
    MonitorTaskRequest, MonitorType, Page, PublicMonitor, TimeRange,
};

use std::fmt::Debug;

use async_trait::async_trait;

/// Trait for reading from and writing to the monitoring API.
///
/// [`ApiClient`] is the HTTP implementation. The polling cache only
/// depends on this trait, so tests and alternative transports can plug
/// in their own.
///
/// Implementations perform no retries: errors are returned as-is and the
/// caller decides when to try again.
#[async_trait]
pub trait MonitorApi: Send + Sync + Debug {
    /// Returns the base URL requests are sent to.
    ///
    /// Used for display in the TUI status bar.
    fn base_url(&self) -> &str;

    /// Fleet-wide live status and latency, one entry per monitor.
    async fn public_monitors(&self) -> Result<Vec<PublicMonitor>, ApiError>;

    /// Per-probe statistics for the named monitor.
    async fn monitor_stats(&self, name: &str) -> Result<Vec<MonitorStats>, ApiError>;

    /// Aggregated response-time history for the named monitor.
    async fn monitor_history(
        &self,
        name: &str,
        range: TimeRange,
    ) -> Result<Vec<AggregatedMonitorMetric>, ApiError>;

    /// Paginated admin list of configured monitors.
    async fn list_monitors(&self, query: &ListQuery) -> Result<Page<MonitorTask>, ApiError>;

    async fn get_monitor(&self, id: &str) -> Result<MonitorTask, ApiError>;

    async fn create_monitor(&self, request: &MonitorTaskRequest) -> Result<MonitorTask, ApiError>;

    async fn update_monitor(
        &self,
        id: &str,
        request: &MonitorTaskRequest,
    ) -> Result<MonitorTask, ApiError>;

    async fn delete_monitor(&self, id: &str) -> Result<(), ApiError>;

    /// Current server-side retention settings.
    async fn metrics_config(&self) -> Result<MetricsConfig, ApiError>;

    async fn save_metrics_config(&self, config: &MetricsConfig) -> Result<(), ApiError>;
}
