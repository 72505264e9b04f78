//! Wire types for the monitoring API.
//!
//! These mirror the JSON returned by the server's public and admin
//! endpoints. Secondary fields default when absent so a newer server
//! adding or dropping columns does not break the dashboard.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Protocol a monitor checks with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorType {
    Tcp,
    #[default]
    Http,
}

impl MonitorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MonitorType::Tcp => "tcp",
            MonitorType::Http => "http",
        }
    }
}

impl fmt::Display for MonitorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MonitorType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Ok(MonitorType::Tcp),
            "http" => Ok(MonitorType::Http),
            other => Err(format!("unknown monitor type: {other} (expected tcp or http)")),
        }
    }
}

/// Live aggregate status of a monitor.
///
/// Anything the server sends that is not `up` or `down` is treated as
/// `unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorStatus {
    Up,
    Down,
    #[default]
    #[serde(other)]
    Unknown,
}

impl MonitorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MonitorStatus::Up => "up",
            MonitorStatus::Down => "down",
            MonitorStatus::Unknown => "unknown",
        }
    }
}

/// Time window requested for aggregated history.
///
/// The server picks the bucket width for each window so that labels
/// formatted to the second stay distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeRange {
    #[default]
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[serde(rename = "1h")]
    OneHour,
}

impl TimeRange {
    pub const ALL: [TimeRange; 4] = [
        TimeRange::FiveMinutes,
        TimeRange::FifteenMinutes,
        TimeRange::ThirtyMinutes,
        TimeRange::OneHour,
    ];

    /// Query-string token understood by the history endpoint.
    pub fn token(&self) -> &'static str {
        match self {
            TimeRange::FiveMinutes => "5m",
            TimeRange::FifteenMinutes => "15m",
            TimeRange::ThirtyMinutes => "30m",
            TimeRange::OneHour => "1h",
        }
    }

    /// Human label for the range selector.
    pub fn label(&self) -> &'static str {
        match self {
            TimeRange::FiveMinutes => "5 min",
            TimeRange::FifteenMinutes => "15 min",
            TimeRange::ThirtyMinutes => "30 min",
            TimeRange::OneHour => "1 hour",
        }
    }

    /// Bucket width the server aggregates this window into.
    pub fn bucket(&self) -> std::time::Duration {
        let secs = match self {
            TimeRange::FiveMinutes => 15,
            TimeRange::FifteenMinutes => 30,
            TimeRange::ThirtyMinutes => 60,
            TimeRange::OneHour => 120,
        };
        std::time::Duration::from_secs(secs)
    }

    pub fn next(self) -> Self {
        match self {
            TimeRange::FiveMinutes => TimeRange::FifteenMinutes,
            TimeRange::FifteenMinutes => TimeRange::ThirtyMinutes,
            TimeRange::ThirtyMinutes => TimeRange::OneHour,
            TimeRange::OneHour => TimeRange::FiveMinutes,
        }
    }
}

impl FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeRange::ALL
            .into_iter()
            .find(|r| r.token() == s)
            .ok_or_else(|| format!("unknown time range: {s}"))
    }
}

/// An admin-configured synthetic check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorTask {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub monitor_type: MonitorType,
    pub target: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub enabled: bool,
    /// Check interval in seconds.
    #[serde(default)]
    pub interval: u32,
    #[serde(default)]
    pub agent_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_config: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tcp_config: Option<serde_json::Value>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

/// Body for creating or updating a monitor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorTaskRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub monitor_type: MonitorType,
    pub target: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub enabled: bool,
    /// Zero lets the server apply its default interval.
    #[serde(default)]
    pub interval: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_config: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tcp_config: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub agent_ids: Vec<String>,
}

/// Paginated admin list envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub total: u64,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
        }
    }
}

/// Parameters for the admin monitor list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListQuery {
    pub page: u32,
    pub page_size: u32,
    pub keyword: Option<String>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 10,
            keyword: None,
        }
    }
}

impl ListQuery {
    /// Number of pages for a list of `total` items at this page size.
    pub fn page_count(&self, total: u64) -> u32 {
        if self.page_size == 0 {
            return 1;
        }
        (total.div_ceil(self.page_size as u64) as u32).max(1)
    }
}

/// A monitor as shown on the public dashboard, with its live status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicMonitor {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub monitor_type: MonitorType,
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub status: MonitorStatus,
    /// Average response time across probes, in milliseconds.
    #[serde(default)]
    pub response_time: f64,
    /// Worst response time across probes, in milliseconds.
    #[serde(default)]
    pub response_time_max: f64,
    #[serde(default)]
    pub agent_count: u32,
    #[serde(default)]
    pub cert_expiry_date: i64,
    #[serde(default)]
    pub cert_expiry_days: i64,
    #[serde(default)]
    pub last_check_time: i64,
}

/// Per-probe statistics snapshot for one monitor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorStats {
    pub agent_id: String,
    #[serde(default)]
    pub monitor_name: String,
    #[serde(rename = "type", default)]
    pub monitor_type: MonitorType,
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub current_response: f64,
    #[serde(default)]
    pub avg_response_24h: f64,
    #[serde(default)]
    pub uptime_24h: f64,
    #[serde(default)]
    pub uptime_30d: f64,
    #[serde(default)]
    pub success_checks_24h: u64,
    #[serde(default)]
    pub total_checks_24h: u64,
    #[serde(default)]
    pub last_check_status: MonitorStatus,
    #[serde(default)]
    pub last_check_time: i64,
    #[serde(default)]
    pub cert_expiry_date: i64,
    #[serde(default)]
    pub cert_expiry_days: i64,
}

/// One aggregated history bucket reported by a single probe.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedMonitorMetric {
    /// Bucket start, epoch milliseconds.
    pub timestamp: i64,
    pub agent_id: String,
    #[serde(default)]
    pub avg_response: f64,
    #[serde(default)]
    pub max_response: f64,
    #[serde(default)]
    pub min_response: f64,
    #[serde(default)]
    pub success_count: u64,
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub success_rate: f64,
    #[serde(default)]
    pub last_status: String,
    #[serde(default)]
    pub last_error_msg: String,
}

/// Server-side retention and rollup settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsConfig {
    pub retention_hours: u32,
    pub max_query_points: u32,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            retention_hours: 168,
            max_query_points: 720,
        }
    }
}

impl MetricsConfig {
    /// Retention expressed in days, for display.
    pub fn retention_days(&self) -> f64 {
        self.retention_hours as f64 / 24.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_public_monitor() {
        let json = r#"{
            "id": "m-1",
            "name": "api",
            "type": "http",
            "target": "https://api.example.com",
            "status": "up",
            "responseTime": 120.5,
            "responseTimeMax": 310
        }"#;

        let monitor: PublicMonitor = serde_json::from_str(json).unwrap();
        assert_eq!(monitor.monitor_type, MonitorType::Http);
        assert_eq!(monitor.status, MonitorStatus::Up);
        assert_eq!(monitor.response_time, 120.5);
        assert_eq!(monitor.response_time_max, 310.0);
        assert_eq!(monitor.cert_expiry_days, 0);
    }

    #[test]
    fn test_unrecognised_status_is_unknown() {
        let json = r#"{"id": "m-2", "name": "db", "status": "degraded"}"#;
        let monitor: PublicMonitor = serde_json::from_str(json).unwrap();
        assert_eq!(monitor.status, MonitorStatus::Unknown);
    }

    #[test]
    fn test_deserialize_history_point() {
        let json = r#"{
            "timestamp": 1700000000000,
            "agentId": "agent-a",
            "avgResponse": 42.0,
            "maxResponse": 80.0,
            "minResponse": 10.0,
            "successCount": 4,
            "totalCount": 4,
            "successRate": 100.0,
            "lastStatus": "up",
            "lastErrorMsg": ""
        }"#;

        let point: AggregatedMonitorMetric = serde_json::from_str(json).unwrap();
        assert_eq!(point.agent_id, "agent-a");
        assert_eq!(point.total_count, 4);
    }

    #[test]
    fn test_monitor_stats_field_names() {
        let json = r#"{
            "agentId": "a",
            "uptime24h": 99.5,
            "uptime30d": 98.0,
            "avgResponse24h": 33,
            "successChecks24h": 10,
            "totalChecks24h": 11,
            "lastCheckStatus": "down"
        }"#;

        let stats: MonitorStats = serde_json::from_str(json).unwrap();
        assert_eq!(stats.uptime_24h, 99.5);
        assert_eq!(stats.uptime_30d, 98.0);
        assert_eq!(stats.avg_response_24h, 33.0);
        assert_eq!(stats.success_checks_24h, 10);
        assert_eq!(stats.last_check_status, MonitorStatus::Down);
    }

    #[test]
    fn test_request_omits_empty_optionals() {
        let req = MonitorTaskRequest {
            name: "web".to_string(),
            monitor_type: MonitorType::Tcp,
            target: "example.com:443".to_string(),
            ..Default::default()
        };

        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["type"], "tcp");
        assert!(value.get("agentIds").is_none());
        assert!(value.get("httpConfig").is_none());
    }

    #[test]
    fn test_time_range_tokens() {
        assert_eq!(TimeRange::default().token(), "5m");
        assert_eq!("1h".parse::<TimeRange>().unwrap(), TimeRange::OneHour);
        assert!("2h".parse::<TimeRange>().is_err());
        assert_eq!(TimeRange::OneHour.next(), TimeRange::FiveMinutes);
        assert_eq!(serde_json::to_string(&TimeRange::ThirtyMinutes).unwrap(), "\"30m\"");
    }

    #[test]
    fn test_page_count() {
        let query = ListQuery::default();
        assert_eq!(query.page_count(0), 1);
        assert_eq!(query.page_count(10), 1);
        assert_eq!(query.page_count(11), 2);
    }
}
