//! Fleet and per-monitor summaries with health levels.

use serde::{Deserialize, Serialize};

use crate::api::{MonitorStats, MonitorStatus, PublicMonitor};

/// Thresholds for health colouring.
///
/// Uptime below `uptime_warning` is a warning, below `uptime_critical`
/// critical. Certificates expiring within `cert_warning_days` warn, and
/// expired ones are critical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub uptime_warning: f64,
    pub uptime_critical: f64,
    pub cert_warning_days: i64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            uptime_warning: 99.0,
            uptime_critical: 95.0,
            cert_warning_days: 30,
        }
    }
}

impl Thresholds {
    pub fn uptime_status(&self, uptime: f64) -> HealthStatus {
        if uptime >= self.uptime_warning {
            HealthStatus::Healthy
        } else if uptime >= self.uptime_critical {
            HealthStatus::Warning
        } else {
            HealthStatus::Critical
        }
    }

    pub fn cert_status(&self, days_left: i64) -> HealthStatus {
        if days_left <= 0 {
            HealthStatus::Critical
        } else if days_left < self.cert_warning_days {
            HealthStatus::Warning
        } else {
            HealthStatus::Healthy
        }
    }
}

/// Health status for a monitor, metric or the whole fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
}

impl HealthStatus {
    /// Returns a short symbol for display.
    pub fn symbol(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "OK",
            HealthStatus::Warning => "WARN",
            HealthStatus::Critical => "CRIT",
        }
    }
}

/// Headline numbers for the monitor list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FleetStats {
    pub total: usize,
    pub online: usize,
    pub issues: usize,
    /// Rounded mean of `response_time` over all monitors, ms.
    pub avg_latency: u64,
}

impl FleetStats {
    pub fn from_monitors(monitors: &[PublicMonitor]) -> Self {
        let total = monitors.len();
        if total == 0 {
            return Self::default();
        }

        let online = monitors
            .iter()
            .filter(|m| m.status == MonitorStatus::Up)
            .count();
        let sum: f64 = monitors
            .iter()
            .map(|m| m.response_time)
            .filter(|v| v.is_finite())
            .sum();
        let mean = (sum / total as f64).round();

        Self {
            total,
            online,
            issues: total - online,
            avg_latency: if mean > 0.0 { mean as u64 } else { 0 },
        }
    }

    /// Worst state across the fleet: any down monitor is critical,
    /// anything else that is not up is a warning.
    pub fn health(monitors: &[PublicMonitor]) -> HealthStatus {
        monitors
            .iter()
            .map(|m| match m.status {
                MonitorStatus::Up => HealthStatus::Healthy,
                MonitorStatus::Unknown => HealthStatus::Warning,
                MonitorStatus::Down => HealthStatus::Critical,
            })
            .max()
            .unwrap_or(HealthStatus::Healthy)
    }
}

/// Cross-probe summary for one monitor.
///
/// Uptimes are averaged across probes. Response times and certificate
/// data come from the first row, which the server returns for the
/// monitor's primary probe.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeSummary {
    pub probes: usize,
    pub current_response: f64,
    pub avg_response_24h: f64,
    pub avg_uptime_24h: f64,
    pub avg_uptime_30d: f64,
    pub has_cert: bool,
    pub cert_expiring_soon: bool,
    pub cert_expiry_date: i64,
    pub cert_expiry_days: i64,
}

impl ProbeSummary {
    pub fn from_stats(stats: &[MonitorStats], thresholds: &Thresholds) -> Option<Self> {
        let first = stats.first()?;
        let n = stats.len() as f64;

        let avg_uptime_24h = stats.iter().map(|s| s.uptime_24h).sum::<f64>() / n;
        let avg_uptime_30d = stats.iter().map(|s| s.uptime_30d).sum::<f64>() / n;
        let has_cert = first.cert_expiry_date > 0;

        Some(Self {
            probes: stats.len(),
            current_response: first.current_response,
            avg_response_24h: first.avg_response_24h,
            avg_uptime_24h,
            avg_uptime_30d,
            has_cert,
            cert_expiring_soon: has_cert && first.cert_expiry_days < thresholds.cert_warning_days,
            cert_expiry_date: first.cert_expiry_date,
            cert_expiry_days: first.cert_expiry_days,
        })
    }
}
