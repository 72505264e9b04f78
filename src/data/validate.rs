//! Input checks for admin writes, run before any request is sent.

use std::collections::BTreeMap;
use std::fmt;

use crate::api::{MetricsConfig, MonitorTaskRequest, MonitorType};

pub const MIN_RETENTION_HOURS: u32 = 24;
pub const MAX_RETENTION_HOURS: u32 = 720;
/// Upper bound on a monitor's check interval, one day.
pub const MAX_INTERVAL_SECS: u32 = 86_400;

/// Validation failures keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<&'static str, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.keys().copied()
    }

    fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

/// Check a monitor request and return it with name and target trimmed.
pub fn validate_monitor_request(req: &MonitorTaskRequest) -> Result<MonitorTaskRequest, FieldErrors> {
    let mut errors = FieldErrors::new();
    let mut normalized = req.clone();
    normalized.name = req.name.trim().to_string();
    normalized.target = req.target.trim().to_string();
    normalized.description = req.description.trim().to_string();

    if normalized.name.is_empty() {
        errors.add("name", "name is required");
    }

    if normalized.target.is_empty() {
        errors.add("target", "target is required");
    } else {
        match normalized.monitor_type {
            MonitorType::Http => check_http_target(&normalized.target, &mut errors),
            MonitorType::Tcp => check_tcp_target(&normalized.target, &mut errors),
        }
    }

    if normalized.interval > MAX_INTERVAL_SECS {
        errors.add(
            "interval",
            format!("interval must be at most {MAX_INTERVAL_SECS} seconds"),
        );
    }

    if normalized.agent_ids.iter().any(|id| id.trim().is_empty()) {
        errors.add("agentIds", "probe ids must not be blank");
    }

    errors.into_result().map(|_| normalized)
}

fn check_http_target(target: &str, errors: &mut FieldErrors) {
    let rest = target
        .strip_prefix("http://")
        .or_else(|| target.strip_prefix("https://"));
    match rest {
        Some(host) if !host.is_empty() => {}
        Some(_) => errors.add("target", "URL has no host"),
        None => errors.add("target", "HTTP targets must start with http:// or https://"),
    }
}

fn check_tcp_target(target: &str, errors: &mut FieldErrors) {
    let Some((host, port)) = target.rsplit_once(':') else {
        errors.add("target", "TCP targets must be host:port");
        return;
    };
    if host.is_empty() {
        errors.add("target", "TCP target has no host");
    }
    match port.parse::<u16>() {
        Ok(p) if p > 0 => {}
        _ => errors.add("target", format!("invalid port: {port}")),
    }
}

/// Check retention settings against the server's accepted range.
pub fn validate_metrics_config(cfg: &MetricsConfig) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    if !(MIN_RETENTION_HOURS..=MAX_RETENTION_HOURS).contains(&cfg.retention_hours) {
        errors.add(
            "retentionHours",
            format!("must be between {MIN_RETENTION_HOURS} and {MAX_RETENTION_HOURS} hours"),
        );
    }
    if cfg.max_query_points < 1 {
        errors.add("maxQueryPoints", "must be at least 1");
    }

    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(monitor_type: MonitorType, target: &str) -> MonitorTaskRequest {
        MonitorTaskRequest {
            name: "api".to_string(),
            monitor_type,
            target: target.to_string(),
            enabled: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_http_request_is_trimmed() {
        let mut req = request(MonitorType::Http, "  https://example.com/health ");
        req.name = "  api ".to_string();
        let ok = validate_monitor_request(&req).unwrap();
        assert_eq!(ok.name, "api");
        assert_eq!(ok.target, "https://example.com/health");
    }

    #[test]
    fn test_missing_name_and_target() {
        let mut req = request(MonitorType::Http, "   ");
        req.name = " ".to_string();
        let errors = validate_monitor_request(&req).unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["name", "target"]);
        assert_eq!(errors.get("name"), ["name is required"]);
    }

    #[test]
    fn test_http_target_needs_scheme() {
        let errors = validate_monitor_request(&request(MonitorType::Http, "example.com")).unwrap_err();
        assert_eq!(errors.get("target").len(), 1);

        let errors = validate_monitor_request(&request(MonitorType::Http, "https://")).unwrap_err();
        assert_eq!(errors.get("target"), ["URL has no host"]);
    }

    #[test]
    fn test_tcp_target_shape() {
        assert!(validate_monitor_request(&request(MonitorType::Tcp, "db.local:5432")).is_ok());
        assert!(validate_monitor_request(&request(MonitorType::Tcp, "[::1]:22")).is_ok());
        assert!(validate_monitor_request(&request(MonitorType::Tcp, "db.local")).is_err());
        assert!(validate_monitor_request(&request(MonitorType::Tcp, ":80")).is_err());
        assert!(validate_monitor_request(&request(MonitorType::Tcp, "db:0")).is_err());
        assert!(validate_monitor_request(&request(MonitorType::Tcp, "db:http")).is_err());
    }

    #[test]
    fn test_interval_bounds() {
        let mut req = request(MonitorType::Tcp, "db:5432");
        req.interval = 0;
        assert!(validate_monitor_request(&req).is_ok());
        req.interval = MAX_INTERVAL_SECS;
        assert!(validate_monitor_request(&req).is_ok());
        req.interval = MAX_INTERVAL_SECS + 1;
        let errors = validate_monitor_request(&req).unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["interval"]);
    }

    #[test]
    fn test_metrics_config_bounds() {
        assert!(validate_metrics_config(&MetricsConfig::default()).is_ok());

        let low = MetricsConfig {
            retention_hours: 12,
            max_query_points: 0,
        };
        let errors = validate_metrics_config(&low).unwrap_err();
        assert_eq!(
            errors.fields().collect::<Vec<_>>(),
            vec!["maxQueryPoints", "retentionHours"]
        );

        let high = MetricsConfig {
            retention_hours: 721,
            max_query_points: 10,
        };
        assert!(validate_metrics_config(&high).is_err());
    }

    #[test]
    fn test_display_joins_messages() {
        let mut errors = FieldErrors::new();
        errors.add("name", "name is required");
        errors.add("interval", "too long");
        assert_eq!(errors.to_string(), "interval: too long; name: name is required");
    }
}
