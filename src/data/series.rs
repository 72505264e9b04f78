//! Chart series built from raw history points.
//!
//! History arrives as one row per (bucket, probe). The chart wants one
//! point per time label with a value per probe, so rows are grouped by
//! their formatted local time and keyed by `agent_<id>`.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Local};

use super::filter::AgentSelection;
use crate::api::AggregatedMonitorMetric;

/// Prefix used for every per-probe series key.
pub const SERIES_PREFIX: &str = "agent_";

/// One x-axis position on the response-time chart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartSeriesPoint {
    /// Display label, local time of day.
    pub time: String,
    /// Series key to average response time (ms).
    pub values: BTreeMap<String, f64>,
}

impl ChartSeriesPoint {
    fn new(time: String) -> Self {
        Self {
            time,
            values: BTreeMap::new(),
        }
    }

    /// Value for one probe, if present at this label.
    pub fn value_for(&self, agent_id: &str) -> Option<f64> {
        self.values.get(&series_key(agent_id)).copied()
    }
}

/// Series key for a probe id.
pub fn series_key(agent_id: &str) -> String {
    format!("{SERIES_PREFIX}{agent_id}")
}

/// Probe id back out of a series key.
pub fn agent_of(key: &str) -> Option<&str> {
    key.strip_prefix(SERIES_PREFIX)
}

/// Local `HH:MM:SS` label for an epoch-millis timestamp.
pub fn time_label(timestamp_ms: i64) -> String {
    DateTime::from_timestamp_millis(timestamp_ms)
        .map(|dt| dt.with_timezone(&Local).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string())
}

/// Group history rows into chart points using local time labels.
pub fn group_history(
    points: &[AggregatedMonitorMetric],
    selection: &AgentSelection,
) -> Vec<ChartSeriesPoint> {
    group_history_with(points, selection, time_label)
}

/// Group history rows with an explicit label function.
///
/// Points keep the order in which their label was first seen. Every row
/// creates its label, even when its probe is filtered out, so narrowing
/// the selection only removes values. Two rows with the same label and
/// probe overwrite each other: the later row wins.
pub fn group_history_with<F>(
    points: &[AggregatedMonitorMetric],
    selection: &AgentSelection,
    label: F,
) -> Vec<ChartSeriesPoint>
where
    F: Fn(i64) -> String,
{
    let mut grouped: Vec<ChartSeriesPoint> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for point in points {
        let time = label(point.timestamp);
        let slot = *index.entry(time.clone()).or_insert_with(|| {
            grouped.push(ChartSeriesPoint::new(time));
            grouped.len() - 1
        });

        if selection.matches(&point.agent_id) {
            grouped[slot]
                .values
                .insert(series_key(&point.agent_id), point.avg_response);
        }
    }

    grouped
}

/// Distinct series keys across all points, in first-seen order.
pub fn series_keys(points: &[ChartSeriesPoint]) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for point in points {
        for key in point.values.keys() {
            if !keys.contains(key) {
                keys.push(key.clone());
            }
        }
    }
    keys
}
