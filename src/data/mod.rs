//! Derived views over fetched monitor data.
//!
//! Everything here is a pure function of the current cached data and the
//! view state. Nothing is accumulated between polls: the chart series,
//! fleet numbers and probe summary are rebuilt on every render.
//!
//! ## Submodules
//!
//! - [`series`]: History rows grouped into per-probe chart points
//! - [`stats`]: Fleet statistics, cross-probe summaries and health levels
//! - [`filter`]: Status/keyword narrowing, display mode, probe selection
//! - [`format`]: Response time, percentage, date and duration formatting
//! - [`validate`]: Admin input checks ([`FieldErrors`])
//!
//! ## Data Flow
//!
//! ```text
//! Vec<PublicMonitor> ──▶ MonitorFilter::apply() ──▶ monitor table
//!        └─────────────▶ FleetStats::from_monitors() ──▶ stat cards
//!
//! Vec<MonitorStats> ──▶ available_probes() ──▶ AgentSelection::revalidate()
//!        └─────────────▶ ProbeSummary::from_stats() ──▶ detail cards
//!
//! Vec<AggregatedMonitorMetric> ──▶ group_history(selection) ──▶ chart
//! ```

pub mod filter;
pub mod format;
pub mod series;
pub mod stats;
pub mod validate;

pub use filter::{AgentSelection, DisplayMode, MonitorFilter, ProbeOption, StatusFilter};
pub use series::{group_history, group_history_with, series_key, series_keys, ChartSeriesPoint};
pub use stats::{FleetStats, HealthStatus, ProbeSummary, Thresholds};
pub use validate::FieldErrors;
