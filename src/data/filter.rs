//! View filters: status, keyword, display mode and probe selection.
//!
//! Filters never touch the cached data. They narrow a borrowed view of it,
//! one stage at a time, in a fixed order.

use crate::api::{MonitorStats, MonitorStatus, PublicMonitor};

/// Status narrowing for the monitor list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Up,
    Down,
    Unknown,
}

impl StatusFilter {
    pub fn label(&self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Up => "up",
            StatusFilter::Down => "down",
            StatusFilter::Unknown => "unknown",
        }
    }

    /// Cycle All → Up → Down → Unknown → All.
    pub fn next(self) -> Self {
        match self {
            StatusFilter::All => StatusFilter::Up,
            StatusFilter::Up => StatusFilter::Down,
            StatusFilter::Down => StatusFilter::Unknown,
            StatusFilter::Unknown => StatusFilter::All,
        }
    }

    pub fn matches(&self, status: MonitorStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Up => status == MonitorStatus::Up,
            StatusFilter::Down => status == MonitorStatus::Down,
            StatusFilter::Unknown => status == MonitorStatus::Unknown,
        }
    }
}

/// Which precomputed latency the monitor list shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    Avg,
    #[default]
    Max,
}

impl DisplayMode {
    pub fn label(&self) -> &'static str {
        match self {
            DisplayMode::Avg => "avg",
            DisplayMode::Max => "max",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            DisplayMode::Avg => DisplayMode::Max,
            DisplayMode::Max => DisplayMode::Avg,
        }
    }

    /// Latency field selected by this mode, in ms.
    pub fn latency(&self, monitor: &PublicMonitor) -> f64 {
        match self {
            DisplayMode::Avg => monitor.response_time,
            DisplayMode::Max => monitor.response_time_max,
        }
    }
}

/// Status and keyword narrowing for the public monitor list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorFilter {
    pub status: StatusFilter,
    pub keyword: String,
}

impl MonitorFilter {
    /// True when neither stage narrows anything.
    pub fn is_empty(&self) -> bool {
        self.status == StatusFilter::All && self.keyword.trim().is_empty()
    }

    /// Run the narrowing pipeline: status first, then keyword.
    pub fn apply<'a>(&self, monitors: &'a [PublicMonitor]) -> Vec<&'a PublicMonitor> {
        let view: Vec<&PublicMonitor> = monitors.iter().collect();
        let view = narrow_by_status(view, self.status);
        narrow_by_keyword(view, &self.keyword)
    }
}

/// Keep monitors whose status matches. `All` keeps everything.
pub fn narrow_by_status(view: Vec<&PublicMonitor>, filter: StatusFilter) -> Vec<&PublicMonitor> {
    if filter == StatusFilter::All {
        return view;
    }
    view.into_iter().filter(|m| filter.matches(m.status)).collect()
}

/// Keep monitors whose name or target contains the keyword, ignoring case.
/// A blank keyword keeps everything.
pub fn narrow_by_keyword<'a>(view: Vec<&'a PublicMonitor>, keyword: &str) -> Vec<&'a PublicMonitor> {
    let needle = keyword.trim().to_lowercase();
    if needle.is_empty() {
        return view;
    }
    view.into_iter()
        .filter(|m| {
            m.name.to_lowercase().contains(&needle) || m.target.to_lowercase().contains(&needle)
        })
        .collect()
}

/// A probe that reported stats for the current monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOption {
    pub id: String,
    /// Shortened id for selectors and legends.
    pub label: String,
}

/// Probe ids are UUID-like; eight characters are enough to tell them apart.
const PROBE_LABEL_LEN: usize = 8;

/// Short display form of a probe id.
pub fn probe_label(agent_id: &str) -> String {
    agent_id.chars().take(PROBE_LABEL_LEN).collect()
}

/// Probes present in a stats response, in response order, deduplicated.
pub fn available_probes(stats: &[MonitorStats]) -> Vec<ProbeOption> {
    let mut probes: Vec<ProbeOption> = Vec::new();
    for row in stats {
        if !probes.iter().any(|p| p.id == row.agent_id) {
            probes.push(ProbeOption {
                id: row.agent_id.clone(),
                label: probe_label(&row.agent_id),
            });
        }
    }
    probes
}

/// Probe selection on the detail view.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AgentSelection {
    #[default]
    All,
    Agent(String),
}

impl AgentSelection {
    pub fn matches(&self, agent_id: &str) -> bool {
        match self {
            AgentSelection::All => true,
            AgentSelection::Agent(id) => id == agent_id,
        }
    }

    pub fn label(&self) -> String {
        match self {
            AgentSelection::All => "all probes".to_string(),
            AgentSelection::Agent(id) => probe_label(id),
        }
    }

    /// Reset to `All` if the selected probe is no longer available.
    ///
    /// Returns true when the selection was reset.
    pub fn revalidate(&mut self, available: &[ProbeOption]) -> bool {
        let missing = match self {
            AgentSelection::All => false,
            AgentSelection::Agent(id) => !available.iter().any(|p| &p.id == id),
        };
        if missing {
            *self = AgentSelection::All;
        }
        missing
    }

    /// Step through All → each probe in order → All.
    pub fn next(&self, available: &[ProbeOption]) -> Self {
        let position = match self {
            AgentSelection::All => None,
            AgentSelection::Agent(id) => available.iter().position(|p| &p.id == id),
        };
        let next = match position {
            None => available.first(),
            Some(i) => available.get(i + 1),
        };
        next.map_or(AgentSelection::All, |p| AgentSelection::Agent(p.id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor(name: &str, target: &str, status: MonitorStatus) -> PublicMonitor {
        PublicMonitor {
            name: name.to_string(),
            target: target.to_string(),
            status,
            response_time: 40.0,
            response_time_max: 90.0,
            ..Default::default()
        }
    }

    fn fleet() -> Vec<PublicMonitor> {
        vec![
            monitor("API Gateway", "https://api.example.com", MonitorStatus::Up),
            monitor("db", "10.0.0.5:5432", MonitorStatus::Down),
            monitor("cdn", "https://static.example.com", MonitorStatus::Unknown),
            monitor("auth", "https://auth.internal", MonitorStatus::Up),
        ]
    }

    fn names(view: &[&PublicMonitor]) -> Vec<String> {
        view.iter().map(|m| m.name.clone()).collect()
    }

    fn probes(ids: &[&str]) -> Vec<ProbeOption> {
        ids.iter()
            .map(|id| ProbeOption {
                id: id.to_string(),
                label: probe_label(id),
            })
            .collect()
    }

    #[test]
    fn test_default_filter_keeps_everything() {
        let monitors = fleet();
        let filter = MonitorFilter::default();
        assert!(filter.is_empty());
        assert_eq!(filter.apply(&monitors).len(), 4);
    }

    #[test]
    fn test_status_filter() {
        let monitors = fleet();
        let filter = MonitorFilter {
            status: StatusFilter::Up,
            ..Default::default()
        };
        assert_eq!(names(&filter.apply(&monitors)), vec!["API Gateway", "auth"]);
    }

    #[test]
    fn test_keyword_matches_name_or_target_ignoring_case() {
        let monitors = fleet();
        let mut filter = MonitorFilter {
            keyword: "  EXAMPLE ".to_string(),
            ..Default::default()
        };
        assert_eq!(names(&filter.apply(&monitors)), vec!["API Gateway", "cdn"]);

        filter.keyword = "gateway".to_string();
        assert_eq!(names(&filter.apply(&monitors)), vec!["API Gateway"]);
    }

    #[test]
    fn test_blank_keyword_is_noop() {
        let monitors = fleet();
        assert_eq!(narrow_by_keyword(monitors.iter().collect(), "   ").len(), 4);
    }

    #[test]
    fn test_status_then_keyword() {
        let monitors = fleet();
        let filter = MonitorFilter {
            status: StatusFilter::Up,
            keyword: "example".to_string(),
        };
        assert_eq!(names(&filter.apply(&monitors)), vec!["API Gateway"]);
    }

    #[test]
    fn test_status_filter_cycles() {
        let mut f = StatusFilter::All;
        for _ in 0..4 {
            f = f.next();
        }
        assert_eq!(f, StatusFilter::All);
    }

    #[test]
    fn test_display_mode_reads_field() {
        let m = monitor("x", "y", MonitorStatus::Up);
        assert_eq!(DisplayMode::default(), DisplayMode::Max);
        assert_eq!(DisplayMode::Max.latency(&m), 90.0);
        assert_eq!(DisplayMode::Avg.latency(&m), 40.0);
        assert_eq!(DisplayMode::Max.toggle(), DisplayMode::Avg);
    }

    #[test]
    fn test_available_probes_dedup_in_order() {
        let stats: Vec<MonitorStats> = ["bbbbbbbbbbbb", "a1", "bbbbbbbbbbbb"]
            .iter()
            .map(|id| MonitorStats {
                agent_id: id.to_string(),
                ..Default::default()
            })
            .collect();
        let available = available_probes(&stats);
        assert_eq!(available.len(), 2);
        assert_eq!(available[0].label, "bbbbbbbb");
        assert_eq!(available[1].label, "a1");
    }

    #[test]
    fn test_missing_probe_resets_to_all() {
        let mut sel = AgentSelection::Agent("gone".to_string());
        assert!(sel.revalidate(&probes(&["a", "b"])));
        assert_eq!(sel, AgentSelection::All);
    }

    #[test]
    fn test_present_probe_is_kept() {
        let mut sel = AgentSelection::Agent("b".to_string());
        assert!(!sel.revalidate(&probes(&["a", "b"])));
        assert_eq!(sel, AgentSelection::Agent("b".to_string()));

        let mut all = AgentSelection::All;
        assert!(!all.revalidate(&[]));
    }

    #[test]
    fn test_probe_cycle() {
        let available = probes(&["a", "b"]);
        let sel = AgentSelection::All.next(&available);
        assert_eq!(sel, AgentSelection::Agent("a".to_string()));
        let sel = sel.next(&available);
        assert_eq!(sel, AgentSelection::Agent("b".to_string()));
        assert_eq!(sel.next(&available), AgentSelection::All);
        assert_eq!(AgentSelection::All.next(&[]), AgentSelection::All);
    }
}
