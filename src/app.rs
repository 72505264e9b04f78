//! Application state and navigation logic.
//!
//! `App` owns one [`Query`] per dashboard read and the view state that
//! selects their keys. Everything the renderers show is derived from the
//! queries on demand; changing a local filter never triggers a fetch, and
//! changing the monitor or time range only changes a query key.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::api::{
    AggregatedMonitorMetric, ApiError, ListQuery, MetricsConfig, MonitorApi, MonitorStats,
    MonitorTask, Page, PublicMonitor, TimeRange,
};
use crate::cache::{FetchFuture, Fetcher, Query};
use crate::config::DashboardConfig;
use crate::data::filter::available_probes;
use crate::data::{
    group_history, AgentSelection, ChartSeriesPoint, DisplayMode, FleetStats, HealthStatus,
    MonitorFilter, ProbeOption, ProbeSummary, StatusFilter,
};
use crate::ui::Theme;

/// How long a status message stays visible.
const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(3);

/// The current view/tab in the TUI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Fleet overview with stat cards and the filtered monitor table.
    Monitors,
    /// Stats, chart and probes for one monitor.
    Detail,
    /// Configured monitors and retention settings.
    Admin,
}

impl View {
    pub const ALL: [View; 3] = [View::Monitors, View::Detail, View::Admin];

    pub fn next(self) -> Self {
        match self {
            View::Monitors => View::Detail,
            View::Detail => View::Admin,
            View::Admin => View::Monitors,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            View::Monitors => View::Admin,
            View::Detail => View::Monitors,
            View::Admin => View::Detail,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            View::Monitors => "Monitors",
            View::Detail => "Detail",
            View::Admin => "Admin",
        }
    }
}

/// Fleet snapshot written by `e` in the TUI and by the `export` command.
#[derive(Debug, Clone, Serialize)]
pub struct FleetSnapshot {
    pub system_name: String,
    pub source: String,
    pub generated_at: String,
    pub health: HealthStatus,
    pub summary: FleetStats,
    pub monitors: Vec<PublicMonitor>,
}

impl FleetSnapshot {
    pub fn new(system_name: &str, source: &str, monitors: Vec<PublicMonitor>) -> Self {
        Self {
            system_name: system_name.to_string(),
            source: source.to_string(),
            generated_at: chrono::Local::now().to_rfc3339(),
            health: FleetStats::health(&monitors),
            summary: FleetStats::from_monitors(&monitors),
            monitors,
        }
    }

    /// Write the snapshot as pretty JSON.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

/// Wrap an API call as a query fetcher.
fn fetcher<K, T, F, Fut>(api: &Arc<dyn MonitorApi>, call: F) -> Fetcher<K, T>
where
    K: Send + 'static,
    T: Send + 'static,
    F: Fn(Arc<dyn MonitorApi>, K) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
{
    let api = api.clone();
    Arc::new(move |key: K| -> FetchFuture<T> { Box::pin(call(api.clone(), key)) })
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub current_view: View,
    pub show_help: bool,

    api: Arc<dyn MonitorApi>,
    pub config: DashboardConfig,

    // Queries
    pub monitors: Query<(), Vec<PublicMonitor>>,
    pub stats: Query<String, Vec<MonitorStats>>,
    pub history: Query<(String, TimeRange), Vec<AggregatedMonitorMetric>>,
    pub admin_monitors: Query<ListQuery, Page<MonitorTask>>,
    pub metrics_config: Query<(), MetricsConfig>,

    // Monitors view
    pub filter: MonitorFilter,
    pub filter_active: bool,
    pub display_mode: DisplayMode,
    pub selected_index: usize,

    // Detail view
    pub detail_monitor: Option<String>,
    pub time_range: TimeRange,
    pub agent_selection: AgentSelection,
    pub selected_probe_index: usize,

    // Admin view
    pub admin_query: ListQuery,
    /// Search text as typed; `admin_query` carries the trimmed form.
    pub admin_keyword: String,
    pub selected_admin_index: usize,

    pub theme: Theme,
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Create the app. Fetches are spawned on `runtime`.
    pub fn new(api: Arc<dyn MonitorApi>, config: DashboardConfig, runtime: Handle) -> Result<Self> {
        let interval = config.refresh_interval()?;

        let monitors = Query::with_key(
            "monitors",
            (),
            fetcher(&api, |api, ()| async move { api.public_monitors().await }),
            interval,
            runtime.clone(),
        );
        let stats = Query::new(
            "stats",
            fetcher(&api, |api, name: String| async move {
                api.monitor_stats(&name).await
            }),
            interval,
            runtime.clone(),
        );
        let history = Query::new(
            "history",
            fetcher(&api, |api, (name, range): (String, TimeRange)| async move {
                api.monitor_history(&name, range).await
            }),
            interval,
            runtime.clone(),
        );
        let admin_monitors = Query::new(
            "admin_monitors",
            fetcher(&api, |api, query: ListQuery| async move {
                api.list_monitors(&query).await
            }),
            interval,
            runtime.clone(),
        );
        let metrics_config = Query::new(
            "metrics_config",
            fetcher(&api, |api, ()| async move { api.metrics_config().await }),
            interval,
            runtime,
        );

        Ok(Self {
            running: true,
            current_view: View::Monitors,
            show_help: false,
            api,
            config,
            monitors,
            stats,
            history,
            admin_monitors,
            metrics_config,
            filter: MonitorFilter::default(),
            filter_active: false,
            display_mode: DisplayMode::default(),
            selected_index: 0,
            detail_monitor: None,
            time_range: TimeRange::default(),
            agent_selection: AgentSelection::All,
            selected_probe_index: 0,
            admin_query: ListQuery::default(),
            admin_keyword: String::new(),
            selected_admin_index: 0,
            theme: Theme::dark(),
            status_message: None,
        })
    }

    /// Base URL of the API being watched.
    pub fn source_description(&self) -> &str {
        self.api.base_url()
    }

    pub fn system_name(&self) -> &str {
        &self.config.dashboard.system_name
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired.
    pub fn get_status_message(&self) -> Option<&str> {
        match &self.status_message {
            Some((msg, at)) if at.elapsed() < STATUS_MESSAGE_TTL => Some(msg),
            _ => None,
        }
    }

    /// Drive every query once: apply resolved responses, dispatch due refetches.
    ///
    /// The probe selection is revalidated against the stats in the same
    /// pass, so a vanished probe never reaches the renderer.
    /// Returns true if anything visible changed.
    pub fn tick(&mut self) -> bool {
        let mut changed = self.monitors.tick();
        if changed {
            self.clamp_selection();
        }

        if self.stats.tick() {
            changed = true;
        }
        if self.stats.state().has_data() {
            let probes = available_probes(self.stats.data());
            if self.agent_selection.revalidate(&probes) {
                info!("selected probe no longer reports, showing all probes");
                self.set_status_message("Selected probe is gone, showing all".to_string());
                changed = true;
            }
            if self.selected_probe_index >= probes.len() {
                self.selected_probe_index = probes.len().saturating_sub(1);
            }
        }

        changed |= self.history.tick();
        changed |= self.admin_monitors.tick();
        changed |= self.metrics_config.tick();
        changed
    }

    /// Point each query at the parameters the current view needs.
    ///
    /// Queries for views that are not visible are disabled; their cached
    /// data reappears when the view is shown again.
    fn sync_query_keys(&mut self) {
        let on_detail = self.current_view == View::Detail;
        let monitor = self.detail_monitor.clone().filter(|_| on_detail);
        self.stats.set_key(monitor.clone());
        self.history
            .set_key(monitor.map(|name| (name, self.time_range)));

        let on_admin = self.current_view == View::Admin;
        self.admin_monitors
            .set_key(on_admin.then(|| self.admin_query.clone()));
        self.metrics_config.set_key(on_admin.then_some(()));
    }

    // Derived data

    /// Public monitors after status and keyword narrowing.
    pub fn filtered_monitors(&self) -> Vec<&PublicMonitor> {
        self.filter.apply(self.monitors.data())
    }

    /// Fleet numbers over every monitor, regardless of filters.
    pub fn fleet_stats(&self) -> FleetStats {
        FleetStats::from_monitors(self.monitors.data())
    }

    pub fn fleet_health(&self) -> HealthStatus {
        FleetStats::health(self.monitors.data())
    }

    /// Monitor under the cursor on the Monitors view.
    pub fn selected_monitor(&self) -> Option<&PublicMonitor> {
        self.filtered_monitors().get(self.selected_index).copied()
    }

    /// Public record for the monitor shown on the Detail view.
    pub fn detail_public_monitor(&self) -> Option<&PublicMonitor> {
        let name = self.detail_monitor.as_deref()?;
        self.monitors.data().iter().find(|m| m.name == name)
    }

    pub fn probes(&self) -> Vec<ProbeOption> {
        available_probes(self.stats.data())
    }

    pub fn probe_summary(&self) -> Option<ProbeSummary> {
        ProbeSummary::from_stats(self.stats.data(), &self.config.thresholds)
    }

    /// Chart points for the current monitor, range and probe selection.
    pub fn chart_data(&self) -> Vec<ChartSeriesPoint> {
        group_history(self.history.data(), &self.agent_selection)
    }

    /// Age of the last successful fleet fetch.
    pub fn last_update_age(&self) -> Option<Duration> {
        self.monitors.state().updated_at.map(|at| at.elapsed())
    }

    // Navigation

    pub fn next_view(&mut self) {
        self.set_view(self.current_view.next());
    }

    pub fn prev_view(&mut self) {
        self.set_view(self.current_view.prev());
    }

    pub fn set_view(&mut self, view: View) {
        self.current_view = view;
        self.filter_active = false;
        self.sync_query_keys();
    }

    /// Open the Detail view for the monitor under the cursor.
    pub fn enter_detail(&mut self) {
        match self.current_view {
            View::Monitors => {
                let Some(name) = self.selected_monitor().map(|m| m.name.clone()) else {
                    return;
                };
                self.open_detail(name);
            }
            View::Detail => {
                // Enter on a probe row focuses the chart on that probe
                if let Some(probe) = self.probes().get(self.selected_probe_index) {
                    self.agent_selection = AgentSelection::Agent(probe.id.clone());
                }
            }
            View::Admin => {
                let Some(name) = self
                    .admin_monitors
                    .data()
                    .items
                    .get(self.selected_admin_index)
                    .map(|t| t.name.clone())
                else {
                    return;
                };
                self.open_detail(name);
            }
        }
    }

    /// Show `name` on the Detail view with a fresh probe selection.
    pub fn open_detail(&mut self, name: String) {
        debug!(monitor = %name, "opening detail");
        if self.detail_monitor.as_deref() != Some(name.as_str()) {
            self.agent_selection = AgentSelection::All;
            self.selected_probe_index = 0;
        }
        self.detail_monitor = Some(name);
        self.set_view(View::Detail);
    }

    /// Close help, then leave keyword input, then return to Monitors.
    pub fn go_back(&mut self) {
        if self.show_help {
            self.show_help = false;
        } else if self.filter_active {
            self.filter_active = false;
        } else if self.current_view != View::Monitors {
            self.set_view(View::Monitors);
        }
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    fn list_len(&self) -> usize {
        match self.current_view {
            View::Monitors => self.filtered_monitors().len(),
            View::Detail => self.probes().len(),
            View::Admin => self.admin_monitors.data().items.len(),
        }
    }

    fn cursor_mut(&mut self) -> &mut usize {
        match self.current_view {
            View::Monitors => &mut self.selected_index,
            View::Detail => &mut self.selected_probe_index,
            View::Admin => &mut self.selected_admin_index,
        }
    }

    pub fn select_next(&mut self) {
        self.select_next_n(1);
    }

    pub fn select_prev(&mut self) {
        self.select_prev_n(1);
    }

    pub fn select_next_n(&mut self, n: usize) {
        let max = self.list_len().saturating_sub(1);
        let cursor = self.cursor_mut();
        *cursor = (*cursor + n).min(max);
    }

    pub fn select_prev_n(&mut self, n: usize) {
        let cursor = self.cursor_mut();
        *cursor = cursor.saturating_sub(n);
    }

    pub fn select_first(&mut self) {
        *self.cursor_mut() = 0;
    }

    pub fn select_last(&mut self) {
        let last = self.list_len().saturating_sub(1);
        *self.cursor_mut() = last;
    }

    fn clamp_selection(&mut self) {
        let len = self.filtered_monitors().len();
        if self.selected_index >= len {
            self.selected_index = len.saturating_sub(1);
        }
    }

    // Local view state, never fetches

    pub fn cycle_status_filter(&mut self) {
        self.filter.status = self.filter.status.next();
        self.clamp_selection();
    }

    pub fn set_status_filter(&mut self, status: StatusFilter) {
        self.filter.status = status;
        self.clamp_selection();
    }

    pub fn toggle_display_mode(&mut self) {
        self.display_mode = self.display_mode.toggle();
    }

    pub fn cycle_probe(&mut self) {
        self.agent_selection = self.agent_selection.next(&self.probes());
    }

    // Keyword input: local filter on Monitors, server-side search on Admin

    pub fn start_filter(&mut self) {
        if self.current_view != View::Detail {
            self.filter_active = true;
        }
    }

    pub fn cancel_filter(&mut self) {
        self.filter_active = false;
    }

    /// The keyword being edited for the current view.
    pub fn keyword(&self) -> &str {
        match self.current_view {
            View::Admin => &self.admin_keyword,
            _ => &self.filter.keyword,
        }
    }

    fn edit_keyword(&mut self, edit: impl FnOnce(&mut String)) {
        match self.current_view {
            View::Admin => {
                edit(&mut self.admin_keyword);
                let trimmed = self.admin_keyword.trim();
                self.admin_query.keyword = (!trimmed.is_empty()).then(|| trimmed.to_string());
                self.admin_query.page = 1;
                self.selected_admin_index = 0;
                self.sync_query_keys();
            }
            _ => {
                edit(&mut self.filter.keyword);
                self.clamp_selection();
            }
        }
    }

    pub fn filter_push(&mut self, c: char) {
        self.edit_keyword(|k| k.push(c));
    }

    pub fn filter_pop(&mut self) {
        self.edit_keyword(|k| {
            k.pop();
        });
    }

    pub fn clear_filter(&mut self) {
        self.edit_keyword(String::clear);
        self.filter_active = false;
    }

    // Parameter changes, these re-key queries

    pub fn cycle_time_range(&mut self) {
        self.time_range = self.time_range.next();
        self.sync_query_keys();
    }

    pub fn next_page(&mut self) {
        let pages = self.admin_query.page_count(self.admin_monitors.data().total);
        if self.admin_query.page < pages {
            self.admin_query.page += 1;
            self.selected_admin_index = 0;
            self.sync_query_keys();
        }
    }

    pub fn prev_page(&mut self) {
        if self.admin_query.page > 1 {
            self.admin_query.page -= 1;
            self.selected_admin_index = 0;
            self.sync_query_keys();
        }
    }

    /// Refetch everything the current view shows.
    pub fn refetch(&mut self) {
        match self.current_view {
            View::Monitors => self.monitors.refetch(),
            View::Detail => {
                self.stats.refetch();
                self.history.refetch();
            }
            View::Admin => {
                self.admin_monitors.refetch();
                self.metrics_config.refetch();
            }
        }
    }

    /// Export the filtered fleet to a JSON file.
    pub fn export_state(&self, path: &Path) -> Result<()> {
        if !self.monitors.state().has_data() {
            anyhow::bail!("No data to export");
        }
        FleetSnapshot::new(
            self.system_name(),
            self.source_description(),
            self.filtered_monitors().into_iter().cloned().collect(),
        )
        .write_to(path)
    }
}
