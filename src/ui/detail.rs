//! Detail view rendering.
//!
//! Summary cards, certificate status, range and probe selectors, the
//! multi-probe response-time chart and the per-probe table for the
//! monitor opened from the list.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, Block, Borders, Cell, Chart, Dataset, GraphType, Paragraph, Row, Table, TableState,
    },
    Frame,
};

use super::common::{percent_bar, placeholder, render_message};
use crate::api::TimeRange;
use crate::app::App;
use crate::data::filter::probe_label;
use crate::data::format::{
    clamp_percent, format_date, format_datetime, format_duration, format_percent,
    format_response_time,
};
use crate::data::series::agent_of;
use crate::data::{
    series_keys, AgentSelection, ChartSeriesPoint, HealthStatus, ProbeOption, ProbeSummary,
};

/// Width of the uptime bars in the probe table.
const BAR_WIDTH: usize = 10;

/// Render the Detail view.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let Some(name) = app.detail_monitor.as_deref() else {
        render_message(
            frame,
            app,
            area,
            "Detail",
            "No monitor selected. Pick one on the Monitors tab and press Enter.",
        );
        return;
    };

    let stats_state = app.stats.state();
    if let Some(message) =
        placeholder(stats_state, stats_state.data.is_empty(), "No stats reported yet")
    {
        render_message(frame, app, area, name, &message);
        return;
    }

    let summary = app.probe_summary();
    let cert_height = if summary.as_ref().is_some_and(|s| s.has_cert) { 1 } else { 0 };
    let probe_rows = app.stats.data().len() as u16;

    let chunks = Layout::vertical([
        Constraint::Length(1),              // Title line
        Constraint::Length(4),              // Summary cards
        Constraint::Length(cert_height),    // Certificate
        Constraint::Length(1),              // Selectors
        Constraint::Min(8),                 // Chart
        Constraint::Length(probe_rows + 3), // Probe table
    ])
    .split(area);

    render_title(frame, app, name, chunks[0]);
    if let Some(summary) = &summary {
        render_cards(frame, app, summary, chunks[1]);
        if summary.has_cert {
            render_cert(frame, app, summary, chunks[2]);
        }
    }
    render_selectors(frame, app, chunks[3]);
    render_chart(frame, app, chunks[4]);
    render_probes(frame, app, chunks[5]);
}

fn render_title(frame: &mut Frame, app: &App, name: &str, area: Rect) {
    let mut spans = vec![Span::styled(
        format!(" {} ", name),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    if let Some(monitor) = app.detail_public_monitor() {
        spans.push(Span::styled(
            format!("[{}] ", monitor.status.as_str()),
            app.theme.monitor_status_style(monitor.status),
        ));
        spans.push(Span::raw(format!(
            "{} {}",
            monitor.monitor_type.as_str(),
            monitor.target
        )));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_cards(frame: &mut Frame, app: &App, summary: &ProbeSummary, area: Rect) {
    let thresholds = &app.config.thresholds;
    let cards = [
        (
            "Current",
            format_response_time(summary.current_response),
            Style::default(),
        ),
        (
            "24h avg",
            format_response_time(summary.avg_response_24h),
            Style::default(),
        ),
        (
            "Uptime 24h",
            format!("{}%", format_percent(clamp_percent(summary.avg_uptime_24h))),
            app.theme
                .status_style(thresholds.uptime_status(summary.avg_uptime_24h)),
        ),
        (
            "Uptime 30d",
            format!("{}%", format_percent(clamp_percent(summary.avg_uptime_30d))),
            app.theme
                .status_style(thresholds.uptime_status(summary.avg_uptime_30d)),
        ),
    ];

    let columns = Layout::horizontal([Constraint::Ratio(1, 4); 4]).split(area);
    for ((title, value, style), column) in cards.into_iter().zip(columns.iter()) {
        let block = Block::default()
            .title(format!(" {} ", title))
            .borders(Borders::ALL)
            .border_type(app.theme.border_type)
            .border_style(Style::default().fg(app.theme.border));
        let paragraph = Paragraph::new(Line::from(Span::styled(
            format!(" {}", value),
            style.add_modifier(Modifier::BOLD),
        )))
        .block(block);
        frame.render_widget(paragraph, *column);
    }
}

fn render_cert(frame: &mut Frame, app: &App, summary: &ProbeSummary, area: Rect) {
    let status = app.config.thresholds.cert_status(summary.cert_expiry_days);
    let note = match status {
        HealthStatus::Critical => " (expired)",
        HealthStatus::Warning => " (expiring soon)",
        HealthStatus::Healthy => "",
    };
    let line = Line::from(vec![
        Span::raw(" TLS certificate expires "),
        Span::styled(
            format!(
                "{} in {} days{}",
                format_date(summary.cert_expiry_date),
                summary.cert_expiry_days,
                note
            ),
            app.theme.status_style(status),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_selectors(frame: &mut Frame, app: &App, area: Rect) {
    let active = app.theme.tab_active;
    let inactive = app.theme.tab_inactive;

    let mut spans = vec![Span::raw(" Range: ")];
    for range in TimeRange::ALL {
        let style = if range == app.time_range { active } else { inactive };
        spans.push(Span::styled(format!("[{}]", range.token()), style));
        spans.push(Span::raw(" "));
    }
    spans.push(Span::raw(format!(
        "({} per point) │ Probe: ",
        format_duration(app.time_range.bucket())
    )));

    let all_style = if app.agent_selection == AgentSelection::All { active } else { inactive };
    spans.push(Span::styled("[all]", all_style));
    for probe in app.probes() {
        spans.push(Span::raw(" "));
        let style = if app.agent_selection.matches(&probe.id)
            && app.agent_selection != AgentSelection::All
        {
            active
        } else {
            inactive
        };
        spans.push(Span::styled(format!("[{}]", probe.label), style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Palette slot for a probe: its position among all probes reporting for
/// the monitor, so a probe keeps its colour when the chart is narrowed.
fn probe_color_index(probes: &[ProbeOption], agent_id: &str) -> usize {
    probes
        .iter()
        .position(|p| p.id == agent_id)
        .unwrap_or(probes.len())
}

/// Per-series `(x, y)` points, x being the label index.
fn chart_points(points: &[ChartSeriesPoint], keys: &[String]) -> Vec<Vec<(f64, f64)>> {
    keys.iter()
        .map(|key| {
            points
                .iter()
                .enumerate()
                .filter_map(|(i, p)| p.values.get(key).map(|v| (i as f64, *v)))
                .collect()
        })
        .collect()
}

fn render_chart(frame: &mut Frame, app: &App, area: Rect) {
    let title = format!(" Response time ({}) ", app.agent_selection.label());
    let history_state = app.history.state();
    let points = app.chart_data();
    let keys = series_keys(&points);

    if let Some(message) =
        placeholder(history_state, keys.is_empty(), "No history in this range")
    {
        render_message(frame, app, area, title.trim(), &message);
        return;
    }

    let series = chart_points(&points, &keys);
    let max_y = series
        .iter()
        .flatten()
        .map(|(_, y)| *y)
        .fold(0.0_f64, f64::max);
    let max_y = if max_y > 0.0 { max_y * 1.1 } else { 1.0 };
    let max_x = (points.len().saturating_sub(1)).max(1) as f64;

    let probes = app.probes();
    let datasets: Vec<Dataset> = keys
        .iter()
        .zip(&series)
        .map(|(key, data)| {
            let agent = agent_of(key).unwrap_or(key.as_str());
            let color = app.theme.series_color(probe_color_index(&probes, agent));
            Dataset::default()
                .name(probe_label(agent))
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(color))
                .data(data)
        })
        .collect();

    let first = points.first().map(|p| p.time.clone()).unwrap_or_default();
    let last = points.last().map(|p| p.time.clone()).unwrap_or_default();
    let axis_style = Style::default().fg(app.theme.border);

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_type(app.theme.border_type)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .x_axis(
            Axis::default()
                .style(axis_style)
                .bounds([0.0, max_x])
                .labels(vec![Span::raw(first), Span::raw(last)]),
        )
        .y_axis(
            Axis::default()
                .style(axis_style)
                .bounds([0.0, max_y])
                .labels(vec![
                    Span::raw("0"),
                    Span::raw(format_response_time(max_y / 2.0)),
                    Span::raw(format_response_time(max_y)),
                ]),
        );

    frame.render_widget(chart, area);
}

fn render_probes(frame: &mut Frame, app: &App, area: Rect) {
    let thresholds = &app.config.thresholds;
    let header = Row::new(vec![
        Cell::from(""),
        Cell::from("Probe"),
        Cell::from("Last"),
        Cell::from("Current"),
        Cell::from("24h avg"),
        Cell::from("Uptime 24h"),
        Cell::from("Uptime 30d"),
        Cell::from("Checks 24h"),
        Cell::from("Last check"),
    ])
    .height(1)
    .style(app.theme.header);

    let probes = app.probes();
    let rows: Vec<Row> = app
        .stats
        .data()
        .iter()
        .map(|s| {
            let focused = app.agent_selection.matches(&s.agent_id);
            let label_style = if focused {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default().add_modifier(Modifier::DIM)
            };
            let color = app.theme.series_color(probe_color_index(&probes, &s.agent_id));
            Row::new(vec![
                Cell::from("●").style(Style::default().fg(color)),
                Cell::from(probe_label(&s.agent_id)).style(label_style),
                Cell::from(s.last_check_status.as_str())
                    .style(app.theme.monitor_status_style(s.last_check_status)),
                Cell::from(format_response_time(s.current_response)),
                Cell::from(format_response_time(s.avg_response_24h)),
                Cell::from(percent_bar(s.uptime_24h, BAR_WIDTH))
                    .style(app.theme.status_style(thresholds.uptime_status(s.uptime_24h))),
                Cell::from(percent_bar(s.uptime_30d, BAR_WIDTH))
                    .style(app.theme.status_style(thresholds.uptime_status(s.uptime_30d))),
                Cell::from(format!("{}/{}", s.success_checks_24h, s.total_checks_24h)),
                Cell::from(format_datetime(s.last_check_time)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(1),
        Constraint::Length(10),
        Constraint::Length(8),
        Constraint::Length(9),
        Constraint::Length(9),
        Constraint::Length(19),
        Constraint::Length(19),
        Constraint::Length(11),
        Constraint::Fill(1),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(format!(" Probes ({}) ", app.stats.data().len()))
                .borders(Borders::ALL)
                .border_type(app.theme.border_type)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    state.select(Some(app.selected_probe_index));
    frame.render_stateful_widget(table, area, &mut state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::AggregatedMonitorMetric;
    use crate::data::group_history;
    use std::collections::BTreeMap;

    fn point(time: &str, values: &[(&str, f64)]) -> ChartSeriesPoint {
        ChartSeriesPoint {
            time: time.to_string(),
            values: values
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn test_chart_points_skip_gaps() {
        let points = vec![
            point("a", &[("agent_x", 1.0), ("agent_y", 2.0)]),
            point("b", &[("agent_y", 3.0)]),
            point("c", &[("agent_x", 4.0)]),
        ];
        let keys = series_keys(&points);
        let series = chart_points(&points, &keys);

        assert_eq!(series[0], vec![(0.0, 1.0), (2.0, 4.0)]);
        assert_eq!(series[1], vec![(0.0, 2.0), (1.0, 3.0)]);
    }

    #[test]
    fn test_probe_keeps_colour_when_selected() {
        let probes = vec![
            ProbeOption {
                id: "probe-a".to_string(),
                label: "probe-a".to_string(),
            },
            ProbeOption {
                id: "probe-b".to_string(),
                label: "probe-b".to_string(),
            },
        ];
        let history: Vec<AggregatedMonitorMetric> = ["probe-a", "probe-b"]
            .iter()
            .map(|agent| AggregatedMonitorMetric {
                timestamp: 1_700_000_000_000,
                agent_id: agent.to_string(),
                avg_response: 50.0,
                ..Default::default()
            })
            .collect();

        let all = series_keys(&group_history(&history, &AgentSelection::All));
        let all_b = all.iter().find(|k| agent_of(k) == Some("probe-b")).unwrap();
        assert_eq!(probe_color_index(&probes, agent_of(all_b).unwrap()), 1);

        let only_b = series_keys(&group_history(
            &history,
            &AgentSelection::Agent("probe-b".to_string()),
        ));
        assert_eq!(only_b.len(), 1);
        assert_eq!(probe_color_index(&probes, agent_of(&only_b[0]).unwrap()), 1);
    }
}
