//! Common UI components shared across views.
//!
//! This module contains the header bar, tab bar, status bar, help overlay
//! and the small helpers the views share.

use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs},
    Frame,
};

use crate::api::MonitorStatus;
use crate::app::{App, View};
use crate::cache::QueryState;
use crate::data::format::{clamp_percent, format_duration, format_percent};

/// Render the header bar with the system name and fleet health.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let name = Span::styled(
        format!("{} ", app.system_name()),
        Style::default().add_modifier(Modifier::BOLD),
    );

    if !app.monitors.state().has_data() {
        let line = Line::from(vec![Span::raw(" ○ "), name, Span::raw("│ Loading...")]);
        frame.render_widget(Paragraph::new(line), area);
        return;
    }

    let monitors = app.monitors.data();
    let count = |status: MonitorStatus| monitors.iter().filter(|m| m.status == status).count();
    let (up, down, unknown) = (
        count(MonitorStatus::Up),
        count(MonitorStatus::Down),
        count(MonitorStatus::Unknown),
    );

    let dim = Style::default().add_modifier(Modifier::DIM);
    let health = app.fleet_health();
    let line = Line::from(vec![
        Span::styled(
            format!(" ● {} ", health.symbol()),
            app.theme.status_style(health),
        ),
        name,
        Span::raw("│ "),
        Span::styled(up.to_string(), Style::default().fg(app.theme.healthy)),
        Span::raw(" up "),
        if down > 0 {
            Span::styled(
                down.to_string(),
                Style::default().fg(app.theme.critical).add_modifier(Modifier::BOLD),
            )
        } else {
            Span::styled("0", dim)
        },
        Span::raw(" down "),
        if unknown > 0 {
            Span::styled(unknown.to_string(), Style::default().fg(app.theme.warning))
        } else {
            Span::styled("0", dim)
        },
        Span::raw(" unknown │ "),
        Span::styled(
            monitors.len().to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" monitors"),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

/// Render the tab bar showing available views.
pub fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = View::ALL
        .iter()
        .enumerate()
        .map(|(i, view)| Line::from(format!(" {}:{} ", i + 1, view.label())))
        .collect();

    let selected = View::ALL
        .iter()
        .position(|v| *v == app.current_view)
        .unwrap_or(0);

    let tabs = Tabs::new(titles)
        .select(selected)
        .style(app.theme.tab_inactive)
        .highlight_style(app.theme.tab_active)
        .divider("|");

    frame.render_widget(tabs, area);
}

/// Key hints for the current view and input mode.
fn controls(app: &App) -> &'static str {
    if app.filter_active {
        return "Type to search | Enter:apply Esc:done";
    }
    match app.current_view {
        View::Monitors => "/:search f:status m:avg/max Enter:detail r:refresh ?:help q:quit",
        View::Detail => "t:range p:probe ↑↓:probes Enter:focus Esc:back ?:help q:quit",
        View::Admin => "/:search n/N:page Enter:detail r:refresh ?:help q:quit",
    }
}

/// First error among the queries the current view reads.
fn view_error(app: &App) -> Option<&str> {
    let errors = match app.current_view {
        View::Monitors => vec![app.monitors.state().error.as_deref()],
        View::Detail => vec![
            app.stats.state().error.as_deref(),
            app.history.state().error.as_deref(),
        ],
        View::Admin => vec![
            app.admin_monitors.state().error.as_deref(),
            app.metrics_config.state().error.as_deref(),
        ],
    };
    errors.into_iter().flatten().next()
}

/// Render the status bar at the bottom.
///
/// Shows the source URL, time since the last update and controls, or a
/// temporary status message, or the current view's fetch error.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    if let Some(err) = view_error(app) {
        let paragraph = Paragraph::new(format!(" Error: {} | r:retry q:quit", err))
            .style(Style::default().fg(app.theme.critical));
        frame.render_widget(paragraph, area);
        return;
    }

    let updated = app
        .last_update_age()
        .map(|age| format!("Updated {} ago", format_duration(age)))
        .unwrap_or_else(|| "Waiting for data".to_string());

    let status = format!(
        " {} | {} | {}",
        app.source_description(),
        updated,
        controls(app)
    );
    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(paragraph, area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the current view.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let section = |title: &'static str| {
        Line::from(vec![Span::styled(
            title,
            Style::default().add_modifier(Modifier::BOLD),
        )])
    };

    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        section(" Navigation"),
        Line::from("  Tab/1-3     Switch views"),
        Line::from("  ↑/↓ j/k     Navigate list"),
        Line::from("  PgUp/PgDn   Jump 10 items"),
        Line::from("  Enter       Open detail / focus probe"),
        Line::from("  Esc         Go back"),
        Line::from(""),
        section(" Monitors"),
        Line::from("  /  c        Search / clear search"),
        Line::from("  f           Cycle status filter"),
        Line::from("  m           Toggle avg/max latency"),
        Line::from(""),
        section(" Detail"),
        Line::from("  t           Cycle time range"),
        Line::from("  p           Cycle probe"),
        Line::from(""),
        section(" Admin"),
        Line::from("  n / N       Next / previous page"),
        Line::from(""),
        section(" General"),
        Line::from("  r           Refresh current view"),
        Line::from("  e           Export fleet to JSON"),
        Line::from("  q           Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    let help_width = 44u16.min(area.width.saturating_sub(4));
    let help_height = 32u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    frame.render_widget(Clear, help_area);
    frame.render_widget(paragraph, help_area);
}

/// Message to show instead of a query's data, if any.
///
/// Loading only shows before the first successful fetch, and an error
/// only replaces the content while there is nothing cached to show.
pub fn placeholder<T>(state: &QueryState<T>, is_empty: bool, empty_message: &str) -> Option<String> {
    if state.has_data() {
        return is_empty.then(|| empty_message.to_string());
    }
    if let Some(err) = &state.error {
        return Some(format!("Error: {}", err));
    }
    if state.is_initial_load() {
        return Some("Loading...".to_string());
    }
    Some(empty_message.to_string())
}

/// Render a bordered block with a centred message.
pub fn render_message(frame: &mut Frame, app: &App, area: Rect, title: &str, message: &str) {
    let block = Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    let inner_height = area.height.saturating_sub(2);
    let mut lines: Vec<Line> = (0..inner_height / 2).map(|_| Line::from("")).collect();
    lines.push(Line::from(Span::styled(
        message.to_string(),
        Style::default().add_modifier(Modifier::DIM),
    )));

    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(block);
    frame.render_widget(paragraph, area);
}

/// Text bar for a percentage, clamped to [0, 100].
pub fn percent_bar(value: f64, width: usize) -> String {
    let clamped = clamp_percent(value);
    let filled = ((clamped / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    format!(
        "{}{} {:>6}%",
        "█".repeat(filled),
        "░".repeat(width - filled),
        format_percent(clamped)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Phase;
    use std::time::Instant;

    #[test]
    fn test_percent_bar() {
        assert_eq!(percent_bar(100.0, 4), "████ 100.00%");
        assert_eq!(percent_bar(50.0, 4), "██░░  50.00%");
        assert_eq!(percent_bar(-5.0, 4), "░░░░   0.00%");
        assert_eq!(percent_bar(140.0, 4), "████ 100.00%");
    }

    #[test]
    fn test_placeholder_states() {
        let mut state: QueryState<Vec<u32>> = QueryState::default();
        assert_eq!(placeholder(&state, true, "No monitors").as_deref(), Some("No monitors"));

        state.phase = Phase::Loading;
        assert_eq!(placeholder(&state, true, "No monitors").as_deref(), Some("Loading..."));

        state.phase = Phase::Error;
        state.error = Some("connection refused".to_string());
        assert_eq!(
            placeholder(&state, true, "No monitors").as_deref(),
            Some("Error: connection refused")
        );

        // Cached data wins over a later error
        state.data = vec![1];
        state.updated_at = Some(Instant::now());
        assert_eq!(placeholder(&state, false, "No monitors"), None);

        // Loaded but empty is its own state
        state.phase = Phase::Ready;
        state.error = None;
        state.data.clear();
        assert_eq!(placeholder(&state, true, "No monitors").as_deref(), Some("No monitors"));
    }
}
