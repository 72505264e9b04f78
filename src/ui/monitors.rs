//! Monitors view rendering.
//!
//! Stat cards across the top, the active filters, then the filtered
//! monitor table.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use super::common::{placeholder, render_message};
use crate::app::App;
use crate::data::format::format_response_time;
use crate::data::{HealthStatus, StatusFilter};

/// Render the Monitors view.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::vertical([
        Constraint::Length(4), // Stat cards
        Constraint::Length(1), // Filter bar
        Constraint::Min(5),    // Table
    ])
    .split(area);

    render_cards(frame, app, chunks[0]);
    render_filter_bar(frame, app, chunks[1]);
    render_table(frame, app, chunks[2]);
}

fn render_cards(frame: &mut Frame, app: &App, area: Rect) {
    let stats = app.fleet_stats();
    let issues_style = if stats.issues > 0 {
        app.theme.status_style(HealthStatus::Critical)
    } else {
        app.theme.status_style(HealthStatus::Healthy)
    };

    let cards = [
        ("Total", stats.total.to_string(), Style::default()),
        (
            "Online",
            stats.online.to_string(),
            app.theme.status_style(HealthStatus::Healthy),
        ),
        ("Issues", stats.issues.to_string(), issues_style),
        (
            "Avg latency",
            format_response_time(stats.avg_latency as f64),
            Style::default(),
        ),
    ];

    let columns = Layout::horizontal([Constraint::Ratio(1, 4); 4]).split(area);
    for ((title, value, style), column) in cards.into_iter().zip(columns.iter()) {
        let block = Block::default()
            .title(format!(" {} ", title))
            .borders(Borders::ALL)
            .border_type(app.theme.border_type)
            .border_style(Style::default().fg(app.theme.border));
        let value = Paragraph::new(Line::from(Span::styled(
            format!(" {}", value),
            style.add_modifier(Modifier::BOLD),
        )))
        .block(block);
        frame.render_widget(value, *column);
    }
}

fn render_filter_bar(frame: &mut Frame, app: &App, area: Rect) {
    let active = app.theme.tab_active;
    let inactive = app.theme.tab_inactive;

    let mut spans = vec![Span::raw(" Status: ")];
    for status in [
        StatusFilter::All,
        StatusFilter::Up,
        StatusFilter::Down,
        StatusFilter::Unknown,
    ] {
        let style = if app.filter.status == status { active } else { inactive };
        spans.push(Span::styled(format!("[{}]", status.label()), style));
        spans.push(Span::raw(" "));
    }

    spans.push(Span::raw("│ Latency: "));
    spans.push(Span::styled(app.display_mode.label(), active));

    spans.push(Span::raw(" │ Search: "));
    if app.filter_active {
        spans.push(Span::styled(format!("{}_", app.filter.keyword), active));
    } else if app.filter.keyword.is_empty() {
        spans.push(Span::styled("-", inactive));
    } else {
        spans.push(Span::raw(format!("{} [c:clear]", app.filter.keyword)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_table(frame: &mut Frame, app: &App, area: Rect) {
    let monitors = app.filtered_monitors();
    let total = app.monitors.data().len();
    let empty_message = if total == 0 {
        "No monitors configured"
    } else {
        "No monitors match the current filter"
    };

    if let Some(message) = placeholder(app.monitors.state(), monitors.is_empty(), empty_message) {
        render_message(frame, app, area, "Monitors", &message);
        return;
    }

    let latency_header = format!("Latency ({})", app.display_mode.label());
    let header = Row::new(vec![
        Cell::from("Status"),
        Cell::from("Name"),
        Cell::from("Type"),
        Cell::from("Target"),
        Cell::from(latency_header),
        Cell::from("Probes"),
        Cell::from("Cert"),
    ])
    .height(1)
    .style(app.theme.header);

    let thresholds = &app.config.thresholds;
    let rows: Vec<Row> = monitors
        .iter()
        .map(|m| {
            let cert = if m.cert_expiry_date > 0 {
                Cell::from(format!("{}d", m.cert_expiry_days))
                    .style(app.theme.status_style(thresholds.cert_status(m.cert_expiry_days)))
            } else {
                Cell::from("-")
            };

            Row::new(vec![
                Cell::from(m.status.as_str()).style(app.theme.monitor_status_style(m.status)),
                Cell::from(m.name.clone()),
                Cell::from(m.monitor_type.as_str()),
                Cell::from(m.target.clone()),
                Cell::from(format_response_time(app.display_mode.latency(m))),
                Cell::from(m.agent_count.to_string()),
                cert,
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(8),
        Constraint::Fill(2),
        Constraint::Length(5),
        Constraint::Fill(3),
        Constraint::Length(14),
        Constraint::Length(7),
        Constraint::Length(6),
    ];

    let selected = app.selected_index.min(monitors.len().saturating_sub(1));
    let title = format!(
        " Monitors ({}/{}) [{}/{}] ",
        monitors.len(),
        total,
        selected + 1,
        monitors.len()
    );

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_type(app.theme.border_type)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    state.select(Some(selected));

    frame.render_stateful_widget(table, area, &mut state);
}
