//! Admin view rendering: configured monitors and retention settings.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use super::common::{placeholder, render_message};
use crate::app::App;
use crate::data::format::{format_datetime, format_duration};

/// Interval the server applies when a monitor is saved with zero.
const SERVER_DEFAULT_INTERVAL_SECS: u64 = 60;

/// Render the Admin view.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::vertical([
        Constraint::Min(6),    // Monitor list
        Constraint::Length(4), // Metrics config
    ])
    .split(area);

    render_list(frame, app, chunks[0]);
    render_metrics_config(frame, app, chunks[1]);
}

fn interval_label(secs: u32) -> String {
    if secs == 0 {
        format!(
            "{} (default)",
            format_duration(std::time::Duration::from_secs(SERVER_DEFAULT_INTERVAL_SECS))
        )
    } else {
        format_duration(std::time::Duration::from_secs(secs.into()))
    }
}

fn render_list(frame: &mut Frame, app: &App, area: Rect) {
    let state = app.admin_monitors.state();
    let page = &state.data;
    let query = &app.admin_query;
    let pages = query.page_count(page.total).max(1);

    let search = if app.filter_active {
        format!(" /{}_", app.keyword())
    } else if let Some(keyword) = &query.keyword {
        format!(" /{}/ [c:clear]", keyword)
    } else {
        String::new()
    };
    let title = format!(
        " Configured monitors ({} total) page {}/{}{} ",
        page.total, query.page, pages, search
    );

    if let Some(message) = placeholder(state, page.items.is_empty(), "No monitors on this page") {
        render_message(frame, app, area, title.trim(), &message);
        return;
    }

    let header = Row::new(vec![
        Cell::from("Name"),
        Cell::from("Type"),
        Cell::from("Target"),
        Cell::from("Interval"),
        Cell::from("Enabled"),
        Cell::from("Probes"),
        Cell::from("Updated"),
    ])
    .height(1)
    .style(app.theme.header);

    let rows: Vec<Row> = page
        .items
        .iter()
        .map(|task| {
            let enabled = if task.enabled {
                Cell::from("yes").style(Style::default().fg(app.theme.healthy))
            } else {
                Cell::from("no").style(Style::default().add_modifier(Modifier::DIM))
            };
            let probes = if task.agent_ids.is_empty() {
                "all".to_string()
            } else {
                task.agent_ids.len().to_string()
            };
            Row::new(vec![
                Cell::from(task.name.clone()),
                Cell::from(task.monitor_type.as_str()),
                Cell::from(task.target.clone()),
                Cell::from(interval_label(task.interval)),
                enabled,
                Cell::from(probes),
                Cell::from(format_datetime(task.updated_at)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Fill(2),
        Constraint::Length(5),
        Constraint::Fill(3),
        Constraint::Length(14),
        Constraint::Length(8),
        Constraint::Length(7),
        Constraint::Length(20),
    ];

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

    let mut table_state = TableState::default();
    table_state.select(Some(app.selected_admin_index));
    frame.render_stateful_widget(table, area, &mut table_state);
}

fn render_metrics_config(frame: &mut Frame, app: &App, area: Rect) {
    let state = app.metrics_config.state();
    let block = Block::default()
        .title(" Metrics retention ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    let lines = if let Some(message) = placeholder(state, false, "") {
        vec![Line::from(Span::styled(
            format!(" {}", message),
            Style::default().add_modifier(Modifier::DIM),
        ))]
    } else {
        let cfg = &state.data;
        let bold = Style::default().add_modifier(Modifier::BOLD);
        vec![
            Line::from(vec![
                Span::raw(" Retention: "),
                Span::styled(format!("{} h", cfg.retention_hours), bold),
                Span::raw(format!(" ({:.1} days)", cfg.retention_days())),
            ]),
            Line::from(vec![
                Span::raw(" Max query points: "),
                Span::styled(cfg.max_query_points.to_string(), bold),
                Span::styled(
                    "   change with `probewatch metrics-config set`",
                    Style::default().add_modifier(Modifier::DIM),
                ),
            ]),
        ]
    };

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
