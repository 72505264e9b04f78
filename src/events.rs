use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

use crate::app::{App, View};

/// File written by the `e` key, relative to the working directory.
pub const EXPORT_FILE: &str = "probewatch_export.json";

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    // Any key closes help
    if app.show_help {
        app.show_help = false;
        return;
    }

    if app.filter_active {
        handle_filter_input(app, key);
        return;
    }

    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.quit(),

        KeyCode::Tab => {
            if key.modifiers.contains(KeyModifiers::SHIFT) {
                app.prev_view();
            } else {
                app.next_view();
            }
        }
        KeyCode::BackTab => app.prev_view(),
        KeyCode::Char('1') => app.set_view(View::Monitors),
        KeyCode::Char('2') => app.set_view(View::Detail),
        KeyCode::Char('3') => app.set_view(View::Admin),

        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::PageUp => app.select_prev_n(10),
        KeyCode::PageDown => app.select_next_n(10),
        KeyCode::Home => app.select_first(),
        KeyCode::End => app.select_last(),

        KeyCode::Enter => app.enter_detail(),
        KeyCode::Esc | KeyCode::Backspace => app.go_back(),

        KeyCode::Char('/') => app.start_filter(),
        KeyCode::Char('c') => {
            if !app.keyword().is_empty() {
                app.clear_filter();
            }
        }
        KeyCode::Char('f') if app.current_view == View::Monitors => app.cycle_status_filter(),
        KeyCode::Char('m') if app.current_view == View::Monitors => app.toggle_display_mode(),

        KeyCode::Char('t') if app.current_view == View::Detail => app.cycle_time_range(),
        KeyCode::Char('p') if app.current_view == View::Detail => app.cycle_probe(),

        KeyCode::Char('n') if app.current_view == View::Admin => app.next_page(),
        KeyCode::Char('N') if app.current_view == View::Admin => app.prev_page(),

        KeyCode::Char('r') => {
            app.refetch();
            app.set_status_message("Refreshing".to_string());
        }

        KeyCode::Char('?') => app.toggle_help(),

        KeyCode::Char('e') => {
            let export_path = PathBuf::from(EXPORT_FILE);
            match app.export_state(&export_path) {
                Ok(()) => {
                    app.set_status_message(format!("Exported to {}", export_path.display()));
                }
                Err(e) => {
                    app.set_status_message(format!("Export failed: {}", e));
                }
            }
        }

        _ => {}
    }
}

/// Handle key input while keyword entry is active
fn handle_filter_input(app: &mut App, key: KeyEvent) {
    match key.code {
        // Keep the keyword, stop editing
        KeyCode::Enter | KeyCode::Esc => app.cancel_filter(),

        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.clear_filter();
        }

        KeyCode::Backspace => {
            app.filter_pop();
            if app.keyword().is_empty() {
                app.cancel_filter();
            }
        }

        KeyCode::Char(c) => app.filter_push(c),

        _ => {}
    }
}

/// Handle mouse events
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.select_prev(),
        MouseEventKind::ScrollDown => app.select_next(),
        _ => {}
    }
}
