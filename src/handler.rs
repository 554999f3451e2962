use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use tokio::sync::mpsc;

use crate::app::{App, AppMode, DialogKind};
use crate::event::Event;
use crate::tree::Direction;

/// Handle a key event, dispatching on the current mode.
pub fn handle_key_event(app: &mut App, key: KeyEvent, event_tx: &mpsc::UnboundedSender<Event>) {
    // Windows reports releases too.
    if key.kind != KeyEventKind::Press {
        return;
    }
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return;
    }

    match app.mode.clone() {
        AppMode::Normal => handle_normal_mode(app, key, event_tx),
        AppMode::Search => handle_search_mode(app, key),
        AppMode::Dialog(DialogKind::Error { .. }) => {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char('q')) {
                app.close_dialog();
            }
        }
        AppMode::Dialog(_) => handle_dialog_input(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent, event_tx: &mpsc::UnboundedSender<Event>) {
    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('j') | KeyCode::Down => app.select_next(),
        KeyCode::Char('k') | KeyCode::Up => app.select_previous(),
        KeyCode::Char('g') | KeyCode::Home => app.select_first(),
        KeyCode::Char('G') | KeyCode::End => app.select_last(),
        KeyCode::Char('l') | KeyCode::Right => app.expand_selected(),
        KeyCode::Char('h') | KeyCode::Left => app.collapse_selected(),
        KeyCode::Enter => app.select_current(),
        KeyCode::Char(' ') => app.toggle_multi_select(),
        KeyCode::Char('a') => app.open_dialog(DialogKind::NewFile),
        KeyCode::Char('A') => app.open_dialog(DialogKind::NewFolder),
        KeyCode::Char('r') | KeyCode::F(2) => app.open_rename_dialog(),
        KeyCode::Char('x') => app.pick_selection(),
        KeyCode::Char('v') => app.drop_picked(),
        KeyCode::Char('J') => app.reorder_focused(Direction::Down),
        KeyCode::Char('K') => app.reorder_focused(Direction::Up),
        KeyCode::Char('/') => app.start_search(),
        KeyCode::Char('p') => app.persist_focused(event_tx),
        KeyCode::Esc => app.cancel(),
        _ => {}
    }
}

fn handle_search_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.cancel_search(),
        KeyCode::Enter => app.finish_search(),
        KeyCode::Backspace => app.search_delete_char(),
        KeyCode::Down => app.select_next(),
        KeyCode::Up => app.select_previous(),
        KeyCode::Char(c) => app.search_input_char(c),
        _ => {}
    }
}

fn handle_dialog_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.close_dialog(),
        KeyCode::Enter => app.confirm_dialog(),
        KeyCode::Backspace => app.dialog_delete_char(),
        KeyCode::Left => app.dialog_move_cursor_left(),
        KeyCode::Right => app.dialog_move_cursor_right(),
        KeyCode::Home => app.dialog_cursor_home(),
        KeyCode::End => app.dialog_cursor_end(),
        KeyCode::Char(c) => app.dialog_input_char(c),
        _ => {}
    }
}

/// Handle a mouse event: clicks focus rows, the wheel scrolls.
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
    if app.mode != AppMode::Normal {
        return;
    }
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            app.focus_row_at(mouse.row);
        }
        MouseEventKind::ScrollDown => app.select_next(),
        MouseEventKind::ScrollUp => app.select_previous(),
        _ => {}
    }
}
