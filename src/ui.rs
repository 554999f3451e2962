use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::Style,
    widgets::{Block, Borders},
    Frame,
};

use crate::app::{App, AppMode};
use crate::components::dialog::DialogWidget;
use crate::components::status_bar::StatusBarWidget;
use crate::components::tree::TreeWidget;
use crate::store::LoadStatus;

/// Render the application UI.
pub fn render(app: &mut App, frame: &mut Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(frame.area());
    let (tree_area, status_area) = (chunks[0], chunks[1]);

    let block = Block::default()
        .title(format!(" {} ", app.view.title().unwrap_or("files")))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border_fg));
    let inner = block.inner(tree_area);
    app.tree_area = inner;
    app.view.state.update_scroll(inner.height as usize);

    let placeholder = placeholder_text(app);
    let mut tree = TreeWidget::new(&app.view.state, &app.theme, app.use_icons)
        .picked(app.view.picked())
        .block(block);
    if let Some((text, is_error)) = &placeholder {
        tree = tree.placeholder(text, *is_error);
    }
    frame.render_widget(tree, tree_area);

    let location = app.store.storage_location();
    let status = app.store.load_status().to_string();
    let mut bar = StatusBarWidget::new(&location, &status, &app.theme).counts(
        app.store.items().len(),
        app.store.items().unlinked_count(app.store.root_id()),
    );
    if app.mode == AppMode::Search || app.view.state.is_filtering {
        bar = bar.filter(&app.view.state.filter_query);
    }
    if let Some((msg, _, is_error)) = &app.status_message {
        bar = bar.status_message(msg, *is_error);
    }
    frame.render_widget(bar, status_area);

    if matches!(app.mode, AppMode::Dialog(_)) {
        frame.render_widget(
            DialogWidget::new(&app.mode, &app.dialog_state, &app.theme),
            frame.area(),
        );
    }
}

/// What to show in place of rows, if anything.
fn placeholder_text(app: &App) -> Option<(String, bool)> {
    match app.store.load_status() {
        LoadStatus::NotStarted | LoadStatus::Loading if app.view.state.flat_items.is_empty() => {
            Some(("Loading…".to_string(), false))
        }
        LoadStatus::Failed if app.view.state.flat_items.is_empty() => {
            let reason = app
                .store
                .load_error()
                .map(|e| e.to_string())
                .unwrap_or_default();
            Some((format!("Could not load files: {}", reason), true))
        }
        _ if app.view.state.flat_items.is_empty() => {
            let text = if app.view.state.is_filtering {
                "No matches"
            } else {
                "Nothing to show"
            };
            Some((text.to_string(), false))
        }
        _ => None,
    }
}
