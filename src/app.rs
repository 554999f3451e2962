use std::time::Instant;

use ratatui::layout::Rect;
use tokio::sync::mpsc;

use crate::event::Event;
use crate::store::{Action, CreateRequest, Item, ItemKind, LoadRequest, StoreError, TreeStore};
use crate::theme::ThemeColors;
use crate::tree::Direction;
use crate::view::{TreeView, ViewEvent};

/// The kind of dialog being displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogKind {
    NewFile,
    NewFolder,
    Rename { id: String },
    Error { message: String },
}

/// Application mode.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum AppMode {
    #[default]
    Normal,
    /// Typing into the tree filter.
    Search,
    Dialog(DialogKind),
}

/// State for a dialog's text input.
#[derive(Debug, Default)]
pub struct DialogState {
    pub input: String,
    pub cursor_position: usize,
}

/// Main application state.
pub struct App {
    pub store: TreeStore,
    pub view: TreeView,
    pub theme: ThemeColors,
    pub use_icons: bool,
    pub should_quit: bool,
    pub mode: AppMode,
    pub dialog_state: DialogState,
    /// Transient message, its timestamp, and whether it reports an error.
    pub status_message: Option<(String, Instant, bool)>,
    /// Where the tree rows were last drawn, for mouse hit-testing.
    pub tree_area: Rect,
}

impl App {
    pub fn new(store: TreeStore, view: TreeView, theme: ThemeColors, use_icons: bool) -> Self {
        Self {
            store,
            view,
            theme,
            use_icons,
            should_quit: false,
            mode: AppMode::Normal,
            dialog_state: DialogState::default(),
            status_message: None,
            tree_area: Rect::default(),
        }
    }

    /// Mount the tree view, starting the one initial load.
    pub fn mount(&mut self, event_tx: &mpsc::UnboundedSender<Event>) {
        if let Some(request) = self.view.mount(&mut self.store) {
            spawn_load(request, event_tx);
        }
    }

    /// Apply a store action delivered by a background request.
    pub fn handle_store_action(&mut self, action: Action) {
        self.store.dispatch(action);
        self.view.sync(&self.store);
    }

    /// Report the outcome of a create request.
    pub fn handle_created(
        &mut self,
        kind: ItemKind,
        label: &str,
        result: std::result::Result<Item, StoreError>,
    ) {
        match result {
            Ok(stored) => self.set_status_message(format!(
                "Saved {} '{}' on server as {}",
                kind.label(),
                stored.label,
                stored.id
            )),
            Err(e) => self.open_dialog(DialogKind::Error {
                message: format!("Could not save '{}': {}", label, e),
            }),
        }
    }

    /// Turn view events into user feedback.
    pub fn handle_view_events(&mut self, events: Vec<ViewEvent>) {
        for event in events {
            self.handle_view_event(event);
        }
    }

    fn handle_view_event(&mut self, event: ViewEvent) {
        match event {
            ViewEvent::FileOpened { id, label } => {
                tracing::info!(%id, "file opened");
                self.set_status_message(format!("Opened {}", label));
            }
            ViewEvent::FolderSelected { label, .. } => {
                self.set_status_message(format!("{} is a folder", label));
            }
            ViewEvent::UnknownSelected { id } => {
                self.set_error_message(format!("Unknown item {}", id));
            }
            ViewEvent::ItemRenamed {
                id,
                old_label,
                new_label,
            } => {
                tracing::info!(%id, %old_label, %new_label, "item renamed in view");
                self.set_status_message(format!("{} renamed to {}", old_label, new_label));
            }
            ViewEvent::ItemsPicked { count } => {
                self.set_status_message(format!(
                    "Picked up {} item(s); v to drop, Esc to cancel",
                    count
                ));
            }
            ViewEvent::ItemsMoved { ids, target } => {
                tracing::info!(?ids, ?target, "items moved in view");
                self.set_status_message(format!("Moved {} item(s)", ids.len()));
            }
            ViewEvent::MoveRejected(e) => {
                self.set_error_message(format!("Cannot drop here: {}", e));
            }
        }
    }

    /// Submit the current selection to the view.
    pub fn select_current(&mut self) {
        let events = self.view.select_current();
        self.handle_view_events(events);
    }

    // ── Dialogs ─────────────────────────────────────────────────────────────

    /// Open a dialog of the given kind.
    pub fn open_dialog(&mut self, kind: DialogKind) {
        self.dialog_state = DialogState::default();
        if let DialogKind::Rename { ref id } = kind {
            if let Some(item) = self.view.provider.get_item(id) {
                self.dialog_state.input = item.label.clone();
                self.dialog_state.cursor_position = item.label.len();
            }
        }
        self.mode = AppMode::Dialog(kind);
    }

    /// Open the rename dialog for the focused item.
    pub fn open_rename_dialog(&mut self) {
        if !self.view.flags.can_rename {
            return;
        }
        if let Some(id) = self.view.state.focused_id().cloned() {
            self.open_dialog(DialogKind::Rename { id });
        }
    }

    /// Close the current dialog and return to normal mode.
    pub fn close_dialog(&mut self) {
        self.mode = AppMode::Normal;
        self.dialog_state = DialogState::default();
    }

    /// Apply the open input dialog.
    pub fn confirm_dialog(&mut self) {
        let AppMode::Dialog(kind) = self.mode.clone() else {
            return;
        };
        let input = std::mem::take(&mut self.dialog_state.input);
        self.close_dialog();

        match kind {
            DialogKind::NewFile | DialogKind::NewFolder => {
                let result = if kind == DialogKind::NewFile {
                    self.store.add_file(&input)
                } else {
                    self.store.add_folder(&input)
                };
                match result {
                    Ok(id) => {
                        self.view.sync(&self.store);
                        let kind = self.store.item(&id).map(|i| i.kind().label()).unwrap_or("item");
                        self.set_status_message(format!(
                            "Added {} '{}' (not linked into any folder)",
                            kind,
                            input.trim()
                        ));
                    }
                    Err(e) => self.open_dialog(DialogKind::Error {
                        message: e.to_string(),
                    }),
                }
            }
            DialogKind::Rename { id } => {
                if let Some(event) = self.view.on_rename_item(&id, &input) {
                    self.handle_view_event(event);
                }
            }
            DialogKind::Error { .. } => {}
        }
    }

    /// Insert a character at the current cursor position.
    pub fn dialog_input_char(&mut self, c: char) {
        self.dialog_state
            .input
            .insert(self.dialog_state.cursor_position, c);
        self.dialog_state.cursor_position += c.len_utf8();
    }

    /// Delete the character before the cursor (backspace).
    pub fn dialog_delete_char(&mut self) {
        let pos = self.dialog_state.cursor_position;
        if let Some(prev) = self.dialog_state.input[..pos].chars().next_back() {
            self.dialog_state.cursor_position -= prev.len_utf8();
            self.dialog_state
                .input
                .remove(self.dialog_state.cursor_position);
        }
    }

    /// Move cursor left by one character.
    pub fn dialog_move_cursor_left(&mut self) {
        let pos = self.dialog_state.cursor_position;
        if let Some(prev) = self.dialog_state.input[..pos].chars().next_back() {
            self.dialog_state.cursor_position -= prev.len_utf8();
        }
    }

    /// Move cursor right by one character.
    pub fn dialog_move_cursor_right(&mut self) {
        let pos = self.dialog_state.cursor_position;
        if let Some(next) = self.dialog_state.input[pos..].chars().next() {
            self.dialog_state.cursor_position += next.len_utf8();
        }
    }

    pub fn dialog_cursor_home(&mut self) {
        self.dialog_state.cursor_position = 0;
    }

    pub fn dialog_cursor_end(&mut self) {
        self.dialog_state.cursor_position = self.dialog_state.input.len();
    }

    // ── Search ──────────────────────────────────────────────────────────────

    pub fn start_search(&mut self) {
        if self.view.flags.can_search {
            self.mode = AppMode::Search;
        }
    }

    pub fn search_input_char(&mut self, c: char) {
        let mut query = self.view.state.filter_query.clone();
        query.push(c);
        self.view.set_filter(&query);
    }

    pub fn search_delete_char(&mut self) {
        let mut query = self.view.state.filter_query.clone();
        query.pop();
        self.view.set_filter(&query);
    }

    /// Leave search mode, keeping the filter applied.
    pub fn finish_search(&mut self) {
        self.mode = AppMode::Normal;
    }

    /// Leave search mode and drop the filter.
    pub fn cancel_search(&mut self) {
        self.view.clear_filter();
        self.mode = AppMode::Normal;
    }

    // ── Drag and drop ───────────────────────────────────────────────────────

    pub fn pick_selection(&mut self) {
        if let Some(event) = self.view.pick_selection() {
            self.handle_view_event(event);
        }
    }

    pub fn drop_picked(&mut self) {
        if let Some(event) = self.view.drop_on_focused() {
            self.handle_view_event(event);
        }
    }

    /// Cancel a pending drag, or clear the multi-selection.
    pub fn cancel(&mut self) {
        if self.view.cancel_pick() {
            self.set_status_message("Drag cancelled".to_string());
        } else {
            self.view.state.clear_multi_select();
        }
    }

    pub fn reorder_focused(&mut self, direction: Direction) {
        self.view.reorder_focused(direction);
    }

    // ── Server writes ───────────────────────────────────────────────────────

    /// Send the focused item, as displayed, to the server.
    pub fn persist_focused(&mut self, event_tx: &mpsc::UnboundedSender<Event>) {
        let Some(item) = self
            .view
            .state
            .focused_id()
            .and_then(|id| self.view.provider.get_item(id))
            .cloned()
        else {
            return;
        };
        let request = if item.is_container {
            self.store.create_folder(item)
        } else {
            self.store.create_file(item)
        };
        self.set_status_message(format!("Saving '{}'", request.item().label));
        spawn_create(request, event_tx);
    }

    // ── Status ──────────────────────────────────────────────────────────────

    /// Set a status message with current timestamp.
    pub fn set_status_message(&mut self, msg: String) {
        self.status_message = Some((msg, Instant::now(), false));
    }

    pub fn set_error_message(&mut self, msg: String) {
        tracing::warn!("{}", msg);
        self.status_message = Some((msg, Instant::now(), true));
    }

    /// Clear the status message if it has been displayed for more than 3 seconds.
    pub fn clear_expired_status(&mut self) {
        if let Some((_, ref created, _)) = self.status_message {
            if created.elapsed().as_secs() > 3 {
                self.status_message = None;
            }
        }
    }

    // ── Navigation ──────────────────────────────────────────────────────────

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn select_next(&mut self) {
        self.view.state.select_next();
    }

    pub fn select_previous(&mut self) {
        self.view.state.select_previous();
    }

    pub fn select_first(&mut self) {
        self.view.state.select_first();
    }

    pub fn select_last(&mut self) {
        self.view.state.select_last();
    }

    pub fn expand_selected(&mut self) {
        self.view.expand_selected();
    }

    pub fn collapse_selected(&mut self) {
        self.view.collapse_selected();
    }

    pub fn toggle_multi_select(&mut self) {
        self.view.state.toggle_multi_select();
    }

    /// Focus the row drawn at terminal row `y`, if any.
    pub fn focus_row_at(&mut self, y: u16) -> bool {
        let area = self.tree_area;
        if y < area.y || y >= area.y + area.height {
            return false;
        }
        let idx = self.view.state.scroll_offset + (y - area.y) as usize;
        if idx < self.view.state.flat_items.len() {
            self.view.state.selected_index = idx;
            true
        } else {
            false
        }
    }
}

fn spawn_load(request: LoadRequest, event_tx: &mpsc::UnboundedSender<Event>) {
    let tx = event_tx.clone();
    tokio::spawn(async move {
        let action = request.run().await;
        let _ = tx.send(Event::Store(action));
    });
}

fn spawn_create(request: CreateRequest, event_tx: &mpsc::UnboundedSender<Event>) {
    let tx = event_tx.clone();
    let kind = request.item().kind();
    let label = request.item().label.clone();
    tokio::spawn(async move {
        let result = request.run().await;
        let _ = tx.send(Event::Created {
            kind,
            label,
            result,
        });
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tree_store::tests::{sample_items, MockStorage};
    use crate::store::LoadStatus;
    use crate::theme::dark_theme;
    use crate::view::TreeFlags;
    use std::sync::Arc;

    fn app_with(storage: Arc<MockStorage>) -> App {
        let store = TreeStore::new(storage, "root");
        let view = TreeView::new("root", TreeFlags::default());
        App::new(store, view, dark_theme(), false)
    }

    fn loaded_app() -> App {
        let mut app = app_with(MockStorage::with_fetches(vec![]));
        app.handle_store_action(Action::LoadResolved {
            seq: 1,
            result: Ok(sample_items()),
        });
        app
    }

    async fn next_event(rx: &mut mpsc::UnboundedReceiver<Event>) -> Event {
        rx.recv().await.expect("event")
    }

    #[tokio::test]
    async fn mount_loads_once_and_renders_result() {
        let mut app = app_with(MockStorage::with_fetches(vec![Ok(sample_items())]));
        let (tx, mut rx) = mpsc::unbounded_channel();

        app.mount(&tx);
        app.mount(&tx);
        assert_eq!(app.store.load_status(), LoadStatus::Loading);

        match next_event(&mut rx).await {
            Event::Store(action) => app.handle_store_action(action),
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(app.store.load_status(), LoadStatus::Loaded);
        assert_eq!(app.view.state.flat_items.len(), 1);
        assert_eq!(app.view.state.flat_items[0].label, "note.txt");
        // The second mount did not start another request.
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn failed_mount_load_keeps_tree_empty() {
        let mut app = app_with(MockStorage::with_fetches(vec![Err(StoreError::Transport(
            "connection refused".into(),
        ))]));
        let (tx, mut rx) = mpsc::unbounded_channel();
        app.mount(&tx);
        if let Event::Store(action) = next_event(&mut rx).await {
            app.handle_store_action(action);
        }
        assert_eq!(app.store.load_status(), LoadStatus::Failed);
        assert!(app.view.state.flat_items.is_empty());
    }

    #[test]
    fn enter_on_file_reports_open() {
        let mut app = loaded_app();
        app.select_current();
        let (msg, _, is_error) = app.status_message.as_ref().unwrap();
        assert_eq!(msg, "Opened note.txt");
        assert!(!is_error);
    }

    #[test]
    fn new_folder_dialog_adds_unlinked_item() {
        let mut app = loaded_app();
        app.open_dialog(DialogKind::NewFolder);
        for c in "Projects".chars() {
            app.dialog_input_char(c);
        }
        app.confirm_dialog();

        assert_eq!(app.mode, AppMode::Normal);
        assert_eq!(app.store.items().len(), 3);
        assert_eq!(app.view.provider.items().len(), 3);
        assert!(app
            .status_message
            .as_ref()
            .unwrap()
            .0
            .contains("folder 'Projects'"));
    }

    #[test]
    fn empty_new_file_name_shows_error_dialog() {
        let mut app = loaded_app();
        app.open_dialog(DialogKind::NewFile);
        app.confirm_dialog();
        assert!(matches!(
            app.mode,
            AppMode::Dialog(DialogKind::Error { .. })
        ));
        assert_eq!(app.store.items().len(), 2);
    }

    #[test]
    fn rename_dialog_prefills_and_renames_in_view_only() {
        let mut app = loaded_app();
        app.open_rename_dialog();
        assert_eq!(app.dialog_state.input, "note.txt");
        assert_eq!(app.dialog_state.cursor_position, 8);

        app.dialog_cursor_end();
        for _ in 0..4 {
            app.dialog_delete_char();
        }
        for c in ".md".chars() {
            app.dialog_input_char(c);
        }
        app.confirm_dialog();

        assert_eq!(app.view.provider.get_item("a").unwrap().label, "note.md");
        assert_eq!(app.store.item("a").unwrap().label, "note.txt");
        assert_eq!(
            app.status_message.as_ref().unwrap().0,
            "note.txt renamed to note.md"
        );
    }

    #[tokio::test]
    async fn persist_reports_success() {
        let mut app = loaded_app();
        let (tx, mut rx) = mpsc::unbounded_channel();
        app.persist_focused(&tx);

        match next_event(&mut rx).await {
            Event::Created {
                kind,
                label,
                result,
            } => {
                assert_eq!(kind, ItemKind::File);
                app.handle_created(kind, &label, result);
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert!(app.status_message.as_ref().unwrap().0.starts_with("Saved file"));
        // Create results are not written to the store.
        assert_eq!(app.store.items().len(), 2);
    }

    #[test]
    fn create_failure_opens_error_dialog() {
        let mut app = loaded_app();
        app.handle_created(
            ItemKind::Folder,
            "docs",
            Err(StoreError::Response {
                status: 409,
                body: "exists".into(),
            }),
        );
        assert_eq!(
            app.mode,
            AppMode::Dialog(DialogKind::Error {
                message: "Could not save 'docs': HTTP 409: exists".into()
            })
        );
    }

    #[test]
    fn search_mode_filters_and_cancel_restores() {
        let mut app = loaded_app();
        app.start_search();
        assert_eq!(app.mode, AppMode::Search);
        for c in "zzz".chars() {
            app.search_input_char(c);
        }
        assert!(app.view.state.flat_items.is_empty());
        app.search_delete_char();
        assert_eq!(app.view.state.filter_query, "zz");
        app.cancel_search();
        assert_eq!(app.mode, AppMode::Normal);
        assert_eq!(app.view.state.flat_items.len(), 1);
    }

    #[test]
    fn dialog_cursor_handles_multibyte() {
        let mut app = loaded_app();
        app.open_dialog(DialogKind::NewFile);
        app.dialog_input_char('é');
        app.dialog_input_char('x');
        app.dialog_move_cursor_left();
        app.dialog_move_cursor_left();
        assert_eq!(app.dialog_state.cursor_position, 0);
        app.dialog_move_cursor_right();
        assert_eq!(app.dialog_state.cursor_position, 2);
        app.dialog_cursor_home();
        app.dialog_delete_char();
        assert_eq!(app.dialog_state.input, "éx");
    }

    #[test]
    fn focus_row_at_maps_screen_rows() {
        let mut app = loaded_app();
        app.tree_area = Rect::new(1, 1, 20, 5);
        assert!(app.focus_row_at(1));
        assert_eq!(app.view.state.selected_index, 0);
        assert!(!app.focus_row_at(3));
        assert!(!app.focus_row_at(0));
    }

    #[test]
    fn clear_expired_status_removes_old() {
        let mut app = loaded_app();
        app.status_message = Some((
            "old".to_string(),
            Instant::now() - std::time::Duration::from_secs(5),
            false,
        ));
        app.clear_expired_status();
        assert!(app.status_message.is_none());
    }

    #[test]
    fn quit_sets_flag() {
        let mut app = loaded_app();
        app.quit();
        assert!(app.should_quit);
    }
}
