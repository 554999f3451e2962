//! Binds the [`TreeStore`] to the tree widget.
//!
//! The view triggers the initial load, rebuilds its data provider whenever the
//! store changes, and turns user interaction into [`ViewEvent`]s. It never
//! writes to the store: renames and drag-and-drop moves live in the provider
//! snapshot until the next rebuild.

use crate::store::{ItemId, LoadRequest, TreeStore};
use crate::tree::{Direction, DropTarget, MoveError, TreeDataProvider, TreeState};

/// Interaction switches of the tree widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeFlags {
    pub can_drag_and_drop: bool,
    pub can_drop_on_folder: bool,
    pub can_reorder_items: bool,
    pub can_search: bool,
    pub can_rename: bool,
}

impl Default for TreeFlags {
    fn default() -> Self {
        Self {
            can_drag_and_drop: true,
            can_drop_on_folder: true,
            can_reorder_items: true,
            can_search: true,
            can_rename: true,
        }
    }
}

/// Outcome of a user interaction, for the application to act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    /// A folder was selected; folders do not open.
    FolderSelected { id: ItemId, label: String },
    /// A file was selected and should be opened.
    FileOpened { id: ItemId, label: String },
    /// The widget reported an id the mapping does not contain.
    UnknownSelected { id: ItemId },
    ItemRenamed {
        id: ItemId,
        old_label: String,
        new_label: String,
    },
    ItemsPicked { count: usize },
    ItemsMoved { ids: Vec<ItemId>, target: DropTarget },
    MoveRejected(MoveError),
}

pub struct TreeView {
    pub provider: TreeDataProvider,
    pub state: TreeState,
    pub flags: TreeFlags,
    mounted: bool,
    synced_revision: Option<u64>,
    /// Items picked up for drag-and-drop.
    picked: Vec<ItemId>,
}

impl TreeView {
    pub fn new(root_id: &str, flags: TreeFlags) -> Self {
        Self {
            provider: TreeDataProvider::new(Default::default(), root_id),
            state: TreeState::new(),
            flags,
            mounted: false,
            synced_revision: None,
            picked: Vec::new(),
        }
    }

    /// Start the initial load. Only the first call returns a request.
    pub fn mount(&mut self, store: &mut TreeStore) -> Option<LoadRequest> {
        if self.mounted {
            return None;
        }
        self.mounted = true;
        let request = store.load();
        tracing::debug!(seq = request.seq(), "tree view mounted");
        Some(request)
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Rebuild from the store if it changed since the last sync.
    pub fn sync(&mut self, store: &TreeStore) -> bool {
        if self.synced_revision == Some(store.revision()) {
            return false;
        }
        self.synced_revision = Some(store.revision());
        self.provider = TreeDataProvider::new(store.items().clone(), store.root_id());
        self.picked.retain(|id| store.item(id).is_some());
        self.state.refresh(&self.provider);
        true
    }

    /// Classify each selected id against the current mapping.
    pub fn on_select_items(&self, ids: &[ItemId]) -> Vec<ViewEvent> {
        tracing::debug!(?ids, "items selected");
        ids.iter()
            .map(|id| match self.provider.get_item(id) {
                Some(item) if item.is_container => {
                    tracing::debug!(%id, "folder selected, not opening");
                    ViewEvent::FolderSelected {
                        id: id.clone(),
                        label: item.label.clone(),
                    }
                }
                Some(item) => {
                    tracing::debug!(%id, "file selected, opening");
                    ViewEvent::FileOpened {
                        id: id.clone(),
                        label: item.label.clone(),
                    }
                }
                None => {
                    tracing::warn!(%id, "selected id not in mapping");
                    ViewEvent::UnknownSelected { id: id.clone() }
                }
            })
            .collect()
    }

    /// Submit the current selection (multi-selection or focused row).
    pub fn select_current(&self) -> Vec<ViewEvent> {
        self.on_select_items(&self.state.selected_ids())
    }

    /// Rename inside the provider only; the store keeps the old label.
    pub fn on_rename_item(&mut self, id: &str, new_label: &str) -> Option<ViewEvent> {
        if !self.flags.can_rename {
            return None;
        }
        let new_label = new_label.trim();
        if new_label.is_empty() {
            return None;
        }
        let old_label = self.provider.get_item(id)?.label.clone();
        let renamed = self.provider.rename_item(id, new_label)?;
        self.state.refresh(&self.provider);
        Some(ViewEvent::ItemRenamed {
            id: renamed.id,
            old_label,
            new_label: renamed.label,
        })
    }

    pub fn picked(&self) -> &[ItemId] {
        &self.picked
    }

    /// Pick up the current selection for drag-and-drop.
    pub fn pick_selection(&mut self) -> Option<ViewEvent> {
        if !self.flags.can_drag_and_drop {
            return None;
        }
        let ids = self.state.selected_ids();
        if ids.is_empty() {
            return None;
        }
        self.picked = ids;
        self.state.clear_multi_select();
        Some(ViewEvent::ItemsPicked {
            count: self.picked.len(),
        })
    }

    pub fn cancel_pick(&mut self) -> bool {
        let had = !self.picked.is_empty();
        self.picked.clear();
        had
    }

    /// Drop the picked items onto the focused row: into it when it is a
    /// folder, otherwise right before it.
    pub fn drop_on_focused(&mut self) -> Option<ViewEvent> {
        if !self.flags.can_drag_and_drop || self.picked.is_empty() {
            return None;
        }
        let focused = self.state.focused()?;
        let target = if focused.is_container && self.flags.can_drop_on_folder {
            DropTarget::Folder(focused.id.clone())
        } else if self.flags.can_reorder_items {
            DropTarget::Before(focused.id.clone())
        } else {
            return Some(ViewEvent::MoveRejected(MoveError::NotAFolder(
                focused.id.clone(),
            )));
        };

        match self.provider.move_items(&self.picked, &target) {
            Ok(()) => {
                let ids = std::mem::take(&mut self.picked);
                if let DropTarget::Folder(folder) = &target {
                    self.state.expanded.insert(folder.clone());
                }
                self.state.refresh(&self.provider);
                if let Some(first) = ids.first() {
                    self.state.focus_id(first);
                }
                Some(ViewEvent::ItemsMoved { ids, target })
            }
            Err(e) => Some(ViewEvent::MoveRejected(e)),
        }
    }

    /// Move the focused row among its siblings.
    pub fn reorder_focused(&mut self, direction: Direction) -> bool {
        if !self.flags.can_reorder_items {
            return false;
        }
        let Some(id) = self.state.focused_id().cloned() else {
            return false;
        };
        if !self.provider.reorder(&id, direction) {
            return false;
        }
        self.state.refresh(&self.provider);
        self.state.focus_id(&id);
        true
    }

    /// Replace the filter query. Ignored when search is disabled.
    pub fn set_filter(&mut self, query: &str) {
        if !self.flags.can_search {
            return;
        }
        self.state.filter_query = query.to_string();
        self.state.refresh(&self.provider);
    }

    pub fn clear_filter(&mut self) {
        self.state.filter_query.clear();
        self.state.refresh(&self.provider);
    }

    pub fn expand_selected(&mut self) {
        self.state.expand_selected(&self.provider);
    }

    pub fn collapse_selected(&mut self) {
        self.state.collapse_selected(&self.provider);
    }

    /// Label of the root item, used as the panel title.
    pub fn title(&self) -> Option<&str> {
        self.provider
            .root()
            .map(|root| self.provider.item_title(root))
    }
}
