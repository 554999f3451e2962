use std::collections::HashSet;

use crate::store::ItemId;
use crate::tree::provider::TreeDataProvider;

/// A flattened representation of a tree item for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatItem {
    pub id: ItemId,
    pub label: String,
    pub is_container: bool,
    pub depth: usize,
    pub is_expanded: bool,
    pub is_last_sibling: bool,
}

/// Focus, expansion, selection and filter state of the tree widget.
///
/// The root item itself is not rendered; its children appear at depth 0.
#[derive(Debug, Default)]
pub struct TreeState {
    pub flat_items: Vec<FlatItem>,
    pub selected_index: usize,
    pub scroll_offset: usize,
    pub expanded: HashSet<ItemId>,
    /// Ids of multi-selected items.
    pub multi_selected: HashSet<ItemId>,
    /// Current inline filter query string.
    pub filter_query: String,
    /// Whether the tree is currently being filtered.
    pub is_filtering: bool,
}

impl TreeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the focused row.
    pub fn focused_id(&self) -> Option<&ItemId> {
        self.flat_items.get(self.selected_index).map(|item| &item.id)
    }

    pub fn focused(&self) -> Option<&FlatItem> {
        self.flat_items.get(self.selected_index)
    }

    /// Rebuild the flat list, honouring the filter if one is active.
    ///
    /// Focus follows the previously focused id when it is still visible.
    pub fn refresh(&mut self, provider: &TreeDataProvider) {
        let focused = self.focused_id().cloned();
        if self.filter_query.is_empty() {
            self.is_filtering = false;
            self.flat_items.clear();
            let mut path = HashSet::new();
            Self::flatten_children(
                provider,
                provider.root_id(),
                0,
                &self.expanded,
                &mut path,
                &mut self.flat_items,
            );
        } else {
            self.is_filtering = true;
            self.flat_items.clear();
            let query = self.filter_query.to_lowercase();
            let mut path = HashSet::new();
            Self::flatten_filtered(
                provider,
                provider.root_id(),
                0,
                &query,
                &mut path,
                &mut self.flat_items,
            );
        }
        self.multi_selected
            .retain(|id| provider.get_item(id).is_some());
        if let Some(idx) = focused.and_then(|id| self.find_index_by_id(&id)) {
            self.selected_index = idx;
        }
        self.clamp_selection();
    }

    fn flatten_children(
        provider: &TreeDataProvider,
        parent: &str,
        depth: usize,
        expanded: &HashSet<ItemId>,
        path: &mut HashSet<ItemId>,
        items: &mut Vec<FlatItem>,
    ) {
        // `path` holds the ancestors being walked; a child already on it is a cycle.
        if !path.insert(parent.to_string()) {
            return;
        }
        let children = provider.children(parent);
        let count = children.len();
        for (i, child) in children.into_iter().enumerate() {
            if path.contains(&child.id) {
                continue;
            }
            let is_expanded = child.is_container && expanded.contains(&child.id);
            items.push(FlatItem {
                id: child.id.clone(),
                label: provider.item_title(child).to_string(),
                is_container: child.is_container,
                depth,
                is_expanded,
                is_last_sibling: i + 1 == count,
            });
            if is_expanded {
                Self::flatten_children(provider, &child.id, depth + 1, expanded, path, items);
            }
        }
        path.remove(parent);
    }

    /// Returns true if the subtree below `parent` contains any match.
    /// Matching branches are shown expanded regardless of `expanded`.
    fn flatten_filtered(
        provider: &TreeDataProvider,
        parent: &str,
        depth: usize,
        query: &str,
        path: &mut HashSet<ItemId>,
        items: &mut Vec<FlatItem>,
    ) -> bool {
        if !path.insert(parent.to_string()) {
            return false;
        }
        let mut kept: Vec<(FlatItem, Vec<FlatItem>)> = Vec::new();
        for child in provider.children(parent) {
            if path.contains(&child.id) {
                continue;
            }
            let mut below = Vec::new();
            let child_matches = child.is_container
                && Self::flatten_filtered(provider, &child.id, depth + 1, query, path, &mut below);
            let self_matches = child.label.to_lowercase().contains(query);
            if self_matches || child_matches {
                kept.push((
                    FlatItem {
                        id: child.id.clone(),
                        label: provider.item_title(child).to_string(),
                        is_container: child.is_container,
                        depth,
                        is_expanded: child_matches,
                        is_last_sibling: false,
                    },
                    below,
                ));
            }
        }
        path.remove(parent);

        let any = !kept.is_empty();
        let count = kept.len();
        for (i, (mut item, below)) in kept.into_iter().enumerate() {
            item.is_last_sibling = i + 1 == count;
            items.push(item);
            items.extend(below);
        }
        any
    }

    fn clamp_selection(&mut self) {
        if self.flat_items.is_empty() {
            self.selected_index = 0;
        } else if self.selected_index >= self.flat_items.len() {
            self.selected_index = self.flat_items.len() - 1;
        }
    }

    /// Move focus down by one row.
    pub fn select_next(&mut self) {
        let len = self.flat_items.len();
        if len > 0 && self.selected_index < len - 1 {
            self.selected_index += 1;
        }
    }

    /// Move focus up by one row.
    pub fn select_previous(&mut self) {
        if self.selected_index > 0 {
            self.selected_index -= 1;
        }
    }

    pub fn select_first(&mut self) {
        self.selected_index = 0;
    }

    pub fn select_last(&mut self) {
        let len = self.flat_items.len();
        if len > 0 {
            self.selected_index = len - 1;
        }
    }

    /// Expand the focused folder (no-op on files).
    pub fn expand_selected(&mut self, provider: &TreeDataProvider) {
        let Some(item) = self.focused() else {
            return;
        };
        if item.is_container && !item.is_expanded {
            let id = item.id.clone();
            self.expanded.insert(id);
            self.refresh(provider);
        }
    }

    /// Collapse the focused folder, or jump to its parent row.
    pub fn collapse_selected(&mut self, provider: &TreeDataProvider) {
        let Some(item) = self.focused() else {
            return;
        };
        if item.is_container && item.is_expanded {
            let id = item.id.clone();
            self.expanded.remove(&id);
            self.refresh(provider);
            return;
        }
        let depth = item.depth;
        if depth == 0 {
            return;
        }
        if let Some(parent) = (0..self.selected_index)
            .rev()
            .find(|&i| self.flat_items[i].depth < depth)
        {
            self.selected_index = parent;
        }
    }

    /// Toggle multi-selection of the focused row.
    pub fn toggle_multi_select(&mut self) {
        let Some(id) = self.focused_id().cloned() else {
            return;
        };
        if !self.multi_selected.remove(&id) {
            self.multi_selected.insert(id);
        }
    }

    pub fn clear_multi_select(&mut self) {
        self.multi_selected.clear();
    }

    /// The current selection: multi-selected ids in display order, or the
    /// focused id when nothing is multi-selected.
    pub fn selected_ids(&self) -> Vec<ItemId> {
        if self.multi_selected.is_empty() {
            return self.focused_id().cloned().into_iter().collect();
        }
        let mut ids: Vec<ItemId> = self
            .flat_items
            .iter()
            .filter(|item| self.multi_selected.contains(&item.id))
            .map(|item| item.id.clone())
            .collect();
        // Selected rows hidden by a collapse or filter still count.
        let mut hidden: Vec<ItemId> = self
            .multi_selected
            .iter()
            .filter(|id| !ids.contains(id))
            .cloned()
            .collect();
        hidden.sort();
        ids.extend(hidden);
        ids
    }

    pub fn find_index_by_id(&self, id: &str) -> Option<usize> {
        self.flat_items.iter().position(|item| item.id == id)
    }

    /// Focus the row showing `id`, if visible.
    pub fn focus_id(&mut self, id: &str) -> bool {
        match self.find_index_by_id(id) {
            Some(idx) => {
                self.selected_index = idx;
                true
            }
            None => false,
        }
    }

    /// Update the scroll offset to ensure the focused row is visible.
    pub fn update_scroll(&mut self, visible_height: usize) {
        if visible_height == 0 {
            return;
        }
        if self.selected_index < self.scroll_offset {
            self.scroll_offset = self.selected_index;
        } else if self.selected_index >= self.scroll_offset + visible_height {
            self.scroll_offset = self.selected_index - visible_height + 1;
        }
    }
}
