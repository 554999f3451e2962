use std::collections::HashSet;

use thiserror::Error;

use crate::store::{Item, ItemId, ItemMap};

/// Where a drag-and-drop lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    /// Append to the end of a folder's children.
    Folder(ItemId),
    /// Insert right before a sibling, in that sibling's parent.
    Before(ItemId),
}

/// Direction for sibling reordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Why a move was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("'{0}' is not in the tree")]
    UnknownItem(ItemId),
    #[error("'{0}' is not a folder")]
    NotAFolder(ItemId),
    #[error("cannot move the root item")]
    MovingRoot,
    #[error("cannot move '{0}' into itself")]
    IntoOwnSubtree(ItemId),
    #[error("'{0}' has no parent")]
    NoParent(ItemId),
}

/// Data provider the tree widget reads from.
///
/// Holds a snapshot of the store's items. Renames and moves are applied to
/// this snapshot only and are dropped when the snapshot is rebuilt.
#[derive(Debug, Clone)]
pub struct TreeDataProvider {
    items: ItemMap,
    root_id: ItemId,
}

impl TreeDataProvider {
    pub fn new(items: ItemMap, root_id: impl Into<ItemId>) -> Self {
        Self {
            items,
            root_id: root_id.into(),
        }
    }

    pub fn root_id(&self) -> &str {
        &self.root_id
    }

    pub fn root(&self) -> Option<&Item> {
        self.items.get(&self.root_id)
    }

    pub fn get_item(&self, id: &str) -> Option<&Item> {
        self.items.get(id)
    }

    pub fn items(&self) -> &ItemMap {
        &self.items
    }

    /// Display title of an item.
    pub fn item_title<'a>(&self, item: &'a Item) -> &'a str {
        &item.label
    }

    /// Child ids of `id` that resolve to items; dangling ids are skipped.
    pub fn children(&self, id: &str) -> Vec<&Item> {
        self.items
            .get(id)
            .map(|item| {
                item.children()
                    .iter()
                    .filter_map(|child| self.items.get(child))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Replace an item's label with a shallow copy and return that copy.
    pub fn rename_item(&mut self, id: &str, new_label: &str) -> Option<Item> {
        let renamed = self.items.get(id)?.with_label(new_label);
        self.items.insert(renamed.clone());
        Some(renamed)
    }

    /// The folder whose child list contains `id`.
    ///
    /// When several folders list `id`, the first one met walking down from
    /// the root in display order wins; unreachable holders are ordered by id.
    pub fn parent_of(&self, id: &str) -> Option<&ItemId> {
        let holds = |item: &Item| item.is_container && item.children().iter().any(|c| c == id);

        let mut seen = HashSet::new();
        let mut stack = vec![self.root_id.as_str()];
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            let Some(item) = self.items.get(current) else {
                continue;
            };
            if holds(item) {
                return Some(&item.id);
            }
            stack.extend(item.children().iter().rev().map(String::as_str));
        }

        self.items
            .values()
            .filter(|item| holds(*item))
            .map(|item| &item.id)
            .min()
    }

    /// Whether `descendant` is `ancestor` or lies anywhere beneath it.
    pub fn is_within(&self, ancestor: &str, descendant: &str) -> bool {
        let mut seen = HashSet::new();
        let mut stack = vec![ancestor];
        while let Some(id) = stack.pop() {
            if id == descendant {
                return true;
            }
            if !seen.insert(id) {
                continue;
            }
            if let Some(item) = self.items.get(id) {
                stack.extend(item.children().iter().map(String::as_str));
            }
        }
        false
    }

    /// Move `ids` to `target`, keeping their relative order.
    ///
    /// Nothing changes unless every id can be moved.
    pub fn move_items(&mut self, ids: &[ItemId], target: &DropTarget) -> Result<(), MoveError> {
        let (parent, anchor) = match target {
            DropTarget::Folder(folder) => {
                let item = self
                    .items
                    .get(folder)
                    .ok_or_else(|| MoveError::UnknownItem(folder.clone()))?;
                if !item.is_container {
                    return Err(MoveError::NotAFolder(folder.clone()));
                }
                (folder.clone(), None)
            }
            DropTarget::Before(sibling) => {
                if !self.items.contains(sibling) {
                    return Err(MoveError::UnknownItem(sibling.clone()));
                }
                let parent = self
                    .parent_of(sibling)
                    .cloned()
                    .ok_or_else(|| MoveError::NoParent(sibling.clone()))?;
                (parent, Some(sibling.clone()))
            }
        };

        for id in ids {
            if !self.items.contains(id) {
                return Err(MoveError::UnknownItem(id.clone()));
            }
            if *id == self.root_id {
                return Err(MoveError::MovingRoot);
            }
            if self.is_within(id, &parent) {
                return Err(MoveError::IntoOwnSubtree(id.clone()));
            }
        }

        let moving: Vec<&ItemId> = ids
            .iter()
            .filter(|id| anchor.as_ref() != Some(*id))
            .collect();
        let moving_set: HashSet<&str> = moving.iter().map(|id| id.as_str()).collect();

        let holders: Vec<ItemId> = self
            .items
            .values()
            .filter(|item| item.children().iter().any(|c| moving_set.contains(c.as_str())))
            .map(|item| item.id.clone())
            .collect();
        for holder in holders {
            if let Some(children) = self
                .items
                .get_mut(&holder)
                .and_then(|item| item.child_ids.as_mut())
            {
                children.retain(|c| !moving_set.contains(c.as_str()));
            }
        }

        if let Some(children) = self
            .items
            .get_mut(&parent)
            .map(|item| item.child_ids.get_or_insert_with(Vec::new))
        {
            let at = anchor
                .as_ref()
                .and_then(|a| children.iter().position(|c| c == a))
                .unwrap_or(children.len());
            for (offset, id) in moving.into_iter().enumerate() {
                children.insert(at + offset, id.clone());
            }
        }
        Ok(())
    }

    /// Swap `id` with its neighbour. Returns false at either end.
    pub fn reorder(&mut self, id: &str, direction: Direction) -> bool {
        let Some(parent) = self.parent_of(id).cloned() else {
            return false;
        };
        let Some(children) = self
            .items
            .get_mut(&parent)
            .and_then(|item| item.child_ids.as_mut())
        else {
            return false;
        };
        let Some(pos) = children.iter().position(|c| c == id) else {
            return false;
        };
        let other = match direction {
            Direction::Up if pos > 0 => pos - 1,
            Direction::Down if pos + 1 < children.len() => pos + 1,
            _ => return false,
        };
        children.swap(pos, other);
        true
    }
}
