use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque item identifier.
pub type ItemId = String;

/// Whether an item is a folder or a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    File,
    Folder,
}

impl ItemKind {
    pub fn label(&self) -> &'static str {
        match self {
            ItemKind::File => "file",
            ItemKind::Folder => "folder",
        }
    }
}

/// One file or folder record, as exchanged with the storage backend.
///
/// The legacy field names (`index`, `isFolder`, `children`, `data`) are
/// accepted when deserializing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    #[serde(alias = "index")]
    pub id: ItemId,
    #[serde(alias = "isFolder")]
    pub is_container: bool,
    #[serde(default, alias = "children", skip_serializing_if = "Option::is_none")]
    pub child_ids: Option<Vec<ItemId>>,
    #[serde(alias = "data")]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Item {
    /// A new, empty file.
    pub fn file(id: impl Into<ItemId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_container: false,
            child_ids: None,
            label: label.into(),
            content: Some(String::new()),
        }
    }

    /// A new folder with no children.
    pub fn folder(id: impl Into<ItemId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_container: true,
            child_ids: Some(Vec::new()),
            label: label.into(),
            content: None,
        }
    }

    pub fn kind(&self) -> ItemKind {
        if self.is_container {
            ItemKind::Folder
        } else {
            ItemKind::File
        }
    }

    /// Child ids in display order (empty for files).
    pub fn children(&self) -> &[ItemId] {
        self.child_ids.as_deref().unwrap_or(&[])
    }

    /// Shallow copy with the label replaced.
    pub fn with_label(&self, label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..self.clone()
        }
    }
}

/// A structural problem found in an item mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityIssue {
    MissingRoot(ItemId),
    RootIsLeaf(ItemId),
    KeyMismatch { key: ItemId, id: ItemId },
    FileWithChildren(ItemId),
    DanglingChild { parent: ItemId, child: ItemId },
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityIssue::MissingRoot(id) => write!(f, "root item '{}' is missing", id),
            IntegrityIssue::RootIsLeaf(id) => write!(f, "root item '{}' is not a folder", id),
            IntegrityIssue::KeyMismatch { key, id } => {
                write!(f, "entry '{}' carries id '{}'", key, id)
            }
            IntegrityIssue::FileWithChildren(id) => write!(f, "file '{}' has children", id),
            IntegrityIssue::DanglingChild { parent, child } => {
                write!(f, "'{}' references missing child '{}'", parent, child)
            }
        }
    }
}

/// Flat id → item mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemMap(HashMap<ItemId, Item>);

impl ItemMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&Item> {
        self.0.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Item> {
        self.0.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains_key(id)
    }

    /// Insert an item under its own id, returning any item it replaced.
    pub fn insert(&mut self, item: Item) -> Option<Item> {
        self.0.insert(item.id.clone(), item)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &ItemId> {
        self.0.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &Item> {
        self.0.values()
    }

    /// Ids reachable from `root_id` by following child lists (root included).
    pub fn reachable_from(&self, root_id: &str) -> HashSet<ItemId> {
        let mut seen = HashSet::new();
        let mut stack = vec![root_id.to_string()];
        while let Some(id) = stack.pop() {
            let Some(item) = self.0.get(&id) else {
                continue;
            };
            if !seen.insert(id) {
                continue;
            }
            stack.extend(item.children().iter().cloned());
        }
        seen
    }

    /// Number of items no child list under `root_id` leads to.
    pub fn unlinked_count(&self, root_id: &str) -> usize {
        let reachable = self.reachable_from(root_id);
        self.0.keys().filter(|id| !reachable.contains(*id)).count()
    }

    /// All structural problems, sorted for stable reporting.
    pub fn integrity_issues(&self, root_id: &str) -> Vec<IntegrityIssue> {
        let mut issues = Vec::new();

        match self.0.get(root_id) {
            None => issues.push(IntegrityIssue::MissingRoot(root_id.to_string())),
            Some(root) if !root.is_container => {
                issues.push(IntegrityIssue::RootIsLeaf(root_id.to_string()))
            }
            Some(_) => {}
        }

        let mut keys: Vec<&ItemId> = self.0.keys().collect();
        keys.sort();
        for key in keys {
            let item = &self.0[key];
            if &item.id != key {
                issues.push(IntegrityIssue::KeyMismatch {
                    key: key.clone(),
                    id: item.id.clone(),
                });
            }
            if !item.is_container && !item.children().is_empty() {
                issues.push(IntegrityIssue::FileWithChildren(key.clone()));
            }
            for child in item.children() {
                if !self.0.contains_key(child) {
                    issues.push(IntegrityIssue::DanglingChild {
                        parent: key.clone(),
                        child: child.clone(),
                    });
                }
            }
        }

        issues
    }
}

impl FromIterator<Item> for ItemMap {
    fn from_iter<I: IntoIterator<Item = Item>>(iter: I) -> Self {
        Self(iter.into_iter().map(|item| (item.id.clone(), item)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folder_with(id: &str, label: &str, children: &[&str]) -> Item {
        let mut item = Item::folder(id, label);
        item.child_ids = Some(children.iter().map(|c| c.to_string()).collect());
        item
    }

    #[test]
    fn deserializes_wire_names() {
        let json = r#"{
            "root": {"id":"root","isContainer":true,"childIds":["a"],"label":"root"},
            "a": {"id":"a","isContainer":false,"label":"note.txt","content":"hi"}
        }"#;
        let map: ItemMap = serde_json::from_str(json).unwrap();
        assert_eq!(map.len(), 2);
        let a = map.get("a").unwrap();
        assert!(!a.is_container);
        assert_eq!(a.content.as_deref(), Some("hi"));
        assert!(a.child_ids.is_none());
        assert_eq!(map.get("root").unwrap().children(), ["a".to_string()]);
    }

    #[test]
    fn deserializes_legacy_names() {
        let json = r#"{
            "root": {"index":"root","isFolder":true,"children":["b"],"data":"Root"},
            "b": {"index":"b","isFolder":false,"data":"b.md","content":""}
        }"#;
        let map: ItemMap = serde_json::from_str(json).unwrap();
        assert_eq!(map.get("root").unwrap().label, "Root");
        assert_eq!(map.get("b").unwrap().kind(), ItemKind::File);
    }

    #[test]
    fn file_serializes_without_child_ids() {
        let value = serde_json::to_value(Item::file("f1", "readme.md")).unwrap();
        assert_eq!(value["isContainer"], false);
        assert_eq!(value["content"], "");
        assert!(value.get("childIds").is_none());
    }

    #[test]
    fn folder_serializes_with_empty_child_ids() {
        let value = serde_json::to_value(Item::folder("d1", "Projects")).unwrap();
        assert_eq!(value["isContainer"], true);
        assert_eq!(value["childIds"], serde_json::json!([]));
        assert!(value.get("content").is_none());
    }

    #[test]
    fn with_label_keeps_everything_else() {
        let original = folder_with("d", "old", &["x"]);
        let renamed = original.with_label("new");
        assert_eq!(renamed.label, "new");
        assert_eq!(renamed.children(), original.children());
        assert_eq!(original.label, "old");
    }

    #[test]
    fn integrity_of_valid_map_is_clean() {
        let map: ItemMap = [folder_with("root", "root", &["a"]), Item::file("a", "a")]
            .into_iter()
            .collect();
        assert!(map.integrity_issues("root").is_empty());
    }

    #[test]
    fn integrity_reports_every_problem() {
        let mut file_with_kids = Item::file("f", "f");
        file_with_kids.child_ids = Some(vec!["root".into()]);
        let mislabeled = Item::file("other", "x");
        let mut map: ItemMap = [folder_with("root", "root", &["f", "ghost"]), file_with_kids]
            .into_iter()
            .collect();
        map.0.insert("key".into(), mislabeled);

        let issues = map.integrity_issues("root");
        assert!(issues.contains(&IntegrityIssue::FileWithChildren("f".into())));
        assert!(issues.contains(&IntegrityIssue::DanglingChild {
            parent: "root".into(),
            child: "ghost".into()
        }));
        assert!(issues.contains(&IntegrityIssue::KeyMismatch {
            key: "key".into(),
            id: "other".into()
        }));
    }

    #[test]
    fn integrity_flags_missing_and_leaf_root() {
        let empty = ItemMap::new();
        assert_eq!(
            empty.integrity_issues("root"),
            vec![IntegrityIssue::MissingRoot("root".into())]
        );

        let leaf_root: ItemMap = [Item::file("root", "root")].into_iter().collect();
        assert_eq!(
            leaf_root.integrity_issues("root"),
            vec![IntegrityIssue::RootIsLeaf("root".into())]
        );
    }

    #[test]
    fn unlinked_count_ignores_reachable_items() {
        let map: ItemMap = [
            folder_with("root", "root", &["a"]),
            Item::file("a", "a"),
            Item::file("orphan", "orphan"),
            Item::folder("lonely", "lonely"),
        ]
        .into_iter()
        .collect();
        assert_eq!(map.unlinked_count("root"), 2);
    }

    #[test]
    fn reachable_from_survives_cycles() {
        let map: ItemMap = [
            folder_with("root", "root", &["loop"]),
            folder_with("loop", "loop", &["root"]),
        ]
        .into_iter()
        .collect();
        assert_eq!(map.reachable_from("root").len(), 2);
    }
}
