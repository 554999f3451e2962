use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::store::error::StoreError;
use crate::store::item::{Item, ItemId, ItemKind, ItemMap};
use crate::store::storage::FileStorage;

/// Lifecycle of the full-mapping load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadStatus {
    #[default]
    NotStarted,
    Loading,
    Loaded,
    Failed,
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LoadStatus::NotStarted => "not-started",
            LoadStatus::Loading => "loading",
            LoadStatus::Loaded => "loaded",
            LoadStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Everything that may change store state. Only [`TreeStore::dispatch`]
/// applies these.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    LoadStarted {
        seq: u64,
    },
    LoadResolved {
        seq: u64,
        result: std::result::Result<ItemMap, StoreError>,
    },
    AddItem {
        item: Item,
    },
}

/// A pending `GET /files`. Resolve with [`LoadRequest::run`] and dispatch
/// the returned action.
pub struct LoadRequest {
    seq: u64,
    storage: Arc<dyn FileStorage>,
}

impl LoadRequest {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub async fn run(self) -> Action {
        let result = self.storage.fetch_all().await;
        Action::LoadResolved {
            seq: self.seq,
            result,
        }
    }
}

/// A pending `POST /files` for one item.
pub struct CreateRequest {
    item: Item,
    storage: Arc<dyn FileStorage>,
}

impl CreateRequest {
    pub fn item(&self) -> &Item {
        &self.item
    }

    /// Send the item; the backend's stored record on success.
    pub async fn run(self) -> std::result::Result<Item, StoreError> {
        let kind = self.item.kind().label();
        tracing::info!(id = %self.item.id, kind, "creating item on server");
        match self.storage.create(&self.item).await {
            Ok(stored) => {
                tracing::info!(id = %stored.id, kind, "item created");
                Ok(stored)
            }
            Err(e) => {
                tracing::warn!(id = %self.item.id, kind, error = %e, "create failed");
                Err(e)
            }
        }
    }
}

/// Normalized item store with an asynchronous load lifecycle.
pub struct TreeStore {
    items: ItemMap,
    load_status: LoadStatus,
    load_error: Option<StoreError>,
    revision: u64,
    next_seq: u64,
    root_id: ItemId,
    storage: Arc<dyn FileStorage>,
}

impl TreeStore {
    /// Create an empty store backed by `storage`.
    pub fn new(storage: Arc<dyn FileStorage>, root_id: impl Into<ItemId>) -> Self {
        Self {
            items: ItemMap::new(),
            load_status: LoadStatus::NotStarted,
            load_error: None,
            revision: 0,
            next_seq: 0,
            root_id: root_id.into(),
            storage,
        }
    }

    pub fn items(&self) -> &ItemMap {
        &self.items
    }

    pub fn item(&self, id: &str) -> Option<&Item> {
        self.items.get(id)
    }

    pub fn load_status(&self) -> LoadStatus {
        self.load_status
    }

    /// The last load failure; only set while the status is `Failed`.
    pub fn load_error(&self) -> Option<&StoreError> {
        self.load_error.as_ref()
    }

    /// Bumped on every change to `items`.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn root_id(&self) -> &str {
        &self.root_id
    }

    pub fn storage_location(&self) -> String {
        self.storage.describe()
    }

    /// Mark a load as started and hand back the request to run.
    ///
    /// Overlapping loads are not deduplicated: whichever resolution is
    /// dispatched last determines the final state.
    pub fn load(&mut self) -> LoadRequest {
        self.next_seq += 1;
        let seq = self.next_seq;
        self.dispatch(Action::LoadStarted { seq });
        LoadRequest {
            seq,
            storage: Arc::clone(&self.storage),
        }
    }

    /// Insert a new, unparented file. Returns its generated id.
    pub fn add_file(&mut self, label: &str) -> Result<ItemId> {
        let label = validate_label(label)?;
        let item = Item::file(Uuid::new_v4().to_string(), label);
        let id = item.id.clone();
        self.dispatch(Action::AddItem { item });
        Ok(id)
    }

    /// Insert a new, unparented folder. Returns its generated id.
    pub fn add_folder(&mut self, label: &str) -> Result<ItemId> {
        let label = validate_label(label)?;
        let item = Item::folder(Uuid::new_v4().to_string(), label);
        let id = item.id.clone();
        self.dispatch(Action::AddItem { item });
        Ok(id)
    }

    /// Prepare a `POST` of a caller-supplied file record.
    ///
    /// The result never touches the store; callers surface it themselves.
    pub fn create_file(&self, file: Item) -> CreateRequest {
        self.create(file, ItemKind::File)
    }

    /// Prepare a `POST` of a caller-supplied folder record.
    pub fn create_folder(&self, folder: Item) -> CreateRequest {
        self.create(folder, ItemKind::Folder)
    }

    fn create(&self, mut item: Item, kind: ItemKind) -> CreateRequest {
        match kind {
            ItemKind::File => {
                item.is_container = false;
                item.child_ids = None;
            }
            ItemKind::Folder => {
                item.is_container = true;
                item.content = None;
                item.child_ids.get_or_insert_with(Vec::new);
            }
        }
        CreateRequest {
            item,
            storage: Arc::clone(&self.storage),
        }
    }

    /// Apply an action. This is the only place store state changes.
    pub fn dispatch(&mut self, action: Action) {
        match action {
            Action::LoadStarted { seq } => {
                tracing::debug!(seq, "load started");
                self.load_status = LoadStatus::Loading;
                self.load_error = None;
            }
            Action::LoadResolved {
                seq,
                result: Ok(items),
            } => {
                tracing::info!(seq, count = items.len(), "load succeeded");
                for issue in items.integrity_issues(&self.root_id) {
                    tracing::warn!(seq, %issue, "item mapping integrity");
                }
                self.items = items;
                self.load_status = LoadStatus::Loaded;
                self.load_error = None;
                self.revision += 1;
            }
            Action::LoadResolved {
                seq,
                result: Err(e),
            } => {
                tracing::warn!(seq, error = %e, "load failed");
                self.load_status = LoadStatus::Failed;
                self.load_error = Some(e);
            }
            Action::AddItem { item } => {
                tracing::info!(id = %item.id, kind = item.kind().label(), label = %item.label, "item added");
                self.items.insert(item);
                self.revision += 1;
            }
        }
    }
}

fn validate_label(label: &str) -> Result<&str> {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidLabel("label must not be empty".into()));
    }
    Ok(trimmed)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::store::error::ErrorKind;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// In-memory backend replaying queued responses.
    #[derive(Default)]
    pub(crate) struct MockStorage {
        fetches: Mutex<VecDeque<std::result::Result<ItemMap, StoreError>>>,
        creates: Mutex<VecDeque<std::result::Result<Item, StoreError>>>,
        pub(crate) posted: Mutex<Vec<Item>>,
    }

    impl MockStorage {
        pub(crate) fn with_fetches(
            fetches: Vec<std::result::Result<ItemMap, StoreError>>,
        ) -> Arc<Self> {
            Arc::new(Self {
                fetches: Mutex::new(fetches.into()),
                ..Default::default()
            })
        }

        pub(crate) fn with_creates(creates: Vec<std::result::Result<Item, StoreError>>) -> Arc<Self> {
            Arc::new(Self {
                creates: Mutex::new(creates.into()),
                ..Default::default()
            })
        }
    }

    #[async_trait]
    impl FileStorage for MockStorage {
        async fn fetch_all(&self) -> std::result::Result<ItemMap, StoreError> {
            self.fetches
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(StoreError::Transport("no response queued".into())))
        }

        async fn create(&self, item: &Item) -> std::result::Result<Item, StoreError> {
            self.posted.lock().unwrap().push(item.clone());
            self.creates
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(item.clone()))
        }

        fn describe(&self) -> String {
            "mock://files".into()
        }
    }

    pub(crate) fn sample_items() -> ItemMap {
        serde_json::from_str(
            r#"{"root": {"id":"root","isContainer":true,"childIds":["a"],"label":"root"},
                "a": {"id":"a","isContainer":false,"label":"note.txt","content":"hi"}}"#,
        )
        .unwrap()
    }

    #[test]
    fn new_store_is_empty_and_not_started() {
        let store = TreeStore::new(MockStorage::with_fetches(vec![]), "root");
        assert!(store.items().is_empty());
        assert_eq!(store.load_status(), LoadStatus::NotStarted);
        assert!(store.load_error().is_none());
        assert_eq!(store.load_status().to_string(), "not-started");
    }

    #[test]
    fn load_marks_loading_before_resolution() {
        let mut store = TreeStore::new(MockStorage::with_fetches(vec![]), "root");
        let _request = store.load();
        assert_eq!(store.load_status(), LoadStatus::Loading);
    }

    #[tokio::test]
    async fn successful_load_replaces_items() {
        let storage = MockStorage::with_fetches(vec![Ok(sample_items())]);
        let mut store = TreeStore::new(storage, "root");
        store.add_folder("stale").unwrap();

        let action = store.load().run().await;
        store.dispatch(action);

        assert_eq!(store.load_status(), LoadStatus::Loaded);
        assert_eq!(store.items(), &sample_items());
        assert!(!store.item("a").unwrap().is_container);
    }

    #[tokio::test]
    async fn failed_load_keeps_items_and_records_error() {
        let storage = MockStorage::with_fetches(vec![
            Ok(sample_items()),
            Err(StoreError::Response {
                status: 500,
                body: "oops".into(),
            }),
        ]);
        let mut store = TreeStore::new(storage, "root");
        let first = store.load().run().await;
        store.dispatch(first);
        let revision = store.revision();

        let second = store.load().run().await;
        store.dispatch(second);

        assert_eq!(store.load_status(), LoadStatus::Failed);
        assert_eq!(store.items(), &sample_items());
        assert_eq!(store.revision(), revision);
        assert_eq!(store.load_error().unwrap().kind(), ErrorKind::Response);
    }

    #[tokio::test]
    async fn first_failed_load_leaves_items_empty() {
        let storage = MockStorage::with_fetches(vec![Err(StoreError::Transport(
            "connection refused".into(),
        ))]);
        let mut store = TreeStore::new(storage, "root");

        let action = store.load().run().await;
        store.dispatch(action);

        assert_eq!(store.load_status().to_string(), "failed");
        assert!(!store.load_error().unwrap().to_string().is_empty());
        assert!(store.items().is_empty());
    }

    #[tokio::test]
    async fn success_after_failure_clears_error() {
        let storage = MockStorage::with_fetches(vec![
            Err(StoreError::Unexpected("garbage".into())),
            Ok(sample_items()),
        ]);
        let mut store = TreeStore::new(storage, "root");
        let a = store.load().run().await;
        store.dispatch(a);
        let b = store.load().run().await;
        store.dispatch(b);

        assert_eq!(store.load_status(), LoadStatus::Loaded);
        assert!(store.load_error().is_none());
    }

    #[tokio::test]
    async fn overlapping_loads_last_dispatch_wins() {
        let mut newer = sample_items();
        newer.insert(Item::file("b", "b.txt"));
        let storage = MockStorage::with_fetches(vec![Ok(sample_items()), Ok(newer.clone())]);
        let mut store = TreeStore::new(storage, "root");

        let first = store.load();
        let second = store.load();
        assert_eq!(first.seq() + 1, second.seq());
        let first_action = first.run().await;
        let second_action = second.run().await;

        // The earlier request resolves last.
        store.dispatch(second_action);
        store.dispatch(first_action);

        assert_eq!(store.items(), &sample_items());
        assert_eq!(store.load_status(), LoadStatus::Loaded);
    }

    #[tokio::test]
    async fn reload_after_failure_clears_error_while_loading() {
        let storage = MockStorage::with_fetches(vec![
            Err(StoreError::Transport("down".into())),
            Ok(sample_items()),
        ]);
        let mut store = TreeStore::new(storage, "root");
        let failed = store.load();
        store.dispatch(failed.run().await);
        assert_eq!(store.load_status(), LoadStatus::Failed);
        assert!(store.load_error().is_some());

        let retry = store.load();
        assert_eq!(store.load_status(), LoadStatus::Loading);
        assert!(store.load_error().is_none());

        store.dispatch(retry.run().await);
        assert_eq!(store.load_status(), LoadStatus::Loaded);
        assert!(store.load_error().is_none());
    }

    #[tokio::test]
    async fn repeated_loads_with_same_response_are_idempotent() {
        let storage = MockStorage::with_fetches(vec![Ok(sample_items()), Ok(sample_items())]);
        let mut store = TreeStore::new(storage, "root");
        let first = store.load();
        let second = store.load();

        store.dispatch(first.run().await);
        let after_first = store.items().clone();
        store.dispatch(second.run().await);

        assert_eq!(store.items(), &after_first);
    }

    #[test]
    fn add_file_and_folder_insert_unlinked_items() {
        let mut store = TreeStore::new(MockStorage::with_fetches(vec![]), "root");
        store.dispatch(Action::LoadResolved {
            seq: 1,
            result: Ok(sample_items()),
        });

        let folder = store.add_folder("Projects").unwrap();
        let file = store.add_file("readme.md").unwrap();

        assert_eq!(store.items().len(), 4);
        assert_ne!(folder, file);
        assert!(store.item(&folder).unwrap().is_container);
        assert_eq!(store.item(&folder).unwrap().child_ids, Some(vec![]));
        let file_item = store.item(&file).unwrap();
        assert!(!file_item.is_container);
        assert_eq!(file_item.content.as_deref(), Some(""));
        assert!(file_item.child_ids.is_none());
        // Not linked into any parent.
        assert_eq!(store.item("root").unwrap().children(), ["a".to_string()]);
        assert_eq!(store.items().unlinked_count("root"), 2);
    }

    #[test]
    fn identical_labels_get_distinct_ids() {
        let mut store = TreeStore::new(MockStorage::with_fetches(vec![]), "root");
        let first = store.add_file("same").unwrap();
        let second = store.add_file("same").unwrap();
        assert_ne!(first, second);
        assert_eq!(store.items().len(), 2);
    }

    #[test]
    fn empty_label_is_rejected() {
        let mut store = TreeStore::new(MockStorage::with_fetches(vec![]), "root");
        assert!(matches!(
            store.add_folder("   "),
            Err(AppError::InvalidLabel(_))
        ));
        assert!(store.items().is_empty());
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn mutations_bump_revision() {
        let mut store = TreeStore::new(MockStorage::with_fetches(vec![]), "root");
        store.add_file("one").unwrap();
        store.add_folder("two").unwrap();
        assert_eq!(store.revision(), 2);
    }

    #[tokio::test]
    async fn create_file_posts_and_leaves_store_untouched() {
        let confirmed = Item::file("server-id", "readme.md");
        let storage = MockStorage::with_creates(vec![Ok(confirmed.clone())]);
        let store = TreeStore::new(storage.clone(), "root");

        let result = store.create_file(Item::file("tmp", "readme.md")).run().await;

        assert_eq!(result.unwrap(), confirmed);
        assert!(store.items().is_empty());
        assert_eq!(storage.posted.lock().unwrap()[0].id, "tmp");
    }

    #[tokio::test]
    async fn create_folder_normalizes_record() {
        let storage = MockStorage::with_creates(vec![]);
        let store = TreeStore::new(storage.clone(), "root");
        let mut sloppy = Item::file("d", "docs");
        sloppy.content = Some("ignored".into());

        let request = store.create_folder(sloppy);
        assert!(request.item().is_container);
        assert!(request.item().content.is_none());
        assert_eq!(request.item().child_ids, Some(vec![]));
        request.run().await.unwrap();
    }

    #[tokio::test]
    async fn create_failure_is_returned_to_caller() {
        let storage = MockStorage::with_creates(vec![Err(StoreError::Transport(
            "connection reset".into(),
        ))]);
        let store = TreeStore::new(storage, "root");

        let err = store
            .create_file(Item::file("x", "x"))
            .run()
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
    }
}
