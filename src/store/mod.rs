//! Normalized item store and its remote backend.
//!
//! The store owns the id → item mapping and the load lifecycle. Network
//! requests are handed out as request objects; their results come back as
//! [`Action`]s that the event loop dispatches into the single reducer.

pub mod error;
pub mod item;
pub mod storage;
pub mod tree_store;

pub use error::{ErrorKind, StoreError};
pub use item::{Item, ItemId, ItemKind, ItemMap};
pub use storage::{FileStorage, HttpFileStorage};
pub use tree_store::{Action, CreateRequest, LoadRequest, LoadStatus, TreeStore};
