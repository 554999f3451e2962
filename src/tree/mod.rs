//! View-side tree model: the data provider over a store snapshot and the
//! flattened, focusable row list rendered by the tree widget.

pub mod provider;
pub mod state;

pub use provider::{Direction, DropTarget, MoveError, TreeDataProvider};
pub use state::{FlatItem, TreeState};
