//! Widget tree: arena-backed nodes, per-window state, queries.

pub mod node;
pub mod query;
pub mod tree;
pub mod window;

pub use node::{WidgetId, WidgetNode};
pub use query::{PathSegment, SelectorPath};
pub use tree::{TreeError, WidgetTree};
pub use window::{Mnemonic, WindowState};
