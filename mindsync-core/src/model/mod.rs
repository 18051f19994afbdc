//! Mindmap document model
//!
//! The document, its per-branch graphs, cards and the bounded history log.

mod card;
mod graph;
mod history;
mod mindmap;

pub use card::{Card, CardUpdate, NewCard};
pub use graph::{Edge, GraphSnapshot, Node, NodeStyle, Position, Viewport};
pub use history::{HistoryEntry, HistoryKind, HistoryLog, HistorySnapshot, HISTORY_LIMIT};
pub use mindmap::{BranchState, MindMap, NodeUpdate, MAIN_BRANCH};
