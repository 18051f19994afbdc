//! MindSync Core - mindmap documents mirrored into git repositories
//!
//! A mindmap is stored as a graph per branch plus a set of markdown cards.
//! This crate turns a branch into a directory tree, tracks that tree in a
//! per-branch git working directory, and reads trees back into graphs.

pub mod change;
pub mod config;
pub mod error;
pub mod git;
pub mod model;
pub mod secrets;
pub mod store;
pub mod sync;
pub mod tree;

pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use model::{BranchState, Card, GraphSnapshot, MindMap, MAIN_BRANCH};
pub use secrets::Secrets;
pub use store::{DocumentStore, MemoryStore};
pub use sync::{FlowOutcome, SaveRequest, SyncOrchestrator, SyncTarget};
