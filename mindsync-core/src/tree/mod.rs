//! Conversion between branch graphs and directory trees
//!
//! Layout: `README.md` holds the document content; every non-root node is a
//! directory named after its sanitized text, nested like the tree; each card
//! is `<sanitized title>.md` in its node's directory, and a node without cards
//! holds an empty `.keep` so git tracks the directory.

mod export;
mod import;
mod mirror;
mod sanitize;

pub use export::{export_tree, ExportSummary};
pub use import::{import_tree, read_readme, ImportedTree, DEPTH_SPACING};
pub use mirror::{apply_mirror, list_tree, plan_mirror, EntryKind, Listing, MirrorPlan};
pub use sanitize::{sanitize, UniqueNames, UNTITLED};

/// Document content file at the top of the tree
pub const README_FILE: &str = "README.md";

/// Sentinel that keeps an otherwise empty node directory tracked
pub const KEEP_FILE: &str = ".keep";

/// Card file extension
pub const MARKDOWN_EXT: &str = ".md";

/// Version-control metadata directory, never exported, imported or mirrored
pub const GIT_DIR: &str = ".git";
