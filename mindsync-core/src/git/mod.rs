//! Git operations for MindSync
//!
//! Each working directory is driven through an explicit [`GitRepo`] handle.
//! Mutations shell out to the `git` tool with bounded time; cheap ref lookups
//! go through libgit2.

mod branch;
mod command;
mod remote;
mod repo;
mod status;

pub use branch::BranchResolution;
pub use command::{GitCommand, GitOutput, Lookup};
pub use remote::{redact_url, RemoteKind, RemoteUrl};
pub use repo::{CommitAuthor, GitRepo, RepoState, ORIGIN};
pub use status::{parse_porcelain, FileChanges, RepoStatus};

#[cfg(test)]
pub(crate) use repo::tests as test_support;
