//! MindSync GitHub - repository provisioning
//!
//! Creates (or adopts) the GitHub repository a mindmap is mirrored to.

mod client;
mod error;

pub use client::{repo_name_for, GitHubClient, RemoteRepository};
pub use error::{Error, Result};
