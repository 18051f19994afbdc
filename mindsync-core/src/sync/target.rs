//! What a flow operates on and where its working directory lives

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::model::MAIN_BRANCH;
use crate::tree::sanitize;

/// One branch of one mindmap in one domain
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SyncTarget {
    pub domain: String,
    pub mmid: i64,
    pub branch: String,
}

impl SyncTarget {
    pub fn new(domain: impl Into<String>, mmid: i64, branch: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            mmid,
            branch: branch.into(),
        }
    }

    pub fn main(domain: impl Into<String>, mmid: i64) -> Self {
        Self::new(domain, mmid, MAIN_BRANCH)
    }

    /// `<repos_dir>/<domain>/<mmid>/<branch-slug>`
    ///
    /// Each branch gets its own working directory so flows on different
    /// branches never share an index or a checkout.
    pub fn working_dir(&self, repos_dir: &Path) -> PathBuf {
        repos_dir
            .join(sanitize(&self.domain))
            .join(self.mmid.to_string())
            .join(branch_slug(&self.branch))
    }
}

impl fmt::Display for SyncTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.domain, self.mmid, self.branch)
    }
}

/// Directory-safe form of a branch name
fn branch_slug(branch: &str) -> String {
    sanitize(&branch.replace('/', "-"))
}
