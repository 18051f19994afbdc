//! Branch resolution for a working directory
//!
//! Probing and acting are separate: [`GitRepo::resolve_branch`] only reads
//! refs, and [`GitRepo::checkout_branch`] runs exactly one git command chosen
//! by the resolved state.

use tracing::debug;

use super::command::Lookup;
use super::repo::{GitRepo, ORIGIN};
use crate::model::MAIN_BRANCH;
use crate::Result;

/// Where a branch can be checked out from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchResolution {
    /// A local branch of that name exists
    HasTargetBranch,
    /// Only `origin/<branch>` exists
    HasRemoteBranch,
    /// Neither exists, but there is a commit to start from
    HasDefaultBranch {
        /// `HEAD` or `origin/main`
        start: String,
    },
    /// No commits anywhere; the branch will be born on first commit
    EmptyRepo,
}

impl GitRepo {
    /// Decide how `branch` would be checked out, without changing anything
    pub fn resolve_branch(&self, branch: &str) -> Result<BranchResolution> {
        if self.local_branch(branch).into_result()?.is_some() {
            return Ok(BranchResolution::HasTargetBranch);
        }

        if self.remote_branch(branch).into_result()?.is_some() {
            return Ok(BranchResolution::HasRemoteBranch);
        }

        if self.head_commit().into_result()?.is_some() {
            return Ok(BranchResolution::HasDefaultBranch {
                start: "HEAD".to_string(),
            });
        }

        if self.remote_branch(MAIN_BRANCH).into_result()?.is_some() {
            return Ok(BranchResolution::HasDefaultBranch {
                start: format!("{}/{}", ORIGIN, MAIN_BRANCH),
            });
        }

        Ok(BranchResolution::EmptyRepo)
    }

    /// Make `branch` the current branch
    pub async fn checkout_branch(&self, branch: &str) -> Result<BranchResolution> {
        let resolution = self.resolve_branch(branch)?;
        debug!(branch, resolution = ?resolution, "Resolved branch");

        let git = self.command();
        match &resolution {
            BranchResolution::HasTargetBranch => {
                if !matches!(self.current_branch(), Lookup::Found(ref b) if b == branch) {
                    git.run(&["checkout", branch, "--"]).await?;
                }
            }
            BranchResolution::HasRemoteBranch => {
                let upstream = format!("{}/{}", ORIGIN, branch);
                git.run(&["checkout", "-B", branch, "--track", &upstream])
                    .await?;
            }
            BranchResolution::HasDefaultBranch { start } => {
                git.run(&["checkout", "--no-track", "-b", branch, start])
                    .await?;
            }
            BranchResolution::EmptyRepo => {
                let head = format!("refs/heads/{}", branch);
                git.run(&["symbolic-ref", "HEAD", &head]).await?;
            }
        }

        Ok(resolution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GitConfig;
    use crate::git::test_support::{bare_remote, git_available};
    use crate::git::CommitAuthor;
    use tempfile::TempDir;

    fn author() -> CommitAuthor {
        CommitAuthor::new("d", "u", "name")
    }

    #[tokio::test]
    async fn test_empty_repo_uses_symbolic_ref() {
        if !git_available() {
            return;
        }
        let temp = TempDir::new().unwrap();
        let repo = GitRepo::new(temp.path().join("wd"), &GitConfig::default());
        repo.ensure_repo().await.unwrap();

        assert_eq!(repo.resolve_branch("main").unwrap(), BranchResolution::EmptyRepo);
        repo.checkout_branch("main").await.unwrap();
        assert_eq!(repo.current_branch().found().as_deref(), Some("main"));

        // idempotent while still unborn
        assert_eq!(
            repo.checkout_branch("main").await.unwrap(),
            BranchResolution::EmptyRepo
        );
    }

    #[tokio::test]
    async fn test_branch_from_head_then_target_exists() {
        if !git_available() {
            return;
        }
        let temp = TempDir::new().unwrap();
        let repo = GitRepo::new(temp.path().join("wd"), &GitConfig::default());
        repo.prepare("main").await.unwrap();
        std::fs::write(repo.root().join("README.md"), "x").unwrap();
        repo.commit_if_dirty("init", &author()).await.unwrap();

        assert_eq!(
            repo.resolve_branch("feature").unwrap(),
            BranchResolution::HasDefaultBranch {
                start: "HEAD".to_string()
            }
        );
        repo.checkout_branch("feature").await.unwrap();
        assert_eq!(repo.current_branch().found().as_deref(), Some("feature"));

        assert_eq!(
            repo.resolve_branch("main").unwrap(),
            BranchResolution::HasTargetBranch
        );
        repo.checkout_branch("main").await.unwrap();
        assert_eq!(repo.current_branch().found().as_deref(), Some("main"));
    }

    #[tokio::test]
    async fn test_fresh_directory_tracks_remote_branch() {
        if !git_available() {
            return;
        }
        let temp = TempDir::new().unwrap();
        let remote = bare_remote(&temp.path().join("origin.git"));

        let first = GitRepo::new(temp.path().join("first"), &GitConfig::default())
            .with_remote(Some(remote.clone()));
        first.prepare("main").await.unwrap();
        std::fs::write(first.root().join("README.md"), "shared").unwrap();
        first.commit_if_dirty("init", &author()).await.unwrap();
        first.push("main").await.unwrap();

        // Same branch elsewhere: picked up from origin
        let second = GitRepo::new(temp.path().join("second"), &GitConfig::default())
            .with_remote(Some(remote.clone()));
        second.ensure_repo().await.unwrap();
        second.fetch().await.unwrap();
        assert_eq!(
            second.resolve_branch("main").unwrap(),
            BranchResolution::HasRemoteBranch
        );

        // New branch elsewhere: starts from origin/main
        let third = GitRepo::new(temp.path().join("third"), &GitConfig::default())
            .with_remote(Some(remote));
        third.prepare("feature").await.unwrap();
        assert_eq!(third.current_branch().found().as_deref(), Some("feature"));
        assert_eq!(
            std::fs::read_to_string(third.root().join("README.md")).unwrap(),
            "shared"
        );
    }
}
