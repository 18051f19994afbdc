//! Working-directory lifecycle: init, identity, remote, commit, push, pull

use std::future::Future;
use std::path::{Path, PathBuf};

use git2::{BranchType, Oid, Repository};
use tracing::{debug, info, warn};

use super::command::{GitCommand, Lookup};
use super::remote::{redact_error, redact_url, RemoteUrl};
use crate::config::GitConfig;
use crate::{Error, Result};

/// Name of the only remote a working directory has
pub const ORIGIN: &str = "origin";

/// Who a commit is made on behalf of
///
/// Commits are authored by the configured bot identity; the acting user is
/// recorded in the message prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitAuthor {
    pub domain: String,
    pub user_id: String,
    pub username: String,
}

impl CommitAuthor {
    pub fn new(
        domain: impl Into<String>,
        user_id: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            user_id: user_id.into(),
            username: username.into(),
        }
    }

    /// `<domain>/<user>/<username>: <message>`
    pub fn message(&self, message: &str) -> String {
        let message = message.trim();
        let message = if message.is_empty() { "Update mindmap" } else { message };
        format!(
            "{}/{}/{}: {}",
            self.domain, self.user_id, self.username, message
        )
    }
}

/// What a working directory looked like before [`GitRepo::ensure_repo`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoState {
    /// No repository at the path
    Uninitialized,
    /// Repository without any commit on HEAD
    Empty,
    /// HEAD resolves to a commit
    HasHistory,
}

/// One scoped working directory and the remote it syncs with
pub struct GitRepo {
    root: PathBuf,
    git: GitCommand,
    bot_name: String,
    bot_email: String,
    remote: Option<RemoteUrl>,
    token: Option<String>,
}

impl std::fmt::Debug for GitRepo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitRepo")
            .field("root", &self.root)
            .field("remote", &self.remote)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .finish_non_exhaustive()
    }
}

impl GitRepo {
    pub fn new(root: impl Into<PathBuf>, config: &GitConfig) -> Self {
        let root = root.into();
        let git = GitCommand::new(&root)
            .with_program(&config.git_path)
            .with_timeouts(config.command_timeout, config.network_timeout);
        Self {
            root,
            git,
            bot_name: config.bot_name.clone(),
            bot_email: config.bot_email.clone(),
            remote: None,
            token: None,
        }
    }

    pub fn with_remote(mut self, remote: Option<RemoteUrl>) -> Self {
        self.remote = remote;
        self
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    /// Get the working directory path
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn remote(&self) -> Option<&RemoteUrl> {
        self.remote.as_ref()
    }

    pub(crate) fn command(&self) -> &GitCommand {
        &self.git
    }

    fn with_repository<T>(&self, f: impl FnOnce(&Repository) -> Lookup<T>) -> Lookup<T> {
        match Lookup::from(Repository::open(&self.root)) {
            Lookup::Found(repo) => f(&repo),
            Lookup::NotFound => Lookup::NotFound,
            Lookup::Error(e) => Lookup::Error(e),
        }
    }

    /// Inspect the repository state without changing anything
    pub fn state(&self) -> Result<RepoState> {
        if !self.root.join(".git").exists() {
            return Ok(RepoState::Uninitialized);
        }
        match self.head_commit() {
            Lookup::Found(_) => Ok(RepoState::HasHistory),
            Lookup::NotFound => match self.with_repository(|_| Lookup::Found(())) {
                Lookup::Found(()) => Ok(RepoState::Empty),
                Lookup::NotFound => Ok(RepoState::Uninitialized),
                Lookup::Error(e) => Err(e),
            },
            Lookup::Error(e) => Err(e),
        }
    }

    /// Commit HEAD points at
    pub fn head_commit(&self) -> Lookup<Oid> {
        self.with_repository(|repo| repo.refname_to_id("HEAD").into())
    }

    /// Branch HEAD points at, also for an unborn branch
    pub fn current_branch(&self) -> Lookup<String> {
        self.with_repository(|repo| {
            let head = match Lookup::from(repo.find_reference("HEAD")) {
                Lookup::Found(head) => head,
                Lookup::NotFound => return Lookup::NotFound,
                Lookup::Error(e) => return Lookup::Error(e),
            };
            match head.symbolic_target() {
                Some(target) => Lookup::Found(
                    target
                        .strip_prefix("refs/heads/")
                        .unwrap_or(target)
                        .to_string(),
                ),
                None => Lookup::NotFound,
            }
        })
    }

    pub fn local_branch(&self, branch: &str) -> Lookup<Oid> {
        self.with_repository(|repo| {
            Lookup::from(repo.find_branch(branch, BranchType::Local))
                .map(|b| b.get().target().unwrap_or_else(Oid::zero))
        })
    }

    /// `refs/remotes/origin/<branch>` as of the last fetch
    pub fn remote_branch(&self, branch: &str) -> Lookup<Oid> {
        let refname = format!("refs/remotes/{}/{}", ORIGIN, branch);
        self.with_repository(|repo| repo.refname_to_id(&refname).into())
    }

    /// Whether `origin` is configured in this working directory
    pub fn has_origin(&self) -> bool {
        self.with_repository(|repo| Lookup::from(repo.find_remote(ORIGIN)).map(|_| ()))
            .is_found()
    }

    /// Create the directory, init if needed, write identity and origin
    ///
    /// Returns the state observed before anything was changed.
    pub async fn ensure_repo(&self) -> Result<RepoState> {
        tokio::fs::create_dir_all(&self.root).await?;

        let before = self.state()?;
        if before == RepoState::Uninitialized {
            info!(path = %self.root.display(), "Initializing repository");
            self.git.run(&["init"]).await?;
        }

        self.git.run(&["config", "user.name", &self.bot_name]).await?;
        self.git.run(&["config", "user.email", &self.bot_email]).await?;
        self.git.run(&["config", "commit.gpgsign", "false"]).await?;

        if let Some(remote) = &self.remote {
            self.set_origin(remote.as_str()).await?;
        }

        Ok(before)
    }

    /// Add `origin`, or point it at `url` if it differs
    async fn set_origin(&self, url: &str) -> Result<()> {
        match self.git.lookup(&["remote", "get-url", ORIGIN]).await {
            Lookup::Found(current) if current == url => Ok(()),
            Lookup::Found(_) => {
                debug!(remote = %redact_url(url), "Updating origin");
                self.git.run(&["remote", "set-url", ORIGIN, url]).await.map(|_| ())
            }
            Lookup::NotFound => {
                debug!(remote = %redact_url(url), "Adding origin");
                self.git.run(&["remote", "add", ORIGIN, url]).await.map(|_| ())
            }
            Lookup::Error(e) => Err(e),
        }
    }

    /// Run `op` with a token-bearing origin, restoring the clean URL afterwards
    ///
    /// The clean URL is put back whether or not `op` succeeded; any token
    /// echoed in git's output is scrubbed from the returned error.
    async fn with_auth<T, F, Fut>(&self, op: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let remote = self
            .remote
            .as_ref()
            .ok_or_else(|| Error::Validation("no remote configured".to_string()))?;
        let token = self.token.as_deref();

        let url = remote.authenticated(token)?;
        let armed = url != remote.as_str();
        if armed {
            self.git
                .run(&["remote", "set-url", ORIGIN, &url])
                .await
                .map_err(|e| redact_error(e, token))?;
        }

        let result = op().await;

        if armed {
            if let Err(e) = self
                .git
                .run(&["remote", "set-url", ORIGIN, remote.as_str()])
                .await
            {
                warn!(error = %redact_error(e, token), "Failed to restore token-free origin URL");
            }
        }

        result.map_err(|e| redact_error(e, token))
    }

    /// Fetch all branches from origin
    pub async fn fetch(&self) -> Result<()> {
        self.with_auth(move || async move {
            self.git
                .run_network(&["fetch", ORIGIN, "--prune"])
                .await
                .map(|_| ())
        })
        .await
    }

    /// Ensure the repository and check out `branch`
    ///
    /// A directory that was just initialized and has a remote is fetched once
    /// first, so existing remote history is picked up instead of starting an
    /// unrelated one.
    pub async fn prepare(&self, branch: &str) -> Result<RepoState> {
        let before = self.ensure_repo().await?;
        if before == RepoState::Uninitialized && self.remote.is_some() {
            if let Err(e) = self.fetch().await {
                warn!(branch, error = %e, "Initial fetch failed; starting from local state");
            }
        }
        self.checkout_branch(branch).await?;
        Ok(before)
    }

    /// Stage everything and commit if anything changed
    ///
    /// Returns the new commit sha, or `None` when the tree was clean.
    pub async fn commit_if_dirty(
        &self,
        message: &str,
        author: &CommitAuthor,
    ) -> Result<Option<String>> {
        self.git.run(&["add", "-A"]).await?;

        let status = self.git.run(&["status", "--porcelain"]).await?;
        if status.stdout.trim().is_empty() {
            debug!(path = %self.root.display(), "Nothing to commit");
            return Ok(None);
        }

        let full_message = author.message(message);
        self.git.run(&["commit", "-m", &full_message]).await?;

        let sha = self.git.run(&["rev-parse", "HEAD"]).await?;
        let sha = sha.trimmed().to_string();
        info!(sha = %sha, "Committed");
        Ok(Some(sha))
    }

    /// Push `branch` to origin
    ///
    /// Without any commit the push sets upstream directly. Otherwise a plain
    /// push is tried first and retried with upstream tracking, except for
    /// credential failures and timeouts.
    pub async fn push(&self, branch: &str) -> Result<()> {
        let has_head = self.head_commit().into_result()?.is_some();

        self.with_auth(move || async move {
            if !has_head {
                return self
                    .git
                    .run_network(&["push", "-u", ORIGIN, branch])
                    .await
                    .map(|_| ());
            }

            match self.git.run_network(&["push", ORIGIN, branch]).await {
                Ok(_) => Ok(()),
                Err(e @ (Error::RemoteAuth(_) | Error::Timeout { .. })) => Err(e),
                Err(e) => {
                    debug!(branch, error = %e, "Plain push failed, retrying with upstream");
                    self.git
                        .run_network(&["push", "-u", ORIGIN, branch])
                        .await
                        .map(|_| ())
                }
            }
        })
        .await?;

        info!(branch, "Pushed");
        Ok(())
    }

    /// Drop staged, modified and untracked files so a checkout cannot refuse
    async fn discard_local_changes(&self) -> Result<()> {
        if self.head_commit().into_result()?.is_some() {
            self.git.run(&["reset", "--hard", "-q"]).await?;
        } else {
            self.git.run(&["read-tree", "--empty"]).await?;
        }
        self.git.run(&["clean", "-fdq"]).await?;
        Ok(())
    }

    /// Make the working tree identical to `origin/<branch>`
    ///
    /// Local commits and edits on the branch are discarded.
    pub async fn pull_reset(&self, branch: &str) -> Result<()> {
        self.fetch().await?;

        if self.remote_branch(branch).into_result()?.is_none() {
            return Err(Error::NotFound(format!(
                "remote branch '{}/{}'",
                ORIGIN, branch
            )));
        }

        self.discard_local_changes().await?;
        self.checkout_branch(branch).await?;

        let upstream = format!("{}/{}", ORIGIN, branch);
        self.git.run(&["reset", "--hard", &upstream]).await?;
        self.git.run(&["clean", "-fd"]).await?;

        info!(branch, "Reset working tree to remote");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::process::Command;
    use tempfile::TempDir;

    pub(crate) fn git_available() -> bool {
        Command::new("git")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// A bare repository to act as origin
    pub(crate) fn bare_remote(dir: &Path) -> RemoteUrl {
        let status = Command::new("git")
            .args(["init", "--bare", "-q"])
            .arg(dir)
            .status()
            .unwrap();
        assert!(status.success());
        RemoteUrl::parse(dir.to_str().unwrap()).unwrap()
    }

    fn author() -> CommitAuthor {
        CommitAuthor::new("acme", "u1", "alice")
    }

    #[test]
    fn test_commit_message_prefix() {
        assert_eq!(author().message("Add topic"), "acme/u1/alice: Add topic");
        assert_eq!(author().message("  "), "acme/u1/alice: Update mindmap");
    }

    #[tokio::test]
    async fn test_ensure_repo_reports_prior_state() {
        if !git_available() {
            return;
        }
        let temp = TempDir::new().unwrap();
        let repo = GitRepo::new(temp.path().join("wd"), &GitConfig::default());

        assert_eq!(repo.state().unwrap(), RepoState::Uninitialized);
        assert_eq!(repo.ensure_repo().await.unwrap(), RepoState::Uninitialized);
        assert_eq!(repo.ensure_repo().await.unwrap(), RepoState::Empty);
        assert!(!repo.has_origin());
    }

    #[tokio::test]
    async fn test_commit_if_dirty() {
        if !git_available() {
            return;
        }
        let temp = TempDir::new().unwrap();
        let repo = GitRepo::new(temp.path().join("wd"), &GitConfig::default());
        repo.prepare("main").await.unwrap();

        assert_eq!(repo.commit_if_dirty("nothing", &author()).await.unwrap(), None);

        std::fs::write(repo.root().join("README.md"), "hello").unwrap();
        let sha = repo.commit_if_dirty("first", &author()).await.unwrap().unwrap();
        assert_eq!(sha.len(), 40);
        assert_eq!(repo.state().unwrap(), RepoState::HasHistory);
        assert_eq!(repo.current_branch().found().as_deref(), Some("main"));

        let log = repo.command().run(&["log", "-1", "--format=%s%n%an"]).await.unwrap();
        assert_eq!(log.trimmed(), "acme/u1/alice: first\nMindSync Bot");

        assert_eq!(repo.commit_if_dirty("again", &author()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_push_and_pull_reset_through_bare_remote() {
        if !git_available() {
            return;
        }
        let temp = TempDir::new().unwrap();
        let remote = bare_remote(&temp.path().join("origin.git"));

        let writer = GitRepo::new(temp.path().join("writer"), &GitConfig::default())
            .with_remote(Some(remote.clone()));
        writer.prepare("main").await.unwrap();
        assert!(writer.has_origin());
        std::fs::write(writer.root().join("README.md"), "v1").unwrap();
        writer.commit_if_dirty("v1", &author()).await.unwrap();
        writer.push("main").await.unwrap();

        let reader = GitRepo::new(temp.path().join("reader"), &GitConfig::default())
            .with_remote(Some(remote));
        reader.prepare("main").await.unwrap();
        std::fs::write(reader.root().join("stray.md"), "local only").unwrap();
        reader.pull_reset("main").await.unwrap();

        assert_eq!(
            std::fs::read_to_string(reader.root().join("README.md")).unwrap(),
            "v1"
        );
        assert!(!reader.root().join("stray.md").exists());

        // second push of an existing branch goes through the plain path
        std::fs::write(writer.root().join("README.md"), "v2").unwrap();
        writer.commit_if_dirty("v2", &author()).await.unwrap();
        writer.push("main").await.unwrap();
    }

    #[tokio::test]
    async fn test_pull_reset_missing_remote_branch() {
        if !git_available() {
            return;
        }
        let temp = TempDir::new().unwrap();
        let remote = bare_remote(&temp.path().join("origin.git"));
        let repo = GitRepo::new(temp.path().join("wd"), &GitConfig::default())
            .with_remote(Some(remote));
        repo.prepare("feature").await.unwrap();

        let err = repo.pull_reset("feature").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_push_without_token_fails_before_network() {
        if !git_available() {
            return;
        }
        let temp = TempDir::new().unwrap();
        let remote = RemoteUrl::parse("acme/notes").unwrap();
        let repo = GitRepo::new(temp.path().join("wd"), &GitConfig::default())
            .with_remote(Some(remote));
        repo.ensure_repo().await.unwrap();

        let err = repo.push("main").await.unwrap_err();
        assert!(matches!(err, Error::RemoteAuth(_)));

        // origin stays token-free
        let url = repo.command().run(&["remote", "get-url", "origin"]).await.unwrap();
        assert_eq!(url.trimmed(), "https://github.com/acme/notes.git");
    }
}
