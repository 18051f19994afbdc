//! Repository status as reported to callers
//!
//! Every query is guarded on its own; a failing subcommand leaves its fields
//! at their defaults instead of failing the whole report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::repo::{GitRepo, RepoState, ORIGIN};

/// Length of abbreviated shas
const SHORT_SHA_LEN: usize = 7;

/// Length of abbreviated commit subjects
const SHORT_MESSAGE_LEN: usize = 50;

/// Uncommitted paths, relative to the working directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChanges {
    pub added: Vec<String>,
    pub modified: Vec<String>,
    pub deleted: Vec<String>,
}

impl FileChanges {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.deleted.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoStatus {
    pub has_local_repo: bool,
    pub has_local_branch: bool,
    pub has_remote: bool,
    pub has_remote_branch: bool,
    pub local_commits: u64,
    pub remote_commits: u64,
    pub ahead: u64,
    pub behind: u64,
    pub uncommitted_changes: bool,
    pub current_branch: Option<String>,
    pub last_commit: Option<String>,
    pub last_commit_short: Option<String>,
    pub last_commit_message: Option<String>,
    pub last_commit_message_short: Option<String>,
    pub last_commit_time: Option<DateTime<Utc>>,
    pub changes: FileChanges,
}

impl GitRepo {
    /// Compute the status of `branch`; never fails
    ///
    /// With `refresh`, origin is fetched first so ahead/behind reflect the
    /// remote rather than the last fetch.
    pub async fn compute_status(&self, branch: &str, refresh: bool) -> RepoStatus {
        let mut status = RepoStatus::default();

        match self.state() {
            Ok(RepoState::Uninitialized) => return status,
            Ok(_) => status.has_local_repo = true,
            Err(e) => {
                debug!(error = %e, "Repository unreadable");
                return status;
            }
        }

        status.has_remote = self.remote().is_some() && self.has_origin();
        if refresh && status.has_remote {
            if let Err(e) = self.fetch().await {
                debug!(branch, error = %e, "Status fetch failed; using last known remote refs");
            }
        }

        status.current_branch = self.current_branch().found();
        status.has_local_branch = self.local_branch(branch).is_found();
        status.has_remote_branch = self.remote_branch(branch).is_found();

        let local_ref = format!("refs/heads/{}", branch);
        let remote_ref = format!("refs/remotes/{}/{}", ORIGIN, branch);
        let git = self.command();

        if status.has_local_branch {
            status.local_commits = git
                .lookup(&["rev-list", "--count", &local_ref, "--"])
                .await
                .found()
                .and_then(|n| n.parse().ok())
                .unwrap_or(0);

            if let Some(line) = git
                .lookup(&["log", "-1", "--format=%H%x1f%s%x1f%cI", &local_ref, "--"])
                .await
                .found()
            {
                apply_last_commit(&mut status, &line);
            }
        }

        if status.has_remote_branch {
            status.remote_commits = git
                .lookup(&["rev-list", "--count", &remote_ref, "--"])
                .await
                .found()
                .and_then(|n| n.parse().ok())
                .unwrap_or(0);
        }

        if status.has_local_branch && status.has_remote_branch {
            let range = format!("{}...{}", local_ref, remote_ref);
            if let Some((ahead, behind)) = git
                .lookup(&["rev-list", "--left-right", "--count", &range, "--"])
                .await
                .found()
                .and_then(|out| parse_left_right(&out))
            {
                status.ahead = ahead;
                status.behind = behind;
            }
        }

        if let Some(out) = git
            .lookup(&["-c", "core.quotePath=false", "status", "--porcelain", "-uall"])
            .await
            .found()
        {
            status.changes = parse_porcelain(&out);
            status.uncommitted_changes = !status.changes.is_empty();
        }

        status
    }
}

/// `"<left>\t<right>"` from `rev-list --left-right --count`
fn parse_left_right(output: &str) -> Option<(u64, u64)> {
    let mut parts = output.split_whitespace();
    let ahead = parts.next()?.parse().ok()?;
    let behind = parts.next()?.parse().ok()?;
    Some((ahead, behind))
}

/// Fill the last-commit fields from `%H%x1f%s%x1f%cI`
fn apply_last_commit(status: &mut RepoStatus, line: &str) {
    let mut fields = line.splitn(3, '\x1f');
    let (Some(sha), Some(subject), Some(time)) = (fields.next(), fields.next(), fields.next())
    else {
        return;
    };

    status.last_commit_short = Some(sha.chars().take(SHORT_SHA_LEN).collect());
    status.last_commit = Some(sha.to_string());
    status.last_commit_message_short = Some(shorten(subject, SHORT_MESSAGE_LEN));
    status.last_commit_message = Some(subject.to_string());
    status.last_commit_time = DateTime::parse_from_rfc3339(time.trim())
        .ok()
        .map(|t| t.with_timezone(&Utc));
}

/// First line, cut to `max` characters with a trailing ellipsis
fn shorten(message: &str, max: usize) -> String {
    let first = message.lines().next().unwrap_or("");
    if first.chars().count() <= max {
        return first.to_string();
    }
    let mut short: String = first.chars().take(max).collect();
    short.push_str("...");
    short
}

/// Classify `git status --porcelain` (v1) lines
pub fn parse_porcelain(output: &str) -> FileChanges {
    let mut changes = FileChanges::default();

    for line in output.lines() {
        if line.len() < 4 {
            continue;
        }
        let (code, rest) = line.split_at(2);
        let path = rest.trim_start();
        // renames report "old -> new"
        let path = path.rsplit(" -> ").next().unwrap_or(path);
        let path = unquote(path);

        let mut flags = code.chars();
        let index = flags.next().unwrap_or(' ');
        let worktree = flags.next().unwrap_or(' ');

        if code == "??" || index == 'A' || worktree == 'A' {
            changes.added.push(path);
        } else if index == 'D' || worktree == 'D' {
            changes.deleted.push(path);
        } else {
            changes.modified.push(path);
        }
    }

    changes
}

fn unquote(path: &str) -> String {
    path.strip_prefix('"')
        .and_then(|p| p.strip_suffix('"'))
        .unwrap_or(path)
        .replace("\\\"", "\"")
        .replace("\\\\", "\\")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GitConfig;
    use crate::git::test_support::{bare_remote, git_available};
    use crate::git::CommitAuthor;
    use tempfile::TempDir;

    #[test]
    fn test_parse_porcelain() {
        let out = "?? Topic/Card A.md\nA  New/.keep\n M README.md\nD  Old/.keep\n D Gone.md\nR  a.md -> b.md\n";
        let changes = parse_porcelain(out);
        assert_eq!(changes.added, vec!["Topic/Card A.md", "New/.keep"]);
        assert_eq!(changes.modified, vec!["README.md", "b.md"]);
        assert_eq!(changes.deleted, vec!["Old/.keep", "Gone.md"]);
        assert!(parse_porcelain("").is_empty());
    }

    #[test]
    fn test_parse_quoted_path() {
        let changes = parse_porcelain("?? \"with \\\"quote\\\".md\"\n");
        assert_eq!(changes.added, vec!["with \"quote\".md"]);
    }

    #[test]
    fn test_last_commit_fields() {
        let mut status = RepoStatus::default();
        let subject = "acme/u1/alice: a rather long commit subject that goes past fifty characters";
        let line = format!(
            "0123456789abcdef0123456789abcdef01234567\x1f{}\x1f2024-05-01T10:00:00+02:00",
            subject
        );
        apply_last_commit(&mut status, &line);

        assert_eq!(status.last_commit_short.as_deref(), Some("0123456"));
        assert_eq!(status.last_commit_message.as_deref(), Some(subject));
        let short = status.last_commit_message_short.unwrap();
        assert_eq!(short.chars().count(), SHORT_MESSAGE_LEN + 3);
        assert!(short.ends_with("..."));
        assert_eq!(
            status.last_commit_time.unwrap().to_rfc3339(),
            "2024-05-01T08:00:00+00:00"
        );
    }

    #[test]
    fn test_left_right() {
        assert_eq!(parse_left_right("2\t5"), Some((2, 5)));
        assert_eq!(parse_left_right("garbage"), None);
    }

    #[test]
    fn test_status_serializes_camel_case() {
        let json = serde_json::to_value(RepoStatus::default()).unwrap();
        assert!(json.get("hasLocalRepo").is_some());
        assert!(json.get("lastCommitMessageShort").is_some());
        assert!(json.get("uncommittedChanges").is_some());
        assert!(json["changes"].get("added").is_some());
    }

    #[tokio::test]
    async fn test_status_without_repository() {
        let temp = TempDir::new().unwrap();
        let repo = GitRepo::new(temp.path().join("missing"), &GitConfig::default());
        let status = repo.compute_status("main", true).await;
        assert_eq!(status, RepoStatus::default());
    }

    #[tokio::test]
    async fn test_status_ahead_and_uncommitted() {
        if !git_available() {
            return;
        }
        let temp = TempDir::new().unwrap();
        let remote = bare_remote(&temp.path().join("origin.git"));
        let repo = GitRepo::new(temp.path().join("wd"), &GitConfig::default())
            .with_remote(Some(remote));
        let author = CommitAuthor::new("d", "u", "n");

        repo.prepare("main").await.unwrap();
        std::fs::write(repo.root().join("README.md"), "one").unwrap();
        repo.commit_if_dirty("one", &author).await.unwrap();
        repo.push("main").await.unwrap();

        std::fs::write(repo.root().join("README.md"), "two").unwrap();
        repo.commit_if_dirty("two", &author).await.unwrap();
        std::fs::write(repo.root().join("new.md"), "draft").unwrap();

        let status = repo.compute_status("main", true).await;
        assert!(status.has_local_repo);
        assert!(status.has_remote);
        assert!(status.has_local_branch);
        assert!(status.has_remote_branch);
        assert_eq!(status.local_commits, 2);
        assert_eq!(status.remote_commits, 1);
        assert_eq!(status.ahead, 1);
        assert_eq!(status.behind, 0);
        assert!(status.uncommitted_changes);
        assert_eq!(status.changes.added, vec!["new.md"]);
        assert_eq!(status.current_branch.as_deref(), Some("main"));
        assert_eq!(status.last_commit_message.as_deref(), Some("d/u/n: two"));
    }
}
