//! Running the external `git` tool

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, trace};

use crate::{Error, Result};

/// Outcome of an existence check
///
/// Keeps "it is not there" apart from "we could not tell", so a missing
/// branch is never confused with a broken repository.
#[derive(Debug)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
    Error(Error),
}

impl<T> Lookup<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    /// The found value, treating errors as absence
    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(v) => Some(v),
            Lookup::NotFound | Lookup::Error(_) => None,
        }
    }

    /// Escalate errors, keep absence as `None`
    pub fn into_result(self) -> Result<Option<T>> {
        match self {
            Lookup::Found(v) => Ok(Some(v)),
            Lookup::NotFound => Ok(None),
            Lookup::Error(e) => Err(e),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        match self {
            Lookup::Found(v) => Lookup::Found(f(v)),
            Lookup::NotFound => Lookup::NotFound,
            Lookup::Error(e) => Lookup::Error(e),
        }
    }
}

impl<T> From<std::result::Result<T, git2::Error>> for Lookup<T> {
    fn from(result: std::result::Result<T, git2::Error>) -> Self {
        match result {
            Ok(v) => Lookup::Found(v),
            Err(e)
                if matches!(
                    e.code(),
                    git2::ErrorCode::NotFound | git2::ErrorCode::UnbornBranch
                ) =>
            {
                Lookup::NotFound
            }
            Err(e) => Lookup::Error(Error::Git {
                command: "libgit2".to_string(),
                message: e.message().to_string(),
            }),
        }
    }
}

/// Captured output of a successful invocation
#[derive(Debug, Clone, Default)]
pub struct GitOutput {
    pub stdout: String,
    pub stderr: String,
}

impl GitOutput {
    /// stdout without the trailing newline
    pub fn trimmed(&self) -> &str {
        self.stdout.trim_end()
    }
}

/// Runs git subcommands in one working directory with bounded time
#[derive(Debug, Clone)]
pub struct GitCommand {
    program: String,
    workdir: PathBuf,
    timeout: Duration,
    network_timeout: Duration,
}

impl GitCommand {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            program: "git".to_string(),
            workdir: workdir.into(),
            timeout: Duration::from_secs(30),
            network_timeout: Duration::from_secs(120),
        }
    }

    /// Use a different git executable
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_timeouts(mut self, local: Duration, network: Duration) -> Self {
        self.timeout = local;
        self.network_timeout = network;
        self
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Run a local subcommand
    pub async fn run(&self, args: &[&str]) -> Result<GitOutput> {
        self.run_with_limit(args, self.timeout).await
    }

    /// Run a subcommand that talks to a remote
    pub async fn run_network(&self, args: &[&str]) -> Result<GitOutput> {
        self.run_with_limit(args, self.network_timeout).await
    }

    /// Run a subcommand whose non-zero exit means "absent"
    pub async fn lookup(&self, args: &[&str]) -> Lookup<String> {
        match self.run(args).await {
            Ok(output) => Lookup::Found(output.trimmed().to_string()),
            Err(Error::Git { .. }) | Err(Error::NotFound(_)) => Lookup::NotFound,
            Err(e) => Lookup::Error(e),
        }
    }

    async fn run_with_limit(&self, args: &[&str], limit: Duration) -> Result<GitOutput> {
        let name = subcommand_name(args);
        trace!(command = %name, workdir = %self.workdir.display(), "Running git");

        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .current_dir(&self.workdir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .env("LC_ALL", "C")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(limit, cmd.output()).await {
            Ok(result) => result.map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::Config(format!(
                        "git executable not found at '{}'. Is git installed?",
                        self.program
                    ))
                } else {
                    Error::Io(e)
                }
            })?,
            Err(_) => {
                return Err(Error::Timeout {
                    command: name,
                    after: limit,
                })
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            debug!(command = %name, status = ?output.status.code(), "git exited non-zero");
            let message = if stderr.trim().is_empty() { &stdout } else { &stderr };
            return Err(Error::from_git_failure(name, message));
        }

        Ok(GitOutput { stdout, stderr })
    }
}

/// First argument that is not a global `-c key=value` option
fn subcommand_name(args: &[&str]) -> String {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if *arg == "-c" {
            iter.next();
            continue;
        }
        if !arg.starts_with('-') {
            return arg.to_string();
        }
    }
    "git".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use tempfile::TempDir;

    #[test]
    fn test_subcommand_name_skips_config() {
        assert_eq!(subcommand_name(&["-c", "core.quotePath=false", "status"]), "status");
        assert_eq!(subcommand_name(&["push", "-u", "origin", "main"]), "push");
        assert_eq!(subcommand_name(&[]), "git");
    }

    #[test]
    fn test_lookup_conversions() {
        let found: Lookup<u8> = Lookup::Found(1);
        assert_eq!(found.into_result().unwrap(), Some(1));
        let missing: Lookup<u8> = Lookup::NotFound;
        assert!(missing.into_result().unwrap().is_none());
        let broken: Lookup<u8> = Lookup::Error(Error::Config("x".to_string()));
        assert!(broken.into_result().is_err());
    }

    #[tokio::test]
    async fn test_missing_executable_is_config_error() {
        let temp = TempDir::new().unwrap();
        let git = GitCommand::new(temp.path()).with_program("/nonexistent/git-binary-12345");
        let err = git.run(&["status"]).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_git2_not_found_is_absence() {
        let missing: Lookup<()> = Lookup::from(Err(git2::Error::new(
            git2::ErrorCode::NotFound,
            git2::ErrorClass::Reference,
            "no such ref",
        )));
        assert!(matches!(missing, Lookup::NotFound));

        let broken: Lookup<()> = Lookup::from(Err(git2::Error::from_str("corrupt index")));
        assert!(matches!(broken, Lookup::Error(Error::Git { .. })));
    }

    #[tokio::test]
    async fn test_slow_command_times_out() {
        let temp = TempDir::new().unwrap();
        let git = GitCommand::new(temp.path());
        if git.run(&["--version"]).await.is_err() {
            return;
        }

        let git = git.with_timeouts(Duration::from_nanos(1), Duration::from_nanos(1));
        let err = git.run(&["--version"]).await.unwrap_err();
        assert!(matches!(err, Error::Timeout { ref command, .. } if command == "git"));
        assert_eq!(err.kind(), ErrorKind::Timeout);

        let err = git.run_network(&["ls-remote", "."]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
    }

    #[tokio::test]
    async fn test_lookup_outside_repository_is_not_found() {
        let temp = TempDir::new().unwrap();
        let git = GitCommand::new(temp.path());
        if git.run(&["--version"]).await.is_err() {
            return;
        }
        let lookup = git
            .lookup(&["-c", "safe.directory=*", "rev-parse", "--verify", "HEAD"])
            .await;
        assert!(matches!(lookup, Lookup::NotFound));
    }
}
