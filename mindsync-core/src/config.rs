//! Configuration management for MindSync
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (MINDSYNC_*)
//! 3. Config file (~/.config/mindsync/config.toml)
//! 4. Default values

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{Error, Result};

/// Git-related configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GitConfig {
    /// Path to the git executable
    pub git_path: String,

    /// Committer name written into every working directory
    pub bot_name: String,

    /// Committer email written into every working directory
    pub bot_email: String,

    /// Limit for local subcommands
    #[serde(with = "humantime_serde")]
    pub command_timeout: Duration,

    /// Limit for fetch and push
    #[serde(with = "humantime_serde")]
    pub network_timeout: Duration,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            git_path: "git".to_string(),
            bot_name: "MindSync Bot".to_string(),
            bot_email: "bot@mindsync.local".to_string(),
            command_timeout: Duration::from_secs(30),
            network_timeout: Duration::from_secs(120),
        }
    }
}

/// Where working directories and the document database live
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root of per-branch working directories (default: ~/.local/share/mindsync/repos)
    pub repos_dir: Option<PathBuf>,

    /// SQLite database file (default: ~/.local/share/mindsync/mindsync.db)
    pub database: Option<PathBuf>,
}

impl StorageConfig {
    pub fn repos_dir(&self) -> Result<PathBuf> {
        match &self.repos_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(default_data_dir()?.join("repos")),
        }
    }

    pub fn database(&self) -> Result<PathBuf> {
        match &self.database {
            Some(path) => Ok(path.clone()),
            None => Ok(default_data_dir()?.join("mindsync.db")),
        }
    }
}

/// GitHub repository creation defaults
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// Organization to create repositories under; the token's user when unset
    pub owner: Option<String>,

    /// Create repositories as private
    pub private: bool,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            owner: None,
            private: true,
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub git: GitConfig,
    pub storage: StorageConfig,
    pub github: GitHubConfig,
}

/// `~/.local/share/mindsync` on Unix
fn default_data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
        .ok_or_else(|| Error::Config("Could not determine data directory".to_string()))?;
    Ok(data_dir.join("mindsync"))
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();

        if let Some(path) = config_path {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/mindsync/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("mindsync").join("config.toml"))
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - MINDSYNC_GIT_PATH: Path to git executable
    /// - MINDSYNC_BOT_NAME / MINDSYNC_BOT_EMAIL: Committer identity
    /// - MINDSYNC_GIT_TIMEOUT / MINDSYNC_NETWORK_TIMEOUT: e.g. "45s", "2m"
    /// - MINDSYNC_REPOS_DIR: Working directory root
    /// - MINDSYNC_DATABASE: SQLite file
    /// - MINDSYNC_GITHUB_OWNER: Organization for new repositories
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(path) = std::env::var("MINDSYNC_GIT_PATH") {
            self.git.git_path = path;
        }
        if let Ok(name) = std::env::var("MINDSYNC_BOT_NAME") {
            self.git.bot_name = name;
        }
        if let Ok(email) = std::env::var("MINDSYNC_BOT_EMAIL") {
            self.git.bot_email = email;
        }
        if let Some(timeout) = env_duration("MINDSYNC_GIT_TIMEOUT") {
            self.git.command_timeout = timeout;
        }
        if let Some(timeout) = env_duration("MINDSYNC_NETWORK_TIMEOUT") {
            self.git.network_timeout = timeout;
        }
        if let Ok(dir) = std::env::var("MINDSYNC_REPOS_DIR") {
            self.storage.repos_dir = Some(PathBuf::from(dir));
        }
        if let Ok(db) = std::env::var("MINDSYNC_DATABASE") {
            self.storage.database = Some(PathBuf::from(db));
        }
        if let Ok(owner) = std::env::var("MINDSYNC_GITHUB_OWNER") {
            self.github.owner = Some(owner);
        }

        self
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(
        mut self,
        repos_dir: Option<PathBuf>,
        database: Option<PathBuf>,
    ) -> Self {
        if let Some(dir) = repos_dir {
            self.storage.repos_dir = Some(dir);
        }

        if let Some(db) = database {
            self.storage.database = Some(db);
        }

        self
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: CLI > env > config file > defaults
    pub fn load_with_overrides(
        config_path: Option<&Path>,
        repos_dir: Option<PathBuf>,
        database: Option<PathBuf>,
    ) -> Result<Self> {
        let base = match config_path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::load()?,
        };
        Ok(base
            .with_env_overrides()
            .with_cli_overrides(repos_dir, database))
    }
}

fn env_duration(var: &str) -> Option<Duration> {
    let raw = std::env::var(var).ok()?;
    match humantime_serde::re::humantime::parse_duration(raw.trim()) {
        Ok(d) => Some(d),
        Err(e) => {
            warn!(var, value = %raw, error = %e, "Ignoring unparseable duration");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.git.git_path, "git");
        assert_eq!(config.git.command_timeout, Duration::from_secs(30));
        assert_eq!(config.git.network_timeout, Duration::from_secs(120));
        assert!(config.github.private);
        assert!(config.storage.repos_dir.is_none());
    }

    #[test]
    fn test_cli_overrides() {
        let config = Config::default().with_cli_overrides(
            Some(PathBuf::from("/srv/repos")),
            Some(PathBuf::from("/srv/db.sqlite")),
        );

        assert_eq!(config.storage.repos_dir().unwrap(), PathBuf::from("/srv/repos"));
        assert_eq!(config.storage.database().unwrap(), PathBuf::from("/srv/db.sqlite"));
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
[git]
bot_name = "Sync Bot"
bot_email = "sync@example.com"
command_timeout = "10s"
network_timeout = "5m"

[storage]
repos_dir = "/var/lib/mindsync/repos"

[github]
owner = "acme"
private = false
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.git.bot_name, "Sync Bot");
        assert_eq!(config.git.command_timeout, Duration::from_secs(10));
        assert_eq!(config.git.network_timeout, Duration::from_secs(300));
        assert_eq!(
            config.storage.repos_dir,
            Some(PathBuf::from("/var/lib/mindsync/repos"))
        );
        assert_eq!(config.github.owner.as_deref(), Some("acme"));
        assert!(!config.github.private);
    }

    #[test]
    fn test_partial_toml() {
        let toml = r#"
[git]
bot_email = "only@example.com"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        // everything else keeps its default
        assert_eq!(config.git.bot_name, "MindSync Bot");
        assert_eq!(config.git.bot_email, "only@example.com");
        assert_eq!(config.git.command_timeout, Duration::from_secs(30));
    }
}
