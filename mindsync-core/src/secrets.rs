//! Credentials for the remote
//!
//! The access token authorizes pushes, pulls and repository creation. It is
//! never written to `config.toml` or to a mindmap document. Resolution order:
//! `MINDSYNC_GITHUB_TOKEN`, `GITHUB_TOKEN`, then the `[remote] token` entry of
//! `~/.config/mindsync/secrets.toml`. The file is refused unless only its
//! owner can read it.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{Error, Result};

const TOKEN_VARS: &[&str] = &["MINDSYNC_GITHUB_TOKEN", "GITHUB_TOKEN"];

const TEMPLATE: &str = r#"# MindSync credentials. Keep this file private (chmod 600).

[remote]
# Token used for HTTPS pushes/pulls and for creating GitHub repositories.
# Needs the `repo` scope: https://github.com/settings/tokens
token = ""
"#;

#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Secrets {
    pub remote: RemoteCredentials,
}

#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RemoteCredentials {
    pub token: Option<String>,
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secrets").field("remote", &self.remote).finish()
    }
}

impl fmt::Debug for RemoteCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let masked = self.token.as_ref().map(|_| "***");
        f.debug_struct("RemoteCredentials")
            .field("token", &masked)
            .finish()
    }
}

impl Secrets {
    /// Read the default secrets file, or nothing if it is absent
    pub fn load() -> Result<Self> {
        match Self::default_secrets_path() {
            Some(path) if path.exists() => Self::load_from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        ensure_private(path)?;

        let raw = std::fs::read_to_string(path)?;
        let mut secrets: Secrets = toml::from_str(&raw).map_err(|e| {
            Error::Config(format!("invalid secrets file {}: {}", path.display(), e))
        })?;
        secrets.remote.token = secrets
            .remote
            .token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        Ok(secrets)
    }

    /// `~/.config/mindsync/secrets.toml` on Unix
    pub fn default_secrets_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("mindsync").join("secrets.toml"))
    }

    /// Token for the remote; the environment wins over the file
    pub fn github_token(&self) -> Option<String> {
        let from_env = TOKEN_VARS.iter().find_map(|var| {
            let value = std::env::var(var).ok()?;
            let value = value.trim();
            (!value.is_empty()).then(|| {
                debug!(var, "Remote token taken from environment");
                value.to_string()
            })
        });
        from_env.or_else(|| self.remote.token.clone())
    }

    /// Write the template to the default location
    pub fn create_template() -> Result<PathBuf> {
        let path = Self::default_secrets_path()
            .ok_or_else(|| Error::Config("Could not determine secrets path".to_string()))?;
        Self::write_template(&path)?;
        Ok(path)
    }

    /// Write the template to `path` with mode 0600; never overwrites
    pub fn write_template(path: &Path) -> Result<()> {
        if path.exists() {
            return Err(Error::Config(format!(
                "Secrets file already exists at {}",
                path.display()
            )));
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, TEMPLATE)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        warn!(path = %path.display(), "Secrets template written; add a token before pushing");
        Ok(())
    }
}

#[cfg(unix)]
fn ensure_private(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mode = std::fs::metadata(path)?.permissions().mode() & 0o777;
    if mode & 0o077 != 0 {
        return Err(Error::Config(format!(
            "Secrets file {} is readable by others (mode {:o}); run: chmod 600 {}",
            path.display(),
            mode,
            path.display()
        )));
    }
    Ok(())
}

#[cfg(not(unix))]
fn ensure_private(_path: &Path) -> Result<()> {
    Ok(())
}
