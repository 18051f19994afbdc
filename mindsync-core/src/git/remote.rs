//! Remote URL parsing and access-token injection

use std::fmt;

use crate::{Error, Result};

const GITHUB_HOST: &str = "github.com";

/// How a remote is reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteKind {
    /// `git@host:owner/repo.git` or `ssh://...`; credentials come from the agent
    Ssh,
    /// `https://...`
    Https,
    /// A filesystem path or `file://` URL
    Local,
}

/// A configured remote, always stored without credentials
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteUrl {
    url: String,
    kind: RemoteKind,
    /// Whether pushes and fetches need a token spliced into the URL
    needs_token: bool,
}

impl fmt::Debug for RemoteUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteUrl")
            .field("url", &redact_url(&self.url))
            .field("kind", &self.kind)
            .finish()
    }
}

impl fmt::Display for RemoteUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&redact_url(&self.url))
    }
}

impl RemoteUrl {
    /// Parse a remote URL or shorthand
    ///
    /// Supports:
    /// - `git@github.com:owner/repo.git` and `ssh://` URLs (used verbatim)
    /// - `https://github.com/owner/repo(.git)` (token injected on demand);
    ///   `http://github.com/...` is upgraded to https
    /// - `owner/repo` (expanded to GitHub over https)
    /// - `/abs/path`, `./rel`, `../rel`, `file://...` (used verbatim)
    ///
    /// URLs carrying a user or password are rejected: the result is persisted
    /// on the document, and credentials belong in `secrets.toml`.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(Error::Validation("remote URL is empty".to_string()));
        }

        if input.starts_with("git@") {
            return Ok(Self::verbatim(input, RemoteKind::Ssh));
        }

        if input.starts_with("ssh://") {
            let url = parse_url(input)?;
            if url.password().is_some() {
                return Err(embedded_credentials(input));
            }
            return Ok(Self::verbatim(input, RemoteKind::Ssh));
        }

        if input.starts_with("file://")
            || input.starts_with('/')
            || input.starts_with("./")
            || input.starts_with("../")
        {
            return Ok(Self::verbatim(input, RemoteKind::Local));
        }

        if input.starts_with("https://") || input.starts_with("http://") {
            let mut url = parse_url(input)?;
            if !url.username().is_empty() || url.password().is_some() {
                return Err(embedded_credentials(input));
            }
            let is_github = url.host_str() == Some(GITHUB_HOST);
            if is_github && url.scheme() == "http" && url.set_scheme("https").is_err() {
                return Err(Error::Validation(format!("Invalid remote URL: {}", input)));
            }
            let needs_token = is_github && url.scheme() == "https";
            let url = if is_github { url.to_string() } else { input.to_string() };
            return Ok(Self {
                url,
                kind: RemoteKind::Https,
                needs_token,
            });
        }

        if let Some((owner, repo)) = parse_shorthand(input) {
            return Ok(Self {
                url: format!("https://{}/{}/{}.git", GITHUB_HOST, owner, repo),
                kind: RemoteKind::Https,
                needs_token: true,
            });
        }

        Err(Error::Validation(format!(
            "Invalid remote URL: {}. Expected owner/repo, https://github.com/owner/repo, git@github.com:owner/repo.git or a local path",
            input
        )))
    }

    fn verbatim(input: &str, kind: RemoteKind) -> Self {
        Self {
            url: input.to_string(),
            kind,
            needs_token: false,
        }
    }

    /// The URL as stored in git config, never carrying a token we added
    pub fn as_str(&self) -> &str {
        &self.url
    }

    pub fn kind(&self) -> RemoteKind {
        self.kind
    }

    pub fn needs_token(&self) -> bool {
        self.needs_token
    }

    /// URL to use for one network operation
    ///
    /// Fails with [`Error::RemoteAuth`] when the remote needs a token and none
    /// is configured.
    pub fn authenticated(&self, token: Option<&str>) -> Result<String> {
        if !self.needs_token {
            return Ok(self.url.clone());
        }

        let token = token.filter(|t| !t.trim().is_empty()).ok_or_else(|| {
            Error::RemoteAuth(format!(
                "No access token configured for {}. Set MINDSYNC_GITHUB_TOKEN or GITHUB_TOKEN.",
                self
            ))
        })?;

        let (scheme, rest) = self
            .url
            .split_once("://")
            .ok_or_else(|| Error::Validation(format!("Invalid remote URL: {}", self)))?;
        Ok(format!("{}://{}@{}", scheme, token.trim(), rest))
    }

    /// `(owner, repo)` for GitHub remotes
    pub fn github_repo(&self) -> Option<(String, String)> {
        let path = if let Some(rest) = self.url.strip_prefix("git@github.com:") {
            rest.to_string()
        } else {
            let url = url::Url::parse(&self.url).ok()?;
            if url.host_str() != Some(GITHUB_HOST) {
                return None;
            }
            url.path().trim_start_matches('/').to_string()
        };

        let path = path.trim_end_matches('/').trim_end_matches(".git");
        let (owner, repo) = path.split_once('/')?;
        if owner.is_empty() || repo.is_empty() || repo.contains('/') {
            return None;
        }
        Some((owner.to_string(), repo.to_string()))
    }
}

fn parse_url(input: &str) -> Result<url::Url> {
    url::Url::parse(input).map_err(|e| {
        Error::Validation(format!("Invalid remote URL {}: {}", redact_url(input), e))
    })
}

fn embedded_credentials(input: &str) -> Error {
    Error::Validation(format!(
        "Remote URL {} embeds credentials; put the token in secrets.toml instead",
        redact_url(input)
    ))
}

/// `owner/repo` with exactly two non-empty segments
fn parse_shorthand(input: &str) -> Option<(&str, &str)> {
    if input.starts_with('.') || input.contains(':') || input.contains('@') {
        return None;
    }
    let (owner, repo) = input.split_once('/')?;
    let repo = repo.trim_end_matches(".git");
    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return None;
    }
    Some((owner, repo))
}

/// Replace any userinfo in a URL with `***`
pub fn redact_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let authority_end = rest.find('/').unwrap_or(rest.len());
    match rest[..authority_end].rfind('@') {
        Some(at) => format!("{}://***@{}", scheme, &rest[at + 1..]),
        None => url.to_string(),
    }
}

/// Scrub a secret out of an error's message
pub fn redact_error(err: Error, secret: Option<&str>) -> Error {
    let Some(secret) = secret.filter(|s| !s.is_empty()) else {
        return err;
    };
    let scrub = |s: String| s.replace(secret, "***");
    match err {
        Error::Git { command, message } => Error::Git {
            command,
            message: scrub(message),
        },
        Error::RemoteAuth(message) => Error::RemoteAuth(scrub(message)),
        Error::NotFound(message) => Error::NotFound(scrub(message)),
        other => other,
    }
}
