//! GitHub API client using octocrab

use mindsync_core::Secrets;
use octocrab::models::Repository;
use octocrab::Octocrab;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::{Error, Result};

/// Request body for `POST /user/repos` and `POST /orgs/{org}/repos`
#[derive(Debug, Serialize)]
struct CreateRepository<'a> {
    name: &'a str,
    private: bool,
    description: &'a str,
    auto_init: bool,
}

/// The repository a mindmap is mirrored to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRepository {
    pub owner: String,
    pub name: String,
    pub clone_url: Url,
    pub html_url: Option<Url>,
    pub private: bool,
    /// False when an existing repository was adopted
    pub created: bool,
}

impl RemoteRepository {
    fn from_api(repo: Repository, created: bool) -> Result<Self> {
        let clone_url = repo
            .clone_url
            .ok_or_else(|| Error::Parse(format!("repository '{}' has no clone URL", repo.name)))?;
        let owner = repo
            .owner
            .map(|o| o.login)
            .ok_or_else(|| Error::Parse(format!("repository '{}' has no owner", repo.name)))?;

        Ok(Self {
            owner,
            name: repo.name,
            clone_url,
            html_url: repo.html_url,
            private: repo.private.unwrap_or(false),
            created,
        })
    }
}

/// GitHub API client for repository provisioning
pub struct GitHubClient {
    client: Octocrab,
}

impl GitHubClient {
    /// Create a client authenticated with a personal access token
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let client = Octocrab::builder()
            .personal_token(token.into())
            .build()
            .map_err(|e| Error::Auth(format!("Failed to create GitHub client: {}", e)))?;
        Ok(Self { client })
    }

    /// Create a client from loaded secrets
    ///
    /// Token priority: `MINDSYNC_GITHUB_TOKEN`, `GITHUB_TOKEN`, then
    /// `~/.config/mindsync/secrets.toml`.
    pub fn from_secrets(secrets: &Secrets) -> Result<Self> {
        let token = secrets.github_token().ok_or_else(|| {
            Error::Auth(
                "GitHub token not found. Set GITHUB_TOKEN environment variable \
                 or add token to ~/.config/mindsync/secrets.toml"
                    .to_string(),
            )
        })?;
        Self::new(token)
    }

    /// Get the underlying octocrab client
    pub fn client(&self) -> &Octocrab {
        &self.client
    }

    /// Create `name` under `owner` (an organization) or the authenticated
    /// user, adopting the existing repository when the name is taken
    pub async fn ensure_repository(
        &self,
        owner: Option<&str>,
        name: &str,
        private: bool,
    ) -> Result<RemoteRepository> {
        validate_repo_name(name)?;

        let route = match owner {
            Some(org) => format!("/orgs/{}/repos", org),
            None => "/user/repos".to_string(),
        };
        let body = CreateRepository {
            name,
            private,
            description: "Mindmap synced by MindSync",
            auto_init: false,
        };

        debug!(route = %route, name, private, "Creating GitHub repository");
        match self.client.post::<_, Repository>(&route, Some(&body)).await {
            Ok(repo) => {
                let repo = RemoteRepository::from_api(repo, true)?;
                info!(owner = %repo.owner, name = %repo.name, "Created GitHub repository");
                Ok(repo)
            }
            Err(e) if is_name_taken(&e) => {
                let owner = match owner {
                    Some(org) => org.to_string(),
                    None => self.current_login().await?,
                };
                let repo = self.client.repos(&owner, name).get().await?;
                let repo = RemoteRepository::from_api(repo, false)?;
                info!(owner = %repo.owner, name = %repo.name, "Using existing GitHub repository");
                Ok(repo)
            }
            Err(e) => Err(classify(e)),
        }
    }

    /// Login of the token's user
    pub async fn current_login(&self) -> Result<String> {
        let user = self.client.current().user().await.map_err(classify)?;
        Ok(user.login)
    }
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient").finish_non_exhaustive()
    }
}

/// Repository name derived from a mindmap title
///
/// Keeps ASCII alphanumerics, `.`, `_` and `-`; everything else becomes a
/// single `-`.
pub fn repo_name_for(title: &str) -> String {
    let mut name = String::new();
    for c in title.trim().chars() {
        if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
            name.push(c.to_ascii_lowercase());
        } else if !name.ends_with('-') {
            name.push('-');
        }
    }
    let name = name.trim_matches('-').trim_start_matches('.');
    if name.is_empty() {
        "mindmap".to_string()
    } else {
        name.to_string()
    }
}

fn validate_repo_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name.len() <= 100
        && name != "."
        && name != ".."
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidName(format!(
            "'{}' (use letters, digits, '.', '_' or '-')",
            name
        )))
    }
}

/// True when GitHub rejected a create because the name already exists
fn is_name_taken(err: &octocrab::Error) -> bool {
    let octocrab::Error::GitHub { source, .. } = err else {
        return false;
    };
    let mut text = source.message.to_lowercase();
    if let Some(errors) = &source.errors {
        for detail in errors {
            text.push(' ');
            text.push_str(&detail.to_string().to_lowercase());
        }
    }
    text.contains("already exists")
}

fn classify(err: octocrab::Error) -> Error {
    match err {
        octocrab::Error::GitHub { source, .. }
            if source.message.contains("Bad credentials")
                || source.message.contains("Requires authentication") =>
        {
            Error::Auth("Invalid GitHub token".to_string())
        }
        other => Error::Api(other),
    }
}
