//! Remote repository configuration

use clap::{Args, Subcommand};
use mindsync_core::DocumentStore;
use mindsync_github::{repo_name_for, GitHubClient};

use super::{report, Context};

#[derive(Args, Debug)]
pub struct RemoteArgs {
    #[command(subcommand)]
    pub command: RemoteCommand,
}

#[derive(Subcommand, Debug)]
pub enum RemoteCommand {
    /// Use an existing repository (URL, path or owner/repo)
    Set {
        /// Mindmap id
        mmid: i64,

        url: String,
    },

    /// Forget the remote
    Clear {
        /// Mindmap id
        mmid: i64,
    },

    /// Create a GitHub repository (or adopt an existing one) and use it
    Create {
        /// Mindmap id
        mmid: i64,

        /// Repository name (defaults to one derived from the title)
        #[arg(short, long)]
        name: Option<String>,

        /// Organization to create it in (defaults to [github] owner, then
        /// the token's user)
        #[arg(short, long)]
        owner: Option<String>,

        /// Make the repository public
        #[arg(long)]
        public: bool,
    },
}

impl RemoteArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        match &self.command {
            RemoteCommand::Set { mmid, url } => {
                let orchestrator = ctx.orchestrator().await?;
                let outcome = orchestrator.set_remote(&ctx.domain, *mmid, Some(url.as_str())).await;
                report("Remote set", &outcome, ctx.json)
            }
            RemoteCommand::Clear { mmid } => {
                let orchestrator = ctx.orchestrator().await?;
                let outcome = orchestrator.set_remote(&ctx.domain, *mmid, None).await;
                report("Remote cleared", &outcome, ctx.json)
            }
            RemoteCommand::Create {
                mmid,
                name,
                owner,
                public,
            } => {
                let orchestrator = ctx.orchestrator().await?;
                let mindmap = orchestrator.store().load_mindmap(&ctx.domain, *mmid).await?;

                let name = name.clone().unwrap_or_else(|| repo_name_for(&mindmap.title));
                let owner = owner.clone().or_else(|| ctx.config.github.owner.clone());
                let private = !public && ctx.config.github.private;

                let client = GitHubClient::from_secrets(&ctx.secrets)?;
                let repo = client
                    .ensure_repository(owner.as_deref(), &name, private)
                    .await?;
                if repo.created {
                    println!("Created {}/{}", repo.owner, repo.name);
                } else {
                    println!("Using existing {}/{}", repo.owner, repo.name);
                }

                let outcome = orchestrator
                    .set_remote(&ctx.domain, *mmid, Some(repo.clone_url.as_str()))
                    .await;
                report("Remote set", &outcome, ctx.json)
            }
        }
    }
}
