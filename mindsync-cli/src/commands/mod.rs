//! CLI command implementations

pub mod branch;
pub mod card;
pub mod config;
pub mod flow;
pub mod history;
pub mod map;
pub mod remote;

pub use branch::BranchArgs;
pub use card::CardArgs;
pub use config::ConfigArgs;
pub use flow::{CommitArgs, ExportArgs, PullArgs, PushArgs, SaveArgs, StatusArgs, SyncArgs};
pub use history::HistoryArgs;
pub use map::MapArgs;
pub use remote::RemoteArgs;

use clap::Args;
use mindsync_core::git::CommitAuthor;
use mindsync_core::sync::branch_or_main;
use mindsync_core::{Config, FlowOutcome, Secrets, SyncOrchestrator, SyncTarget};
use mindsync_db::SqliteStore;

/// Settings shared by every command
#[derive(Debug)]
pub struct Context {
    pub config: Config,
    pub secrets: Secrets,
    pub domain: String,
    pub user: String,
    pub verbose: bool,
    /// Print machine-readable output
    pub json: bool,
}

impl Context {
    pub async fn store(&self) -> anyhow::Result<SqliteStore> {
        let path = self.config.storage.database()?;
        if self.verbose {
            tracing::info!(path = %path.display(), "Opening database");
        }
        Ok(SqliteStore::open(&path).await?)
    }

    pub async fn orchestrator(&self) -> anyhow::Result<SyncOrchestrator<SqliteStore>> {
        let store = self.store().await?;
        Ok(SyncOrchestrator::new(
            store,
            self.config.clone(),
            self.secrets.github_token(),
        )?)
    }

    pub fn author(&self) -> CommitAuthor {
        CommitAuthor::new(&self.domain, &self.user, &self.user)
    }
}

/// Which branch of which mindmap a command acts on
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Mindmap id
    pub mmid: i64,

    /// Branch (defaults to main)
    #[arg(short, long)]
    pub branch: Option<String>,
}

impl TargetArgs {
    pub fn target(&self, ctx: &Context) -> SyncTarget {
        SyncTarget::new(
            &ctx.domain,
            self.mmid,
            branch_or_main(self.branch.as_deref()),
        )
    }
}

/// Print a flow outcome and turn a failure into an error exit
pub fn report(action: &str, outcome: &FlowOutcome, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
    } else if outcome.ok {
        match &outcome.commit {
            Some(commit) => println!("{} on '{}' ({})", action, outcome.branch, short_sha(commit)),
            None => println!("{} on '{}'", action, outcome.branch),
        }
    }

    match &outcome.error {
        Some(err) => anyhow::bail!("{} failed [{}]: {}", action, err.kind, err.message),
        None => Ok(()),
    }
}

fn short_sha(commit: &str) -> &str {
    commit.get(..7).unwrap_or(commit)
}
