//! Sync flows: save, sync, commit, push, pull, status, export

use std::io::Read;
use std::path::PathBuf;

use clap::Args;
use mindsync_core::git::RepoStatus;
use mindsync_core::{BranchState, SaveRequest};

use super::{report, Context, TargetArgs};

/// Overwrite a branch with a graph read from a JSON file
#[derive(Args, Debug)]
pub struct SaveArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// JSON file with `nodes`, `edges` and optional `viewport` ("-" for stdin)
    pub file: PathBuf,

    /// History description
    #[arg(short, long)]
    pub description: Option<String>,
}

impl SaveArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let raw = if self.file.as_os_str() == "-" {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        } else {
            std::fs::read_to_string(&self.file)?
        };
        let state: BranchState = serde_json::from_str(&raw)?;

        let orchestrator = ctx.orchestrator().await?;
        let request = SaveRequest {
            state,
            user: ctx.user.clone(),
            description: self.description.clone(),
        };
        let outcome = orchestrator.save(&self.target.target(ctx), request).await;
        report("Saved", &outcome, ctx.json)
    }
}

/// Refresh the working tree without committing
#[derive(Args, Debug)]
pub struct SyncArgs {
    #[command(flatten)]
    pub target: TargetArgs,
}

impl SyncArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let orchestrator = ctx.orchestrator().await?;
        let report = orchestrator
            .sync_without_commit(&self.target.target(ctx))
            .await?;

        if report.unchanged() {
            println!("{} is up to date", report.working_dir.display());
        } else {
            println!("Synced {}", report.working_dir.display());
            println!("  deleted: {}", report.plan.to_delete.len());
            println!("  created: {}", report.plan.to_create.len());
            println!("  copied:  {}", report.plan.to_copy.len());
        }
        if report.export.skipped_cards > 0 {
            println!(
                "  {} card(s) skipped: their node is not in this branch",
                report.export.skipped_cards
            );
        }
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct CommitArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Commit message
    #[arg(short, long, default_value = "")]
    pub message: String,
}

impl CommitArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let orchestrator = ctx.orchestrator().await?;
        let outcome = orchestrator
            .commit_changes(&self.target.target(ctx), &self.message, &ctx.author())
            .await;
        if outcome.ok && outcome.commit.is_none() && !ctx.json {
            println!("Nothing to commit on '{}'", outcome.branch);
            return Ok(());
        }
        report("Committed", &outcome, ctx.json)
    }
}

/// Commit pending changes and push to the remote
#[derive(Args, Debug)]
pub struct PushArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Message for the commit made before pushing, if any
    #[arg(short, long, default_value = "")]
    pub message: String,
}

impl PushArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let orchestrator = ctx.orchestrator().await?;
        let outcome = orchestrator
            .push(&self.target.target(ctx), &self.message, &ctx.author())
            .await;
        report("Pushed", &outcome, ctx.json)
    }
}

/// Replace the branch with the remote's tree
#[derive(Args, Debug)]
pub struct PullArgs {
    #[command(flatten)]
    pub target: TargetArgs,
}

impl PullArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let orchestrator = ctx.orchestrator().await?;
        let outcome = orchestrator.pull(&self.target.target(ctx)).await;
        report("Pulled", &outcome, ctx.json)
    }
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Fetch from the remote first
    #[arg(short, long)]
    pub refresh: bool,
}

impl StatusArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let orchestrator = ctx.orchestrator().await?;
        let status = orchestrator
            .status(&self.target.target(ctx), self.refresh)
            .await;

        if ctx.json {
            println!("{}", serde_json::to_string_pretty(&status)?);
        } else {
            print_status(&status);
        }
        Ok(())
    }
}

fn print_status(status: &RepoStatus) {
    if !status.has_local_repo {
        println!("No local repository yet (save or sync first)");
        return;
    }

    println!(
        "On branch {}",
        status.current_branch.as_deref().unwrap_or("(none)")
    );
    if let (Some(sha), Some(msg)) = (&status.last_commit_short, &status.last_commit_message_short) {
        let when = status
            .last_commit_time
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!("Last commit: {} {} {}", sha, msg, when);
    }
    println!("Commits: {} local, {} remote", status.local_commits, status.remote_commits);

    if !status.has_remote {
        println!("No remote configured");
    } else if !status.has_remote_branch {
        println!("Branch not pushed yet");
    } else {
        println!("Ahead {}, behind {}", status.ahead, status.behind);
    }

    if status.uncommitted_changes {
        println!("Uncommitted changes:");
        for path in &status.changes.added {
            println!("  added:    {}", path);
        }
        for path in &status.changes.modified {
            println!("  modified: {}", path);
        }
        for path in &status.changes.deleted {
            println!("  deleted:  {}", path);
        }
    } else {
        println!("Working tree clean");
    }
}

/// Write a branch as a directory tree, without git
#[derive(Args, Debug)]
pub struct ExportArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Output directory
    #[arg(short, long)]
    pub out: PathBuf,
}

impl ExportArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let orchestrator = ctx.orchestrator().await?;
        let summary = orchestrator
            .export_to(&self.target.target(ctx), &self.out)
            .await?;
        println!(
            "Exported to {}: {} directories, {} cards, {} empty nodes",
            self.out.display(),
            summary.directories,
            summary.cards,
            summary.sentinels
        );
        Ok(())
    }
}
