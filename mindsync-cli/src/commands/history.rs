//! History log: list entries and restore snapshots

use clap::{Args, Subcommand};
use mindsync_core::model::HistoryEntry;
use mindsync_core::DocumentStore;

use super::{report, Context, TargetArgs};

#[derive(Args, Debug)]
pub struct HistoryArgs {
    #[command(subcommand)]
    pub command: HistoryCommand,
}

#[derive(Subcommand, Debug)]
pub enum HistoryCommand {
    /// List entries, newest first
    #[command(visible_alias = "ls")]
    List {
        /// Mindmap id
        mmid: i64,

        /// Only entries taken from this branch
        #[arg(short, long)]
        branch: Option<String>,
    },

    /// Put a snapshot back onto a branch
    Restore {
        #[command(flatten)]
        target: TargetArgs,

        /// History entry id
        entry: String,
    },
}

impl HistoryArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        match &self.command {
            HistoryCommand::List { mmid, branch } => {
                let store = ctx.store().await?;
                let mindmap = store.load_mindmap(&ctx.domain, *mmid).await?;
                let entries: Vec<&HistoryEntry> = mindmap
                    .history
                    .entries()
                    .iter()
                    .filter(|e| branch.as_deref().map_or(true, |b| e.branch == b))
                    .collect();

                if ctx.json {
                    println!("{}", serde_json::to_string_pretty(&entries)?);
                } else if entries.is_empty() {
                    println!("No history");
                } else {
                    for entry in entries {
                        println!("{}", format_entry(entry));
                    }
                }
                Ok(())
            }
            HistoryCommand::Restore { target, entry } => {
                let orchestrator = ctx.orchestrator().await?;
                let outcome = orchestrator.restore(&target.target(ctx), entry).await;
                report("Restored", &outcome, ctx.json)
            }
        }
    }
}

fn format_entry(entry: &HistoryEntry) -> String {
    format!(
        "{}  {}  {:<6}  {:<10}  {}  ({}, {} nodes)",
        entry.id,
        entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
        format!("{:?}", entry.kind).to_lowercase(),
        entry.user,
        entry.description,
        entry.branch,
        entry.snapshot.nodes.len()
    )
}
