//! Branch management

use clap::{Args, Subcommand};
use mindsync_core::{DocumentStore, MAIN_BRANCH};

use super::{report, Context};

#[derive(Args, Debug)]
pub struct BranchArgs {
    #[command(subcommand)]
    pub command: BranchCommand,
}

#[derive(Subcommand, Debug)]
pub enum BranchCommand {
    /// Copy a branch into a new one
    Create {
        /// Mindmap id
        mmid: i64,

        /// New branch name
        name: String,

        /// Source branch
        #[arg(long, default_value = MAIN_BRANCH)]
        from: String,
    },

    /// List branches of a mindmap
    #[command(visible_alias = "ls")]
    List {
        /// Mindmap id
        mmid: i64,
    },
}

impl BranchArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        match &self.command {
            BranchCommand::Create { mmid, name, from } => {
                let orchestrator = ctx.orchestrator().await?;
                let outcome = orchestrator
                    .create_branch(&ctx.domain, *mmid, name, from)
                    .await;
                report("Created branch", &outcome, ctx.json)
            }
            BranchCommand::List { mmid } => {
                let store = ctx.store().await?;
                let mindmap = store.load_mindmap(&ctx.domain, *mmid).await?;
                let names = mindmap.branch_names();
                if ctx.json {
                    println!("{}", serde_json::to_string_pretty(&names)?);
                } else {
                    for name in names {
                        println!("{}", name);
                    }
                }
                Ok(())
            }
        }
    }
}
