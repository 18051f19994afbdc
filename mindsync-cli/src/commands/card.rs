//! Cards attached to nodes
//!
//! Card edits only touch the store; run `sync` or `commit` afterwards to
//! refresh a working tree.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use mindsync_core::model::{CardUpdate, NewCard};
use mindsync_core::DocumentStore;

use super::Context;

#[derive(Args, Debug)]
pub struct CardArgs {
    #[command(subcommand)]
    pub command: CardCommand,
}

#[derive(Subcommand, Debug)]
pub enum CardCommand {
    /// Attach a card to a node
    Add {
        /// Mindmap id
        mmid: i64,

        /// Node id
        node: String,

        /// Card title
        title: String,

        /// Markdown file with the card body
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Sort order among the node's cards
        #[arg(long, default_value_t = 0)]
        order: i64,
    },

    /// List cards of a mindmap
    #[command(visible_alias = "ls")]
    List {
        /// Mindmap id
        mmid: i64,
    },

    /// Change a card's title, body or order
    Edit {
        /// Card id
        id: String,

        #[arg(short, long)]
        title: Option<String>,

        /// Markdown file with the new body
        #[arg(short, long)]
        file: Option<PathBuf>,

        #[arg(long)]
        order: Option<i64>,
    },

    /// Delete a card
    #[command(visible_alias = "rm")]
    Remove {
        /// Card id
        id: String,
    },
}

impl CardArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let store = ctx.store().await?;
        match &self.command {
            CardCommand::Add {
                mmid,
                node,
                title,
                file,
                order,
            } => {
                let content = match file {
                    Some(path) => std::fs::read_to_string(path)?,
                    None => String::new(),
                };
                // Reject cards for nodes no branch knows about
                let mindmap = store.load_mindmap(&ctx.domain, *mmid).await?;
                let known = mindmap.branch_names().iter().any(|b| {
                    mindmap
                        .branch(b)
                        .map(|g| g.node(node).is_some())
                        .unwrap_or(false)
                });
                if !known {
                    anyhow::bail!("node '{}' not found in mindmap {}", node, mmid);
                }

                let card = store
                    .create_card(
                        &ctx.domain,
                        NewCard::new(*mmid, node.as_str(), title.as_str(), content)
                            .with_order(*order),
                    )
                    .await?;
                println!("Created card {} (cid {})", card.id, card.cid);
            }
            CardCommand::List { mmid } => {
                let cards = store.list_cards(&ctx.domain, *mmid).await?;
                if ctx.json {
                    println!("{}", serde_json::to_string_pretty(&cards)?);
                } else {
                    for card in cards {
                        println!(
                            "{}  node={} cid={} order={}  {}",
                            card.id, card.node_id, card.cid, card.order, card.title
                        );
                    }
                }
            }
            CardCommand::Edit {
                id,
                title,
                file,
                order,
            } => {
                let update = CardUpdate {
                    title: title.clone(),
                    content: file.as_ref().map(std::fs::read_to_string).transpose()?,
                    order: *order,
                };
                if update.is_empty() {
                    anyhow::bail!("nothing to change; pass --title, --file or --order");
                }
                let card = store.update_card(&ctx.domain, id, &update).await?;
                println!("Updated card {}", card.id);
            }
            CardCommand::Remove { id } => {
                store.delete_card(&ctx.domain, id).await?;
                println!("Deleted card {}", id);
            }
        }
        Ok(())
    }
}
