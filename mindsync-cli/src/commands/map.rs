//! Mindmap documents: create, list, show, and node edits

use clap::{Args, Subcommand};
use mindsync_core::model::{GraphSnapshot, Node, NodeUpdate};
use mindsync_core::sync::branch_or_main;
use mindsync_core::{BranchState, DocumentStore, SaveRequest};

use super::{report, Context, TargetArgs};

#[derive(Args, Debug)]
pub struct MapArgs {
    #[command(subcommand)]
    pub command: MapCommand,
}

#[derive(Subcommand, Debug)]
pub enum MapCommand {
    /// Create a mindmap with a single root node
    New {
        /// Title (also the root node's text)
        title: String,
    },

    /// List mindmaps in the domain
    #[command(visible_alias = "ls")]
    List,

    /// Print a branch as an outline
    Show {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Add a node under a parent and save
    AddNode {
        #[command(flatten)]
        target: TargetArgs,

        /// Node text
        text: String,

        /// Parent node id (defaults to the root)
        #[arg(short, long)]
        parent: Option<String>,
    },

    /// Change a node's text and save
    RenameNode {
        #[command(flatten)]
        target: TargetArgs,

        /// Node id
        id: String,

        /// New text
        text: String,
    },

    /// Remove a node and its subtree and save
    RemoveNode {
        #[command(flatten)]
        target: TargetArgs,

        /// Node id
        id: String,
    },
}

impl MapArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        match &self.command {
            MapCommand::New { title } => {
                let store = ctx.store().await?;
                let mindmap = store.create_mindmap(&ctx.domain, title).await?;
                if ctx.json {
                    println!("{}", serde_json::to_string_pretty(&mindmap)?);
                } else {
                    println!("Created mindmap {} '{}'", mindmap.id, mindmap.title);
                }
                Ok(())
            }
            MapCommand::List => {
                let store = ctx.store().await?;
                let mindmaps = store.list_mindmaps(&ctx.domain).await?;
                if mindmaps.is_empty() {
                    println!("No mindmaps in domain '{}'", ctx.domain);
                }
                for (id, title) in mindmaps {
                    println!("{:>4}  {}", id, title);
                }
                Ok(())
            }
            MapCommand::Show { target } => show(ctx, target).await,
            MapCommand::AddNode {
                target,
                text,
                parent,
            } => {
                edit(ctx, target, "Added node", |mindmap, branch| {
                    let parent = match parent {
                        Some(p) => p.clone(),
                        None => mindmap
                            .branch(branch)?
                            .root()
                            .map(|n| n.id.clone())
                            .ok_or_else(|| {
                                mindsync_core::Error::Validation(format!(
                                    "branch '{}' has no root",
                                    branch
                                ))
                            })?,
                    };
                    let id = next_node_id(&mindmap.branch(branch)?);
                    mindmap.add_node(branch, Node::new(id, text.as_str()), Some(parent.as_str()))
                })
                .await
            }
            MapCommand::RenameNode { target, id, text } => {
                let update = NodeUpdate {
                    text: Some(text.clone()),
                    ..Default::default()
                };
                edit(ctx, target, "Renamed node", |mindmap, branch| {
                    mindmap.update_node(branch, id, &update)
                })
                .await
            }
            MapCommand::RemoveNode { target, id } => {
                edit(ctx, target, "Removed node", |mindmap, branch| {
                    mindmap.delete_node(branch, id).map(|_| ())
                })
                .await
            }
        }
    }
}

async fn show(ctx: &Context, target: &TargetArgs) -> anyhow::Result<()> {
    let store = ctx.store().await?;
    let mindmap = store.load_mindmap(&ctx.domain, target.mmid).await?;
    let branch = branch_or_main(target.branch.as_deref());
    let graph = mindmap.branch(branch)?;

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&graph)?);
        return Ok(());
    }

    println!("{} [{}]", mindmap.title, branch);
    println!("Branches: {}", mindmap.branch_names().join(", "));
    if let Some(remote) = &mindmap.remote {
        println!("Remote: {}", mindsync_core::git::redact_url(remote));
    }
    println!();
    for line in outline(&graph) {
        println!("{}", line);
    }
    Ok(())
}

/// Apply a node edit to a branch and save it through the sync flow
async fn edit<F>(ctx: &Context, target: &TargetArgs, action: &str, f: F) -> anyhow::Result<()>
where
    F: FnOnce(&mut mindsync_core::MindMap, &str) -> mindsync_core::Result<()>,
{
    let orchestrator = ctx.orchestrator().await?;
    let target = target.target(ctx);

    let mut mindmap = orchestrator
        .store()
        .load_mindmap(&target.domain, target.mmid)
        .await?;
    f(&mut mindmap, &target.branch)?;
    let graph = mindmap.branch(&target.branch)?;

    let request = SaveRequest {
        state: BranchState {
            nodes: graph.nodes,
            edges: graph.edges,
            viewport: None,
        },
        user: ctx.user.clone(),
        description: Some(action.to_string()),
    };
    let outcome = orchestrator.save(&target, request).await;
    report(action, &outcome, ctx.json)
}

/// Indented `text (id)` lines, depth-first from the root
fn outline(graph: &GraphSnapshot) -> Vec<String> {
    let mut lines = Vec::new();
    let Some(root) = graph.root() else {
        return lines;
    };

    let mut seen = std::collections::HashSet::new();
    let mut stack = vec![(root, 0usize)];
    while let Some((node, depth)) = stack.pop() {
        if !seen.insert(node.id.as_str()) {
            continue;
        }
        lines.push(format!("{}{} ({})", "  ".repeat(depth), node.text, node.id));
        for child in graph.children_of(&node.id).into_iter().rev() {
            stack.push((child, depth + 1));
        }
    }
    lines
}

/// First free `n<k>` id in the graph
fn next_node_id(graph: &GraphSnapshot) -> String {
    (1..)
        .map(|k| format!("n{}", k))
        .find(|id| graph.node(id).is_none())
        .unwrap_or_default()
}
