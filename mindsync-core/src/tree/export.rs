//! Graph → directory tree

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use super::sanitize::{sanitize, UniqueNames};
use super::{KEEP_FILE, MARKDOWN_EXT, README_FILE};
use crate::model::{Card, GraphSnapshot, Node};
use crate::Result;

/// Counts from one export run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    /// Directories written (one per non-root node)
    pub directories: usize,
    /// Card files written
    pub cards: usize,
    /// `.keep` sentinels written for nodes without cards
    pub sentinels: usize,
    /// Cards whose node is not reachable in this branch
    pub skipped_cards: usize,
    /// Edges that would have revisited a node
    pub cycles_broken: usize,
}

struct Exporter<'a> {
    graph: &'a GraphSnapshot,
    cards: HashMap<&'a str, Vec<&'a Card>>,
    visited: HashSet<&'a str>,
    summary: ExportSummary,
}

/// Write `content` as README.md and one directory per reachable non-root node
///
/// `output_dir` is created if missing. Existing files are overwritten but
/// nothing is deleted; mirroring onto a live tree is
/// [`plan_mirror`](super::plan_mirror)'s job.
pub fn export_tree(
    content: &str,
    graph: &GraphSnapshot,
    cards: &[Card],
    output_dir: &Path,
) -> Result<ExportSummary> {
    fs::create_dir_all(output_dir)?;
    fs::write(output_dir.join(README_FILE), content)?;

    let roots = graph.roots();
    if roots.len() > 1 {
        warn!(
            roots = roots.len(),
            "Graph has several parentless nodes; exporting the first one only"
        );
    }

    let Some(&root) = roots.first() else {
        if !graph.nodes.is_empty() {
            warn!("Graph has no root node; only README.md exported");
        }
        return Ok(ExportSummary {
            skipped_cards: cards.len(),
            ..Default::default()
        });
    };

    let mut by_node: HashMap<&str, Vec<&Card>> = HashMap::new();
    for card in cards {
        by_node.entry(card.node_id.as_str()).or_default().push(card);
    }
    for list in by_node.values_mut() {
        list.sort_by_key(|c| (c.order, c.cid));
    }

    let mut exporter = Exporter {
        graph,
        cards: by_node,
        visited: HashSet::from([root.id.as_str()]),
        summary: ExportSummary::default(),
    };
    let mut names = UniqueNames::reserving(&[README_FILE, KEEP_FILE]);
    exporter.write_children(root, output_dir, &mut names)?;

    let exported: usize = exporter
        .visited
        .iter()
        .filter(|id| **id != root.id)
        .map(|id| exporter.cards.get(id).map_or(0, Vec::len))
        .sum();
    exporter.summary.skipped_cards = cards.len() - exported;

    debug!(summary = ?exporter.summary, dir = %output_dir.display(), "Exported tree");
    Ok(exporter.summary)
}

impl<'a> Exporter<'a> {
    /// Cards and child directories of one node share `names`
    fn write_children(
        &mut self,
        parent: &'a Node,
        dir: &Path,
        names: &mut UniqueNames,
    ) -> Result<()> {
        for child in self.graph.children_of(&parent.id) {
            if !self.visited.insert(child.id.as_str()) {
                warn!(node = %child.id, "Edge revisits a node; skipping to break the cycle");
                self.summary.cycles_broken += 1;
                continue;
            }

            let child_dir = dir.join(names.claim(&sanitize(&child.text), ""));
            fs::create_dir_all(&child_dir)?;
            self.summary.directories += 1;

            let mut inner = UniqueNames::reserving(&[KEEP_FILE]);
            self.write_cards(child, &child_dir, &mut inner)?;
            self.write_children(child, &child_dir, &mut inner)?;
        }

        Ok(())
    }

    fn write_cards(&mut self, node: &Node, dir: &Path, names: &mut UniqueNames) -> Result<()> {
        let cards = match self.cards.get(node.id.as_str()) {
            Some(cards) if !cards.is_empty() => cards,
            _ => {
                fs::write(dir.join(KEEP_FILE), "")?;
                self.summary.sentinels += 1;
                return Ok(());
            }
        };

        for card in cards {
            let file = names.claim(&sanitize(&card.title), MARKDOWN_EXT);
            fs::write(dir.join(file), &card.content)?;
            self.summary.cards += 1;
        }
        Ok(())
    }
}
