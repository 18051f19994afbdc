//! The persisted mindmap document and its branch bookkeeping

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::graph::{Edge, GraphSnapshot, Node, NodeStyle, Position, Viewport};
use super::history::{HistoryEntry, HistoryKind, HistoryLog, HistorySnapshot};
use crate::{Error, Result};

/// Name of the branch mirrored by the document's top-level nodes/edges
pub const MAIN_BRANCH: &str = "main";

/// Names that can never be created as branches
const RESERVED_BRANCHES: &[&str] = &[MAIN_BRANCH, "HEAD", "origin"];

const MAX_BRANCH_NAME_LEN: usize = 100;

/// Full overwrite of one branch's editable state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BranchState {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub viewport: Option<Viewport>,
}

/// Targeted update of one node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeUpdate {
    pub text: Option<String>,
    pub position: Option<Position>,
    pub style: Option<NodeStyle>,
    pub order: Option<i64>,
    pub expanded: Option<bool>,
}

impl NodeUpdate {
    fn apply(&self, node: &mut Node) {
        if let Some(ref text) = self.text {
            node.text = text.clone();
        }
        if let Some(position) = self.position {
            node.position = Some(position);
        }
        if let Some(ref style) = self.style {
            node.style = style.clone();
        }
        if let Some(order) = self.order {
            node.order = order;
        }
        if let Some(expanded) = self.expanded {
            node.expanded = expanded;
        }
    }
}

/// A mindmap document
///
/// `nodes`/`edges` are the legacy top-level representation of the `main`
/// branch and are kept identical to `branch_data["main"]` by every method
/// that writes a branch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MindMap {
    pub id: i64,
    pub title: String,
    /// Free text exported as README.md
    pub content: String,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub viewport: Viewport,
    pub branches: Vec<String>,
    pub branch_data: BTreeMap<String, GraphSnapshot>,
    pub history: HistoryLog,
    /// Remote repository URL, never carrying a token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote: Option<String>,
}

impl MindMap {
    /// Create a document whose main branch holds a single root node
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        let title = title.into();
        let root = Node::new(uuid::Uuid::new_v4().to_string(), title.clone());
        let mut map = Self {
            id,
            title,
            ..Default::default()
        };
        map.write_branch(MAIN_BRANCH, GraphSnapshot::new(vec![root], Vec::new()));
        map
    }

    /// Repair documents written before branches existed
    ///
    /// The top-level fields are authoritative for `main`.
    pub fn normalize(&mut self) {
        let main = GraphSnapshot::new(self.nodes.clone(), self.edges.clone());
        self.branch_data.insert(MAIN_BRANCH.to_string(), main);

        for name in self.branch_data.keys() {
            if !self.branches.iter().any(|b| b == name) {
                self.branches.push(name.clone());
            }
        }
        self.branches.retain(|b| self.branch_data.contains_key(b));
    }

    pub fn has_branch(&self, name: &str) -> bool {
        name == MAIN_BRANCH || self.branch_data.contains_key(name)
    }

    pub fn branch_names(&self) -> Vec<String> {
        let mut names = vec![MAIN_BRANCH.to_string()];
        names.extend(
            self.branches
                .iter()
                .filter(|b| b.as_str() != MAIN_BRANCH)
                .cloned(),
        );
        names
    }

    /// Copy of a branch's graph
    pub fn branch(&self, name: &str) -> Result<GraphSnapshot> {
        if name == MAIN_BRANCH {
            return Ok(GraphSnapshot::new(self.nodes.clone(), self.edges.clone()));
        }
        self.branch_data
            .get(name)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("branch '{}'", name)))
    }

    /// Store a branch graph, mirroring `main` into the top-level fields
    fn write_branch(&mut self, name: &str, graph: GraphSnapshot) {
        if name == MAIN_BRANCH {
            self.nodes = graph.nodes.clone();
            self.edges = graph.edges.clone();
        }
        self.branch_data.insert(name.to_string(), graph);
        if !self.branches.iter().any(|b| b == name) {
            self.branches.push(name.to_string());
        }
    }

    /// Apply `f` to a copy of the branch and write it back only on success
    fn update_branch<T>(
        &mut self,
        name: &str,
        f: impl FnOnce(&mut GraphSnapshot) -> Result<T>,
    ) -> Result<T> {
        let mut graph = self.branch(name)?;
        let out = f(&mut graph)?;
        self.write_branch(name, graph);
        Ok(out)
    }

    /// Overwrite a branch with a validated graph
    pub fn set_branch(&mut self, name: &str, graph: GraphSnapshot) -> Result<()> {
        if !self.has_branch(name) {
            return Err(Error::NotFound(format!("branch '{}'", name)));
        }
        graph.validate()?;
        self.write_branch(name, graph);
        Ok(())
    }

    /// Overwrite a branch's nodes/edges and, if given, the viewport
    pub fn apply_state(&mut self, name: &str, state: BranchState) -> Result<()> {
        self.set_branch(name, GraphSnapshot::new(state.nodes, state.edges))?;
        if let Some(viewport) = state.viewport {
            self.viewport = viewport;
        }
        Ok(())
    }

    /// Replace a branch from an imported tree without re-validating it
    pub fn replace_branch(&mut self, name: &str, graph: GraphSnapshot) {
        self.write_branch(name, graph);
    }

    /// Check a proposed branch name
    pub fn validate_branch_name(name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(Error::Validation("branch name must not be empty".to_string()));
        }
        if name.len() > MAX_BRANCH_NAME_LEN {
            return Err(Error::Validation(format!(
                "branch name longer than {} characters",
                MAX_BRANCH_NAME_LEN
            )));
        }
        if RESERVED_BRANCHES.contains(&name) {
            return Err(Error::Validation(format!("branch name '{}' is reserved", name)));
        }
        if name.starts_with('.') || name.starts_with('-') {
            return Err(Error::Validation(
                "branch name must not start with '.' or '-'".to_string(),
            ));
        }
        if name.ends_with(".lock") || name.contains("..") {
            return Err(Error::Validation(format!("invalid branch name '{}'", name)));
        }
        if let Some(c) = name
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
        {
            return Err(Error::Validation(format!(
                "branch name contains invalid character {:?}",
                c
            )));
        }
        Ok(())
    }

    /// Create `name` as a copy of `from`
    ///
    /// Only `main` may be branched from.
    pub fn create_branch(&mut self, name: &str, from: &str) -> Result<()> {
        if from != MAIN_BRANCH {
            return Err(Error::Forbidden(format!(
                "branches can only be created from '{}', not '{}'",
                MAIN_BRANCH, from
            )));
        }
        Self::validate_branch_name(name)?;
        if self.has_branch(name) {
            return Err(Error::Validation(format!("branch '{}' already exists", name)));
        }

        let graph = self.branch(from)?;
        self.write_branch(name, graph);
        Ok(())
    }

    /// Add a node, linked under `parent` when given
    ///
    /// A parentless node is only accepted into an empty branch, so the
    /// branch keeps a single root.
    pub fn add_node(&mut self, branch: &str, node: Node, parent: Option<&str>) -> Result<()> {
        self.update_branch(branch, |graph| {
            if graph.node(&node.id).is_some() {
                return Err(Error::Validation(format!("node '{}' already exists", node.id)));
            }
            match parent {
                Some(parent) => {
                    if graph.node(parent).is_none() {
                        return Err(Error::NotFound(format!("node '{}'", parent)));
                    }
                    graph.edges.push(Edge::new(
                        uuid::Uuid::new_v4().to_string(),
                        parent,
                        node.id.clone(),
                    ));
                }
                None if !graph.nodes.is_empty() => {
                    return Err(Error::Validation(
                        "a parent is required once the branch has a root".to_string(),
                    ));
                }
                None => {}
            }
            graph.nodes.push(node);
            Ok(())
        })
    }

    pub fn update_node(&mut self, branch: &str, id: &str, update: &NodeUpdate) -> Result<()> {
        self.update_branch(branch, |graph| {
            let node = graph
                .node_mut(id)
                .ok_or_else(|| Error::NotFound(format!("node '{}'", id)))?;
            update.apply(node);
            Ok(())
        })
    }

    /// Remove a node, its descendants and every edge touching them
    ///
    /// Returns the removed node ids.
    pub fn delete_node(&mut self, branch: &str, id: &str) -> Result<Vec<String>> {
        self.update_branch(branch, |graph| {
            if graph.node(id).is_none() {
                return Err(Error::NotFound(format!("node '{}'", id)));
            }

            let mut removed = Vec::new();
            let mut stack = vec![id.to_string()];
            while let Some(current) = stack.pop() {
                if removed.contains(&current) {
                    continue;
                }
                stack.extend(
                    graph
                        .edges
                        .iter()
                        .filter(|e| e.source == current)
                        .map(|e| e.target.clone()),
                );
                removed.push(current);
            }

            graph.nodes.retain(|n| !removed.contains(&n.id));
            graph
                .edges
                .retain(|e| !removed.contains(&e.source) && !removed.contains(&e.target));
            Ok(removed)
        })
    }

    /// Snapshot of a branch plus the current viewport
    pub fn history_snapshot(&self, branch: &str) -> Result<HistorySnapshot> {
        let graph = self.branch(branch)?;
        Ok(HistorySnapshot {
            nodes: graph.nodes,
            edges: graph.edges,
            viewport: self.viewport,
        })
    }

    /// Append a history entry describing the current state of `branch`
    pub fn record_history(
        &mut self,
        kind: HistoryKind,
        branch: &str,
        user: &str,
        description: &str,
    ) -> Result<()> {
        let snapshot = self.history_snapshot(branch)?;
        self.history
            .record(HistoryEntry::new(kind, user, description, branch, snapshot));
        Ok(())
    }

    /// Put a history snapshot back onto `branch`
    ///
    /// No history entry is recorded for the restore itself.
    pub fn restore_history(&mut self, branch: &str, entry_id: &str) -> Result<()> {
        if !self.has_branch(branch) {
            return Err(Error::NotFound(format!("branch '{}'", branch)));
        }
        let snapshot = self.history.restore(entry_id)?;
        self.write_branch(branch, GraphSnapshot::new(snapshot.nodes, snapshot.edges));
        self.viewport = snapshot.viewport;
        Ok(())
    }
}
