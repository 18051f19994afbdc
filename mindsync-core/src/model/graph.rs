//! Nodes, edges and branch snapshots

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Canvas coordinates of a node
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Visual attributes of a node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<String>,
    /// Set on the synthetic root produced by an import
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub hidden: bool,
}

/// A mindmap node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Node {
    pub id: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    pub style: NodeStyle,
    /// Sibling ordering
    pub order: i64,
    /// UI-only; never written to the file tree
    pub expanded: bool,
}

impl Node {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            expanded: true,
            ..Default::default()
        }
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.position = Some(Position::new(x, y));
        self
    }

    pub fn with_order(mut self, order: i64) -> Self {
        self.order = order;
        self
    }
}

/// A directed parent→child link
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Edge {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            label: None,
        }
    }
}

/// Pan/zoom state of the editor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

/// The {nodes, edges} pair stored per branch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphSnapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl GraphSnapshot {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Nodes without an incoming edge, in document order
    pub fn roots(&self) -> Vec<&Node> {
        let targets: HashSet<&str> = self.edges.iter().map(|e| e.target.as_str()).collect();
        self.nodes
            .iter()
            .filter(|n| !targets.contains(n.id.as_str()))
            .collect()
    }

    /// The first parentless node in document order
    pub fn root(&self) -> Option<&Node> {
        self.roots().into_iter().next()
    }

    /// Child ids of `id`, ordered by (order, position in the node list)
    pub fn children_of(&self, id: &str) -> Vec<&Node> {
        let index: HashMap<&str, usize> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.as_str(), i))
            .collect();

        let mut children: Vec<(usize, &Node)> = self
            .edges
            .iter()
            .filter(|e| e.source == id)
            .filter_map(|e| index.get(e.target.as_str()).map(|&i| (i, &self.nodes[i])))
            .collect();

        children.sort_by_key(|(i, n)| (n.order, *i));
        children.dedup_by_key(|(i, _)| *i);
        children.into_iter().map(|(_, n)| n).collect()
    }

    /// Ids reachable from the root (root included), guarded against cycles
    pub fn reachable_ids(&self) -> HashSet<String> {
        let mut seen = HashSet::new();
        let Some(root) = self.root() else {
            return seen;
        };

        let mut stack = vec![root.id.as_str()];
        while let Some(id) = stack.pop() {
            if !seen.insert(id.to_string()) {
                continue;
            }
            for child in self.children_of(id) {
                stack.push(child.id.as_str());
            }
        }
        seen
    }

    /// Reject graphs that are not a single rooted tree
    ///
    /// Checks unique node ids, edge endpoints, a single parent per node,
    /// exactly one root (for non-empty graphs) and that every node is
    /// reachable from it, which also rules out cycles.
    pub fn validate(&self) -> Result<()> {
        if self.nodes.is_empty() {
            if self.edges.is_empty() {
                return Ok(());
            }
            return Err(Error::Validation("edges present without nodes".to_string()));
        }

        let mut ids = HashSet::new();
        for node in &self.nodes {
            if node.id.is_empty() {
                return Err(Error::Validation("node id must not be empty".to_string()));
            }
            if !ids.insert(node.id.as_str()) {
                return Err(Error::Validation(format!("duplicate node id '{}'", node.id)));
            }
        }

        let mut parents: HashMap<&str, &str> = HashMap::new();
        for edge in &self.edges {
            if !ids.contains(edge.source.as_str()) || !ids.contains(edge.target.as_str()) {
                return Err(Error::Validation(format!(
                    "edge '{}' references a missing node",
                    edge.id
                )));
            }
            if let Some(previous) = parents.insert(edge.target.as_str(), edge.source.as_str()) {
                if previous != edge.source {
                    return Err(Error::Validation(format!(
                        "node '{}' has more than one parent",
                        edge.target
                    )));
                }
            }
        }

        let roots = self.roots();
        match roots.len() {
            0 => {
                return Err(Error::Validation(
                    "graph has no root (every node has a parent)".to_string(),
                ))
            }
            1 => {}
            n => {
                return Err(Error::Validation(format!(
                    "graph has {} roots, expected exactly one",
                    n
                )))
            }
        }

        if self.reachable_ids().len() != self.nodes.len() {
            return Err(Error::Validation(
                "graph contains a cycle or unreachable nodes".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> GraphSnapshot {
        GraphSnapshot::new(
            vec![
                Node::new("root", "Root"),
                Node::new("b", "B").with_order(2),
                Node::new("a", "A").with_order(1),
            ],
            vec![Edge::new("e1", "root", "b"), Edge::new("e2", "root", "a")],
        )
    }

    #[test]
    fn test_children_sorted_by_order() {
        let graph = tree();
        let names: Vec<_> = graph.children_of("root").iter().map(|n| n.text.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn test_valid_tree() {
        assert!(tree().validate().is_ok());
        assert!(GraphSnapshot::default().validate().is_ok());
    }

    #[test]
    fn test_multiple_roots_rejected() {
        let mut graph = tree();
        graph.nodes.push(Node::new("stray", "Stray"));
        let err = graph.validate().unwrap_err();
        assert!(err.to_string().contains("2 roots"));
    }

    #[test]
    fn test_cycle_rejected() {
        let mut graph = tree();
        graph.nodes.push(Node::new("c", "C"));
        graph.nodes.push(Node::new("d", "D"));
        graph.edges.push(Edge::new("e3", "c", "d"));
        graph.edges.push(Edge::new("e4", "d", "c"));
        assert!(matches!(graph.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_reachable_terminates_on_cycle() {
        let graph = GraphSnapshot::new(
            vec![Node::new("r", "R"), Node::new("a", "A"), Node::new("b", "B")],
            vec![
                Edge::new("1", "r", "a"),
                Edge::new("2", "a", "b"),
                Edge::new("3", "b", "a"),
            ],
        );
        assert_eq!(graph.reachable_ids().len(), 3);
    }

    #[test]
    fn test_node_json_is_camel_case() {
        let mut node = Node::new("n1", "Hello");
        node.style.background_color = Some("#fff".to_string());
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["style"]["backgroundColor"], "#fff");
        assert!(json["style"].get("hidden").is_none());
    }
}
