//! Decide whether a save is worth an export + git round trip
//!
//! Dragging nodes around produces a save per drop. Those only touch
//! coordinates, which the file tree does not carry, so they skip the sync.

use std::collections::{HashMap, HashSet};

use crate::model::{Edge, GraphSnapshot, Node};

/// True when the new nodes/edges differ from `old` in anything the file
/// tree (or the editor's structural state) reflects
///
/// `None` means "unchanged" for that half of the payload.
pub fn is_substantive(
    old: &GraphSnapshot,
    new_nodes: Option<&[Node]>,
    new_edges: Option<&[Edge]>,
) -> bool {
    if let Some(nodes) = new_nodes {
        if nodes.len() != old.nodes.len() {
            return true;
        }

        let previous: HashMap<&str, &Node> =
            old.nodes.iter().map(|n| (n.id.as_str(), n)).collect();

        for node in nodes {
            match previous.get(node.id.as_str()) {
                Some(before) if differs_beyond_position(before, node) => return true,
                Some(_) => {}
                // Same count but different ids: something was replaced
                None => return true,
            }
        }
    }

    if let Some(edges) = new_edges {
        if edges.len() != old.edges.len() {
            return true;
        }
        if edge_pairs(edges) != edge_pairs(&old.edges) {
            return true;
        }
    }

    false
}

fn differs_beyond_position(a: &Node, b: &Node) -> bool {
    a.text != b.text
        || a.expanded != b.expanded
        || a.style.color != b.style.color
        || a.style.background_color != b.style.background_color
        || a.style.font_size != b.style.font_size
        || a.style.shape != b.style.shape
}

fn edge_pairs(edges: &[Edge]) -> HashSet<(&str, &str)> {
    edges
        .iter()
        .map(|e| (e.source.as_str(), e.target.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn old() -> GraphSnapshot {
        GraphSnapshot::new(vec![Node::new("n1", "A")], Vec::new())
    }

    #[test]
    fn test_position_only_is_not_substantive() {
        let moved = vec![Node::new("n1", "A").with_position(5.0, 9.0)];
        assert!(!is_substantive(&old(), Some(moved.as_slice()), None));
    }

    #[test]
    fn test_text_change_is_substantive() {
        let renamed = vec![Node::new("n1", "B")];
        assert!(is_substantive(&old(), Some(renamed.as_slice()), None));
    }

    #[test]
    fn test_style_and_expanded_changes() {
        let mut styled = Node::new("n1", "A");
        styled.style.shape = Some("ellipse".to_string());
        assert!(is_substantive(&old(), Some(&[styled][..]), None));

        let mut collapsed = Node::new("n1", "A");
        collapsed.expanded = false;
        assert!(is_substantive(&old(), Some(&[collapsed][..]), None));
    }

    #[test]
    fn test_node_count_change() {
        let nodes = vec![Node::new("n1", "A"), Node::new("n2", "B")];
        assert!(is_substantive(&old(), Some(nodes.as_slice()), None));
    }

    #[test]
    fn test_edge_rewiring_is_substantive() {
        let graph = GraphSnapshot::new(
            vec![Node::new("r", "R"), Node::new("a", "A"), Node::new("b", "B")],
            vec![Edge::new("e1", "r", "a"), Edge::new("e2", "a", "b")],
        );
        let rewired = vec![Edge::new("e1", "r", "a"), Edge::new("e2", "r", "b")];
        assert!(is_substantive(&graph, None, Some(rewired.as_slice())));

        // New edge ids with the same endpoints are not a structural change
        let relabelled = vec![Edge::new("x1", "r", "a"), Edge::new("x2", "a", "b")];
        assert!(!is_substantive(&graph, None, Some(relabelled.as_slice())));
    }

    #[test]
    fn test_nothing_given() {
        assert!(!is_substantive(&old(), None, None));
    }
}
