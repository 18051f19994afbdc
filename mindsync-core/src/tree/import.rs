//! Directory tree → graph
//!
//! Node identity is not recoverable from the tree: every import mints fresh
//! ids, and positions are derived from depth alone.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use uuid::Uuid;

use super::sanitize::sanitize;
use super::{GIT_DIR, MARKDOWN_EXT, README_FILE};
use crate::model::{Edge, GraphSnapshot, NewCard, Node, Position};
use crate::{Error, Result};

/// Horizontal distance between tree levels
pub const DEPTH_SPACING: f64 = 250.0;

/// Result of reading a tree back
#[derive(Debug, Clone)]
pub struct ImportedTree {
    pub graph: GraphSnapshot,
    /// Cards to create; the store assigns ids and sequence numbers
    pub cards: Vec<NewCard>,
    /// Id of the synthetic root
    pub root_id: String,
}

struct Importer {
    mindmap_id: i64,
    graph: GraphSnapshot,
    cards: Vec<NewCard>,
}

/// Rebuild a graph from `local_dir`
///
/// The returned root is synthetic and hidden. README.md at the top level is
/// left for the caller, which owns the document's content field.
pub fn import_tree(local_dir: &Path, mindmap_id: i64, root_label: &str) -> Result<ImportedTree> {
    let mut root = Node::new(Uuid::new_v4().to_string(), root_label);
    root.position = Some(Position::new(0.0, 0.0));
    root.style.hidden = true;
    let root_id = root.id.clone();

    let mut importer = Importer {
        mindmap_id,
        graph: GraphSnapshot::new(vec![root], Vec::new()),
        cards: Vec::new(),
    };
    importer.walk(local_dir, &root_id, 0)?;

    debug!(
        nodes = importer.graph.nodes.len(),
        cards = importer.cards.len(),
        dir = %local_dir.display(),
        "Imported tree"
    );

    Ok(ImportedTree {
        graph: importer.graph,
        cards: importer.cards,
        root_id,
    })
}

/// Read README.md from a tree, empty when absent
pub fn read_readme(local_dir: &Path) -> Result<String> {
    let path = local_dir.join(README_FILE);
    match fs::read_to_string(&path) {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(parse_error(path, e)),
    }
}

impl Importer {
    fn walk(&mut self, dir: &Path, parent_id: &str, depth: usize) -> Result<()> {
        let mut dirs = Vec::new();
        let mut files = Vec::new();

        for (name, file_type) in sorted_entries(dir)? {
            if file_type.is_dir() {
                if name != GIT_DIR {
                    dirs.push(name);
                }
            } else if file_type.is_file() && is_card_file(&name, depth) {
                files.push(name);
            }
        }

        for (order, name) in files.iter().enumerate() {
            let path = dir.join(name);
            let content = fs::read_to_string(&path).map_err(|e| parse_error(path.clone(), e))?;
            let stem = name.strip_suffix(MARKDOWN_EXT).unwrap_or(name);
            self.cards.push(
                NewCard::new(self.mindmap_id, parent_id, sanitize(stem), content)
                    .with_order(order as i64),
            );
        }

        for (order, name) in dirs.iter().enumerate() {
            let child_depth = depth + 1;
            let node = Node::new(Uuid::new_v4().to_string(), name.clone())
                .with_position(child_depth as f64 * DEPTH_SPACING, 0.0)
                .with_order(order as i64);
            let child_id = node.id.clone();

            self.graph.nodes.push(node);
            self.graph.edges.push(Edge::new(
                Uuid::new_v4().to_string(),
                parent_id,
                child_id.clone(),
            ));

            self.walk(&dir.join(name), &child_id, child_depth)?;
        }

        Ok(())
    }
}

/// Markdown files become cards, except the document README at the top
fn is_card_file(name: &str, depth: usize) -> bool {
    name.ends_with(MARKDOWN_EXT) && !(depth == 0 && name == README_FILE)
}

/// Directory entries sorted by name, symlinks skipped
fn sorted_entries(dir: &Path) -> Result<Vec<(String, fs::FileType)>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| parse_error(dir.to_path_buf(), e))? {
        let entry = entry.map_err(|e| parse_error(dir.to_path_buf(), e))?;
        let file_type = entry
            .file_type()
            .map_err(|e| parse_error(entry.path(), e))?;
        if file_type.is_symlink() {
            continue;
        }
        let name = entry.file_name().into_string().map_err(|raw| Error::ImportParse {
            path: dir.join(&raw),
            message: "file name is not valid UTF-8".to_string(),
        })?;
        entries.push((name, file_type));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}

fn parse_error(path: PathBuf, err: std::io::Error) -> Error {
    Error::ImportParse {
        path,
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Card;
    use crate::tree::export_tree;
    use tempfile::TempDir;

    #[test]
    fn test_import_layout() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::write(root.join("README.md"), "hello").unwrap();
        fs::create_dir_all(root.join("Topic1/Sub")).unwrap();
        fs::write(root.join("Topic1/Card A.md"), "# hi").unwrap();
        fs::write(root.join("Topic1/Sub/.keep"), "").unwrap();
        fs::write(root.join("Topic1/image.png"), [0u8, 1, 2]).unwrap();
        fs::create_dir_all(root.join(".git/objects")).unwrap();

        let tree = import_tree(root, 9, "Doc").unwrap();

        assert_eq!(tree.graph.nodes.len(), 3);
        assert_eq!(tree.graph.edges.len(), 2);
        let synthetic = tree.graph.node(&tree.root_id).unwrap();
        assert!(synthetic.style.hidden);
        assert_eq!(synthetic.text, "Doc");

        let topic = tree.graph.nodes.iter().find(|n| n.text == "Topic1").unwrap();
        assert_eq!(topic.position, Some(Position::new(DEPTH_SPACING, 0.0)));
        let sub = tree.graph.nodes.iter().find(|n| n.text == "Sub").unwrap();
        assert_eq!(sub.position, Some(Position::new(2.0 * DEPTH_SPACING, 0.0)));

        assert_eq!(tree.cards.len(), 1);
        assert_eq!(tree.cards[0].title, "Card A");
        assert_eq!(tree.cards[0].content, "# hi");
        assert_eq!(tree.cards[0].node_id, topic.id);
        assert_eq!(tree.cards[0].mindmap_id, 9);
        assert!(tree.graph.validate().is_ok());

        assert_eq!(read_readme(root).unwrap(), "hello");
    }

    #[test]
    fn test_nested_readme_is_a_card() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("A")).unwrap();
        fs::write(temp.path().join("A/README.md"), "inner").unwrap();

        let tree = import_tree(temp.path(), 1, "Doc").unwrap();
        assert_eq!(tree.cards.len(), 1);
        assert_eq!(tree.cards[0].title, "README");
    }

    #[test]
    fn test_non_utf8_card_fails() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("A")).unwrap();
        fs::write(temp.path().join("A/bad.md"), [0xffu8, 0xfe, 0xfd]).unwrap();

        let err = import_tree(temp.path(), 1, "Doc").unwrap_err();
        assert!(matches!(err, Error::ImportParse { .. }));
    }

    #[test]
    fn test_missing_readme_is_empty() {
        let temp = TempDir::new().unwrap();
        assert_eq!(read_readme(temp.path()).unwrap(), "");
    }

    /// Shape of a graph as sorted (depth, child count, card titles) rows
    fn shape(graph: &GraphSnapshot, cards: &[(String, String, String)]) -> Vec<String> {
        let root = graph.root().unwrap();
        let mut rows = Vec::new();
        let mut stack = vec![(root, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            let children = graph.children_of(&node.id);
            let mut titles: Vec<String> = cards
                .iter()
                .filter(|(id, _, _)| *id == node.id)
                .map(|(_, t, c)| format!("{}={}", t, c))
                .collect();
            titles.sort();
            if depth > 0 {
                rows.push(format!(
                    "{}|{}|{}|{}",
                    depth,
                    node.text,
                    children.len(),
                    titles.join(",")
                ));
            }
            for child in children {
                stack.push((child, depth + 1));
            }
        }
        rows.sort();
        rows
    }

    #[test]
    fn test_round_trip_preserves_structure() {
        let temp = TempDir::new().unwrap();
        let mut styled = Node::new("a", "Alpha").with_position(12.0, 34.0).with_order(1);
        styled.style.color = Some("red".to_string());
        let graph = GraphSnapshot::new(
            vec![
                Node::new("root", "Root"),
                styled,
                Node::new("b", "Beta").with_order(2),
                Node::new("a1", "Alpha One"),
                Node::new("a2", "Alpha Two"),
            ],
            vec![
                Edge::new("e1", "root", "a"),
                Edge::new("e2", "root", "b"),
                Edge::new("e3", "a", "a1"),
                Edge::new("e4", "a", "a2"),
            ],
        );
        let cards: Vec<Card> = vec![
            NewCard::new(1, "a1", "First", "one").into_card("c1", 1),
            NewCard::new(1, "a1", "Second", "two").into_card("c2", 2),
            NewCard::new(1, "b", "Beta notes", "# beta").into_card("c3", 1),
        ];

        export_tree("doc", &graph, &cards, temp.path()).unwrap();
        let tree = import_tree(temp.path(), 1, "Root").unwrap();

        let before: Vec<_> = cards
            .iter()
            .map(|c| (c.node_id.clone(), c.title.clone(), c.content.clone()))
            .collect();
        let after: Vec<_> = tree
            .cards
            .iter()
            .map(|c| (c.node_id.clone(), c.title.clone(), c.content.clone()))
            .collect();

        assert_eq!(shape(&graph, &before), shape(&tree.graph, &after));

        // Identity and styling are not preserved
        assert!(tree.graph.node("a").is_none());
        let alpha = tree.graph.nodes.iter().find(|n| n.text == "Alpha").unwrap();
        assert_eq!(alpha.style.color, None);
        assert_eq!(alpha.position, Some(Position::new(DEPTH_SPACING, 0.0)));
    }
}
