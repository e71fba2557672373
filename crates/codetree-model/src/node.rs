//! Tree-view node model

use serde::{Deserialize, Serialize};

use crate::types::EntryKind;

/// Prefix of every node id
pub const NODE_PREFIX: &str = "codetree";

/// Children of a folder node
///
/// Serializes as a node list (full tree) or as `true` (load on expand).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Children {
    Loaded(Vec<Node>),
    Lazy(bool),
}

/// Anchor attributes consumed by the tree view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anchor {
    pub href: String,
}

/// One row of the rendered file tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Unique id derived from the full path
    pub id: String,

    /// Display HTML (escaped name, or submodule links)
    pub text: String,

    /// CSS class for the icon, the entry type name
    pub icon: String,

    /// Full path from the repository root
    pub path: String,

    /// Object SHA, used for lazy expansion
    pub sha: String,

    #[serde(rename = "type")]
    pub kind: EntryKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Children>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub a_attr: Option<Anchor>,
}

impl Node {
    pub fn is_folder(&self) -> bool {
        self.kind == EntryKind::Tree
    }

    /// Loaded children (empty for files and lazy folders)
    pub fn children(&self) -> &[Node] {
        match &self.children {
            Some(Children::Loaded(children)) => children,
            _ => &[],
        }
    }

    /// Whether children are fetched on expand
    pub fn is_lazy(&self) -> bool {
        matches!(self.children, Some(Children::Lazy(true)))
    }

    pub fn href(&self) -> Option<&str> {
        self.a_attr.as_ref().map(|a| a.href.as_str())
    }
}

/// Depth-first walk over a node forest, yielding `(depth, node)`.
pub fn walk(nodes: &[Node]) -> Vec<(usize, &Node)> {
    fn visit<'a>(nodes: &'a [Node], depth: usize, out: &mut Vec<(usize, &'a Node)>) {
        for node in nodes {
            out.push((depth, node));
            visit(node.children(), depth + 1, out);
        }
    }

    let mut out = Vec::new();
    visit(nodes, 0, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(path: &str, kind: EntryKind, children: Option<Children>) -> Node {
        Node {
            id: format!("{}{}", NODE_PREFIX, path),
            text: path.rsplit('/').next().unwrap_or(path).to_string(),
            icon: kind.to_string(),
            path: path.to_string(),
            sha: "0".to_string(),
            kind,
            children,
            a_attr: None,
        }
    }

    #[test]
    fn test_lazy_children_serialize_as_true() {
        let folder = node("src", EntryKind::Tree, Some(Children::Lazy(true)));
        let json = serde_json::to_value(&folder).unwrap();
        assert_eq!(json["children"], serde_json::json!(true));
        assert_eq!(json["type"], "tree");
        assert_eq!(json["icon"], "tree");
        assert!(json.get("a_attr").is_none());
        assert!(folder.is_lazy());
    }

    #[test]
    fn test_loaded_children_serialize_as_list() {
        let file = node("src/lib.rs", EntryKind::Blob, None);
        let folder = node("src", EntryKind::Tree, Some(Children::Loaded(vec![file])));
        let json = serde_json::to_value(&folder).unwrap();
        assert_eq!(json["children"][0]["path"], "src/lib.rs");
        assert!(json["children"][0].get("children").is_none());
    }

    #[test]
    fn test_walk_is_depth_first() {
        let tree = vec![
            node(
                "a",
                EntryKind::Tree,
                Some(Children::Loaded(vec![node("a/b", EntryKind::Blob, None)])),
            ),
            node("c", EntryKind::Blob, None),
        ];
        let visited: Vec<(usize, &str)> = walk(&tree)
            .into_iter()
            .map(|(depth, n)| (depth, n.path.as_str()))
            .collect();
        assert_eq!(visited, vec![(0, "a"), (1, "a/b"), (0, "c")]);
    }
}
