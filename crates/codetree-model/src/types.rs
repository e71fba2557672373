//! Wire and context types shared by every crate

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Mapping from submodule path to its remote URL
pub type SubmoduleMap = HashMap<String, String>;

/// Type of a tree entry as reported by the host API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Directory
    Tree,
    /// File
    Blob,
    /// Submodule reference
    Commit,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Tree => "tree",
            EntryKind::Blob => "blob",
            EntryKind::Commit => "commit",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A flat tree record `{path, type, sha}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    /// Path relative to the listed tree
    pub path: String,

    /// Entry type
    #[serde(rename = "type")]
    pub kind: EntryKind,

    /// Object SHA (blob, tree or pinned commit)
    pub sha: String,
}

impl TreeEntry {
    pub fn new(path: impl Into<String>, kind: EntryKind, sha: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            sha: sha.into(),
        }
    }

    /// Parent directory path (`""` for top-level entries)
    pub fn parent_path(&self) -> &str {
        match self.path.rfind('/') {
            Some(index) => &self.path[..index],
            None => "",
        }
    }

    /// Last path segment
    pub fn file_name(&self) -> &str {
        match self.path.rfind('/') {
            Some(index) => &self.path[index + 1..],
            None => &self.path,
        }
    }
}

/// Repository being viewed on the current page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoContext {
    /// Owner (user or organization)
    pub username: String,
    /// Repository name
    pub reponame: String,
    /// Branch, tag or commit being browsed
    pub branch: String,
}

impl RepoContext {
    pub fn new(
        username: impl Into<String>,
        reponame: impl Into<String>,
        branch: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            reponame: reponame.into(),
            branch: branch.into(),
        }
    }

    /// `owner/repo` key used by the default-branch cache
    pub fn slug(&self) -> String {
        format!("{}/{}", self.username, self.reponame)
    }

    /// Whether both contexts point at the same repository (branch ignored)
    pub fn same_repo(&self, username: &str, reponame: &str) -> bool {
        self.username == username && self.reponame == reponame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_deserialize_ignores_extra_fields() {
        let json = r#"{"path":"src/lib.rs","mode":"100644","type":"blob","sha":"abc","size":12}"#;
        let entry: TreeEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry, TreeEntry::new("src/lib.rs", EntryKind::Blob, "abc"));
    }

    #[test]
    fn test_parent_and_file_name() {
        let nested = TreeEntry::new("a/b/c.txt", EntryKind::Blob, "1");
        assert_eq!(nested.parent_path(), "a/b");
        assert_eq!(nested.file_name(), "c.txt");

        let top = TreeEntry::new("README.md", EntryKind::Blob, "2");
        assert_eq!(top.parent_path(), "");
        assert_eq!(top.file_name(), "README.md");
    }

    #[test]
    fn test_same_repo_ignores_branch() {
        let repo = RepoContext::new("octocat", "hello", "dev");
        assert!(repo.same_repo("octocat", "hello"));
        assert!(!repo.same_repo("octocat", "other"));
        assert_eq!(repo.slug(), "octocat/hello");
    }
}
