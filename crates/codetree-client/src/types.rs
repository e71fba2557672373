//! API data transfer objects

use codetree_model::TreeEntry;
use serde::{Deserialize, Serialize};

/// `GET /repos/{owner}/{repo}/git/trees/{sha}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeResponse {
    #[serde(default)]
    pub sha: Option<String>,

    pub tree: Vec<TreeEntry>,

    /// Set when the host cut the listing short
    #[serde(default)]
    pub truncated: bool,
}

/// `GET /repos/{owner}/{repo}/git/blobs/{sha}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobResponse {
    /// Base64 content, possibly wrapped with newlines
    pub content: String,

    #[serde(default)]
    pub encoding: Option<String>,
}

/// `GET /repos/{owner}/{repo}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepoInfo {
    #[serde(default)]
    pub default_branch: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_response_defaults() {
        let json = r#"{"tree":[{"path":"a","type":"tree","sha":"1"}]}"#;
        let response: TreeResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.tree.len(), 1);
        assert!(!response.truncated);
        assert!(response.sha.is_none());
    }

    #[test]
    fn test_repo_info_without_default_branch() {
        let info: RepoInfo = serde_json::from_str(r#"{"id": 1}"#).unwrap();
        assert!(info.default_branch.is_none());
    }
}
