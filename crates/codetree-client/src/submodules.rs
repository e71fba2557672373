//! `.gitmodules` lookup, decoding and parsing

use base64::Engine;
use codetree_model::{EntryKind, SubmoduleMap, TreeEntry};
use regex::Regex;
use std::sync::OnceLock;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::types::BlobResponse;

/// `[submodule "name"]`
fn section_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"^\[\s*submodule\s+"([^"]*)"\s*\]$"#).unwrap())
}

/// `key = value`
fn key_value_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([A-Za-z][A-Za-z0-9_.-]*)\s*=\s*(.*)$").unwrap())
}

/// The `.gitmodules` blob at the repository root, matched case-insensitively
pub fn find_gitmodules(tree: &[TreeEntry]) -> Option<&TreeEntry> {
    tree.iter().find(|entry| {
        entry.kind == EntryKind::Blob && entry.path.eq_ignore_ascii_case(".gitmodules")
    })
}

/// Decode base64 blob content as served by the API (wrapped with newlines)
pub fn decode_blob(content: &str) -> Result<String, ApiError> {
    let compact: String = content.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| ApiError::InvalidResponse(format!("blob is not valid base64: {}", e)))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Parse `.gitmodules` text into submodule path → remote URL
///
/// Sections missing either key are skipped.
pub fn parse_gitmodules(text: &str) -> SubmoduleMap {
    let mut map = SubmoduleMap::new();
    let mut current: Option<(Option<String>, Option<String>)> = None;

    let mut flush = |section: Option<(Option<String>, Option<String>)>| {
        if let Some((Some(path), Some(url))) = section {
            map.insert(path, url);
        }
    };

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if line.starts_with('[') {
            flush(current.take());
            if section_regex().is_match(line) {
                current = Some((None, None));
            }
            continue;
        }

        let (Some(section), Some(caps)) = (current.as_mut(), key_value_regex().captures(line))
        else {
            continue;
        };
        let value = caps[2].trim().trim_matches('"').to_string();
        match caps[1].to_ascii_lowercase().as_str() {
            "path" => section.0 = Some(value),
            "url" => section.1 = Some(value),
            _ => {}
        }
    }
    flush(current.take());

    map
}

/// Fetch and parse `.gitmodules` for a tree listing
///
/// Returns an empty map when the tree has no `.gitmodules`.
pub async fn fetch_submodules(
    client: &ApiClient,
    owner: &str,
    repo: &str,
    tree: &[TreeEntry],
    token: Option<&str>,
) -> Result<SubmoduleMap, ApiError> {
    let Some(entry) = find_gitmodules(tree) else {
        return Ok(SubmoduleMap::new());
    };

    let path = format!("/git/blobs/{}", entry.sha);
    let blob: BlobResponse = client.get(owner, repo, Some(&path), token).await?;
    let submodules = parse_gitmodules(&decode_blob(&blob.content)?);
    log::debug!("Found {} submodules in {}/{}", submodules.len(), owner, repo);
    Ok(submodules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canned::CannedTransport;
    use crate::client::ApiEndpoint;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    const GITMODULES: &str = r#"
[submodule "vendor/lib"]
	path = vendor/lib
	url = git://github.com/x/lib.git
; a comment
[submodule "docs"]
	path = docs
	url = https://example.com/docs.git
	branch = main
[submodule "broken"]
	path = broken
"#;

    #[test]
    fn test_parse_gitmodules() {
        let map = parse_gitmodules(GITMODULES);
        assert_eq!(map.len(), 2);
        assert_eq!(map["vendor/lib"], "git://github.com/x/lib.git");
        assert_eq!(map["docs"], "https://example.com/docs.git");
        assert!(!map.contains_key("broken"));
    }

    #[test]
    fn test_find_gitmodules_is_case_insensitive_and_root_only() {
        let tree = vec![
            TreeEntry::new("sub/.gitmodules", EntryKind::Blob, "1"),
            TreeEntry::new(".GitModules", EntryKind::Blob, "2"),
        ];
        assert_eq!(find_gitmodules(&tree).map(|e| e.sha.as_str()), Some("2"));
        assert!(find_gitmodules(&tree[..1]).is_none());
    }

    #[test]
    fn test_decode_blob_strips_newlines() {
        let encoded = "aGVsbG8g\nd29ybGQ=\n";
        assert_eq!(decode_blob(encoded).unwrap(), "hello world");
        assert!(decode_blob("!!!").is_err());
    }

    #[tokio::test]
    async fn test_fetch_submodules() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(GITMODULES);
        let transport = CannedTransport::new();
        transport.respond_json(
            "https://api.github.com/repos/o/r/git/blobs/gm1",
            &json!({"content": encoded, "encoding": "base64"}),
        );
        let client = ApiClient::new(Arc::new(transport.clone()), ApiEndpoint::github());
        let tree = vec![
            TreeEntry::new("src", EntryKind::Tree, "t1"),
            TreeEntry::new(".gitmodules", EntryKind::Blob, "gm1"),
        ];

        let map = fetch_submodules(&client, "o", "r", &tree, None).await.unwrap();
        assert_eq!(map.len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_submodules_without_file_makes_no_request() {
        let transport = CannedTransport::new();
        let client = ApiClient::new(Arc::new(transport.clone()), ApiEndpoint::github());
        let tree = vec![TreeEntry::new("README.md", EntryKind::Blob, "1")];

        let map = fetch_submodules(&client, "o", "r", &tree, None).await.unwrap();
        assert!(map.is_empty());
        assert_eq!(transport.request_count(), 0);
    }
}
