//! Host-specific link shaping for tree nodes

use crate::types::{EntryKind, RepoContext};

/// Builds navigation links for tree nodes.
///
/// Each host adapter supplies one policy. The defaults match GitHub's URL
/// layout, which Gitee shares.
pub trait LinkPolicy: Send + Sync {
    /// Link for a file or folder. `encoded_path` is already percent-encoded.
    fn item_href(&self, repo: &RepoContext, kind: EntryKind, encoded_path: &str) -> String {
        format!(
            "/{}/{}/{}/{}/{}",
            repo.username, repo.reponame, kind, repo.branch, encoded_path
        )
    }

    /// Whether a submodule URL lives on this host family.
    fn is_same_host(&self, url: &str) -> bool;

    /// Link to a submodule's pinned commit.
    fn commit_href(&self, module_url: &str, sha: &str) -> String {
        format!("{}/tree/{}", module_url, sha)
    }
}

/// Link policy for hosts using `/{user}/{repo}/{tree|blob}/{branch}/{path}`
#[derive(Debug, Clone)]
pub struct GitHubStyleLinks {
    hosts: Vec<String>,
}

impl GitHubStyleLinks {
    pub fn new(hosts: &[&str]) -> Self {
        Self {
            hosts: hosts.iter().map(|h| h.to_string()).collect(),
        }
    }
}

impl LinkPolicy for GitHubStyleLinks {
    fn is_same_host(&self, url: &str) -> bool {
        self.hosts.iter().any(|host| url.contains(host.as_str()))
    }
}

/// How a submodule entry should be linked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmoduleLink {
    /// No URL known for the submodule path
    Unknown,
    /// URL on another host, linked as-is
    Foreign { url: String },
    /// URL on the same host family, rewritten to a browsable page
    InHost { url: String },
}

/// Resolve a submodule URL against the current host.
///
/// `scheme` is the page scheme (`https`) used to replace `git://` and
/// `git@` prefixes.
pub fn resolve_submodule(
    url: Option<&str>,
    policy: &dyn LinkPolicy,
    scheme: &str,
) -> SubmoduleLink {
    let Some(url) = url.filter(|u| !u.is_empty()) else {
        return SubmoduleLink::Unknown;
    };

    if !policy.is_same_host(url) {
        return SubmoduleLink::Foreign {
            url: url.to_string(),
        };
    }

    let rewritten = match url.strip_prefix("git://").or_else(|| url.strip_prefix("git@")) {
        Some(rest) => format!("{}://{}", scheme, scp_to_path(rest)),
        None => url.to_string(),
    };
    let rewritten = rewritten
        .strip_suffix(".git")
        .map(str::to_string)
        .unwrap_or(rewritten);

    SubmoduleLink::InHost { url: rewritten }
}

/// `host:owner/repo` → `host/owner/repo`
fn scp_to_path(rest: &str) -> String {
    match rest.find(':') {
        Some(colon) if !rest[..colon].contains('/') && !rest[colon + 1..].starts_with("//") => {
            format!("{}/{}", &rest[..colon], &rest[colon + 1..])
        }
        _ => rest.to_string(),
    }
}
