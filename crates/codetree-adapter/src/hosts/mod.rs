//! Host adapters
//!
//! GitHub and Gitee share the `git/trees` API and URL layout; Bitbucket has
//! its own `src` API and is lazy-only.

mod bitbucket;
mod gitee;
mod github;

pub use bitbucket::BitbucketAdapter;
pub use gitee::GiteeAdapter;
pub use github::GitHubAdapter;

use codetree_client::{fetch_submodules, ApiClient, Transport, TreeResponse};
use codetree_model::{encode_component, BuildContext, BuildMode, BuildTicket, LinkPolicy, Node, TreeBuilder};
use percent_encoding::percent_decode_str;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::adapter::{Adapter, LoadError, LoadRequest};
use crate::page::PageLocation;

/// Top-level names that are site pages on GitHub and Gitee
pub(crate) const GIT_RESERVED_USER_NAMES: &[&str] = &[
    "settings", "orgs", "organizations", "site", "blog", "about", "explore", "styleguide",
    "showcases", "trending", "stars", "dashboard", "notifications", "search", "developer",
    "account", "pulls", "issues", "features", "contact", "security", "join", "login",
    "watching", "new", "integrations", "gist", "business", "mirrors", "open-source",
    "personal", "pricing",
];

pub(crate) const GIT_RESERVED_REPO_NAMES: &[&str] = &["followers", "following", "repositories"];

/// Supported hosting services
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostKind {
    GitHub,
    Gitee,
    Bitbucket,
}

impl HostKind {
    /// Recognize a public host by name
    pub fn detect(host: &str) -> Option<Self> {
        let host = host.split(':').next().unwrap_or(host);
        match host {
            "github.com" | "www.github.com" => Some(HostKind::GitHub),
            "gitee.com" | "git.oschina.net" => Some(HostKind::Gitee),
            "bitbucket.org" => Some(HostKind::Bitbucket),
            _ => None,
        }
    }
}

impl fmt::Display for HostKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HostKind::GitHub => "github",
            HostKind::Gitee => "gitee",
            HostKind::Bitbucket => "bitbucket",
        };
        f.write_str(name)
    }
}

impl FromStr for HostKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "github" | "ghe" => Ok(HostKind::GitHub),
            "gitee" | "oschina" => Ok(HostKind::Gitee),
            "bitbucket" => Ok(HostKind::Bitbucket),
            other => Err(format!("Unknown host kind: {}", other)),
        }
    }
}

/// Create the adapter for a page
pub fn build_adapter(
    kind: HostKind,
    location: &PageLocation,
    transport: Arc<dyn Transport>,
) -> Arc<dyn Adapter> {
    match kind {
        HostKind::GitHub => Arc::new(GitHubAdapter::new(
            &location.host,
            location.scheme(),
            transport,
        )),
        HostKind::Gitee => Arc::new(GiteeAdapter::new(
            &location.host,
            location.scheme(),
            transport,
        )),
        HostKind::Bitbucket => Arc::new(BitbucketAdapter::new(transport)),
    }
}

/// `encodeURIComponent(decodeURIComponent(branch))`
pub(crate) fn encode_branch(branch: &str) -> String {
    encode_component(&percent_decode_str(branch).decode_utf8_lossy())
}

/// Load through `GET /git/trees/{sha|branch}[?recursive=1]`
pub(crate) async fn load_git_tree(
    client: &ApiClient,
    links: Arc<dyn LinkPolicy>,
    request: &LoadRequest,
    ticket: &BuildTicket,
) -> Result<Vec<Node>, LoadError> {
    let repo = &request.repo;
    let token = request.token();
    let encoded_branch = encode_branch(&repo.branch);

    let (tree_path, mode) = match &request.node {
        Some(node) => {
            let target = if node.sha.is_empty() {
                encoded_branch
            } else {
                node.sha.clone()
            };
            let parent_path = Some(node.path.clone()).filter(|p| !p.is_empty());
            (target, BuildMode::Lazy { parent_path })
        }
        None if request.entire_tree => (format!("{}?recursive=1", encoded_branch), BuildMode::Full),
        None => (encoded_branch, BuildMode::Lazy { parent_path: None }),
    };

    log::debug!("Loading tree {} of {}", tree_path, repo.slug());
    let tree: TreeResponse = client
        .get(
            &repo.username,
            &repo.reponame,
            Some(&format!("/git/trees/{}", tree_path)),
            token,
        )
        .await?;

    // Only the root listing can hold the repository's .gitmodules
    let at_root = request.node.as_ref().is_none_or(|node| node.path.is_empty());
    let submodules = if at_root {
        fetch_submodules(client, &repo.username, &repo.reponame, &tree.tree, token).await?
    } else {
        Default::default()
    };

    let ctx = BuildContext::new(repo.clone(), links, mode)
        .with_scheme(request.scheme.clone())
        .with_submodules(submodules);
    Ok(TreeBuilder::new(tree.tree, ctx)
        .build_cooperative(ticket)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_host() {
        assert_eq!(HostKind::detect("github.com"), Some(HostKind::GitHub));
        assert_eq!(HostKind::detect("git.oschina.net"), Some(HostKind::Gitee));
        assert_eq!(HostKind::detect("gitee.com:443"), Some(HostKind::Gitee));
        assert_eq!(HostKind::detect("bitbucket.org"), Some(HostKind::Bitbucket));
        assert_eq!(HostKind::detect("example.com"), None);
    }

    #[test]
    fn test_host_kind_from_str() {
        assert_eq!("GitHub".parse::<HostKind>(), Ok(HostKind::GitHub));
        assert_eq!("oschina".parse::<HostKind>(), Ok(HostKind::Gitee));
        assert!("gitlab".parse::<HostKind>().is_err());
        assert_eq!(HostKind::Bitbucket.to_string(), "bitbucket");
    }

    #[test]
    fn test_encode_branch() {
        assert_eq!(encode_branch("feature/x"), "feature%2Fx");
        assert_eq!(encode_branch("feature%2Fx"), "feature%2Fx");
        assert_eq!(encode_branch("main"), "main");
    }
}
