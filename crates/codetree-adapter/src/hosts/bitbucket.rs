//! Bitbucket Cloud
//!
//! The 2.0 API lists one folder per request (paginated through `next`), so
//! the tree is always loaded lazily. Entries come back with full paths and
//! are cut down to their leaf name before placement.

use async_trait::async_trait;
use codetree_client::{parse_gitmodules, ApiClient, ApiEndpoint, ApiError, Transport};
use codetree_model::{
    encode_path, BuildContext, BuildMode, BuildTicket, EntryKind, LinkPolicy, Node, RepoContext,
    SubmoduleMap, TreeBuilder, TreeEntry,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::encode_branch;
use crate::adapter::{Adapter, LoadError, LoadRequest};
use crate::context::{BranchSource, DefaultBranchCache, PageProfile, PageSelectors};
use crate::layout::{LayoutPlan, LayoutState, PageMetrics};
use crate::navigation::Navigation;
use crate::page::PageScraper;
use crate::watch::PageEvent;

const BITBUCKET_HOST: &str = "bitbucket.org";
const BB_TOGGLE: &str = ".codetree_toggle";
const BB_HEADER: &str = ".aui-header";

/// Toggle offset and header padding while the sidebar is hidden
const TOGGLE_HIDDEN_RIGHT: f64 = -44.0;
const HEADER_HIDDEN_PADDING: f64 = 56.0;

static PROFILE: PageProfile = PageProfile {
    selectors: PageSelectors {
        not_found: "#error.404",
        raw_content: "body > pre",
        pjax_container: "#source-container",
        containers: BB_HEADER,
        branch: &[
            BranchSource::Attr(".branch-dialog-trigger", "title"),
            BranchSource::Text(".branch-dialog-trigger .name"),
        ],
    },
    reserved_users: &[
        "account", "dashboard", "integrations", "product", "repo", "snippets", "support",
        "whats-new",
    ],
    reserved_repos: &["followers", "following", "repositories"],
    code_page_types: &["src"],
};

/// `/{user}/{repo}/src/{branch}/{path}` links
#[derive(Debug, Clone, Default)]
pub struct BitbucketLinks;

impl LinkPolicy for BitbucketLinks {
    fn item_href(&self, repo: &RepoContext, _kind: EntryKind, encoded_path: &str) -> String {
        format!(
            "/{}/{}/src/{}/{}",
            repo.username, repo.reponame, repo.branch, encoded_path
        )
    }

    fn is_same_host(&self, url: &str) -> bool {
        url.contains(BITBUCKET_HOST)
    }

    fn commit_href(&self, module_url: &str, sha: &str) -> String {
        format!("{}/src/{}", module_url, sha)
    }
}

#[derive(Debug, Deserialize)]
struct SrcPage {
    #[serde(default)]
    values: Vec<SrcEntry>,
    #[serde(default)]
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SrcEntry {
    path: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    commit: Option<SrcCommit>,
}

#[derive(Debug, Deserialize)]
struct SrcCommit {
    hash: String,
}

#[derive(Debug, Default, Deserialize)]
struct Repository {
    #[serde(default)]
    mainbranch: Option<MainBranch>,
}

#[derive(Debug, Deserialize)]
struct MainBranch {
    name: String,
}

fn leaf_name(entry: &mut TreeEntry) {
    let trimmed = entry.path.trim_end_matches('/');
    let leaf = trimmed.rsplit('/').next().unwrap_or(trimmed);
    entry.path = leaf.to_string();
}

pub struct BitbucketAdapter {
    client: ApiClient,
    links: Arc<BitbucketLinks>,
    branches: DefaultBranchCache,
    /// `.gitmodules` per `owner/repo@branch`, read with the root listing
    submodules: Mutex<HashMap<String, SubmoduleMap>>,
}

impl BitbucketAdapter {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            client: ApiClient::new(transport, ApiEndpoint::bitbucket()),
            links: Arc::new(BitbucketLinks),
            branches: DefaultBranchCache::new(),
            submodules: Mutex::new(HashMap::new()),
        }
    }

    fn submodule_key(repo: &RepoContext) -> String {
        format!("{}@{}", repo.slug(), repo.branch)
    }

    async fn list_folder(
        &self,
        repo: &RepoContext,
        folder: &str,
        token: Option<&str>,
    ) -> Result<Vec<SrcEntry>, ApiError> {
        let path = format!("/src/{}/{}", encode_branch(&repo.branch), encode_path(folder));
        let mut page: SrcPage = self
            .client
            .get(&repo.username, &repo.reponame, Some(&path), token)
            .await?;
        let mut entries = std::mem::take(&mut page.values);

        while let Some(next) = page.next.take() {
            log::debug!("Following page link {}", next);
            page = self.client.get_url(&next, token).await?;
            entries.append(&mut page.values);
        }
        Ok(entries)
    }

    async fn root_submodules(
        &self,
        repo: &RepoContext,
        listing: &[SrcEntry],
        token: Option<&str>,
    ) -> Result<SubmoduleMap, ApiError> {
        let has_gitmodules = listing
            .iter()
            .any(|entry| entry.kind == "commit_file" && entry.path.eq_ignore_ascii_case(".gitmodules"));
        if !has_gitmodules {
            return Ok(SubmoduleMap::new());
        }

        let path = format!("/src/{}/.gitmodules", encode_branch(&repo.branch));
        let text = self
            .client
            .get_text(&repo.username, &repo.reponame, Some(&path), token)
            .await?;
        Ok(parse_gitmodules(&text))
    }

    fn cached_submodules(&self, repo: &RepoContext) -> SubmoduleMap {
        self.submodules
            .lock()
            .ok()
            .and_then(|cache| cache.get(&Self::submodule_key(repo)).cloned())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Adapter for BitbucketAdapter {
    fn host(&self) -> &str {
        BITBUCKET_HOST
    }

    fn css_class(&self) -> &'static str {
        "codetree_bitbucket_sidebar"
    }

    fn create_token_url(&self) -> String {
        "https://bitbucket.org/account/admin/app-passwords".to_string()
    }

    fn profile(&self) -> &PageProfile {
        &PROFILE
    }

    fn branch_cache(&self) -> &DefaultBranchCache {
        &self.branches
    }

    async fn fetch_default_branch(
        &self,
        username: &str,
        reponame: &str,
        token: Option<&str>,
    ) -> Result<Option<String>, ApiError> {
        let repo: Repository = self.client.get(username, reponame, None, token).await?;
        Ok(repo.mainbranch.map(|branch| branch.name))
    }

    async fn load_code_tree(
        &self,
        request: &LoadRequest,
        ticket: &BuildTicket,
    ) -> Result<Vec<Node>, LoadError> {
        let repo = &request.repo;
        let token = request.token();
        let folder = request
            .node
            .as_ref()
            .map(|node| node.path.as_str())
            .unwrap_or("");

        let listing = self.list_folder(repo, folder, token).await?;

        let submodules = if folder.is_empty() {
            let submodules = self.root_submodules(repo, &listing, token).await?;
            if let Ok(mut cache) = self.submodules.lock() {
                cache.insert(Self::submodule_key(repo), submodules.clone());
            }
            submodules
        } else {
            self.cached_submodules(repo)
        };

        let entries: Vec<TreeEntry> = listing
            .into_iter()
            .filter_map(|entry| {
                let kind = match entry.kind.as_str() {
                    "commit_directory" if submodules.contains_key(entry.path.trim_end_matches('/')) => {
                        EntryKind::Commit
                    }
                    "commit_directory" => EntryKind::Tree,
                    "commit_file" => EntryKind::Blob,
                    other => {
                        log::debug!("Skipping {} entry {}", other, entry.path);
                        return None;
                    }
                };
                let sha = entry.commit.map(|c| c.hash).unwrap_or_default();
                Some(TreeEntry::new(entry.path, kind, sha))
            })
            .collect();

        let mode = BuildMode::Lazy {
            parent_path: Some(folder.to_string()).filter(|p| !p.is_empty()),
        };
        let ctx = BuildContext::new(repo.clone(), self.links.clone(), mode)
            .with_scheme(request.scheme.clone())
            .with_submodules(submodules);

        Ok(TreeBuilder::new(entries, ctx)
            .with_transform(Box::new(leaf_name))
            .build_cooperative(ticket)
            .await?)
    }

    fn update_layout(&self, state: &LayoutState, _metrics: &PageMetrics) -> LayoutPlan {
        let visible = state.sidebar_visible;

        LayoutPlan::new()
            .px(BB_TOGGLE, "right", (!visible).then_some(TOGGLE_HIDDEN_RIGHT))
            .px(BB_HEADER, "padding-left", (!visible).then_some(HEADER_HIDDEN_PADDING))
            .px("html", "margin-left", visible.then_some(f64::from(state.sidebar_width)))
    }

    /// Bitbucket pages don't load through pjax
    fn select_file(&self, _page: &dyn PageScraper, path: &str) -> Navigation {
        Navigation::Assign {
            url: path.to_string(),
        }
    }

    fn on_class_mutation(&self, _old_class: &str, _new_class: &str) -> Option<PageEvent> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::LazyNode;
    use crate::page::StaticPage;
    use codetree_client::{CannedTransport, HttpResponse};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const API: &str = "https://api.bitbucket.org/2.0/repositories/team/app";

    fn adapter(transport: &CannedTransport) -> BitbucketAdapter {
        BitbucketAdapter::new(Arc::new(transport.clone()))
    }

    fn repo() -> RepoContext {
        RepoContext::new("team", "app", "main")
    }

    #[test]
    fn test_lazy_only() {
        let transport = CannedTransport::new();
        assert!(!adapter(&transport).can_load_entire_tree());
    }

    #[tokio::test]
    async fn test_src_pages_are_code_pages() {
        let transport = CannedTransport::new();
        transport.respond_json(API, &json!({"mainbranch": {"name": "develop"}}));
        let adapter = adapter(&transport);

        let src = StaticPage::from_url("https://bitbucket.org/team/app/src").unwrap();
        let repo = adapter.resolve_repo_context(&src, false, None, None).await.unwrap();
        assert_eq!(repo, Some(RepoContext::new("team", "app", "develop")));

        let tree = StaticPage::from_url("https://bitbucket.org/team/app/tree").unwrap();
        assert_eq!(adapter.resolve_repo_context(&tree, false, None, None).await.unwrap(), None);

        let snippets = StaticPage::from_url("https://bitbucket.org/snippets/team").unwrap();
        assert_eq!(
            adapter.resolve_repo_context(&snippets, true, None, None).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_root_listing_follows_pagination() {
        let transport = CannedTransport::new();
        let next = format!("{}/src/main/?page=2", API);
        transport.respond_json(
            format!("{}/src/main/", API),
            &json!({
                "values": [{"path": "src", "type": "commit_directory", "commit": {"hash": "c1"}}],
                "next": next,
            }),
        );
        transport.respond_json(
            next.clone(),
            &json!({"values": [{"path": "README.md", "type": "commit_file", "commit": {"hash": "c1"}}]}),
        );
        let adapter = adapter(&transport);

        let nodes = adapter
            .load_code_tree(&LoadRequest::root(repo(), "https"), &BuildTicket::detached())
            .await
            .unwrap();
        assert_eq!(nodes.len(), 2);
        assert!(nodes[0].is_lazy());
        assert_eq!(nodes[0].href(), Some("/team/app/src/main/src"));
        assert_eq!(nodes[1].path, "README.md");
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn test_folder_entries_are_cut_to_leaf_names() {
        let transport = CannedTransport::new();
        transport.respond_json(
            format!("{}/src/main/src/bin", API),
            &json!({"values": [
                {"path": "src/bin/main.rs", "type": "commit_file", "commit": {"hash": "c1"}},
                {"path": "src/bin/tools", "type": "commit_directory", "commit": {"hash": "c1"}},
                {"path": "src/bin/link", "type": "commit_link"},
            ]}),
        );
        let adapter = adapter(&transport);
        let request = LoadRequest::root(repo(), "https").with_node(LazyNode {
            path: "src/bin".to_string(),
            sha: "c1".to_string(),
        });

        let nodes = adapter
            .load_code_tree(&request, &BuildTicket::detached())
            .await
            .unwrap();
        let paths: Vec<&str> = nodes.iter().map(|n| n.path.as_str()).collect();
        assert_eq!(paths, vec!["src/bin/main.rs", "src/bin/tools"]);
        assert_eq!(nodes[0].text, "main.rs");
        assert_eq!(nodes[0].id, "codetreesrc/bin/main.rs");
    }

    #[tokio::test]
    async fn test_submodule_directories_link_to_module() {
        let transport = CannedTransport::new();
        transport.respond_json(
            format!("{}/src/main/", API),
            &json!({"values": [
                {"path": ".gitmodules", "type": "commit_file", "commit": {"hash": "c1"}},
                {"path": "vendor", "type": "commit_directory", "commit": {"hash": "abcdef1234"}},
            ]}),
        );
        transport.respond(
            format!("{}/src/main/.gitmodules", API),
            HttpResponse::ok("[submodule \"vendor\"]\n\tpath = vendor\n\turl = git@bitbucket.org:team/vendor.git\n"),
        );
        let adapter = adapter(&transport);

        let nodes = adapter
            .load_code_tree(&LoadRequest::root(repo(), "https"), &BuildTicket::detached())
            .await
            .unwrap();
        let vendor = &nodes[1];
        assert_eq!(vendor.kind, EntryKind::Commit);
        assert_eq!(vendor.href(), Some("https://bitbucket.org/team/vendor"));
        assert!(vendor.text.contains("https://bitbucket.org/team/vendor/src/abcdef1234"));
    }

    #[tokio::test]
    async fn test_listing_errors_are_classified() {
        let transport = CannedTransport::new();
        transport.respond(
            format!("{}/src/main/", API),
            HttpResponse::with_status(403, "Forbidden", "{}").with_header("X-RateLimit-Remaining", "0"),
        );
        let adapter = adapter(&transport);

        let err = adapter
            .load_code_tree(&LoadRequest::root(repo(), "https"), &BuildTicket::detached())
            .await
            .unwrap_err();
        assert_eq!(err, LoadError::Api(ApiError::RateLimited));
    }

    #[test]
    fn test_update_layout_and_navigation() {
        let transport = CannedTransport::new();
        let adapter = adapter(&transport);
        let metrics = PageMetrics {
            document_width: 1200.0,
            container_width: 1200.0,
        };
        let hidden = LayoutState {
            toggler_visible: true,
            sidebar_visible: false,
            sidebar_width: 232,
        };

        let plan = adapter.update_layout(&hidden, &metrics);
        assert_eq!(plan.value(BB_TOGGLE, "right"), Some("-44px"));
        assert_eq!(plan.value(BB_HEADER, "padding-left"), Some("56px"));
        assert_eq!(plan.value("html", "margin-left"), Some(""));

        let page = StaticPage::from_url("https://bitbucket.org/team/app/src")
            .unwrap()
            .with_element("#source-container");
        assert_eq!(
            adapter.select_file(&page, "/team/app/src/main/a.rs"),
            Navigation::Assign {
                url: "/team/app/src/main/a.rs".to_string()
            }
        );
        assert_eq!(adapter.on_class_mutation("", "split-diff"), None);
        assert_eq!(
            adapter.download_file("/team/app/src/main/a.rs", "a.rs").url,
            "/team/app/raw/main/a.rs"
        );
    }
}
