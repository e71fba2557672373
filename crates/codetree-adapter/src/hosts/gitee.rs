//! Gitee (formerly git.oschina.net)

use async_trait::async_trait;
use codetree_client::{ApiClient, ApiEndpoint, ApiError, RepoInfo, Transport};
use codetree_model::{BuildTicket, GitHubStyleLinks, Node};
use std::sync::Arc;

use super::{load_git_tree, GIT_RESERVED_REPO_NAMES, GIT_RESERVED_USER_NAMES};
use crate::adapter::{Adapter, LoadError, LoadRequest};
use crate::context::{BranchSource, DefaultBranchCache, PageProfile, PageSelectors};
use crate::layout::{should_push_left, LayoutPlan, LayoutState, PageMetrics};

const OSC_PJAX_CONTAINER_SEL: &str = "#tree-holder";
const OSC_CONTAINERS: &str = "#git-header-nav";
const OSC_DOWNLOAD_PANEL: &str = ".git-project-download-panel";

/// Left offset of the page containers while the sidebar pushes them
const SPACING: f64 = 232.0;
const DOWNLOAD_PANEL_MARGIN: f64 = 240.0;

/// Hosts serving the same repositories
const GITEE_HOSTS: &[&str] = &["gitee.com", "git.oschina.net"];

static PROFILE: PageProfile = PageProfile {
    selectors: PageSelectors {
        not_found: "#parallax_wrapper",
        raw_content: "body > pre",
        pjax_container: OSC_PJAX_CONTAINER_SEL,
        containers: OSC_CONTAINERS,
        branch: &[
            BranchSource::Text("#git-project-branch .text"),
            BranchSource::AfterColon(".commit-ref.base-ref", "title"),
        ],
    },
    reserved_users: GIT_RESERVED_USER_NAMES,
    reserved_repos: GIT_RESERVED_REPO_NAMES,
    code_page_types: &["tree", "blob"],
};

pub struct GiteeAdapter {
    host: String,
    scheme: String,
    client: ApiClient,
    links: Arc<GitHubStyleLinks>,
    branches: DefaultBranchCache,
}

impl GiteeAdapter {
    /// The API follows the page's scheme and host
    pub fn new(host: &str, scheme: &str, transport: Arc<dyn Transport>) -> Self {
        let mut hosts = GITEE_HOSTS.to_vec();
        if !hosts.contains(&host) {
            hosts.push(host);
        }

        Self {
            host: host.to_string(),
            scheme: scheme.to_string(),
            client: ApiClient::new(transport, ApiEndpoint::gitee(scheme, host)),
            links: Arc::new(GitHubStyleLinks::new(&hosts)),
            branches: DefaultBranchCache::new(),
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }
}

#[async_trait]
impl Adapter for GiteeAdapter {
    fn host(&self) -> &str {
        &self.host
    }

    fn css_class(&self) -> &'static str {
        "codetree_gitee_sidebar"
    }

    fn can_load_entire_tree(&self) -> bool {
        true
    }

    fn create_token_url(&self) -> String {
        format!("{}://{}/api/v5/swagger", self.scheme, self.host)
    }

    fn profile(&self) -> &PageProfile {
        &PROFILE
    }

    fn pjax_fragment(&self) -> Option<&'static str> {
        Some(OSC_PJAX_CONTAINER_SEL)
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
        let info: RepoInfo = self.client.get(username, reponame, None, token).await?;
        Ok(info.default_branch)
    }

    async fn load_code_tree(
        &self,
        request: &LoadRequest,
        ticket: &BuildTicket,
    ) -> Result<Vec<Node>, LoadError> {
        load_git_tree(&self.client, self.links.clone(), request, ticket).await
    }

    fn update_layout(&self, state: &LayoutState, metrics: &PageMetrics) -> LayoutPlan {
        let push = should_push_left(state, metrics, SPACING);
        let width = metrics.document_width - SPACING;

        LayoutPlan::new()
            .px("html", "margin-left", push.then_some(f64::from(state.sidebar_width)))
            .px(OSC_CONTAINERS, "margin-left", push.then_some(SPACING))
            .px(OSC_CONTAINERS, "width", push.then_some(width))
            .px(OSC_DOWNLOAD_PANEL, "margin-right", push.then_some(DOWNLOAD_PANEL_MARGIN))
    }
}
