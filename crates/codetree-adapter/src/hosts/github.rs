//! GitHub and GitHub Enterprise

use async_trait::async_trait;
use codetree_client::{ApiClient, ApiEndpoint, ApiError, RepoInfo, Transport};
use codetree_model::{BuildTicket, GitHubStyleLinks, Node};
use std::sync::Arc;

use super::{load_git_tree, GIT_RESERVED_REPO_NAMES, GIT_RESERVED_USER_NAMES};
use crate::adapter::{Adapter, LoadError, LoadRequest};
use crate::context::{BranchSource, DefaultBranchCache, PageProfile, PageSelectors};
use crate::layout::{should_push_left, LayoutPlan, LayoutState, PageMetrics};

const GITHUB_HOST: &str = "github.com";

const GH_CONTAINERS: &str = ".container, .container-lg, .container-responsive";

/// Gap kept between the sidebar and the page containers
const SPACING: f64 = 10.0;

static PROFILE: PageProfile = PageProfile {
    selectors: PageSelectors {
        not_found: "#parallax_wrapper",
        raw_content: "body > pre",
        pjax_container: "#js-repo-pjax-container, .context-loader-container, [data-pjax-container]",
        containers: GH_CONTAINERS,
        branch: &[
            BranchSource::Attr(".branch-select-menu .select-menu-item.selected", "data-name"),
            BranchSource::AfterColon(".commit-ref.base-ref", "title"),
        ],
    },
    reserved_users: GIT_RESERVED_USER_NAMES,
    reserved_repos: GIT_RESERVED_REPO_NAMES,
    code_page_types: &["tree", "blob"],
};

pub struct GitHubAdapter {
    host: String,
    scheme: String,
    client: ApiClient,
    links: Arc<GitHubStyleLinks>,
    branches: DefaultBranchCache,
}

impl GitHubAdapter {
    /// Adapter for `host`; anything but github.com is treated as Enterprise
    pub fn new(host: &str, scheme: &str, transport: Arc<dyn Transport>) -> Self {
        let endpoint = if host == GITHUB_HOST {
            ApiEndpoint::github()
        } else {
            ApiEndpoint::github_enterprise(scheme, host)
        };

        Self {
            host: host.to_string(),
            scheme: scheme.to_string(),
            client: ApiClient::new(transport, endpoint),
            links: Arc::new(GitHubStyleLinks::new(&[host])),
            branches: DefaultBranchCache::new(),
        }
    }

    pub fn is_enterprise(&self) -> bool {
        self.host != GITHUB_HOST
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }
}

#[async_trait]
impl Adapter for GitHubAdapter {
    fn host(&self) -> &str {
        &self.host
    }

    fn css_class(&self) -> &'static str {
        "codetree_github_sidebar"
    }

    fn can_load_entire_tree(&self) -> bool {
        true
    }

    fn create_token_url(&self) -> String {
        if self.is_enterprise() {
            format!("{}://{}/settings/tokens/new", self.scheme, self.host)
        } else {
            "https://github.com/settings/tokens/new".to_string()
        }
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
        let width = f64::from(state.sidebar_width);

        LayoutPlan::new()
            .px("html", "margin-left", push.then_some(width))
            .px(GH_CONTAINERS, "margin-left", push.then_some(SPACING))
    }
}
