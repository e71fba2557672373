//! The per-host adapter contract

use async_trait::async_trait;
use codetree_client::ApiError;
use codetree_model::{BuildError, BuildTicket, Node, RepoContext};
use thiserror::Error;

use crate::context::{DefaultBranchCache, PageProfile, PageSelectors};
use crate::layout::{LayoutPlan, LayoutState, PageMetrics};
use crate::navigation::{raw_download_url, Download, Navigation};
use crate::page::PageScraper;
use crate::watch::{class_mutation_event, PageEvent, PageWatch};

/// Branch used when the host reports no default branch
pub const FALLBACK_BRANCH: &str = "master";

/// Default minimum sidebar width in pixels
pub const MIN_SIDEBAR_WIDTH: u32 = 200;

/// Why a tree could not be loaded
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadError {
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A newer load superseded this one
    #[error("tree load was superseded by a newer load")]
    Cancelled,
}

impl From<BuildError> for LoadError {
    fn from(err: BuildError) -> Self {
        match err {
            BuildError::Cancelled => LoadError::Cancelled,
        }
    }
}

/// Folder being expanded in lazy mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LazyNode {
    pub path: String,
    pub sha: String,
}

impl From<&Node> for LazyNode {
    fn from(node: &Node) -> Self {
        Self {
            path: node.path.clone(),
            sha: node.sha.clone(),
        }
    }
}

/// One tree load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub repo: RepoContext,
    pub token: Option<String>,
    /// `None` loads the root, `Some` the children of one folder
    pub node: Option<LazyNode>,
    /// Page scheme (`https`), used for submodule links
    pub scheme: String,
    /// Load the whole tree in one request, if the host can
    pub entire_tree: bool,
}

impl LoadRequest {
    pub fn root(repo: RepoContext, scheme: impl Into<String>) -> Self {
        Self {
            repo,
            token: None,
            node: None,
            scheme: scheme.into(),
            entire_tree: true,
        }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn with_node(mut self, node: LazyNode) -> Self {
        self.node = Some(node);
        self
    }

    pub fn with_entire_tree(mut self, entire_tree: bool) -> Self {
        self.entire_tree = entire_tree;
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

/// Host-specific knowledge behind the sidebar
///
/// Implementors describe their pages through [`PageProfile`] and talk to
/// their API; repository detection, navigation and change watching have
/// shared defaults built on top of that.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Page host this adapter serves, e.g. `github.com`
    fn host(&self) -> &str;

    /// CSS class added to the sidebar element
    fn css_class(&self) -> &'static str;

    fn min_width(&self) -> u32 {
        MIN_SIDEBAR_WIDTH
    }

    /// Whether the API can list the whole tree in one request
    fn can_load_entire_tree(&self) -> bool {
        false
    }

    /// Page where users create an access token
    fn create_token_url(&self) -> String;

    fn profile(&self) -> &PageProfile;

    fn selectors(&self) -> &PageSelectors {
        &self.profile().selectors
    }

    /// Fragment extracted from pjax responses, if any
    fn pjax_fragment(&self) -> Option<&'static str> {
        None
    }

    /// Per-session cache of fetched default branches
    fn branch_cache(&self) -> &DefaultBranchCache;

    /// Ask the API for the repository's default branch
    async fn fetch_default_branch(
        &self,
        username: &str,
        reponame: &str,
        token: Option<&str>,
    ) -> Result<Option<String>, ApiError>;

    /// Work out which repository and branch the page shows
    ///
    /// Returns `Ok(None)` for pages that are not repository code pages.
    /// The branch comes from the first source that has one: the page's
    /// branch selectors, `previous` when it is the same repository, the
    /// default-branch cache, then the API (falling back to `master`).
    async fn resolve_repo_context(
        &self,
        page: &dyn PageScraper,
        allow_non_code_pages: bool,
        previous: Option<&RepoContext>,
        token: Option<&str>,
    ) -> Result<Option<RepoContext>, ApiError> {
        let profile = self.profile();

        if page.exists(profile.selectors.not_found) || page.exists(profile.selectors.raw_content)
        {
            return Ok(None);
        }

        let location = page.location();
        let Some(path) = profile.parse_repo_path(&location.pathname) else {
            return Ok(None);
        };

        if !allow_non_code_pages && !profile.is_code_page(&path) {
            log::debug!("{} is not a code page", location.pathname);
            return Ok(None);
        }

        let known = profile
            .page_branch(page)
            .or_else(|| {
                previous
                    .filter(|repo| repo.same_repo(&path.username, &path.reponame))
                    .map(|repo| repo.branch.clone())
                    .filter(|branch| !branch.is_empty())
            })
            .or_else(|| self.branch_cache().get(&path.username, &path.reponame));

        let branch = match known {
            Some(branch) => branch,
            None => {
                let fetched = self
                    .fetch_default_branch(&path.username, &path.reponame, token)
                    .await?
                    .filter(|branch| !branch.is_empty())
                    .unwrap_or_else(|| FALLBACK_BRANCH.to_string());
                log::info!(
                    "Default branch of {}/{} is {}",
                    path.username,
                    path.reponame,
                    fetched
                );
                self.branch_cache()
                    .insert(&path.username, &path.reponame, &fetched);
                fetched
            }
        };

        Ok(Some(RepoContext::new(path.username, path.reponame, branch)))
    }

    /// Fetch and build the tree (or one folder of it)
    async fn load_code_tree(
        &self,
        request: &LoadRequest,
        ticket: &BuildTicket,
    ) -> Result<Vec<Node>, LoadError>;

    /// CSS changes for the current sidebar state
    fn update_layout(&self, state: &LayoutState, metrics: &PageMetrics) -> LayoutPlan;

    /// Navigate to a file or folder link
    fn select_file(&self, page: &dyn PageScraper, path: &str) -> Navigation {
        let container = self.selectors().pjax_container;
        if page.exists(container) {
            Navigation::Pjax {
                url: format!("{}{}", page.location().origin(), path),
                container: container.to_string(),
                fragment: self.pjax_fragment().map(str::to_string),
            }
        } else {
            Navigation::Assign {
                url: path.to_string(),
            }
        }
    }

    fn select_submodule(&self, url: &str) -> Navigation {
        Navigation::Assign {
            url: url.to_string(),
        }
    }

    fn open_in_new_tab(&self, url: &str) -> Navigation {
        Navigation::NewTab {
            url: url.to_string(),
        }
    }

    fn download_file(&self, path: &str, file_name: &str) -> Download {
        Download {
            url: raw_download_url(path),
            file_name: file_name.to_string(),
        }
    }

    /// How location changes should be detected on this page
    fn page_watch(&self, page: &dyn PageScraper) -> PageWatch {
        let container = self.selectors().pjax_container;
        if page.exists(container) {
            PageWatch::PjaxContainer {
                selector: container.to_string(),
            }
        } else {
            PageWatch::poll()
        }
    }

    /// React to a class attribute change on the body
    fn on_class_mutation(&self, old_class: &str, new_class: &str) -> Option<PageEvent> {
        class_mutation_event(old_class, new_class)
    }
}
