//! Sidebar session: one adapter, one page view at a time

use codetree_client::{ApiError, ErrorMessage};
use codetree_config::AppConfig;
use codetree_model::{BuildGeneration, BuildTicket, Node, RepoContext};
use serde::Serialize;
use std::sync::{Arc, Mutex};

use crate::adapter::{Adapter, LazyNode, LoadError, LoadRequest};
use crate::page::PageScraper;

/// Result of a reload or expansion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReloadOutcome {
    /// The page is not a repository code page; hide the sidebar
    NotCodePage,
    Loaded { repo: RepoContext, nodes: Vec<Node> },
    /// A newer reload started meanwhile; drop this result
    Stale,
}

#[derive(Debug, Clone)]
struct View {
    repo: RepoContext,
    scheme: String,
}

/// Per-tab controller
///
/// Remembers the repository being viewed so that branch detection can fall
/// back to it, and numbers its builds so that a reload supersedes every
/// load still in flight.
pub struct SidebarSession {
    adapter: Arc<dyn Adapter>,
    config: AppConfig,
    token: Mutex<Option<String>>,
    view: Mutex<Option<View>>,
    generation: BuildGeneration,
}

impl SidebarSession {
    pub fn new(adapter: Arc<dyn Adapter>, config: AppConfig, token: Option<String>) -> Self {
        Self {
            adapter,
            config,
            token: Mutex::new(token.filter(|t| !t.trim().is_empty())),
            view: Mutex::new(None),
            generation: BuildGeneration::new(),
        }
    }

    pub fn adapter(&self) -> &Arc<dyn Adapter> {
        &self.adapter
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Replace the token, e.g. after the user pasted one
    pub fn set_token(&self, token: Option<String>) {
        if let Ok(mut current) = self.token.lock() {
            *current = token.filter(|t| !t.trim().is_empty());
        }
    }

    fn token(&self) -> Option<String> {
        self.token.lock().ok().and_then(|t| t.clone())
    }

    /// Repository of the last successful resolution
    pub fn current_repo(&self) -> Option<RepoContext> {
        self.view
            .lock()
            .ok()
            .and_then(|view| view.as_ref().map(|v| v.repo.clone()))
    }

    fn set_view(&self, view: Option<View>) {
        if let Ok(mut current) = self.view.lock() {
            *current = view;
        }
    }

    /// Resolve the page's repository and load its tree
    pub async fn reload(&self, page: &dyn PageScraper) -> Result<ReloadOutcome, ErrorMessage> {
        let ticket = self.generation.next_ticket();
        let location = page.location();
        let previous = self.current_repo();
        let token = self.token();
        log::info!("Reloading tree for {} (build #{})", location.href, ticket.generation());

        let resolved = self
            .adapter
            .resolve_repo_context(
                page,
                self.config.show_in_non_code_page,
                previous.as_ref(),
                token.as_deref(),
            )
            .await;
        if !ticket.is_current() {
            return Ok(ReloadOutcome::Stale);
        }

        let repo = match resolved {
            Ok(Some(repo)) => repo,
            Ok(None) => {
                self.set_view(None);
                return Ok(ReloadOutcome::NotCodePage);
            }
            Err(err) => return Err(self.error_message(&err)),
        };
        self.set_view(Some(View {
            repo: repo.clone(),
            scheme: location.scheme().to_string(),
        }));

        let request = LoadRequest::root(repo.clone(), location.scheme())
            .with_token(token)
            .with_entire_tree(self.config.load_entire_tree);

        let loaded = self.adapter.load_code_tree(&request, &ticket).await;
        self.finish(loaded, &ticket, repo)
    }

    /// Load the children of a lazily loaded folder
    pub async fn expand(&self, node: &Node) -> Result<ReloadOutcome, ErrorMessage> {
        let ticket = self.generation.current_ticket();
        let Some(view) = self.view.lock().ok().and_then(|v| v.clone()) else {
            return Ok(ReloadOutcome::NotCodePage);
        };

        let request = LoadRequest::root(view.repo.clone(), view.scheme)
            .with_token(self.token())
            .with_node(LazyNode::from(node))
            .with_entire_tree(false);

        log::debug!("Expanding {} in {}", node.path, view.repo.slug());
        let loaded = self.adapter.load_code_tree(&request, &ticket).await;
        self.finish(loaded, &ticket, view.repo)
    }

    fn finish(
        &self,
        loaded: Result<Vec<Node>, LoadError>,
        ticket: &BuildTicket,
        repo: RepoContext,
    ) -> Result<ReloadOutcome, ErrorMessage> {
        if !ticket.is_current() {
            log::debug!("Discarding result of stale build #{}", ticket.generation());
            return Ok(ReloadOutcome::Stale);
        }

        match loaded {
            Ok(nodes) => Ok(ReloadOutcome::Loaded { repo, nodes }),
            Err(LoadError::Cancelled) => Ok(ReloadOutcome::Stale),
            Err(LoadError::Api(err)) => Err(self.error_message(&err)),
        }
    }

    /// Localized message for an API failure
    pub fn error_message(&self, err: &ApiError) -> ErrorMessage {
        log::warn!("Tree load failed: {}", err);
        err.to_message(self.config.locale, &self.adapter.create_token_url())
    }
}
