//! Repository context detection from the page

use regex::Regex;
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use crate::page::{PageScraper, StaticPage};

/// Where the current branch can be read from the page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchSource {
    /// Text content of the element
    Text(&'static str),
    /// Attribute value of the element
    Attr(&'static str, &'static str),
    /// Attribute value after its first `:` (`owner/repo:branch`)
    AfterColon(&'static str, &'static str),
}

impl BranchSource {
    /// Read the branch, if this source yields a non-empty one
    pub fn read(&self, page: &dyn PageScraper) -> Option<String> {
        let value = match *self {
            BranchSource::Text(selector) => page.text(selector),
            BranchSource::Attr(selector, name) => page.attr(selector, name),
            BranchSource::AfterColon(selector, name) => page
                .attr(selector, name)
                .and_then(|value| value.split_once(':').map(|(_, branch)| branch.to_string())),
        };
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Describe `branch` on a static page so that this source reads it back
    pub fn seed(&self, page: StaticPage, branch: &str) -> StaticPage {
        match *self {
            BranchSource::Text(selector) => page.with_text(selector, branch),
            BranchSource::Attr(selector, name) => page.with_attr(selector, name, branch),
            BranchSource::AfterColon(selector, name) => {
                page.with_attr(selector, name, format!(":{}", branch))
            }
        }
    }
}

/// Selectors an adapter queries on its host's pages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSelectors {
    /// Present on 404 pages
    pub not_found: &'static str,
    /// Present on raw file pages
    pub raw_content: &'static str,
    /// Container replaced by pjax navigation
    pub pjax_container: &'static str,
    /// Main page containers shifted by the layout
    pub containers: &'static str,
    /// Branch sources, most specific first
    pub branch: &'static [BranchSource],
}

/// Everything needed to tell repository code pages apart on one host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageProfile {
    pub selectors: PageSelectors,
    /// First path segments that are site pages, not users
    pub reserved_users: &'static [&'static str],
    /// Second path segments that are user pages, not repositories
    pub reserved_repos: &'static [&'static str],
    /// Third path segments that denote code pages
    pub code_page_types: &'static [&'static str],
}

/// `/(user)/(repo)[/(type)]` split out of a page path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoPath {
    pub username: String,
    pub reponame: String,
    pub page_type: Option<String>,
}

fn repo_path_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([^/]+)/([^/]+)(?:/([^/]+))?").unwrap())
}

impl PageProfile {
    /// Match a page path against the repository pattern and reserved names
    pub fn parse_repo_path(&self, pathname: &str) -> Option<RepoPath> {
        let caps = repo_path_regex().captures(pathname)?;
        let username = caps.get(1)?.as_str();
        let reponame = caps.get(2)?.as_str();

        if self.reserved_users.contains(&username) || self.reserved_repos.contains(&reponame) {
            return None;
        }

        Some(RepoPath {
            username: username.to_string(),
            reponame: reponame.to_string(),
            page_type: caps.get(3).map(|m| m.as_str().to_string()),
        })
    }

    /// Code pages are the repository root and the types listed in the profile
    pub fn is_code_page(&self, path: &RepoPath) -> bool {
        path.page_type
            .as_deref()
            .is_none_or(|page_type| self.code_page_types.contains(&page_type))
    }

    /// Branch from the page itself, first non-empty source wins
    pub fn page_branch(&self, page: &dyn PageScraper) -> Option<String> {
        self.selectors
            .branch
            .iter()
            .find_map(|source| source.read(page))
    }
}

/// Default branch per `owner/repo`, kept for the lifetime of an adapter
#[derive(Debug, Default)]
pub struct DefaultBranchCache {
    branches: Mutex<HashMap<String, String>>,
}

impl DefaultBranchCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, username: &str, reponame: &str) -> Option<String> {
        self.branches
            .lock()
            .ok()?
            .get(&format!("{}/{}", username, reponame))
            .cloned()
    }

    pub fn insert(&self, username: &str, reponame: &str, branch: &str) {
        if let Ok(mut branches) = self.branches.lock() {
            branches.insert(format!("{}/{}", username, reponame), branch.to_string());
        }
    }
}
