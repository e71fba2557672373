//! Page adapters for Git hosting sites
//!
//! An adapter knows one host's pages and API: which repository and branch a
//! page shows, how to fetch its tree, how to navigate to a file, and how to
//! shift the page layout around the sidebar. [`SidebarSession`] drives an
//! adapter for one browser tab.
//!
//! # Architecture
//!
//! ```text
//!  PageScraper (URL + selector facts)
//!        │
//!        ▼
//! ┌────────────────────────────┐        ┌──────────────────────┐
//! │ SidebarSession             │───────►│ Adapter              │
//! │  - current repo            │        │  GitHub / Gitee /    │
//! │  - build generation        │        │  Bitbucket           │
//! │  - token, config           │        └──────────┬───────────┘
//! └────────────────────────────┘                   │
//!        │ ReloadOutcome / ErrorMessage            ▼
//!        ▼                              ApiClient ──► TreeBuilder
//!  tree view (Node JSON)
//! ```
//!
//! Navigation, change watching and layout come back as plain data
//! ([`Navigation`], [`PageWatch`], [`LayoutPlan`]) for the embedding page to
//! apply.

pub mod adapter;
pub mod context;
pub mod hosts;
pub mod layout;
pub mod navigation;
pub mod page;
pub mod session;
pub mod watch;

pub use adapter::{Adapter, LazyNode, LoadError, LoadRequest, FALLBACK_BRANCH, MIN_SIDEBAR_WIDTH};
pub use context::{BranchSource, DefaultBranchCache, PageProfile, PageSelectors, RepoPath};
pub use hosts::{build_adapter, BitbucketAdapter, GitHubAdapter, GiteeAdapter, HostKind};
pub use layout::{CssChange, LayoutPlan, LayoutState, PageMetrics};
pub use navigation::{raw_download_url, Download, Navigation};
pub use page::{PageError, PageLocation, PageScraper, StaticPage};
pub use session::{ReloadOutcome, SidebarSession};
pub use watch::{
    class_mutation_event, spawn_location_poller, LocationSource, LocationTracker, PageEvent,
    PageWatch,
};
