//! Tree data model and builder
//!
//! This crate turns the flat tree listing returned by a Git host API into
//! the nested node structure rendered by the sidebar tree view.
//!
//! # Architecture
//!
//! ```text
//! Vec<TreeEntry> ──► TreeBuilder ──step()──► BuildStep::Pending ─┐
//!                        ▲                                       │
//!                        └──────────── yield to runtime ◄────────┘
//!                                            │
//!                                   BuildStep::Done ──► Vec<Node>
//! ```
//!
//! Links for files, folders and submodules are produced through the
//! [`LinkPolicy`] trait so every host can shape its own URLs.
//!
//! # Example
//!
//! ```rust
//! use codetree_model::{BuildContext, BuildMode, GitHubStyleLinks, RepoContext, TreeBuilder, TreeEntry, EntryKind};
//! use std::sync::Arc;
//!
//! let repo = RepoContext::new("octocat", "hello", "main");
//! let ctx = BuildContext::new(repo, Arc::new(GitHubStyleLinks::new(&["github.com"])), BuildMode::Full);
//! let entries = vec![
//!     TreeEntry::new("src", EntryKind::Tree, "a1"),
//!     TreeEntry::new("src/main.rs", EntryKind::Blob, "b2"),
//! ];
//! let nodes = TreeBuilder::new(entries, ctx).build();
//! assert_eq!(nodes[0].children().len(), 1);
//! ```

pub mod builder;
pub mod escape;
pub mod links;
pub mod node;
pub mod ticket;
pub mod types;

pub use builder::{BuildContext, BuildError, BuildMode, BuildStep, Transform, TreeBuilder, CHUNK_SIZE};
pub use escape::{encode_component, encode_path, escape_html};
pub use links::{resolve_submodule, GitHubStyleLinks, LinkPolicy, SubmoduleLink};
pub use node::{walk, Anchor, Children, Node, NODE_PREFIX};
pub use ticket::{BuildGeneration, BuildTicket};
pub use types::{EntryKind, RepoContext, SubmoduleMap, TreeEntry};
