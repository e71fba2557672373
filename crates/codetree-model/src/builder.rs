//! Chunked tree builder
//!
//! Converts a flat list of [`TreeEntry`] into [`Node`]s. Entries are handled
//! in chunks of [`CHUNK_SIZE`] so large repositories never monopolize the
//! runtime: [`TreeBuilder::build_cooperative`] yields between chunks and
//! stops early when its [`BuildTicket`] goes stale.

use log::{debug, warn};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;

use crate::escape::{encode_path, escape_html};
use crate::links::{resolve_submodule, LinkPolicy, SubmoduleLink};
use crate::node::{Anchor, Children, Node, NODE_PREFIX};
use crate::ticket::BuildTicket;
use crate::types::{EntryKind, RepoContext, SubmoduleMap, TreeEntry};

/// Entries processed per scheduler tick
pub const CHUNK_SIZE: usize = 300;

/// Per-item hook run before an entry is placed in the tree
pub type Transform = Box<dyn Fn(&mut TreeEntry) + Send + Sync>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("tree build was superseded by a newer build")]
    Cancelled,
}

/// Shape of the build output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildMode {
    /// Nested tree rooted at the repository root
    Full,
    /// Immediate children of one folder; `parent_path` is `None` at the root
    Lazy { parent_path: Option<String> },
}

/// Everything the builder needs besides the entries
#[derive(Clone)]
pub struct BuildContext {
    pub repo: RepoContext,
    /// Page scheme used when rewriting submodule URLs
    pub scheme: String,
    pub submodules: SubmoduleMap,
    pub links: Arc<dyn LinkPolicy>,
    pub mode: BuildMode,
}

impl BuildContext {
    pub fn new(repo: RepoContext, links: Arc<dyn LinkPolicy>, mode: BuildMode) -> Self {
        Self {
            repo,
            scheme: "https".to_string(),
            submodules: SubmoduleMap::new(),
            links,
            mode,
        }
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn with_submodules(mut self, submodules: SubmoduleMap) -> Self {
        self.submodules = submodules;
        self
    }

    fn is_lazy(&self) -> bool {
        matches!(self.mode, BuildMode::Lazy { .. })
    }
}

/// Progress after one [`TreeBuilder::step`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStep {
    /// More entries remain
    Pending,
    /// Input is exhausted; call [`TreeBuilder::finish`]
    Done,
}

/// Incremental flat-list → tree converter
pub struct TreeBuilder {
    ctx: BuildContext,
    transform: Option<Transform>,
    pending: std::vec::IntoIter<TreeEntry>,
    chunk_size: usize,
    /// Arena of created nodes; folder children are attached in `finish`
    nodes: Vec<Node>,
    /// Folder path → indices of its children, in discovery order
    folders: HashMap<String, Vec<usize>>,
    seen: HashSet<String>,
}

impl TreeBuilder {
    pub fn new(entries: Vec<TreeEntry>, ctx: BuildContext) -> Self {
        let mut folders = HashMap::new();
        folders.insert(String::new(), Vec::new());

        Self {
            ctx,
            transform: None,
            nodes: Vec::with_capacity(entries.len()),
            pending: entries.into_iter(),
            chunk_size: CHUNK_SIZE,
            folders,
            seen: HashSet::new(),
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Process at most one chunk of entries
    pub fn step(&mut self) -> BuildStep {
        for _ in 0..self.chunk_size {
            match self.pending.next() {
                Some(entry) => self.place(entry),
                None => return BuildStep::Done,
            }
        }

        if self.pending.len() == 0 {
            BuildStep::Done
        } else {
            BuildStep::Pending
        }
    }

    /// Drain all entries without yielding
    pub fn build(mut self) -> Vec<Node> {
        while self.step() == BuildStep::Pending {}
        self.finish()
    }

    /// Drain all entries, yielding to the runtime between chunks.
    ///
    /// Returns [`BuildError::Cancelled`] if `ticket` goes stale before the
    /// build completes; no partial result is produced.
    pub async fn build_cooperative(mut self, ticket: &BuildTicket) -> Result<Vec<Node>, BuildError> {
        let mut chunks = 0usize;
        loop {
            if !ticket.is_current() {
                debug!(
                    "Dropping stale tree build #{} after {} chunks",
                    ticket.generation(),
                    chunks
                );
                return Err(BuildError::Cancelled);
            }

            chunks += 1;
            if self.step() == BuildStep::Done {
                break;
            }
            tokio::task::yield_now().await;
        }

        if !ticket.is_current() {
            return Err(BuildError::Cancelled);
        }
        Ok(self.finish())
    }

    /// Assemble the result from everything placed so far
    pub fn finish(mut self) -> Vec<Node> {
        let total = self.nodes.len();
        let mut slots: Vec<Option<Node>> = std::mem::take(&mut self.nodes)
            .into_iter()
            .map(Some)
            .collect();
        let root = self.folders.remove("").unwrap_or_default();

        let result: Vec<Node> = if self.ctx.is_lazy() {
            root.into_iter()
                .filter_map(|index| slots[index].take())
                .collect()
        } else {
            root.into_iter()
                .filter_map(|index| attach(index, &mut slots, &mut self.folders))
                .collect()
        };

        let orphans = slots.iter().filter(|slot| slot.is_some()).count();
        if orphans > 0 {
            warn!(
                "Dropped {} of {} tree entries whose parent folder was not listed",
                orphans, total
            );
        }

        debug!("Built {} top-level nodes from {} entries", result.len(), total);
        result
    }

    fn place(&mut self, mut entry: TreeEntry) {
        if let Some(transform) = &self.transform {
            transform(&mut entry);
        }

        if let BuildMode::Lazy {
            parent_path: Some(parent),
        } = &self.ctx.mode
        {
            if !parent.is_empty() {
                entry.path = format!("{}/{}", parent, entry.path);
            }
        }

        if entry.path.is_empty() {
            warn!("Skipping tree entry with empty path (sha {})", entry.sha);
            return;
        }
        if !self.seen.insert(entry.path.clone()) {
            warn!("Skipping duplicate tree entry {}", entry.path);
            return;
        }

        let node = self.make_node(&entry);
        let index = self.nodes.len();
        self.nodes.push(node);

        let parent = if self.ctx.is_lazy() {
            ""
        } else {
            entry.parent_path()
        };
        self.folders.entry(parent.to_string()).or_default().push(index);

        if entry.kind == EntryKind::Tree && !self.ctx.is_lazy() {
            self.folders.entry(entry.path.clone()).or_default();
        }
    }

    fn make_node(&self, entry: &TreeEntry) -> Node {
        let name = escape_html(entry.file_name());
        let mut node = Node {
            id: format!("{}{}", NODE_PREFIX, entry.path),
            text: name.clone(),
            icon: entry.kind.to_string(),
            path: entry.path.clone(),
            sha: entry.sha.clone(),
            kind: entry.kind,
            children: None,
            a_attr: None,
        };

        match entry.kind {
            EntryKind::Tree | EntryKind::Blob => {
                if entry.kind == EntryKind::Tree && self.ctx.is_lazy() {
                    node.children = Some(Children::Lazy(true));
                }
                let href =
                    self.ctx
                        .links
                        .item_href(&self.ctx.repo, entry.kind, &encode_path(&entry.path));
                node.a_attr = Some(Anchor { href });
            }
            EntryKind::Commit => {
                let url = self.ctx.submodules.get(&entry.path).map(String::as_str);
                match resolve_submodule(url, self.ctx.links.as_ref(), &self.ctx.scheme) {
                    SubmoduleLink::Unknown => {}
                    SubmoduleLink::Foreign { url } => {
                        node.a_attr = Some(Anchor { href: url });
                    }
                    SubmoduleLink::InHost { url } => {
                        let short_sha: String = entry.sha.chars().take(7).collect();
                        node.text = format!(
                            "<a href=\"{url}\" class=\"jstree-anchor\">{name}</a><span>@ </span><a href=\"{commit}\" class=\"jstree-anchor\">{short_sha}</a>",
                            url = url,
                            name = name,
                            commit = self.ctx.links.commit_href(&url, &entry.sha),
                            short_sha = short_sha,
                        );
                        node.a_attr = Some(Anchor { href: url });
                    }
                }
            }
        }

        node
    }
}

/// Move a node out of the arena, recursively attaching folder children
fn attach(
    index: usize,
    slots: &mut [Option<Node>],
    folders: &mut HashMap<String, Vec<usize>>,
) -> Option<Node> {
    let mut node = slots[index].take()?;
    if node.kind == EntryKind::Tree {
        let child_indices = folders.remove(&node.path).unwrap_or_default();
        let children = child_indices
            .into_iter()
            .filter_map(|child| attach(child, slots, folders))
            .collect();
        node.children = Some(Children::Loaded(children));
    }
    Some(node)
}
