//! Navigation requests handed to the embedding page

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// How the page should move to a tree item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Navigation {
    /// Partial page load into `container`
    Pjax {
        /// Absolute URL, `protocol//host` + item path
        url: String,
        container: String,
        fragment: Option<String>,
    },
    /// `window.location.href = url`
    Assign { url: String },
    /// Open and focus a new tab
    NewTab { url: String },
}

/// A file download triggered through a temporary link
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Download {
    pub url: String,
    pub file_name: String,
}

fn blob_or_src_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/blob/|/src/").unwrap())
}

/// Point a file page link at its raw content
///
/// Only the first `/blob/` or `/src/` segment is replaced.
pub fn raw_download_url(path: &str) -> String {
    blob_or_src_regex().replace(path, "/raw/").into_owned()
}
