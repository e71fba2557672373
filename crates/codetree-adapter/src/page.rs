//! Read-only view of the host page
//!
//! Adapters never touch a DOM. Everything they need to know about the page
//! comes through [`PageScraper`]: the location plus a handful of selector
//! queries.

use reqwest::Url;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PageError {
    #[error("Invalid page URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Page URL '{0}' has no host")]
    MissingHost(String),
}

/// The parts of `window.location` adapters look at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLocation {
    /// Scheme with trailing colon, e.g. `https:`
    pub protocol: String,
    /// Host with port, if any
    pub host: String,
    /// Path as served, still percent-encoded
    pub pathname: String,
    /// Fragment including `#`, or empty
    pub hash: String,
    pub href: String,
}

impl PageLocation {
    pub fn parse(url: &str) -> Result<Self, PageError> {
        let parsed = Url::parse(url).map_err(|e| PageError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        let host_name = parsed
            .host_str()
            .ok_or_else(|| PageError::MissingHost(url.to_string()))?;
        let host = match parsed.port() {
            Some(port) => format!("{}:{}", host_name, port),
            None => host_name.to_string(),
        };

        Ok(Self {
            protocol: format!("{}:", parsed.scheme()),
            host,
            pathname: parsed.path().to_string(),
            hash: parsed
                .fragment()
                .map(|f| format!("#{}", f))
                .unwrap_or_default(),
            href: parsed.to_string(),
        })
    }

    /// Scheme without the colon, e.g. `https`
    pub fn scheme(&self) -> &str {
        self.protocol.trim_end_matches(':')
    }

    /// `protocol//host`
    pub fn origin(&self) -> String {
        format!("{}//{}", self.protocol, self.host)
    }
}

/// Queries an adapter may run against the current page
///
/// Selectors may list alternatives separated by commas; a query matches
/// the first element matching any of them.
pub trait PageScraper: Send + Sync {
    fn location(&self) -> PageLocation;

    /// Whether any element matches `selector`
    fn exists(&self, selector: &str) -> bool;

    /// Trimmed text content of the first match
    fn text(&self, selector: &str) -> Option<String>;

    /// Attribute value of the first match
    fn attr(&self, selector: &str, name: &str) -> Option<String>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Element {
    text: String,
    attrs: HashMap<String, String>,
}

/// A page described by its URL and a table of selector facts
///
/// Used by the CLI and by tests in place of a live document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticPage {
    location: PageLocation,
    elements: HashMap<String, Element>,
}

impl StaticPage {
    pub fn new(location: PageLocation) -> Self {
        Self {
            location,
            elements: HashMap::new(),
        }
    }

    pub fn from_url(url: &str) -> Result<Self, PageError> {
        Ok(Self::new(PageLocation::parse(url)?))
    }

    /// Declare that an element matching `selector` exists
    pub fn with_element(mut self, selector: &str) -> Self {
        self.elements.entry(selector.trim().to_string()).or_default();
        self
    }

    pub fn with_text(mut self, selector: &str, text: impl Into<String>) -> Self {
        self.elements
            .entry(selector.trim().to_string())
            .or_default()
            .text = text.into();
        self
    }

    pub fn with_attr(mut self, selector: &str, name: &str, value: impl Into<String>) -> Self {
        self.elements
            .entry(selector.trim().to_string())
            .or_default()
            .attrs
            .insert(name.to_string(), value.into());
        self
    }

    fn find(&self, selector: &str) -> Option<&Element> {
        selector
            .split(',')
            .find_map(|alternative| self.elements.get(alternative.trim()))
    }
}

impl PageScraper for StaticPage {
    fn location(&self) -> PageLocation {
        self.location.clone()
    }

    fn exists(&self, selector: &str) -> bool {
        self.find(selector).is_some()
    }

    fn text(&self, selector: &str) -> Option<String> {
        self.find(selector)
            .map(|element| element.text.trim().to_string())
            .filter(|text| !text.is_empty())
    }

    fn attr(&self, selector: &str, name: &str) -> Option<String> {
        self.find(selector)
            .and_then(|element| element.attrs.get(name).cloned())
    }
}
