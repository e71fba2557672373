//! Page layout adjustments as data

use serde::Serialize;

/// Sidebar state the layout depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutState {
    pub toggler_visible: bool,
    pub sidebar_visible: bool,
    pub sidebar_width: u32,
}

/// Measurements taken from the page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageMetrics {
    /// `$(document).width()`
    pub document_width: f64,
    /// Width of the main containers
    pub container_width: f64,
}

impl PageMetrics {
    /// Margin the page centers its containers with
    pub fn auto_margin_left(&self) -> f64 {
        (self.document_width - self.container_width) / 2.0
    }
}

/// One CSS property to set on every element matching `selector`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CssChange {
    pub selector: String,
    pub property: String,
    /// Empty resets the property to the stylesheet value
    pub value: String,
}

/// CSS changes to apply, in order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LayoutPlan {
    pub changes: Vec<CssChange>,
}

impl LayoutPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a pixel value, or reset the property when `px` is `None`
    pub fn px(mut self, selector: &str, property: &str, px: Option<f64>) -> Self {
        self.changes.push(CssChange {
            selector: selector.to_string(),
            property: property.to_string(),
            value: px.map(format_px).unwrap_or_default(),
        });
        self
    }

    /// Value planned for a property, last change wins
    pub fn value(&self, selector: &str, property: &str) -> Option<&str> {
        self.changes
            .iter()
            .rev()
            .find(|change| change.selector == selector && change.property == property)
            .map(|change| change.value.as_str())
    }
}

fn format_px(px: f64) -> String {
    if px.fract() == 0.0 {
        format!("{}px", px as i64)
    } else {
        format!("{}px", px)
    }
}

/// Push the page right of the sidebar when the centered layout would overlap it
pub fn should_push_left(state: &LayoutState, metrics: &PageMetrics, spacing: f64) -> bool {
    state.sidebar_visible
        && metrics.auto_margin_left() <= f64::from(state.sidebar_width) + spacing
}
