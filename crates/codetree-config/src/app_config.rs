//! Application configuration
//!
//! Configuration loaded from `.codetree.toml`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{Locale, DEFAULT_SIDEBAR_WIDTH};

/// Application configuration loaded from .codetree.toml
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Personal access token sent to the host API (overrides env lookup)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Language of error messages
    #[serde(default)]
    pub locale: Locale,

    /// Load the whole repository tree in one request when the host allows it
    #[serde(default = "default_load_entire_tree")]
    pub load_entire_tree: bool,

    /// Show the sidebar on repository pages that are not code pages
    #[serde(default)]
    pub show_in_non_code_page: bool,

    /// Sidebar width in pixels
    #[serde(default = "default_sidebar_width")]
    pub sidebar_width: u32,
}

fn default_load_entire_tree() -> bool {
    true
}

fn default_sidebar_width() -> u32 {
    DEFAULT_SIDEBAR_WIDTH
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            token: None,
            locale: Locale::default(),
            load_entire_tree: default_load_entire_tree(),
            show_in_non_code_page: false,
            sidebar_width: default_sidebar_width(),
        }
    }
}

impl AppConfig {
    /// Load config from CWD first, then config dir, then home, or use defaults
    pub fn load() -> Self {
        if let Some(content) = crate::load_config_file() {
            match toml::from_str(&content) {
                Ok(config) => {
                    log::info!("Loaded app config from file");
                    return config;
                }
                Err(e) => {
                    log::warn!("Failed to parse config file: {}", e);
                }
            }
        }

        log::debug!("Using default app config");
        Self::default()
    }

    /// Load config from an explicit path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Token from the config file, ignoring blank values
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.token.is_none());
        assert_eq!(config.locale, Locale::Zh);
        assert!(config.load_entire_tree);
        assert!(!config.show_in_non_code_page);
        assert_eq!(config.sidebar_width, DEFAULT_SIDEBAR_WIDTH);
    }

    #[test]
    fn test_config_deserialize_partial() {
        let toml = r#"
            locale = "en"
            load_entire_tree = false
        "#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.locale, Locale::En);
        assert!(!config.load_entire_tree);
        // Other fields should use defaults
        assert_eq!(config.sidebar_width, DEFAULT_SIDEBAR_WIDTH);
        assert!(config.token.is_none());
    }

    #[test]
    fn test_blank_token_is_ignored() {
        let config = AppConfig {
            token: Some("   ".to_string()),
            ..AppConfig::default()
        };
        assert_eq!(config.token(), None);

        let config = AppConfig {
            token: Some(" abc ".to_string()),
            ..AppConfig::default()
        };
        assert_eq!(config.token(), Some("abc"));
    }

    #[test]
    fn test_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".codetree.toml");
        std::fs::write(&path, "token = \"t0k\"\nsidebar_width = 300\n").unwrap();

        let config = AppConfig::load_from_path(&path).unwrap();
        assert_eq!(config.token(), Some("t0k"));
        assert_eq!(config.sidebar_width, 300);
    }

    #[test]
    fn test_load_from_path_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".codetree.toml");
        std::fs::write(&path, "sidebar_width = \"wide\"").unwrap();

        let err = AppConfig::load_from_path(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
