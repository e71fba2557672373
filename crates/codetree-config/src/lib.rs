//! Configuration and file management for codetree
//!
//! This crate provides:
//! - Platform paths for the config file
//! - Configuration file loading (TOML)
//! - Application configuration (AppConfig)
//! - The message locale shared by the client and adapter crates

pub mod app_config;
pub mod config_file;
pub mod locale;
pub mod paths;

pub use app_config::AppConfig;
pub use config_file::load_config_file;
pub use locale::Locale;

/// Default sidebar width in pixels
pub const DEFAULT_SIDEBAR_WIDTH: u32 = 232;
