use std::path::{Path, PathBuf};
use std::{env, fs};

use crate::paths;

const CONFIG_FILE: &str = ".codetree.toml";

/// Load config file content
///
/// Searches in order:
/// 1. `.codetree.toml` in the current working directory
/// 2. `config.toml` in the platform config directory
/// 3. `~/.codetree.toml`
///
/// Returns the file content of the first hit, None otherwise.
pub fn load_config_file() -> Option<String> {
    candidate_paths().iter().find_map(|path| read_config(path))
}

fn candidate_paths() -> Vec<PathBuf> {
    let mut candidates = vec![PathBuf::from(CONFIG_FILE)];
    if let Ok(path) = paths::app_config_path() {
        candidates.push(path);
    }
    if let Some(home_config) = get_home_config_path() {
        candidates.push(home_config);
    }
    candidates
}

fn read_config(path: &Path) -> Option<String> {
    let content = fs::read_to_string(path).ok()?;
    log::debug!("Loaded config from {}", path.display());
    Some(content)
}

/// Get the path to the config file in the home directory
fn get_home_config_path() -> Option<PathBuf> {
    env::var_os("HOME").map(|home| PathBuf::from(home).join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidates_start_with_cwd_file() {
        let candidates = candidate_paths();
        assert_eq!(candidates[0], PathBuf::from(CONFIG_FILE));
    }

    #[test]
    fn test_read_config_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_config(&dir.path().join("nope.toml")).is_none());
    }

    #[test]
    fn test_read_config_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "locale = \"en\"").unwrap();
        assert_eq!(read_config(&path).as_deref(), Some("locale = \"en\""));
    }
}
