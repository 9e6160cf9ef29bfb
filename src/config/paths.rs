//! Configuration paths

use std::path::PathBuf;

/// Get the configuration directory
pub fn config_dir() -> PathBuf {
    config_dir_with(|key| std::env::var(key).ok())
}

/// Get the main configuration file path
pub fn config_path() -> PathBuf {
    config_path_with(|key| std::env::var(key).ok())
}

pub(crate) fn config_dir_with(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    // Check for explicit override
    if let Some(dir) = lookup("SEARCHGRAPH_CONFIG_DIR") {
        return PathBuf::from(dir);
    }

    dirs::config_dir()
        .map(|d| d.join("searchgraph"))
        .unwrap_or_else(|| {
            dirs::home_dir()
                .map(|h| h.join(".config").join("searchgraph"))
                .unwrap_or_else(|| PathBuf::from(".searchgraph"))
        })
}

pub(crate) fn config_path_with(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    if let Some(path) = lookup("SEARCHGRAPH_CONFIG") {
        return PathBuf::from(path);
    }

    config_dir_with(lookup).join("config.json")
}
