//! Path utilities

use std::path::PathBuf;

/// Data directory (~/.toolchat), falling back to the working directory
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".toolchat"))
        .unwrap_or_else(|| PathBuf::from(".toolchat"))
}

/// Config file location
pub fn config_path() -> PathBuf {
    data_dir().join("config.json")
}
