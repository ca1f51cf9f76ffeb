//! Unified path management for parley configuration and data files.
//!
//! All parley configuration and session data live under the platform's
//! standard config/data directories, resolved through the `dirs` crate.

use std::path::PathBuf;

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Unified path management for parley.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/parley/            # Config directory
/// └── config.toml              # Webhook endpoints, greeting text
///
/// ~/.local/share/parley/       # Data directory
/// └── chat_sessions.json       # Durable session store (whole-array writes)
/// ```
pub struct ParleyPaths;

impl ParleyPaths {
    /// Returns the parley configuration directory.
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join("parley"))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the parley data directory.
    pub fn data_dir() -> Result<PathBuf, PathError> {
        dirs::data_dir()
            .map(|dir| dir.join("parley"))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the path to the main configuration file.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the path to the durable session store.
    pub fn sessions_file() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join("chat_sessions.json"))
    }
}
