//! Path management for Passbook
//!
//! ## Path Resolution Order
//!
//! 1. `PASSBOOK_DATA_DIR` environment variable (if set)
//! 2. The platform data directory from `directories::ProjectDirs`
//!    (e.g. `~/.local/share/passbook` on Linux)

use std::path::{Path, PathBuf};

use directories::ProjectDirs;

use crate::error::{PassbookError, PassbookResult};

/// Environment variable that overrides the base directory
pub const DATA_DIR_ENV: &str = "PASSBOOK_DATA_DIR";

/// Manages all paths used by Passbook
#[derive(Debug, Clone)]
pub struct PassbookPaths {
    base_dir: PathBuf,
}

impl PassbookPaths {
    /// Resolve the base directory from the environment or the platform default
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined.
    pub fn new() -> PassbookResult<Self> {
        let base_dir = match std::env::var_os(DATA_DIR_ENV) {
            Some(custom) if !custom.is_empty() => PathBuf::from(custom),
            _ => ProjectDirs::from("", "", "passbook")
                .map(|dirs| dirs.data_dir().to_path_buf())
                .ok_or_else(|| {
                    PassbookError::Config("Could not determine a home directory".into())
                })?,
        };
        Ok(Self { base_dir })
    }

    /// Use an explicit base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Directory holding the store file
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// The persisted item store
    pub fn store_file(&self) -> PathBuf {
        self.data_dir().join("passbook.json")
    }

    /// Token saved by `auth login`
    pub fn session_file(&self) -> PathBuf {
        self.base_dir.join("session")
    }

    /// Ensure the base and data directories exist
    pub fn ensure_directories(&self) -> PassbookResult<()> {
        std::fs::create_dir_all(self.data_dir()).map_err(|e| {
            PassbookError::Io(format!(
                "Failed to create data directory {}: {}",
                self.data_dir().display(),
                e
            ))
        })
    }
}
