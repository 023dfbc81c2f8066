//! Configuration module for Passbook
//!
//! This module provides configuration management including:
//! - Data directory resolution
//! - User settings persistence and environment overrides

pub mod paths;
pub mod settings;

pub use paths::PassbookPaths;
pub use settings::{AuthSettings, Settings};
