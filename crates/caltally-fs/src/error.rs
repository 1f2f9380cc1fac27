//! Error types for the filesystem layer.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for filesystem operations.
pub type Result<T> = std::result::Result<T, FsError>;

/// Errors that can occur while loading workspaces and calendars.
#[derive(Debug, Error)]
pub enum FsError {
    /// Workspace not found at the specified path.
    #[error("workspace not found at '{0}'")]
    WorkspaceNotFound(PathBuf),

    /// Workspace already exists.
    #[error("workspace already exists at '{0}'")]
    WorkspaceExists(PathBuf),

    /// Calendar file not found.
    #[error("calendar not found at '{0}'")]
    CalendarNotFound(PathBuf),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error.
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Core library error.
    #[error("core error: {0}")]
    Core(#[from] caltally_core::CoreError),
}
