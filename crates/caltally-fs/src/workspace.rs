//! Workspace management.

use crate::calendar::Calendar;
use crate::config::CaltallyConfig;
use crate::error::{FsError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Directory name for caltally configuration.
const CALTALLY_DIR: &str = ".caltally";
/// Configuration file name.
const CONFIG_FILE: &str = "config.yml";

/// A directory holding a caltally config and the calendar it points at.
#[derive(Debug)]
pub struct Workspace {
    /// Root path of the workspace.
    root: PathBuf,
    /// Workspace configuration.
    config: CaltallyConfig,
}

impl Workspace {
    /// Initialize a new workspace at the given path.
    ///
    /// # Errors
    /// Returns error if workspace already exists or IO fails.
    pub fn init(path: impl AsRef<Path>) -> Result<Self> {
        let root = path.as_ref().to_path_buf();
        let caltally_dir = root.join(CALTALLY_DIR);

        if caltally_dir.exists() {
            return Err(FsError::WorkspaceExists(root));
        }

        fs::create_dir_all(&caltally_dir)?;

        let config = CaltallyConfig::default();
        let config_content = serde_yaml::to_string(&config)?;
        fs::write(caltally_dir.join(CONFIG_FILE), config_content)?;

        info!(path = %root.display(), "Initialized workspace");

        Ok(Self { root, config })
    }

    /// Open an existing workspace at the given path.
    ///
    /// # Errors
    /// Returns error if workspace doesn't exist or config is invalid.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let root = path.as_ref().to_path_buf();
        let config_path = root.join(CALTALLY_DIR).join(CONFIG_FILE);

        if !config_path.exists() {
            return Err(FsError::WorkspaceNotFound(root));
        }

        let config_content = fs::read_to_string(&config_path)?;
        let config: CaltallyConfig = serde_yaml::from_str(&config_content)?;

        debug!(path = %root.display(), "Opened workspace");

        Ok(Self { root, config })
    }

    /// Open the workspace at `path`, or fall back to default configuration
    /// rooted there when none exists.
    ///
    /// # Errors
    /// Returns error if a workspace exists but its config is invalid.
    pub fn open_or_default(path: impl AsRef<Path>) -> Result<Self> {
        match Self::open(&path) {
            Err(FsError::WorkspaceNotFound(root)) => {
                debug!(path = %root.display(), "No workspace, using default config");
                Ok(Self {
                    root,
                    config: CaltallyConfig::default(),
                })
            }
            other => other,
        }
    }

    /// Get the workspace root path.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the workspace configuration.
    #[must_use]
    pub const fn config(&self) -> &CaltallyConfig {
        &self.config
    }

    /// Path of the configured calendar file.
    #[must_use]
    pub fn calendar_path(&self) -> PathBuf {
        self.root.join(&self.config.calendar.path)
    }

    /// Load the configured calendar, or `override_path` when given.
    ///
    /// # Errors
    /// Returns error if the file is missing or the calendar is unusable.
    pub fn load_calendar(&self, override_path: Option<&Path>) -> Result<Calendar> {
        let path = override_path.map_or_else(|| self.calendar_path(), Path::to_path_buf);
        Calendar::load(path)
    }
}
