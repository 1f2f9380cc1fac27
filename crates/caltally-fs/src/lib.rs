//! Filesystem layer for caltally.
//!
//! A workspace is a directory holding:
//! - `.caltally/config.yml`: calendar location, timezone and report defaults
//! - the exported `.ics` file the config points at

pub mod calendar;
pub mod config;
pub mod error;
pub mod workspace;

pub use calendar::Calendar;
pub use config::CaltallyConfig;
pub use error::{FsError, Result};
pub use workspace::Workspace;
