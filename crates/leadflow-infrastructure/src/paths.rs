//! Unified path management for Leadflow data.
//!
//! Every persistent artefact (sessions, transcripts, the notification
//! outbox, logs) lives below a single data directory.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable that overrides the data directory.
pub const HOME_ENV: &str = "LEADFLOW_HOME";

/// Errors that can occur during path resolution.
#[derive(Debug, Error)]
pub enum PathError {
    /// Home directory could not be determined.
    #[error("Cannot find home directory")]
    HomeDirNotFound,
}

impl From<PathError> for leadflow_core::LeadflowError {
    fn from(err: PathError) -> Self {
        Self::config(err.to_string())
    }
}

/// Resolved directory layout.
///
/// # Directory Structure
///
/// ```text
/// ~/.leadflow/                 # Data directory (LEADFLOW_HOME overrides)
/// ├── config.toml              # Application configuration
/// ├── sessions/                # One <session-id>.json per session
/// ├── transcripts/             # One <session-id>.jsonl per session
/// ├── outbox/                  # Rendered checkpoint notifications
/// └── logs/                    # Application logs
///     └── leadflow.log.YYYY-MM-DD
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadflowPaths {
    root: PathBuf,
}

impl LeadflowPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolves the data directory.
    ///
    /// Precedence: an explicit directory (CLI flag or config file), then
    /// `LEADFLOW_HOME`, then `~/.leadflow`.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, PathError> {
        if let Some(dir) = explicit {
            return Ok(Self::new(dir));
        }
        if let Some(dir) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::new(PathBuf::from(dir)));
        }
        Self::default_root().map(Self::new)
    }

    /// Returns `~/.leadflow`.
    pub fn default_root() -> Result<PathBuf, PathError> {
        dirs::home_dir()
            .map(|home| home.join(".leadflow"))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Expands a leading `~/` against the home directory.
    pub fn expand_home(path: &Path) -> PathBuf {
        match (path.strip_prefix("~"), dirs::home_dir()) {
            (Ok(rest), Some(home)) => home.join(rest),
            _ => path.to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.root.join("sessions")
    }

    pub fn transcripts_dir(&self) -> PathBuf {
        self.root.join("transcripts")
    }

    pub fn outbox_dir(&self) -> PathBuf {
        self.root.join("outbox")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_dir_wins() {
        let paths = LeadflowPaths::resolve(Some(Path::new("/tmp/lf"))).unwrap();
        assert_eq!(paths.root(), Path::new("/tmp/lf"));
        assert_eq!(paths.sessions_dir(), PathBuf::from("/tmp/lf/sessions"));
        assert_eq!(paths.config_file(), PathBuf::from("/tmp/lf/config.toml"));
    }

    #[test]
    fn test_expand_home_leaves_plain_paths() {
        assert_eq!(
            LeadflowPaths::expand_home(Path::new("/srv/leadflow")),
            PathBuf::from("/srv/leadflow")
        );
        if let Some(home) = dirs::home_dir() {
            assert_eq!(
                LeadflowPaths::expand_home(Path::new("~/.leadflow")),
                home.join(".leadflow")
            );
        }
    }

    #[test]
    fn test_missing_home_maps_to_config_error() {
        let err: leadflow_core::LeadflowError = PathError::HomeDirNotFound.into();
        assert!(err.is_config());
        assert!(err.to_string().contains("Cannot find home directory"));
    }

    #[test]
    fn test_layout_is_flat_under_root() {
        let paths = LeadflowPaths::new("/data");
        for dir in [
            paths.sessions_dir(),
            paths.transcripts_dir(),
            paths.outbox_dir(),
            paths.logs_dir(),
        ] {
            assert_eq!(dir.parent(), Some(Path::new("/data")));
        }
    }
}
