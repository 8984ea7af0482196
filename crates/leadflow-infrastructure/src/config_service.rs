//! Configuration service implementation.
//!
//! Loads `LeadflowConfig` from a TOML file. A missing file yields the
//! defaults; a malformed one is an error rather than a silent fallback.

use leadflow_core::config::LeadflowConfig;
use leadflow_core::error::Result;
use std::path::{Path, PathBuf};

/// Reads the application configuration from disk.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
}

impl ConfigService {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the configuration, falling back to defaults when the file is absent.
    pub fn load(&self) -> Result<LeadflowConfig> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(
                    "[ConfigService] No config at {}, using defaults",
                    self.path.display()
                );
                return Ok(LeadflowConfig::default());
            }
            Err(e) => return Err(e.into()),
        };

        let config: LeadflowConfig = toml::from_str(&content)?;
        tracing::debug!("[ConfigService] Loaded config from {}", self.path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let service = ConfigService::new(dir.path().join("config.toml"));
        assert_eq!(service.load().unwrap(), LeadflowConfig::default());
    }

    #[test]
    fn test_loads_overrides() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[flow]\nreply_delay_ms = 25\n").unwrap();

        let config = ConfigService::new(&path).load().unwrap();
        assert_eq!(config.flow.reply_delay_ms, 25);
        assert_eq!(config.flow.typing_window_ms, 3000);
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[flow\n").unwrap();

        let err = ConfigService::new(&path).load().unwrap_err();
        assert!(err.is_serialization());
    }
}
