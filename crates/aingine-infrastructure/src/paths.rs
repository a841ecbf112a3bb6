//! Unified path management for aingine files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/aingine/           # Config directory
//! ├── config.toml              # Client configuration
//! ├── credential.json          # User override credential
//! └── logs/                    # REPL logs
//!     └── aingine.log.YYYY-MM-DD
//! ```

use std::path::PathBuf;

const APP_DIR: &str = "aingine";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Platform config directory could not be determined.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find config directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Path resolution rooted at the platform config directory, or at an
/// explicit base directory (tests, portable installs).
#[derive(Debug, Clone, Default)]
pub struct AinginePaths {
    base: Option<PathBuf>,
}

impl AinginePaths {
    /// Paths under the platform config directory.
    pub fn new() -> Self {
        Self { base: None }
    }

    /// Paths under `base` instead of the platform config directory.
    pub fn with_base(base: impl Into<PathBuf>) -> Self {
        Self {
            base: Some(base.into()),
        }
    }

    /// Returns the aingine configuration directory (e.g. `~/.config/aingine/`).
    pub fn config_dir(&self) -> Result<PathBuf, PathError> {
        match &self.base {
            Some(base) => Ok(base.clone()),
            None => dirs::config_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or(PathError::ConfigDirNotFound),
        }
    }

    pub fn config_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("config.toml"))
    }

    /// Returns the path to the credential file.
    ///
    /// # Security Note
    ///
    /// The file is created with 600 permissions on Unix.
    pub fn credential_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("credential.json"))
    }

    pub fn logs_dir(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("logs"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_dir() {
        // Not every CI sandbox has a config dir
        if let Ok(dir) = AinginePaths::new().config_dir() {
            assert!(dir.ends_with(APP_DIR));
        }
    }

    #[test]
    fn test_files_live_under_base() {
        let paths = AinginePaths::with_base("/tmp/aingine-test");
        let base = paths.config_dir().unwrap();

        let config_file = paths.config_file().unwrap();
        assert!(config_file.ends_with("config.toml"));
        assert!(config_file.starts_with(&base));

        let credential_file = paths.credential_file().unwrap();
        assert!(credential_file.ends_with("credential.json"));
        assert!(credential_file.starts_with(&base));

        let logs_dir = paths.logs_dir().unwrap();
        assert!(logs_dir.ends_with("logs"));
        assert!(logs_dir.starts_with(&base));
    }
}
