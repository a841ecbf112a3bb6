//! Configuration service implementation.
//!
//! Loads [`ClientConfig`] from `~/.config/aingine/config.toml` and applies
//! environment overrides.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use aingine_core::config::ClientConfig;
use aingine_core::error::{AingineError, Result};

use crate::paths::AinginePaths;

/// Configuration service that loads and caches the client configuration.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    /// Cached configuration loaded from file.
    config: Arc<RwLock<Option<ClientConfig>>>,
}

impl ConfigService {
    pub fn new(paths: &AinginePaths) -> Result<Self> {
        let path = paths
            .config_file()
            .map_err(|e| AingineError::config(e.to_string()))?;
        Ok(Self::with_path(path))
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            config: Arc::new(RwLock::new(None)),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Gets the file configuration, loading it if not cached.
    ///
    /// A missing file yields the defaults. Environment overrides are not
    /// applied here; see [`ConfigService::effective_config`].
    pub fn get_config(&self) -> Result<ClientConfig> {
        {
            let read_lock = self.config.read().unwrap_or_else(|e| e.into_inner());
            if let Some(ref cached) = *read_lock {
                return Ok(cached.clone());
            }
        }

        let loaded = self.load_from_file()?;

        {
            let mut write_lock = self.config.write().unwrap_or_else(|e| e.into_inner());
            *write_lock = Some(loaded.clone());
        }

        Ok(loaded)
    }

    /// File configuration with `AINGINE_*` environment overrides applied.
    pub fn effective_config(&self) -> Result<ClientConfig> {
        Ok(self
            .get_config()?
            .with_env_overrides(|name| std::env::var(name).ok()))
    }

    fn load_from_file(&self) -> Result<ClientConfig> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(
                    "No config file at {}, using defaults",
                    self.path.display()
                );
                return Ok(ClientConfig::default());
            }
            Err(e) => return Err(e.into()),
        };

        Ok(toml::from_str(&content)?)
    }
}
