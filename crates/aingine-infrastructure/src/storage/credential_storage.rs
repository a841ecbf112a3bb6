//! Credential storage.
//!
//! Persists the user's override credential as a single-key JSON file:
//!
//! ```json
//! { "user_api_key": "..." }
//! ```

use std::path::{Path, PathBuf};

use aingine_core::credential::CredentialStore;
use aingine_core::error::{AingineError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::paths::AinginePaths;

#[derive(Debug, Default, Serialize, Deserialize)]
struct CredentialFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_api_key: Option<String>,
}

/// File-backed [`CredentialStore`].
///
/// Responsibilities:
/// - Read the override on every `load` (no caching, edits from another
///   process are picked up on the next request)
/// - Write atomically (temp file + rename) with 600 permissions on Unix
///
/// A missing file means "no override".
pub struct FileCredentialStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileCredentialStore {
    /// Store at the default location (`~/.config/aingine/credential.json`).
    pub fn new(paths: &AinginePaths) -> Result<Self> {
        let path = paths
            .credential_file()
            .map_err(|e| AingineError::storage(e.to_string()))?;
        Ok(Self::with_path(path))
    }

    /// Store at a custom path (for testing).
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write_atomic(&self, contents: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, contents).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            tokio::fs::set_permissions(&tmp_path, permissions).await?;
        }

        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> Result<Option<String>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(None);
        }

        let file: CredentialFile = serde_json::from_str(&content)?;
        Ok(file.user_api_key.filter(|k| !k.is_empty()))
    }

    async fn save(&self, value: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let file = CredentialFile {
            user_api_key: (!value.is_empty()).then(|| value.to_string()),
        };
        let json = serde_json::to_string_pretty(&file)?;
        self.write_atomic(json.as_bytes()).await?;

        tracing::debug!(
            "Credential override {} at {}",
            if value.is_empty() { "cleared" } else { "updated" },
            self.path.display()
        );
        Ok(())
    }
}

/// Process-local [`CredentialStore`] for tests and throwaway sessions.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    value: Mutex<Option<String>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            value: Mutex::new(Some(value.into())),
        }
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn load(&self) -> Result<Option<String>> {
        Ok(self.value.lock().await.clone().filter(|k| !k.is_empty()))
    }

    async fn save(&self, value: &str) -> Result<()> {
        *self.value.lock().await = (!value.is_empty()).then(|| value.to_string());
        Ok(())
    }
}
