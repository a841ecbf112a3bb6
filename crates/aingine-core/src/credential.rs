//! Credential store trait and resolution.
//!
//! The user may override the gateway credential; the override is persisted
//! under a single key and read again on every outbound call.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

/// The one key the client persists.
pub const USER_API_KEY: &str = "user_api_key";

/// Compile-time default credential, if the build provided one.
pub const BUILD_DEFAULT_API_KEY: Option<&str> = option_env!("AINGINE_ENGINE_KEY");

/// Key/value surface holding the user's override credential.
///
/// # Security Note
///
/// Implementations must never log the stored value.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Returns the stored override, if any.
    async fn load(&self) -> Result<Option<String>>;

    /// Stores the override. An empty value clears it.
    async fn save(&self, value: &str) -> Result<()>;
}

/// Resolves the credential to attach to a request.
///
/// Priority:
/// 1. Non-empty override from the [`CredentialStore`]
/// 2. The configured default credential
/// 3. Empty string (the gateway is left to reject the request)
#[derive(Clone)]
pub struct CredentialResolver {
    store: Arc<dyn CredentialStore>,
    default_key: Option<String>,
}

impl CredentialResolver {
    pub fn new(store: Arc<dyn CredentialStore>, default_key: Option<String>) -> Self {
        Self { store, default_key }
    }

    /// Resolver whose default falls back to [`BUILD_DEFAULT_API_KEY`].
    pub fn with_build_default(store: Arc<dyn CredentialStore>, configured: Option<String>) -> Self {
        let default_key = configured.or_else(|| BUILD_DEFAULT_API_KEY.map(str::to_string));
        Self::new(store, default_key)
    }

    pub async fn resolve(&self) -> String {
        match self.store.load().await {
            Ok(Some(value)) if !value.is_empty() => return value,
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("Failed to read stored credential, using default: {}", e);
            }
        }

        self.default_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .unwrap_or_default()
            .to_string()
    }

    /// Whether a non-empty override is currently stored.
    pub async fn has_override(&self) -> bool {
        matches!(self.store.load().await, Ok(Some(v)) if !v.is_empty())
    }

    /// Stores a user override. Surrounding whitespace is dropped; a blank
    /// value clears the override.
    pub async fn set_override(&self, value: &str) -> Result<()> {
        self.store.save(value.trim()).await
    }

    pub async fn clear_override(&self) -> Result<()> {
        self.store.save("").await
    }
}
