//! Wiring from configuration to a ready-to-use session.

use std::path::PathBuf;
use std::sync::Arc;

use aingine_application::GatewaySession;
use aingine_core::config::ClientConfig;
use aingine_core::credential::{CredentialResolver, CredentialStore};
use aingine_core::model::ModelCatalog;
use aingine_infrastructure::{AinginePaths, ConfigService, FileCredentialStore};
use aingine_interaction::GatewayClient;
use anyhow::{Context, Result};

pub struct AppContext {
    paths: AinginePaths,
    config: ClientConfig,
    credentials: CredentialResolver,
    catalog: ModelCatalog,
}

impl AppContext {
    /// Loads configuration (file, then environment, then flags) and opens the
    /// credential store.
    pub fn load(config_dir: Option<PathBuf>, gateway_url: Option<String>) -> Result<Self> {
        let paths = match config_dir {
            Some(dir) => AinginePaths::with_base(dir),
            None => AinginePaths::new(),
        };

        let config_service = ConfigService::new(&paths).context("Failed to locate config file")?;
        let mut config = config_service
            .effective_config()
            .with_context(|| format!("Failed to load {}", config_service.path().display()))?;
        if let Some(url) = gateway_url {
            config.gateway_url = url;
        }

        let store: Arc<dyn CredentialStore> = Arc::new(
            FileCredentialStore::new(&paths).context("Failed to locate credential store")?,
        );
        let credentials =
            CredentialResolver::with_build_default(store, config.default_api_key.clone());

        tracing::debug!(gateway = %config.base_url(), "Configuration loaded");

        Ok(Self {
            paths,
            config,
            credentials,
            catalog: ModelCatalog::builtin(),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn credentials(&self) -> &CredentialResolver {
        &self.credentials
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    pub fn logs_dir(&self) -> Option<PathBuf> {
        self.paths.logs_dir().ok()
    }

    /// A fresh client session against the configured gateway.
    pub fn session(&self) -> GatewaySession {
        let gateway = GatewayClient::from_config(&self.config, self.credentials.clone());
        GatewaySession::new(Arc::new(gateway), self.catalog.clone(), &self.config)
    }
}
