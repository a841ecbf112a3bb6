use once_cell::sync::Lazy;

use super::ModelConfig;

/// Directory on the gateway host that holds the model weights.
pub const MODEL_BASE_PATH: &str = "/opt/aingine/models";

static BUILTIN_MODELS: Lazy<Vec<ModelConfig>> = Lazy::new(|| {
    vec![
        ModelConfig {
            id: "qwen-32b".to_string(),
            name: "Qwen 2.5 (32B)".to_string(),
            path: format!("{MODEL_BASE_PATH}/Qwen2.5-32B-Instruct-AWQ"),
            description: "Best all-rounder. Coding & Logic.".to_string(),
            vram_estimate: "~18 GB".to_string(),
            quantization: Some("awq".to_string()),
        },
        ModelConfig {
            id: "mistral-24b".to_string(),
            name: "Mistral Small (24B)".to_string(),
            path: format!("{MODEL_BASE_PATH}/Mistral-Small-24B-Instruct-2501-AWQ"),
            description: "High speed, great reasoning.".to_string(),
            vram_estimate: "~14 GB".to_string(),
            quantization: Some("awq".to_string()),
        },
        ModelConfig {
            id: "llama-8b".to_string(),
            name: "Llama 3.1 (8B)".to_string(),
            path: format!("{MODEL_BASE_PATH}/Meta-Llama-3.1-8B-Instruct"),
            description: "Standard Weights. Fast Chat.".to_string(),
            vram_estimate: "~16 GB".to_string(),
            quantization: None,
        },
    ]
});

/// Fixed list of models offered to the user.
///
/// There is no discovery: the catalog is compiled in and immutable.
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    models: Vec<ModelConfig>,
}

impl ModelCatalog {
    /// The compiled-in catalog.
    pub fn builtin() -> Self {
        Self {
            models: BUILTIN_MODELS.clone(),
        }
    }

    /// A catalog with an explicit model list (used by tests and embedders).
    pub fn from_models(models: Vec<ModelConfig>) -> Self {
        Self { models }
    }

    pub fn models(&self) -> &[ModelConfig] {
        &self.models
    }

    pub fn find(&self, id: &str) -> Option<&ModelConfig> {
        self.models.iter().find(|m| m.id == id)
    }

    /// Display name for a model id, falling back to the id itself for models
    /// the gateway reports but the catalog does not know.
    pub fn display_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.find(id).map(|m| m.name.as_str()).unwrap_or(id)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
