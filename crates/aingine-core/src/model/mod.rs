//! Model catalog types.

mod catalog;

pub use catalog::{MODEL_BASE_PATH, ModelCatalog};

use serde::{Deserialize, Serialize};

/// A model the gateway can be asked to load.
///
/// `path` is only meaningful on the gateway host and is not validated here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub id: String,
    pub name: String,
    pub path: String,
    pub description: String,
    pub vram_estimate: String,
    /// Quantization scheme (e.g. `"awq"`). `None` means full-precision weights.
    #[serde(default)]
    pub quantization: Option<String>,
}

impl ModelConfig {
    pub fn is_full_precision(&self) -> bool {
        self.quantization.is_none()
    }
}
