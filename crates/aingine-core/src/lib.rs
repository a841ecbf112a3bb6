pub mod config;
pub mod credential;
pub mod error;
pub mod gateway;
pub mod model;
pub mod session;

// Re-export common types
pub use error::{AingineError, Result};
pub use gateway::{Gateway, GatewayError, HealthReport, ResponseSource, SystemStatus};
pub use model::{ModelCatalog, ModelConfig};
