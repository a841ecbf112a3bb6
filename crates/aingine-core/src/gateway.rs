//! Gateway contract.
//!
//! The model-serving gateway is reached only through the [`Gateway`] trait.
//! `aingine-interaction` provides the HTTP implementation; tests provide
//! scripted ones.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::model::ModelConfig;

/// Reachability of the gateway as seen by the last resolved health probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemStatus {
    Online,
    #[default]
    Offline,
}

impl fmt::Display for SystemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SystemStatus::Online => write!(f, "online"),
            SystemStatus::Offline => write!(f, "offline"),
        }
    }
}

/// Result of a health probe.
///
/// Probes never fail: an unreachable or misbehaving gateway is reported as
/// [`HealthReport::offline`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: SystemStatus,
    pub current_model_id: Option<String>,
    pub gpu_locked: bool,
}

impl HealthReport {
    /// The report synthesized when the gateway cannot be reached.
    pub fn offline() -> Self {
        Self {
            status: SystemStatus::Offline,
            current_model_id: None,
            gpu_locked: false,
        }
    }

    /// Builds a report from the raw `status` string returned by `/health`.
    ///
    /// Only the exact string `"ok"` counts as online.
    pub fn from_wire(status: &str, current_model_id: Option<String>, gpu_locked: bool) -> Self {
        let status = if status == "ok" {
            SystemStatus::Online
        } else {
            SystemStatus::Offline
        };
        Self {
            status,
            current_model_id,
            gpu_locked,
        }
    }

    pub fn is_online(&self) -> bool {
        self.status == SystemStatus::Online
    }
}

/// Body of `POST /admin/load-model`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadModelRequest {
    pub model_id: String,
    pub model_path: String,
    /// Serialized as `null` for full-precision weights.
    pub quantization: Option<String>,
}

impl LoadModelRequest {
    pub fn for_model(model: &ModelConfig) -> Self {
        Self {
            model_id: model.id.clone(),
            model_path: model.path.clone(),
            quantization: model.quantization.clone(),
        }
    }
}

/// Successful response of `POST /admin/load-model`.
///
/// The gateway's payload shape is not part of the contract, so it is kept
/// as raw JSON.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LoadResult {
    pub payload: serde_json::Value,
}

/// Body of `POST /generate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
    pub max_tokens: u32,
}

/// Where a generated response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseSource {
    /// Served from the gateway's cache of earlier prompts.
    Cache,
    /// Freshly computed on the GPU.
    Gpu,
}

impl ResponseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseSource::Cache => "cache",
            ResponseSource::Gpu => "gpu",
        }
    }
}

impl fmt::Display for ResponseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseSource {
    type Err = String;

    /// Accepts `"cache"` / `"gpu"` and decorated forms such as `"cache ⚡"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let word = s
            .trim()
            .split(|c: char| !c.is_ascii_alphabetic())
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match word.as_str() {
            "cache" => Ok(ResponseSource::Cache),
            "gpu" => Ok(ResponseSource::Gpu),
            _ => Err(format!("unknown response source: {s:?}")),
        }
    }
}

impl Serialize for ResponseSource {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ResponseSource {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Successful response of `POST /generate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateResult {
    pub response: String,
    pub model_used: String,
    pub source: ResponseSource,
}

/// Failure of a swap or generate call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// DNS, TCP, TLS or other connection-level failure.
    #[error("Gateway unreachable: {0}")]
    Transport(String),

    /// No response within the configured bound.
    #[error("Gateway did not respond within {}s", .0.as_secs())]
    Timeout(Duration),

    /// 401/403: the gateway rejected the credential.
    #[error("Gateway rejected the credential (HTTP {status}): {message}")]
    Unauthorized { status: u16, message: String },

    /// Any other non-2xx status.
    #[error("Gateway returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// 2xx with a body that does not match the contract.
    #[error("Unexpected gateway response: {0}")]
    Decode(String),
}

impl GatewayError {
    /// Classifies a non-2xx status code.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => Self::Unauthorized { status, message },
            _ => Self::Status { status, message },
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

/// The three operations the gateway exposes.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// GET `/health`. Must not fail; see [`HealthReport::offline`].
    async fn check_health(&self) -> HealthReport;

    /// POST `/admin/load-model`. Not retried.
    async fn load_model(&self, request: &LoadModelRequest) -> Result<LoadResult, GatewayError>;

    /// POST `/generate`. Not retried.
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResult, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_ok_is_online() {
        assert!(HealthReport::from_wire("ok", None, false).is_online());
        assert!(!HealthReport::from_wire("degraded", Some("x".into()), true).is_online());
        assert!(!HealthReport::from_wire("OK", None, false).is_online());
    }

    #[test]
    fn test_source_accepts_decorated_values() {
        assert_eq!("cache".parse::<ResponseSource>(), Ok(ResponseSource::Cache));
        assert_eq!("gpu 🐢".parse::<ResponseSource>(), Ok(ResponseSource::Gpu));
        assert_eq!("cache ⚡".parse::<ResponseSource>(), Ok(ResponseSource::Cache));
        assert!("disk".parse::<ResponseSource>().is_err());
    }

    #[test]
    fn test_generate_result_decodes_wire_shape() {
        let raw = r#"{"response":"hi","model_used":"qwen-32b","source":"gpu 🐢"}"#;
        let result: GenerateResult = serde_json::from_str(raw).unwrap();
        assert_eq!(result.source, ResponseSource::Gpu);
        assert_eq!(result.model_used, "qwen-32b");
    }

    #[test]
    fn test_load_request_serializes_null_quantization() {
        let request = LoadModelRequest {
            model_id: "llama-8b".into(),
            model_path: "/models/llama".into(),
            quantization: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["quantization"], serde_json::Value::Null);
    }

    #[test]
    fn test_status_classification() {
        assert!(GatewayError::from_status(401, "nope").is_unauthorized());
        assert!(GatewayError::from_status(403, "nope").is_unauthorized());
        assert!(!GatewayError::from_status(500, "boom").is_unauthorized());
    }
}
