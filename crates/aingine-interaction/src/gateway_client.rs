//! GatewayClient - HTTP implementation of the gateway contract.
//!
//! Every request carries the resolved credential in the `api_key` header.
//! Credential priority: stored user override > configured default > empty.

use std::time::Duration;

use aingine_core::config::ClientConfig;
use aingine_core::credential::CredentialResolver;
use aingine_core::gateway::{
    Gateway, GatewayError, GenerateRequest, GenerateResult, HealthReport, LoadModelRequest,
    LoadResult,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;

const API_KEY_HEADER: &str = "api_key";
const HEALTH_PATH: &str = "/health";
const LOAD_MODEL_PATH: &str = "/admin/load-model";
const GENERATE_PATH: &str = "/generate";

/// Client for the model-serving gateway.
#[derive(Clone)]
pub struct GatewayClient {
    client: Client,
    base_url: String,
    credentials: CredentialResolver,
    health_timeout: Duration,
    swap_timeout: Duration,
    generate_timeout: Duration,
}

impl GatewayClient {
    /// Creates a client for an already-normalized base URL.
    pub fn new(base_url: impl Into<String>, credentials: CredentialResolver) -> Self {
        let defaults = ClientConfig::default();
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            credentials,
            health_timeout: defaults.poll_interval(),
            swap_timeout: defaults.swap_timeout(),
            generate_timeout: defaults.generate_timeout(),
        }
    }

    /// Creates a client from configuration.
    ///
    /// Health probes are bounded by the poll interval, so a slow probe never
    /// outlives the tick that would supersede it.
    pub fn from_config(config: &ClientConfig, credentials: CredentialResolver) -> Self {
        Self::new(config.base_url(), credentials)
            .with_health_timeout(config.poll_interval())
            .with_swap_timeout(config.swap_timeout())
            .with_generate_timeout(config.generate_timeout())
    }

    pub fn with_health_timeout(mut self, timeout: Duration) -> Self {
        self.health_timeout = timeout;
        self
    }

    pub fn with_swap_timeout(mut self, timeout: Duration) -> Self {
        self.swap_timeout = timeout;
        self
    }

    pub fn with_generate_timeout(mut self, timeout: Duration) -> Self {
        self.generate_timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header(API_KEY_HEADER, self.credentials.resolve().await)
    }

    async fn send(
        &self,
        builder: RequestBuilder,
        timeout: Duration,
    ) -> Result<Response, GatewayError> {
        let response = self
            .authorized(builder)
            .await
            .timeout(timeout)
            .send()
            .await
            .map_err(|err| map_transport_error(err, timeout))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read gateway error body".to_string());
            return Err(GatewayError::from_status(status, error_message(body_text)));
        }

        Ok(response)
    }

    async fn post_json<B, T>(
        &self,
        path: &str,
        body: &B,
        timeout: Duration,
    ) -> Result<T, GatewayError>
    where
        B: serde::Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.client.post(self.url(path)).json(body);
        let response = self.send(builder, timeout).await?;
        let text = response
            .text()
            .await
            .map_err(|err| map_transport_error(err, timeout))?;
        decode_body(&text)
    }
}

#[async_trait]
impl Gateway for GatewayClient {
    async fn check_health(&self) -> HealthReport {
        let builder = self.client.get(self.url(HEALTH_PATH));
        let response = match self.send(builder, self.health_timeout).await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("Health check failed: {}", e);
                return HealthReport::offline();
            }
        };

        match response.json::<HealthResponse>().await {
            Ok(health) => {
                HealthReport::from_wire(&health.status, health.current_model, health.gpu_locked)
            }
            Err(e) => {
                tracing::debug!("Health response did not decode: {}", e);
                HealthReport::offline()
            }
        }
    }

    async fn load_model(&self, request: &LoadModelRequest) -> Result<LoadResult, GatewayError> {
        tracing::info!(
            model_id = %request.model_id,
            quantization = ?request.quantization,
            "Requesting model load"
        );
        let payload: serde_json::Value = self
            .post_json(LOAD_MODEL_PATH, request, self.swap_timeout)
            .await?;
        Ok(LoadResult { payload })
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResult, GatewayError> {
        tracing::debug!(max_tokens = request.max_tokens, "Requesting generation");
        self.post_json(GENERATE_PATH, request, self.generate_timeout)
            .await
    }
}

#[derive(Deserialize)]
struct HealthResponse {
    status: String,
    #[serde(default)]
    current_model: Option<String>,
    #[serde(default)]
    gpu_locked: bool,
}

/// FastAPI-style error body: `{"detail": "..."}`.
#[derive(Deserialize)]
struct ErrorResponse {
    detail: serde_json::Value,
}

fn error_message(body: String) -> String {
    match serde_json::from_str::<ErrorResponse>(&body) {
        Ok(ErrorResponse {
            detail: serde_json::Value::String(detail),
        }) => detail,
        Ok(ErrorResponse { detail }) => detail.to_string(),
        Err(_) => body,
    }
}

fn map_transport_error(err: reqwest::Error, timeout: Duration) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Timeout(timeout)
    } else {
        GatewayError::Transport(err.to_string())
    }
}

fn decode_body<T: DeserializeOwned>(text: &str) -> Result<T, GatewayError> {
    // An empty 2xx body decodes as JSON null
    let text = if text.trim().is_empty() { "null" } else { text };
    serde_json::from_str(text).map_err(|err| GatewayError::Decode(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_detail() {
        assert_eq!(
            error_message(r#"{"detail":"No model loaded."}"#.to_string()),
            "No model loaded."
        );
        assert_eq!(error_message("plain text".to_string()), "plain text");
    }

    #[test]
    fn test_empty_body_decodes_as_null() {
        let value: serde_json::Value = decode_body("").unwrap();
        assert!(value.is_null());
        assert!(decode_body::<GenerateResult>("").is_err());
    }
}
