//! ModelSwapController - asks the gateway to load a different model.

use std::sync::Arc;
use std::time::Duration;

use aingine_core::gateway::{Gateway, GatewayError, LoadModelRequest};
use aingine_core::model::{ModelCatalog, ModelConfig};

use crate::session::{InFlight, SessionState, SwapRejection};

/// Result of a select request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapOutcome {
    /// Guard failed. Nothing was sent and nothing was logged.
    Rejected(SwapRejection),
    /// The gateway confirmed the load.
    Loaded { model_id: String },
    /// The load failed; an error notice was appended.
    Failed(GatewayError),
}

impl SwapOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded { .. })
    }
}

#[derive(Clone)]
pub struct ModelSwapController {
    state: Arc<SessionState>,
    gateway: Arc<dyn Gateway>,
    catalog: ModelCatalog,
    timeout: Duration,
}

impl ModelSwapController {
    pub fn new(
        state: Arc<SessionState>,
        gateway: Arc<dyn Gateway>,
        catalog: ModelCatalog,
        timeout: Duration,
    ) -> Self {
        Self {
            state,
            gateway,
            catalog,
            timeout,
        }
    }

    /// Looks `model_id` up in the catalog and selects it.
    pub async fn select_by_id(&self, model_id: &str) -> SwapOutcome {
        match self.catalog.find(model_id) {
            Some(model) => self.select(model).await,
            None => SwapOutcome::Rejected(SwapRejection::UnknownModel(model_id.to_string())),
        }
    }

    /// Requests that the gateway load `model`.
    ///
    /// Rejected without any side effect while this client is swapping or
    /// generating, while the gateway reports the GPU locked, or when `model`
    /// is already active.
    pub async fn select(&self, model: &ModelConfig) -> SwapOutcome {
        let catalog = &self.catalog;
        let accepted = self.state.begin_swap(model, |current| {
            let previous = current
                .map(|id| catalog.display_name(id))
                .unwrap_or("previous model");
            format!(
                "System: Unloading {} and initializing {}... Please wait ~20s.",
                previous, model.name
            )
        });
        if let Err(reason) = accepted {
            tracing::debug!(
                client_id = %self.state.client_id(),
                model_id = %model.id,
                ?reason,
                "Model select rejected"
            );
            return SwapOutcome::Rejected(reason);
        }

        tracing::info!(
            client_id = %self.state.client_id(),
            model_id = %model.id,
            "Model swap started"
        );

        let in_flight = InFlight::new(&self.state);
        let request = LoadModelRequest::for_model(model);
        let result = match tokio::time::timeout(self.timeout, self.gateway.load_model(&request)).await
        {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout(self.timeout)),
        };

        in_flight.disarm();
        match result {
            Ok(load) => {
                tracing::info!(
                    client_id = %self.state.client_id(),
                    model_id = %model.id,
                    payload = %load.payload,
                    "Model swap finished"
                );
                self.state
                    .finish_swap_success(&model.id, format!("System: {} is ready.", model.name));
                SwapOutcome::Loaded {
                    model_id: model.id.clone(),
                }
            }
            Err(e) => {
                tracing::warn!(
                    client_id = %self.state.client_id(),
                    model_id = %model.id,
                    "Model swap failed: {}",
                    e
                );
                self.state.finish_swap_failure(failure_notice(&e));
                SwapOutcome::Failed(e)
            }
        }
    }
}

fn failure_notice(error: &GatewayError) -> String {
    match error {
        GatewayError::Unauthorized { .. } => {
            "Error: The gateway rejected the API key. Update it and try again.".to_string()
        }
        GatewayError::Timeout(limit) => format!(
            "Error: Model load did not finish within {}s. Check server logs.",
            limit.as_secs()
        ),
        _ => "Error: Failed to load model. Check server logs.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_notice_variants() {
        let unauthorized = GatewayError::from_status(401, "bad key");
        assert!(failure_notice(&unauthorized).contains("API key"));

        let timeout = GatewayError::Timeout(Duration::from_secs(300));
        assert!(failure_notice(&timeout).contains("300s"));

        let status = GatewayError::from_status(500, "CUDA out of memory");
        assert_eq!(
            failure_notice(&status),
            "Error: Failed to load model. Check server logs."
        );
    }
}
