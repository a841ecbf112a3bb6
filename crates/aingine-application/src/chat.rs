//! ChatController - submits prompts to the active model.

use std::sync::Arc;
use std::time::Duration;

use aingine_core::gateway::{Gateway, GatewayError, GenerateRequest, ResponseSource};

use crate::session::{ChatRejection, InFlight, SessionState};

/// Result of a chat submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatOutcome {
    /// Guard failed. Nothing was sent and nothing was logged.
    Rejected(ChatRejection),
    /// A reply was appended.
    Replied { source: ResponseSource },
    /// Generation failed; an error notice was appended.
    Failed(GatewayError),
}

#[derive(Clone)]
pub struct ChatController {
    state: Arc<SessionState>,
    gateway: Arc<dyn Gateway>,
    max_tokens: u32,
    timeout: Duration,
}

impl ChatController {
    pub fn new(
        state: Arc<SessionState>,
        gateway: Arc<dyn Gateway>,
        max_tokens: u32,
        timeout: Duration,
    ) -> Self {
        Self {
            state,
            gateway,
            max_tokens,
            timeout,
        }
    }

    /// Appends `text` as a user message and asks the gateway for a reply.
    ///
    /// The prompt is sent as typed; only the emptiness check trims it.
    pub async fn submit(&self, text: &str) -> ChatOutcome {
        if let Err(reason) = self.state.begin_generate(text) {
            tracing::debug!(client_id = %self.state.client_id(), ?reason, "Chat rejected");
            return ChatOutcome::Rejected(reason);
        }

        let in_flight = InFlight::new(&self.state);
        let request = GenerateRequest {
            prompt: text.to_string(),
            max_tokens: self.max_tokens,
        };
        let result = match tokio::time::timeout(self.timeout, self.gateway.generate(&request)).await
        {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout(self.timeout)),
        };

        in_flight.disarm();
        match result {
            Ok(reply) => {
                tracing::info!(
                    client_id = %self.state.client_id(),
                    model_used = %reply.model_used,
                    source = reply.source.as_str(),
                    "Reply received"
                );
                let source = reply.source;
                self.state.finish_generate_success(reply.response, source);
                ChatOutcome::Replied { source }
            }
            Err(e) => {
                tracing::warn!(client_id = %self.state.client_id(), "Generation failed: {}", e);
                self.state.finish_generate_failure(failure_notice(&e));
                ChatOutcome::Failed(e)
            }
        }
    }
}

fn failure_notice(error: &GatewayError) -> String {
    match error {
        GatewayError::Unauthorized { .. } => {
            "Error: The gateway rejected the API key. Update it and try again.".to_string()
        }
        GatewayError::Timeout(limit) => {
            format!("Error: No response within {}s. Try again.", limit.as_secs())
        }
        _ => "Error generating response. Ensure model is loaded.".to_string(),
    }
}
