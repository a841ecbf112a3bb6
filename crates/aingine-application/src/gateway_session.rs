//! GatewaySession - composition root for one client.
//!
//! Owns the session state and wires the poller and both controllers to the
//! same gateway. Front-ends hold one `GatewaySession` per client; two
//! sessions against the same gateway share nothing but the gateway itself.

use std::sync::Arc;

use aingine_core::config::ClientConfig;
use aingine_core::gateway::Gateway;
use aingine_core::model::ModelCatalog;
use aingine_core::session::Message;
use tokio::sync::watch;

use crate::chat::{ChatController, ChatOutcome};
use crate::model_swap::{ModelSwapController, SwapOutcome};
use crate::session::{SessionSnapshot, SessionState};
use crate::status_poller::{PollerHandle, StatusPoller};

pub struct GatewaySession {
    state: Arc<SessionState>,
    catalog: ModelCatalog,
    poller: StatusPoller,
    swap: ModelSwapController,
    chat: ChatController,
}

impl GatewaySession {
    pub fn new(gateway: Arc<dyn Gateway>, catalog: ModelCatalog, config: &ClientConfig) -> Self {
        let state = Arc::new(SessionState::new());
        let poller = StatusPoller::new(state.clone(), gateway.clone(), config.poll_interval());
        let swap = ModelSwapController::new(
            state.clone(),
            gateway.clone(),
            catalog.clone(),
            config.swap_timeout(),
        );
        let chat = ChatController::new(
            state.clone(),
            gateway,
            config.max_tokens,
            config.generate_timeout(),
        );

        tracing::debug!(client_id = %state.client_id(), "Session created");

        Self {
            state,
            catalog,
            poller,
            swap,
            chat,
        }
    }

    pub fn state(&self) -> &Arc<SessionState> {
        &self.state
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.snapshot()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.state.messages()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    /// Starts background polling. Dropping the handle stops it.
    pub fn start_polling(&self) -> PollerHandle {
        self.poller.start()
    }

    /// Runs one health probe outside the polling schedule.
    ///
    /// Safe while polling is active: it waits for the loop's probe to finish.
    pub async fn refresh(&self) -> SessionSnapshot {
        self.poller.poll_once().await;
        self.state.snapshot()
    }

    pub async fn select_model(&self, model_id: &str) -> SwapOutcome {
        self.swap.select_by_id(model_id).await
    }

    pub async fn send(&self, text: &str) -> ChatOutcome {
        self.chat.submit(text).await
    }

    /// Controller handle for front-ends that run the swap on its own task.
    pub fn swap_controller(&self) -> ModelSwapController {
        self.swap.clone()
    }

    /// Controller handle for front-ends that run generation on its own task.
    pub fn chat_controller(&self) -> ChatController {
        self.chat.clone()
    }
}
