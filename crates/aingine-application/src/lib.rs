//! Application layer for AIngine.
//!
//! Session state, the status poller, and the swap/chat controllers that
//! coordinate a client with the model-serving gateway.

pub mod chat;
pub mod gateway_session;
pub mod model_swap;
pub mod session;
pub mod status_poller;

pub use chat::{ChatController, ChatOutcome};
pub use gateway_session::GatewaySession;
pub use model_swap::{ModelSwapController, SwapOutcome};
pub use session::{Activity, ChatRejection, SessionSnapshot, SessionState, SwapRejection};
pub use status_poller::{PollerHandle, StatusPoller};
