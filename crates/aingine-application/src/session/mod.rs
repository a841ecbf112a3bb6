//! Per-client session state and its snapshot types.

mod state;

pub use state::{Activity, ChatRejection, SessionSnapshot, SessionState, SwapRejection};
pub(crate) use state::InFlight;
