//! Session domain types shared by the controllers and front-ends.

mod log;
pub mod message;

pub use log::MessageLog;
pub use message::{Message, MessageKind, MessageRole};
