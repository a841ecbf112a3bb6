pub mod chat;
pub mod key;
pub mod status;
pub mod swap;
