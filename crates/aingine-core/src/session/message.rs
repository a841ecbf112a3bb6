//! Conversation message types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::gateway::ResponseSource;

/// Represents the role of a message in the conversation log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    /// Message typed by the user.
    User,
    /// Reply from the model, or a notice produced by the client.
    Assistant,
}

/// What produced an assistant-side entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// User prompt or model reply.
    Chat,
    /// Informational notice (swap started / finished).
    Notice,
    /// A failed swap or generate.
    Error,
}

/// A single entry in the conversation log.
///
/// Entries are never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Monotonic per log, starting at 1.
    pub id: u64,
    pub role: MessageRole,
    pub kind: MessageKind,
    pub content: String,
    /// Present only on replies to a generate request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ResponseSource>,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn is_user(&self) -> bool {
        self.role == MessageRole::User
    }

    pub fn is_error(&self) -> bool {
        self.kind == MessageKind::Error
    }
}
