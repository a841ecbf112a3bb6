use chrono::Utc;

use super::message::{Message, MessageKind, MessageRole};
use crate::gateway::ResponseSource;

/// Append-only, insertion-ordered message log.
///
/// Entries cannot be removed or edited, so every earlier view of the log is
/// a prefix of every later one.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    entries: Vec<Message>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_user(&mut self, content: impl Into<String>) -> &Message {
        self.push(MessageRole::User, MessageKind::Chat, content.into(), None)
    }

    pub fn push_reply(&mut self, content: impl Into<String>, source: ResponseSource) -> &Message {
        self.push(
            MessageRole::Assistant,
            MessageKind::Chat,
            content.into(),
            Some(source),
        )
    }

    pub fn push_notice(&mut self, content: impl Into<String>) -> &Message {
        self.push(MessageRole::Assistant, MessageKind::Notice, content.into(), None)
    }

    pub fn push_error(&mut self, content: impl Into<String>) -> &Message {
        self.push(MessageRole::Assistant, MessageKind::Error, content.into(), None)
    }

    pub fn entries(&self) -> &[Message] {
        &self.entries
    }

    /// Entries appended after the first `seen` ones.
    pub fn since(&self, seen: usize) -> &[Message] {
        self.entries.get(seen..).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push(
        &mut self,
        role: MessageRole,
        kind: MessageKind,
        content: String,
        source: Option<ResponseSource>,
    ) -> &Message {
        let id = self.entries.last().map(|m| m.id + 1).unwrap_or(1);
        self.entries.push(Message {
            id,
            role,
            kind,
            content,
            source,
            timestamp: Utc::now(),
        });
        // Just pushed
        &self.entries[self.entries.len() - 1]
    }
}
