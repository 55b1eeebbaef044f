//! Workspace chat transcript.
//!
//! The backend has no chat endpoint yet, so the assistant side answers with a
//! fixed reply after a short delay. The transcript starts from a greeting
//! exchange so the view is never blank.

use std::time::Duration;

/// Delay before the assistant reply lands.
pub const REPLY_DELAY: Duration = Duration::from_secs(1);

pub const ASSISTANT_REPLY: &str = "This is an AI response to your message.";

const GREETING: &[(Sender, &str)] = &[
    (Sender::Assistant, "Hello! How can I help you today?"),
    (Sender::User, "I have a question about the component library."),
    (
        Sender::Assistant,
        "Sure! I'd be happy to help. What would you like to know?",
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    /// Two-letter avatar fallback.
    pub fn initials(self) -> &'static str {
        match self {
            Sender::User => "US",
            Sender::Assistant => "AI",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// 1-based position in the transcript.
    pub id: usize,
    pub sender: Sender,
    pub content: String,
}

/// Ordered chat messages.
#[derive(Debug, Clone)]
pub struct ChatLog {
    messages: Vec<ChatMessage>,
}

impl ChatLog {
    /// Transcript seeded with the greeting exchange.
    pub fn new() -> Self {
        let mut log = Self {
            messages: Vec::new(),
        };
        for (sender, content) in GREETING {
            log.push(*sender, (*content).to_string());
        }
        log
    }

    fn push(&mut self, sender: Sender, content: String) -> usize {
        let id = self.messages.len() + 1;
        self.messages.push(ChatMessage {
            id,
            sender,
            content,
        });
        id
    }

    /// Append a user message. Blank input is ignored and returns `None`.
    pub fn send(&mut self, input: &str) -> Option<usize> {
        if input.trim().is_empty() {
            return None;
        }
        Some(self.push(Sender::User, input.to_string()))
    }

    pub fn reply(&mut self, content: impl Into<String>) -> usize {
        self.push(Sender::Assistant, content.into())
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Default for ChatLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_with_greeting() {
        let log = ChatLog::new();
        assert_eq!(log.len(), 3);
        assert_eq!(log.messages()[0].sender, Sender::Assistant);
        assert_eq!(log.messages()[1].sender, Sender::User);
        let ids: Vec<usize> = log.messages().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_blank_input_not_sent() {
        let mut log = ChatLog::new();
        assert_eq!(log.send("   "), None);
        assert_eq!(log.send(""), None);
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn test_send_then_reply_numbers_in_order() {
        let mut log = ChatLog::new();
        assert_eq!(log.send("What is PinSage?"), Some(4));
        assert_eq!(log.reply(ASSISTANT_REPLY), 5);
        let last = &log.messages()[4];
        assert_eq!(last.sender, Sender::Assistant);
        assert_eq!(last.content, ASSISTANT_REPLY);
        assert_eq!(log.messages()[3].content, "What is PinSage?");
    }
}
