//! UI-agnostic conversation types
//!
//! Everything here is shared between the terminal UI and the headless `ask`
//! command and doesn't depend on any UI framework.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a message, unique and strictly increasing within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageId(pub u64);

impl MessageId {
    pub const FIRST: MessageId = MessageId(1);

    pub fn next(self) -> MessageId {
        MessageId(self.0 + 1)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single flight offer shown as a card in the assistant's reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightOffer {
    pub airline: String,
    pub code: String,
    pub departure: String,
    pub arrival: String,
    pub duration: String,
    pub price: String,
    pub merchant_url: String,
    #[serde(default)]
    pub sponsored: bool,
    #[serde(default)]
    pub recommended: bool,
}

/// Structured reply payload: a short heading followed by offers in display order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferList {
    #[serde(default)]
    pub heading: Vec<String>,
    pub offers: Vec<FlightOffer>,
}

/// What a message carries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Content {
    Text(String),
    Offers(OfferList),
}

impl Content {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Content::Text(text) => Some(text),
            Content::Offers(_) => None,
        }
    }
}

/// A chat message. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    id: MessageId,
    role: Role,
    content: Content,
}

impl Message {
    pub(crate) fn new(id: MessageId, role: Role, content: Content) -> Self {
        Self { id, role, content }
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &Content {
        &self.content
    }
}

/// Observable phase of the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    AwaitingReply,
}

/// Snapshot of a conversation, published to subscribers on every change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationState {
    pub messages: Vec<Message>,
    pub pending: bool,
    pub next_id: MessageId,
}

impl ConversationState {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            pending: false,
            next_id: MessageId::FIRST,
        }
    }

    pub fn phase(&self) -> Phase {
        if self.pending {
            Phase::AwaitingReply
        } else {
            Phase::Idle
        }
    }

    /// Append a message under the next identifier and advance the counter
    pub(crate) fn push(&mut self, role: Role, content: Content) -> MessageId {
        let id = self.next_id;
        self.messages.push(Message::new(id, role, content));
        self.next_id = id.next();
        id
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_idle_and_empty() {
        let state = ConversationState::new();
        assert!(state.messages.is_empty());
        assert_eq!(state.phase(), Phase::Idle);
        assert_eq!(state.next_id, MessageId(1));
    }

    #[test]
    fn test_push_assigns_sequential_ids() {
        let mut state = ConversationState::new();
        let a = state.push(Role::User, Content::Text("hi".into()));
        let b = state.push(Role::Assistant, Content::Text("hello".into()));
        assert_eq!(a, MessageId(1));
        assert_eq!(b, MessageId(2));
        assert_eq!(state.next_id, MessageId(3));
    }

    #[test]
    fn test_offer_flags_default_to_false() {
        let json = r#"{
            "airline": "Qatar Airways",
            "code": "QR 012",
            "departure": "18:25 PM (London Gatwick)",
            "arrival": "05:15 AM (+1 day)",
            "duration": "9h 50m",
            "price": "£498 (Economy)",
            "merchant_url": "https://www.qatarairways.com/"
        }"#;
        let offer: FlightOffer = serde_json::from_str(json).unwrap();
        assert!(!offer.sponsored);
        assert!(!offer.recommended);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
    }
}
