//! Conversation controller
//!
//! Two observable phases, `Idle` and `AwaitingReply`, and two transitions:
//! [`Conversation::submit`] and [`Conversation::resolve`]. Every change is
//! published through a `tokio::sync::watch` channel so any number of views
//! can re-render from the latest snapshot.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::ReplyError;
use crate::reply::{run_reply, ReplyGenerator};
use crate::state::{Content, ConversationState, Message, MessageId, Phase, Role};

/// Text the assistant answers with when the reply could not be produced
pub const REPLY_FAILED_TEXT: &str = "Sorry, something went wrong.";

static NEXT_SESSION: AtomicU64 = AtomicU64::new(1);

/// Proof of a successful submit. Consumed by [`Conversation::resolve`].
#[derive(Debug)]
pub struct PendingReply {
    session: u64,
    prompt: String,
    user_message: MessageId,
}

impl PendingReply {
    /// The trimmed user text the reply is for
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn user_message(&self) -> MessageId {
        self.user_message
    }
}

pub struct Conversation {
    session: u64,
    state: ConversationState,
    notify: watch::Sender<ConversationState>,
}

impl Conversation {
    pub fn new() -> Self {
        let state = ConversationState::new();
        let (notify, _) = watch::channel(state.clone());
        Self {
            session: NEXT_SESSION.fetch_add(1, Ordering::Relaxed),
            state,
            notify,
        }
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn messages(&self) -> &[Message] {
        &self.state.messages
    }

    pub fn is_pending(&self) -> bool {
        self.state.pending
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// Receive a fresh snapshot after every state change
    pub fn subscribe(&self) -> watch::Receiver<ConversationState> {
        self.notify.subscribe()
    }

    /// Whether `submit(text)` would be accepted right now
    pub fn can_submit(&self, text: &str) -> bool {
        !self.state.pending && !text.trim().is_empty()
    }

    /// Append the user's message and start waiting for a reply.
    ///
    /// Returns `None`, leaving everything untouched, when the trimmed text is
    /// empty or a reply is already outstanding.
    pub fn submit(&mut self, text: &str) -> Option<PendingReply> {
        if !self.can_submit(text) {
            return None;
        }

        let prompt = text.trim().to_string();
        let user_message = self.state.push(Role::User, Content::Text(prompt.clone()));
        self.state.pending = true;
        self.publish();

        info!(id = %user_message, "message submitted");
        Some(PendingReply {
            session: self.session,
            prompt,
            user_message,
        })
    }

    /// Append the assistant's answer for `ticket` and return to idle.
    ///
    /// A failed reply becomes [`REPLY_FAILED_TEXT`]. The pending flag is
    /// cleared on both paths. A ticket issued by another conversation, or
    /// one arriving while nothing is pending, is ignored and gives `None`.
    pub fn resolve(
        &mut self,
        ticket: PendingReply,
        outcome: Result<Content, ReplyError>,
    ) -> Option<MessageId> {
        if ticket.session != self.session || !self.state.pending {
            warn!(
                user_message = %ticket.user_message,
                pending = self.state.pending,
                "ignoring reply for a ticket this conversation did not issue"
            );
            return None;
        }

        let content = match outcome {
            Ok(payload) => payload,
            Err(e) => {
                warn!(user_message = %ticket.user_message, error = %e, "reply failed");
                Content::Text(REPLY_FAILED_TEXT.to_string())
            }
        };

        let id = self.state.push(Role::Assistant, content);
        self.state.pending = false;
        self.publish();

        info!(id = %id, user_message = %ticket.user_message, "reply resolved");
        Some(id)
    }

    /// Submit, wait for the generator and resolve in one go.
    ///
    /// Holds `&mut self` across the wait, so it suits headless callers. The
    /// TUI uses `submit` with a `ReplyTask` instead.
    pub async fn send(
        &mut self,
        generator: Arc<dyn ReplyGenerator>,
        text: &str,
    ) -> Option<MessageId> {
        let ticket = self.submit(text)?;
        let outcome = run_reply(generator, ticket.prompt().to_string()).await;
        self.resolve(ticket, outcome)
    }

    fn publish(&self) {
        self.notify.send_replace(self.state.clone());
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}
