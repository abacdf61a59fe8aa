pub mod config;
pub mod conversation;
pub mod error;
pub mod offers;
pub mod render;
pub mod reply;
pub mod state;

// Re-export main types for convenience
pub use config::Config;
pub use conversation::{Conversation, PendingReply, REPLY_FAILED_TEXT};
pub use error::{ConfigError, ReplyError};
pub use reply::{FailureMode, ReplyGenerator, ScriptedReply};
pub use state::{Content, ConversationState, FlightOffer, Message, MessageId, OfferList, Phase, Role};
