//! Chat domain module: messages and the conversation transcript.

mod conversation;
mod message;

pub use conversation::Conversation;
pub use message::{ChatMessage, MessageRole, QueryAnswer, QueryRequest};
