//! Conversation persistence: one record per external conversation.

pub mod record;
pub mod store;

pub use record::ConversationRecord;
pub use store::{
    ConversationStore, InMemoryConversationStore, SqliteConversationStore, StoreFuture,
};
