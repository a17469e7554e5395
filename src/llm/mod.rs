//! Generative model integration: wire types, client, history and chat.

pub mod chat;
pub mod client;
pub mod history;
pub mod prompt;
pub mod types;

pub use chat::{ChatSession, ChatSettings};
pub use client::{GeminiClient, ModelBackend};
pub use types::{Content, Part, Role};
