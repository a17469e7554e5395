//! Event handling: rehydrate history, ask the model, relay, persist.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::conversation::{ConversationRecord, ConversationStore};
use crate::core::errors::AssistantResult;
use crate::llm::chat::{ChatSession, ChatSettings};
use crate::llm::client::ModelBackend;
use crate::llm::history;
use crate::llm::types::Content;
use crate::messaging::MessageSender;
use crate::tools::ToolExecutor;
use crate::webhook::event::{EventKind, WebhookEvent};

/// What the relay did with an event.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RelayOutcome {
    /// The event was acted on.
    Handled,
    /// The event type is not one the relay handles; nothing was done.
    UnknownMode,
}

impl RelayOutcome {
    /// Plain-text body returned to the webhook caller.
    #[must_use]
    pub const fn as_body(self) -> &'static str {
        match self {
            Self::Handled => "OK",
            Self::UnknownMode => "Unknown mode",
        }
    }
}

/// Connects the store, the model, the tools and the outbound sender.
pub struct Relay {
    store: Arc<dyn ConversationStore>,
    backend: Arc<dyn ModelBackend>,
    tools: Arc<dyn ToolExecutor>,
    sender: Arc<dyn MessageSender>,
    settings: ChatSettings,
    history_limit: usize,
}

impl Relay {
    /// Assemble a relay.
    #[must_use]
    pub const fn new(
        store: Arc<dyn ConversationStore>,
        backend: Arc<dyn ModelBackend>,
        tools: Arc<dyn ToolExecutor>,
        sender: Arc<dyn MessageSender>,
        settings: ChatSettings,
        history_limit: usize,
    ) -> Self {
        Self {
            store,
            backend,
            tools,
            sender,
            settings,
            history_limit,
        }
    }

    /// Handle one webhook event.
    ///
    /// # Errors
    /// Returns the first failure from the store, the model, a tool or the
    /// sender. Nothing is retried, and the history is only stored once every
    /// reply has been delivered.
    pub async fn handle(&self, event: &WebhookEvent) -> AssistantResult<RelayOutcome> {
        match event.kind() {
            EventKind::MessageAdded => {
                info!(
                    event_type = %event.event_type,
                    conversation = %event.conversation_sid,
                    author = %event.author,
                    "message received"
                );
                let exchange = self.converse(&event.conversation_sid, &event.body).await?;
                for reply in &exchange.segments {
                    self.sender.send(&event.conversation_sid, reply).await?;
                }
                self.persist(exchange).await?;
                Ok(RelayOutcome::Handled)
            }
            EventKind::ConversationRemoved => {
                let removed = self.store.delete(&event.conversation_sid).await?;
                info!(conversation = %event.conversation_sid, removed, "conversation removed");
                Ok(RelayOutcome::Handled)
            }
            EventKind::Unknown => {
                warn!(event_type = %event.event_type, "unknown event type");
                Ok(RelayOutcome::UnknownMode)
            }
        }
    }

    /// Run one exchange for a conversation and persist the updated history.
    ///
    /// Returns the reply's text segments; each is meant to be delivered as a
    /// separate message.
    ///
    /// # Errors
    /// Returns an error if loading, the model exchange, or saving fails.
    pub async fn ask(&self, conversation_id: &str, text: &str) -> AssistantResult<Vec<String>> {
        let mut exchange = self.converse(conversation_id, text).await?;
        let segments = std::mem::take(&mut exchange.segments);
        self.persist(exchange).await?;
        Ok(segments)
    }

    async fn converse(&self, conversation_id: &str, text: &str) -> AssistantResult<Exchange> {
        let started = Instant::now();
        let record = self.store.load(conversation_id).await?;
        let prior = history::decode(&record.messages)?;

        let mut chat = ChatSession::new(
            self.backend.as_ref(),
            self.tools.as_ref(),
            &self.settings,
            prior,
        );
        let reply = chat.send_message(text).await?;
        let segments = reply.text_segments();

        info!(
            conversation = conversation_id,
            segments = segments.len(),
            elapsed = ?started.elapsed(),
            "exchange completed"
        );
        Ok(Exchange {
            record,
            history: chat.into_history(),
            segments,
        })
    }

    async fn persist(&self, exchange: Exchange) -> AssistantResult<()> {
        let Exchange {
            mut record,
            history: full,
            ..
        } = exchange;
        let kept = history::trim(full, self.history_limit);
        record.update(history::encode(&kept)?);
        let conversation = record.conversation_id.clone();
        self.store.save(record).await?;
        info!(conversation = %conversation, history = kept.len(), "history stored");
        Ok(())
    }
}

/// A finished model exchange that has not been stored yet.
struct Exchange {
    record: ConversationRecord,
    history: Vec<Content>,
    segments: Vec<String>,
}
