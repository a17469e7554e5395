//! Application state shared across all request handlers.

use std::sync::Arc;

use crate::conversation::SqliteConversationStore;
use crate::core::config::AssistantConfig;
use crate::core::errors::AssistantResult;
use crate::llm::{ChatSettings, GeminiClient};
use crate::messaging::TwilioClient;
use crate::tools::TravigoTools;
use crate::webhook::Relay;

/// Shared application state.
pub struct AppState {
    /// Relay handling webhook events.
    pub relay: Relay,
}

impl AppState {
    /// Wrap an already assembled relay.
    #[must_use]
    pub fn new(relay: Relay) -> Arc<Self> {
        Arc::new(Self { relay })
    }

    /// Build the production state: `SQLite` store, Gemini, Travigo and Twilio.
    ///
    /// # Errors
    /// Returns an error if credentials are missing, a client cannot be
    /// built, or the database cannot be opened.
    pub async fn from_config(config: &AssistantConfig) -> AssistantResult<Arc<Self>> {
        config.require_model()?;
        config.require_twilio()?;

        let timeout = config.model.request_timeout;
        let store = SqliteConversationStore::open(&config.storage.sqlite_path).await?;
        let backend = GeminiClient::new(&config.model)?;
        let tools = TravigoTools::new(&config.travigo, timeout)?;
        let sender = TwilioClient::new(&config.twilio, timeout)?;

        tracing::info!(
            model = %config.model.model,
            endpoint = backend.endpoint(),
            database = %config.storage.sqlite_path.display(),
            "assistant state ready"
        );

        let relay = Relay::new(
            Arc::new(store),
            Arc::new(backend),
            Arc::new(tools),
            Arc::new(sender),
            ChatSettings::travigo(config.model.max_automatic_function_calls),
            config.storage.history_limit,
        );
        Ok(Self::new(relay))
    }
}
