//! Outbound delivery of assistant replies.

pub mod twilio;

pub use twilio::TwilioClient;

use std::future::Future;
use std::pin::Pin;

use crate::core::errors::AssistantResult;

/// Boxed future type for outbound delivery.
pub type SendFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Posts messages into a provider conversation.
pub trait MessageSender: Send + Sync {
    /// Send one message and return the provider's message identifier.
    ///
    /// # Errors
    /// Returns an error if delivery to the provider fails.
    fn send<'a>(
        &'a self,
        conversation_id: &'a str,
        body: &'a str,
    ) -> SendFuture<'a, AssistantResult<String>>;
}
