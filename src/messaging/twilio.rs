//! Twilio Conversations API client.

use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::core::config::TwilioConfig;
use crate::core::errors::{AssistantError, AssistantResult};
use crate::messaging::{MessageSender, SendFuture};

/// Author recorded on every message the assistant posts.
pub const ASSISTANT_AUTHOR: &str = "system";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for posting replies into Twilio conversations.
pub struct TwilioClient {
    client: reqwest::Client,
    base_url: Url,
    account_sid: String,
    auth_token: String,
    service_sid: String,
}

#[derive(Debug, Deserialize)]
struct CreatedMessage {
    sid: String,
}

impl TwilioClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid or the HTTP client cannot be built.
    pub fn new(config: &TwilioConfig, timeout: Duration) -> AssistantResult<Self> {
        let base_url = Url::parse(&config.base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(AssistantError::InvalidConfig(format!(
                "twilio base url cannot be a base: {base_url}"
            )));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url,
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            service_sid: config.service_sid.clone(),
        })
    }

    /// URL of the messages collection for a conversation.
    #[must_use]
    pub fn messages_url(&self, conversation_sid: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend([
                "v1",
                "Services",
                self.service_sid.as_str(),
                "Conversations",
                conversation_sid,
                "Messages",
            ]);
        }
        url
    }

    /// Post a message authored by the assistant.
    ///
    /// # Errors
    /// Returns an error on transport failure or a non-success status.
    pub async fn create_message(
        &self,
        conversation_sid: &str,
        body: &str,
    ) -> AssistantResult<String> {
        let response = self
            .client
            .post(self.messages_url(conversation_sid))
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("Author", ASSISTANT_AUTHOR), ("Body", body)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AssistantError::Upstream {
                service: "twilio",
                status: status.as_u16(),
                body,
            });
        }

        let created: CreatedMessage = response.json().await?;
        tracing::info!(conversation_sid, message_sid = %created.sid, "reply sent");
        Ok(created.sid)
    }
}

impl MessageSender for TwilioClient {
    fn send<'a>(
        &'a self,
        conversation_id: &'a str,
        body: &'a str,
    ) -> SendFuture<'a, AssistantResult<String>> {
        Box::pin(self.create_message(conversation_id, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_url() {
        let config = TwilioConfig {
            account_sid: "AC1".to_string(),
            auth_token: "token".to_string(),
            service_sid: "IS123".to_string(),
            ..TwilioConfig::default()
        };
        let client = TwilioClient::new(&config, Duration::from_secs(5));
        assert!(client.is_ok());
        let url = client.map(|c| c.messages_url("CH456").to_string()).unwrap_or_default();
        assert_eq!(
            url,
            "https://conversations.twilio.com/v1/Services/IS123/Conversations/CH456/Messages"
        );
    }
}
