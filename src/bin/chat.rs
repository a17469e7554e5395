//! Interactive terminal chat against the Travigo assistant.
//! Run with: cargo run --bin travigo-chat
//!
//! Runs the same relay as the webhook server with an in-memory store and
//! prints replies instead of posting them to Twilio.

use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use travigo_assistant::conversation::InMemoryConversationStore;
use travigo_assistant::core::{AssistantConfig, AssistantResult};
use travigo_assistant::llm::{ChatSettings, GeminiClient};
use travigo_assistant::messaging::{MessageSender, SendFuture};
use travigo_assistant::tools::TravigoTools;
use travigo_assistant::webhook::event::ON_MESSAGE_ADDED;
use travigo_assistant::webhook::{Relay, WebhookEvent};

const CONVERSATION_ID: &str = "terminal";

/// Prints each reply segment to the terminal.
struct ConsoleSender;

impl MessageSender for ConsoleSender {
    fn send<'a>(
        &'a self,
        _conversation_id: &'a str,
        body: &'a str,
    ) -> SendFuture<'a, AssistantResult<String>> {
        Box::pin(async move {
            println!("AI: {body}");
            Ok(String::new())
        })
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    match rt.block_on(chat()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

async fn chat() -> AssistantResult<()> {
    let config = AssistantConfig::from_env()?;
    config.require_model()?;

    let timeout = config.model.request_timeout;
    let relay = Relay::new(
        Arc::new(InMemoryConversationStore::new()),
        Arc::new(GeminiClient::new(&config.model)?),
        Arc::new(TravigoTools::new(&config.travigo, timeout)?),
        Arc::new(ConsoleSender),
        ChatSettings::travigo(config.model.max_automatic_function_calls),
        config.storage.history_limit,
    );

    println!("Travigo assistant ({}). Empty line or Ctrl-D to quit.", config.model.model);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("You: ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let text = line.trim();
        if text.is_empty() {
            break;
        }

        let event = WebhookEvent {
            event_type: ON_MESSAGE_ADDED.to_string(),
            conversation_sid: CONVERSATION_ID.to_string(),
            body: text.to_string(),
            author: "terminal".to_string(),
            ..WebhookEvent::default()
        };
        if let Err(e) = relay.handle(&event).await {
            eprintln!("Error: {e}");
        }
    }

    Ok(())
}
