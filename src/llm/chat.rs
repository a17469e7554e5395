//! Chat session with automatic function calling.

use std::time::Instant;

use tracing::{debug, info};

use crate::core::errors::{AssistantError, AssistantResult};
use crate::llm::client::ModelBackend;
use crate::llm::prompt::SYSTEM_PROMPT;
use crate::llm::types::{
    Content, FunctionCall, FunctionResponse, GenerateContentRequest, GenerationConfig,
    SystemInstruction, Tool,
};
use crate::tools::{self, ToolExecutor};

/// Fixed per-deployment chat settings.
#[derive(Clone, Debug)]
pub struct ChatSettings {
    /// System prompt sent with every request.
    pub system_prompt: String,
    /// Tools offered to the model.
    pub tools: Vec<Tool>,
    /// Rounds of function calling allowed per user message.
    pub max_automatic_function_calls: usize,
    /// Sampling overrides; `None` uses the model defaults.
    pub generation_config: Option<GenerationConfig>,
}

impl ChatSettings {
    /// The transit assistant: fixed prompt plus the three Travigo functions.
    #[must_use]
    pub fn travigo(max_automatic_function_calls: usize) -> Self {
        Self {
            system_prompt: SYSTEM_PROMPT.to_string(),
            tools: vec![Tool {
                function_declarations: tools::declarations(),
            }],
            max_automatic_function_calls,
            generation_config: None,
        }
    }
}

/// One conversation with the model, rebuilt for every inbound message.
pub struct ChatSession<'a> {
    backend: &'a dyn ModelBackend,
    executor: &'a dyn ToolExecutor,
    settings: &'a ChatSettings,
    history: Vec<Content>,
}

impl<'a> ChatSession<'a> {
    /// Start a session on top of prior history.
    #[must_use]
    pub fn new(
        backend: &'a dyn ModelBackend,
        executor: &'a dyn ToolExecutor,
        settings: &'a ChatSettings,
        history: Vec<Content>,
    ) -> Self {
        Self {
            backend,
            executor,
            settings,
            history,
        }
    }

    /// Full history, including function call turns.
    #[must_use]
    pub fn history(&self) -> &[Content] {
        &self.history
    }

    /// Consume the session and return its history.
    #[must_use]
    pub fn into_history(self) -> Vec<Content> {
        self.history
    }

    /// Send a user message and return the model's final reply.
    ///
    /// Function calls in a reply are executed and their results fed back
    /// until the model answers without calling anything.
    ///
    /// # Errors
    /// Returns an error if the model or a tool call fails, the model returns
    /// nothing, or the function-call limit is exceeded.
    pub async fn send_message(&mut self, text: &str) -> AssistantResult<Content> {
        let started = Instant::now();
        self.history.push(Content::user_text(text));

        let mut rounds = 0_usize;
        loop {
            let request = self.request();
            let reply = self
                .backend
                .generate(&request)
                .await?
                .into_first_content()
                .filter(|content| !content.parts.is_empty())
                .ok_or(AssistantError::EmptyResponse)?;

            let calls: Vec<FunctionCall> = reply.function_calls().into_iter().cloned().collect();
            self.history.push(reply);

            if calls.is_empty() {
                info!(rounds, elapsed = ?started.elapsed(), "send message");
                return self
                    .history
                    .last()
                    .cloned()
                    .ok_or(AssistantError::EmptyResponse);
            }

            if rounds >= self.settings.max_automatic_function_calls {
                return Err(AssistantError::FunctionCallLimit(
                    self.settings.max_automatic_function_calls,
                ));
            }
            rounds += 1;

            let mut responses = Vec::with_capacity(calls.len());
            for call in calls {
                debug!(function = %call.name, "executing function call");
                let response = self.executor.execute(&call).await?;
                responses.push(FunctionResponse {
                    name: call.name,
                    response,
                });
            }
            self.history.push(Content::function_responses(responses));
        }
    }

    fn request(&self) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: self.history.clone(),
            tools: self.settings.tools.clone(),
            system_instruction: Some(SystemInstruction::text(self.settings.system_prompt.clone())),
            generation_config: self.settings.generation_config,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use serde_json::{Value, json};

    use super::*;
    use crate::llm::client::ModelFuture;
    use crate::llm::types::{Candidate, GenerateContentResponse, Part, Role};
    use crate::tools::ToolFuture;

    /// Backend that replays canned replies and records requests.
    #[derive(Default)]
    pub(crate) struct ScriptedBackend {
        replies: Mutex<Vec<Content>>,
        pub(crate) requests: Mutex<Vec<GenerateContentRequest>>,
    }

    impl ScriptedBackend {
        pub(crate) fn new(mut replies: Vec<Content>) -> Self {
            replies.reverse();
            Self {
                replies: Mutex::new(replies),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn request_count(&self) -> usize {
            self.requests.lock().map(|r| r.len()).unwrap_or_default()
        }
    }

    impl ModelBackend for ScriptedBackend {
        fn generate<'a>(
            &'a self,
            request: &'a GenerateContentRequest,
        ) -> ModelFuture<'a, AssistantResult<GenerateContentResponse>> {
            Box::pin(async move {
                if let Ok(mut requests) = self.requests.lock() {
                    requests.push(request.clone());
                }
                let next = self.replies.lock().ok().and_then(|mut r| r.pop());
                Ok(GenerateContentResponse {
                    candidates: next
                        .map(|content| Candidate {
                            content: Some(content),
                            finish_reason: Some("STOP".to_string()),
                        })
                        .into_iter()
                        .collect(),
                    usage_metadata: None,
                })
            })
        }
    }

    /// Tool executor that echoes its call and records names.
    #[derive(Default)]
    pub(crate) struct EchoTools {
        pub(crate) calls: Mutex<Vec<String>>,
    }

    impl ToolExecutor for EchoTools {
        fn execute<'a>(
            &'a self,
            call: &'a FunctionCall,
        ) -> ToolFuture<'a, AssistantResult<Value>> {
            Box::pin(async move {
                if let Ok(mut calls) = self.calls.lock() {
                    calls.push(call.name.clone());
                }
                Ok(json!({"echo": call.args.clone()}))
            })
        }
    }

    pub(crate) fn call_reply(name: &str, args: Value) -> Content {
        Content {
            role: Role::Model,
            parts: vec![Part::FunctionCall {
                function_call: FunctionCall {
                    name: name.to_string(),
                    args,
                },
            }],
        }
    }

    fn settings(max: usize) -> ChatSettings {
        ChatSettings::travigo(max)
    }

    #[tokio::test]
    async fn test_plain_reply() {
        let backend = ScriptedBackend::new(vec![Content::model_text("Hello 👋")]);
        let tools = EchoTools::default();
        let settings = settings(5);
        let mut chat = ChatSession::new(&backend, &tools, &settings, Vec::new());

        let reply = chat.send_message("Hi").await;
        assert_eq!(reply.ok().map(|c| c.text_segments()), Some(vec!["Hello 👋".to_string()]));
        assert_eq!(chat.history().len(), 2);
        assert_eq!(backend.request_count(), 1);

        let first = backend.requests.lock().ok().and_then(|r| r.first().cloned());
        let first = first.map(|r| (r.tools.len(), r.system_instruction.is_some()));
        assert_eq!(first, Some((1, true)));
    }

    #[tokio::test]
    async fn test_function_calls_are_executed() {
        let backend = ScriptedBackend::new(vec![
            call_reply("search_stops", json!({"name": "Baldock", "transporttype": "Rail"})),
            call_reply("stop_departures", json!({"primaryidentifier": "gb-crs-BDK"})),
            Content::model_text("Next train at 22:04 🚆"),
        ]);
        let tools = EchoTools::default();
        let settings = settings(5);
        let mut chat = ChatSession::new(&backend, &tools, &settings, Vec::new());

        let reply = chat.send_message("Next train from Baldock?").await;
        assert!(reply.is_ok());
        assert_eq!(backend.request_count(), 3);

        let called = tools.calls.lock().map(|c| c.clone()).unwrap_or_default();
        assert_eq!(called, vec!["search_stops".to_string(), "stop_departures".to_string()]);

        // user, call, response, call, response, answer
        let history = chat.into_history();
        assert_eq!(history.len(), 6);
        assert_eq!(history[2].role, Role::User);
        assert!(matches!(history[2].parts[0], Part::FunctionResponse { .. }));
    }

    #[tokio::test]
    async fn test_function_call_limit() {
        let replies = (0..4)
            .map(|_| call_reply("get_stop", json!({"primaryidentifier": "x"})))
            .collect();
        let backend = ScriptedBackend::new(replies);
        let tools = EchoTools::default();
        let settings = settings(2);
        let mut chat = ChatSession::new(&backend, &tools, &settings, Vec::new());

        let result = chat.send_message("loop").await;
        assert!(matches!(result, Err(AssistantError::FunctionCallLimit(2))));
        assert_eq!(backend.request_count(), 3);
    }

    #[tokio::test]
    async fn test_empty_response_is_error() {
        let backend = ScriptedBackend::new(Vec::new());
        let tools = EchoTools::default();
        let settings = settings(5);
        let mut chat = ChatSession::new(&backend, &tools, &settings, Vec::new());

        let result = chat.send_message("anyone?").await;
        assert!(matches!(result, Err(AssistantError::EmptyResponse)));
    }

    #[tokio::test]
    async fn test_prior_history_is_sent() {
        let backend = ScriptedBackend::new(vec![Content::model_text("Still 22:04")]);
        let tools = EchoTools::default();
        let settings = settings(5);
        let prior = vec![Content::user_text("Next train?"), Content::model_text("22:04")];
        let mut chat = ChatSession::new(&backend, &tools, &settings, prior);

        assert!(chat.send_message("Sure?").await.is_ok());
        let sent = backend
            .requests
            .lock()
            .ok()
            .and_then(|r| r.first().map(|req| req.contents.len()));
        assert_eq!(sent, Some(3));
    }

    #[tokio::test]
    async fn test_reply_without_parts_is_empty_response() {
        let backend = ScriptedBackend::new(vec![Content {
            role: Role::Model,
            parts: Vec::new(),
        }]);
        let tools = EchoTools::default();
        let settings = settings(5);
        let mut chat = ChatSession::new(&backend, &tools, &settings, Vec::new());

        let result = chat.send_message("hi").await;
        assert!(matches!(result, Err(AssistantError::EmptyResponse)));
        assert!(chat.history().iter().all(|c| !c.parts.is_empty()));
    }

    #[tokio::test]
    async fn test_generation_config_is_sent() {
        let backend = ScriptedBackend::new(vec![Content::model_text("ok")]);
        let tools = EchoTools::default();
        let settings = ChatSettings {
            generation_config: Some(GenerationConfig {
                temperature: Some(0.2),
                ..GenerationConfig::default()
            }),
            ..settings(5)
        };
        let mut chat = ChatSession::new(&backend, &tools, &settings, Vec::new());

        assert!(chat.send_message("hi").await.is_ok());
        let sent = backend
            .requests
            .lock()
            .ok()
            .and_then(|r| r.first().and_then(|req| req.generation_config));
        assert_eq!(sent.and_then(|g| g.temperature), Some(0.2));
    }
}
