//! HTTP route handlers for the assistant webhook.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Form, Json, Router};

use crate::webhook::WebhookEvent;

use super::state::AppState;

/// Create the API router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/assistant/twilio/", get(placeholder))
        .route("/assistant/twilio/webhook", post(twilio_webhook))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "travigo-assistant",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn placeholder() -> &'static str {
    "No content here"
}

/// Handle a Twilio Conversations webhook.
async fn twilio_webhook(
    State(state): State<Arc<AppState>>,
    Form(event): Form<WebhookEvent>,
) -> Result<&'static str, (StatusCode, String)> {
    let outcome = state.relay.handle(&event).await.map_err(|e| {
        tracing::error!(
            event_type = %event.event_type,
            conversation = %event.conversation_sid,
            "webhook failed: {e}"
        );
        (StatusCode::INTERNAL_SERVER_ERROR, format!("Assistant error: {e}"))
    })?;

    Ok(outcome.as_body())
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, header};
    use tower::ServiceExt;

    use super::*;
    use crate::conversation::{ConversationStore, InMemoryConversationStore};
    use crate::llm::chat::tests::{EchoTools, ScriptedBackend};
    use crate::llm::{ChatSettings, Content};
    use crate::webhook::Relay;
    use crate::webhook::relay::tests::RecordingSender;

    struct Harness {
        store: Arc<InMemoryConversationStore>,
        sender: Arc<RecordingSender>,
        router: Router,
    }

    fn harness(replies: Vec<Content>) -> Harness {
        let store = Arc::new(InMemoryConversationStore::new());
        let sender = Arc::new(RecordingSender::default());
        let relay = Relay::new(
            store.clone(),
            Arc::new(ScriptedBackend::new(replies)),
            Arc::new(EchoTools::default()),
            sender.clone(),
            ChatSettings::travigo(5),
            20,
        );
        Harness {
            store,
            sender,
            router: create_router(AppState::new(relay)),
        }
    }

    async fn call(router: Router, request: Request<Body>) -> (StatusCode, String) {
        let response = router
            .oneshot(request)
            .await
            .unwrap_or_else(|never| match never {});
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap_or_default();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    fn webhook(form: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/assistant/twilio/webhook")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_placeholder_page() {
        let h = harness(Vec::new());
        let request = Request::builder()
            .uri("/assistant/twilio/")
            .body(Body::empty())
            .unwrap_or_default();
        let (status, body) = call(h.router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "No content here");
    }

    #[tokio::test]
    async fn test_health() {
        let h = harness(Vec::new());
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap_or_default();
        let (status, body) = call(h.router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("\"status\":\"ok\""));
    }

    #[tokio::test]
    async fn test_message_added() {
        let h = harness(vec![Content::model_text("Hello 👋")]);
        let form = "EventType=onMessageAdded&ConversationSid=CH1&Body=Hi+there&Author=user1\
                    &Index=3&AccountSid=AC1&Source=SDK";
        let (status, body) = call(h.router, webhook(form)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK");

        let sent = h.sender.sent.lock().map(|s| s.clone()).unwrap_or_default();
        assert_eq!(sent, vec![("CH1".to_string(), "Hello 👋".to_string())]);
        let record = h.store.load("CH1").await.ok();
        assert!(record.is_some_and(|r| r.messages.contains("Hi there")));
    }

    #[tokio::test]
    async fn test_unknown_mode() {
        let h = harness(Vec::new());
        let (status, body) =
            call(h.router, webhook("EventType=onDeliveryUpdated&ConversationSid=CH1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Unknown mode");
        assert!(h.store.is_empty());
    }

    #[tokio::test]
    async fn test_downstream_failure_is_500() {
        let h = harness(Vec::new());
        let (status, body) =
            call(h.router, webhook("EventType=onMessageAdded&ConversationSid=CH1&Body=hi")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("empty response"));
    }

    #[tokio::test]
    async fn test_missing_event_type_is_rejected() {
        let h = harness(Vec::new());
        let (status, _) = call(h.router, webhook("ConversationSid=CH1")).await;
        assert!(status.is_client_error());
        assert!(h.store.is_empty());
    }
}
