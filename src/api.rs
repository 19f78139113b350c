use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Router,
};
use metrics::counter;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use crate::dispatcher::Dispatcher;
use crate::error::{NewsError, Result};
use crate::gateway::MessagingGateway;

pub const SIGNATURE_HEADER: &str = "x-line-signature";

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/callback", post(callback))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct WebhookBody {
    #[serde(default)]
    events: Vec<Event>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Event {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    reply_token: Option<String>,
    #[serde(default)]
    source: Option<EventSource>,
    #[serde(default)]
    message: Option<EventMessage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventSource {
    #[serde(default)]
    user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventMessage {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// A text message event with everything needed to answer it.
struct TextEvent {
    reply_token: String,
    user_id: String,
    text: String,
}

impl Event {
    fn into_text_event(self) -> Option<TextEvent> {
        if self.kind != "message" {
            return None;
        }
        let message = self.message.filter(|m| m.kind == "text")?;
        Some(TextEvent {
            reply_token: self.reply_token?,
            user_id: self.source?.user_id?,
            text: message.text?,
        })
    }
}

/// The signature header must be present and match the raw body.
fn authenticate(gateway: &dyn MessagingGateway, headers: &HeaderMap, body: &[u8]) -> Result<()> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if signature.is_empty() || !gateway.verify(signature, body) {
        return Err(NewsError::Signature);
    }
    Ok(())
}

fn parse_body(body: &[u8]) -> Result<WebhookBody> {
    Ok(serde_json::from_slice(body)?)
}

async fn callback(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> StatusCode {
    if let Err(e) = authenticate(state.dispatcher.gateway().as_ref(), &headers, &body) {
        counter!("webhook_signature_rejected_total").increment(1);
        tracing::warn!(
            error = %e,
            has_header = headers.contains_key(SIGNATURE_HEADER),
            "webhook rejected"
        );
        return StatusCode::BAD_REQUEST;
    }

    let parsed = match parse_body(&body) {
        Ok(b) => b,
        Err(e) => {
            tracing::warn!(error = %e, "webhook body is not valid JSON");
            return StatusCode::BAD_REQUEST;
        }
    };

    for ev in parsed.events.into_iter().filter_map(Event::into_text_event) {
        let dispatcher = Arc::clone(&state.dispatcher);
        tokio::spawn(async move {
            dispatcher
                .handle_text(&ev.reply_token, &ev.user_id, &ev.text)
                .await;
        });
    }
    StatusCode::OK
}
