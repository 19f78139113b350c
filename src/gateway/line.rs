// src/gateway/line.rs
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;

use super::signature::verify_signature;
use super::MessagingGateway;
use crate::config::LineConfig;
use crate::error::{NewsError, Result};

/// Longest text the messaging API accepts in one message.
pub const MAX_TEXT_CHARS: usize = 5000;

#[derive(Clone)]
pub struct LineGateway {
    api_base: String,
    channel_secret: String,
    access_token: String,
    client: Client,
    timeout: Duration,
    max_retries: u8,
}

impl LineGateway {
    pub fn new(cfg: &LineConfig) -> Self {
        Self {
            api_base: cfg.api_base.trim_end_matches('/').to_string(),
            channel_secret: cfg.channel_secret.clone(),
            access_token: cfg.access_token.clone(),
            client: Client::new(),
            timeout: Duration::from_secs(cfg.timeout_secs),
            max_retries: cfg.max_retries.max(1),
        }
    }

    async fn post_with_retry<T: Serialize + Sync>(&self, path: &str, payload: &T) -> Result<()> {
        let url = format!("{}{}", self.api_base, path);
        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            let res = self
                .client
                .post(&url)
                .bearer_auth(&self.access_token)
                .timeout(self.timeout)
                .json(payload)
                .send()
                .await;

            let err = match res {
                Ok(rsp) => {
                    let status = rsp.status();
                    if status.is_success() {
                        return Ok(());
                    }
                    let retryable =
                        status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS;
                    let body = rsp.text().await.unwrap_or_default();
                    let err = NewsError::Gateway(format!("{path} returned {status}: {body}"));
                    if !retryable {
                        return Err(err);
                    }
                    err
                }
                Err(e) => NewsError::Gateway(format!("{path} request failed: {e}")),
            };

            if attempt >= self.max_retries {
                return Err(err);
            }
            tracing::debug!(error = %err, attempt, "messaging API call failed, retrying");
            tokio::time::sleep(Duration::from_millis(500u64 << (attempt - 1))).await;
        }
    }
}

#[derive(Serialize)]
struct TextMessage {
    #[serde(rename = "type")]
    kind: &'static str,
    text: String,
}

impl TextMessage {
    fn new(text: &str) -> Self {
        Self {
            kind: "text",
            text: text.chars().take(MAX_TEXT_CHARS).collect(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplyPayload {
    reply_token: String,
    messages: Vec<TextMessage>,
}

#[derive(Serialize)]
struct PushPayload {
    to: String,
    messages: Vec<TextMessage>,
}

#[async_trait]
impl MessagingGateway for LineGateway {
    fn verify(&self, signature: &str, body: &[u8]) -> bool {
        !self.channel_secret.is_empty() && verify_signature(&self.channel_secret, body, signature)
    }

    async fn reply(&self, reply_token: &str, text: &str) -> Result<()> {
        let payload = ReplyPayload {
            reply_token: reply_token.to_string(),
            messages: vec![TextMessage::new(text)],
        };
        self.post_with_retry("/v2/bot/message/reply", &payload).await
    }

    async fn push(&self, to: &str, text: &str) -> Result<()> {
        let payload = PushPayload {
            to: to.to_string(),
            messages: vec![TextMessage::new(text)],
        };
        self.post_with_retry("/v2/bot/message/push", &payload).await
    }
}
