//! Maps one inbound chat text to replies and pushes.

use std::sync::Arc;

use crate::aggregator::Aggregator;
use crate::gateway::MessagingGateway;
use crate::news::ArticleOutcome;
use crate::selector::select_random;

pub const DIGEST_ACK: &str = "🔍 正在為您搜索最新的科技新聞，請稍等...";
pub const DIGEST_EMPTY: &str = "目前沒有找到包含關鍵字的新聞";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Best article per source for the default keywords.
    Digest,
    /// Free search for one keyword.
    Keyword(String),
    Help,
}

/// Trimmed and lowercased; the trigger wins over the keyword interpretation.
pub fn parse_command(text: &str, trigger: &str) -> Command {
    let text = text.trim().to_lowercase();
    if text.is_empty() {
        Command::Help
    } else if text == trigger {
        Command::Digest
    } else if !text.chars().any(char::is_whitespace) {
        Command::Keyword(text)
    } else {
        Command::Help
    }
}

pub fn keyword_ack(keyword: &str) -> String {
    format!("🔍 正在搜索包含「{keyword}」的相關新聞，請稍等...")
}

pub fn keyword_empty(keyword: &str) -> String {
    format!("目前沒有找到包含關鍵字「{keyword}」的新聞")
}

pub fn help_text(trigger: &str) -> String {
    format!("請發送 '{trigger}' 來獲取每個來源1則最相關的新聞，或發送任何單一關鍵字來搜尋相關新聞")
}

pub struct Dispatcher {
    aggregator: Arc<Aggregator>,
    gateway: Arc<dyn MessagingGateway>,
    default_keywords: Vec<String>,
    trigger: String,
    target_count: usize,
}

impl Dispatcher {
    pub fn new(
        aggregator: Arc<Aggregator>,
        gateway: Arc<dyn MessagingGateway>,
        default_keywords: Vec<String>,
        trigger: impl Into<String>,
        target_count: usize,
    ) -> Self {
        Self {
            aggregator,
            gateway,
            default_keywords,
            trigger: trigger.into().trim().to_lowercase(),
            target_count,
        }
    }

    pub fn gateway(&self) -> &Arc<dyn MessagingGateway> {
        &self.gateway
    }

    /// Run one text event to completion. Delivery failures are logged only.
    pub async fn handle_text(&self, reply_token: &str, user_id: &str, text: &str) {
        match parse_command(text, &self.trigger) {
            Command::Digest => {
                self.reply(reply_token, DIGEST_ACK).await;
                let outcomes = self
                    .aggregator
                    .collect_best_per_source(&self.default_keywords)
                    .await;
                tracing::info!(count = outcomes.len(), "digest collected");
                self.push_all(user_id, &outcomes, DIGEST_EMPTY).await;
            }
            Command::Keyword(kw) => {
                self.reply(reply_token, &keyword_ack(&kw)).await;
                let keywords = vec![kw.clone()];
                let outcomes = self.aggregator.collect_news(&keywords, false).await;
                let total = outcomes.len();
                let picked = select_random(outcomes, &keywords, self.target_count, false);
                tracing::info!(keyword = %kw, total, picked = picked.len(), "keyword search done");
                self.push_all(user_id, &picked, &keyword_empty(&kw)).await;
            }
            Command::Help => {
                self.reply(reply_token, &help_text(&self.trigger)).await;
            }
        }
    }

    async fn reply(&self, reply_token: &str, text: &str) {
        if let Err(e) = self.gateway.reply(reply_token, text).await {
            tracing::warn!(error = %e, "reply failed");
        }
    }

    async fn push_all(&self, user_id: &str, outcomes: &[ArticleOutcome], empty_text: &str) {
        if outcomes.is_empty() {
            if let Err(e) = self.gateway.push(user_id, empty_text).await {
                tracing::warn!(error = %e, "push failed");
            }
            return;
        }
        for o in outcomes {
            if let Err(e) = self.gateway.push(user_id, &o.render()).await {
                tracing::warn!(error = %e, url = %o.url(), "push failed");
            }
        }
    }
}
