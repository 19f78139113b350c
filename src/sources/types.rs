// src/sources/types.rs
use serde::{Deserialize, Serialize};

/// Unsummarized article reference produced by a source client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArticleCandidate {
    pub title: String,
    pub url: String,
    pub source: String,     // e.g., "Intel", "AMD"
    pub published_at: Option<i64>, // unix seconds
}

impl ArticleCandidate {
    pub fn new(title: impl Into<String>, url: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            source: source.into(),
            published_at: None,
        }
    }

    pub fn with_published_at(mut self, ts: Option<i64>) -> Self {
        self.published_at = ts;
        self
    }
}

/// One origin of news candidates.
///
/// Implementations never fail: network or parse errors are logged and the
/// client returns whatever it collected so far (possibly nothing).
#[async_trait::async_trait]
pub trait SourceClient: Send + Sync {
    async fn fetch(&self, keywords: Option<&[String]>, pre_filter: bool) -> Vec<ArticleCandidate>;
    fn name(&self) -> &str;

    /// True when the client already applies its own per-feed cap, so the
    /// aggregator must not truncate its combined list again.
    fn limits_itself(&self) -> bool {
        false
    }
}
