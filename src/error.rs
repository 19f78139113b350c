//! Error types for the news pipeline.
//!
//! Nothing below the aggregator boundary surfaces these to users: source and
//! article failures are logged and degraded. Only webhook `Signature` and
//! `Json` failures reach the HTTP layer, both as 400.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NewsError {
    #[error("source `{source_name}` fetch failed: {reason}")]
    SourceFetch { source_name: String, reason: String },

    #[error("article extraction failed for {url}: {reason}")]
    Extraction { url: String, reason: String },

    #[error("summarization failed: {0}")]
    Summarization(String),

    #[error("invalid webhook signature")]
    Signature,

    #[error("gateway request failed: {0}")]
    Gateway(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl NewsError {
    pub fn source_fetch(source_name: &str, reason: impl ToString) -> Self {
        Self::SourceFetch {
            source_name: source_name.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn extraction(url: &str, reason: impl ToString) -> Self {
        Self::Extraction {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, NewsError>;
