//! Article download and plain-text extraction.

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use scraper::{Html, Selector};
use std::time::Duration;

use crate::config::app::BROWSER_USER_AGENT;
use crate::error::{NewsError, Result};

/// Extracted article body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    /// URL after redirects.
    pub final_url: String,
    pub text: String,
}

#[async_trait]
pub trait ArticleExtractor: Send + Sync {
    async fn extract(&self, url: &str, timeout: Duration) -> Result<Extracted>;
}

/// Fetches the page over HTTP and keeps the paragraph text.
pub struct HttpExtractor {
    client: reqwest::Client,
}

impl HttpExtractor {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ArticleExtractor for HttpExtractor {
    async fn extract(&self, url: &str, timeout: Duration) -> Result<Extracted> {
        let resp = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| NewsError::extraction(url, e))?
            .error_for_status()
            .map_err(|e| NewsError::extraction(url, e))?;
        let final_url = resp.url().to_string();
        let html = resp.text().await.map_err(|e| NewsError::extraction(url, e))?;
        Ok(Extracted {
            final_url,
            text: html_to_text(&html),
        })
    }
}

fn paragraph_selectors() -> &'static [Selector] {
    static SELECTORS: OnceCell<Vec<Selector>> = OnceCell::new();
    SELECTORS.get_or_init(|| {
        ["article p", "main p", "p"]
            .iter()
            .filter_map(|s| Selector::parse(s).ok())
            .collect()
    })
}

/// Paragraph text of an HTML page, preferring `<article>` then `<main>` content.
/// Paragraphs are joined with newlines; empty when nothing readable was found.
pub fn html_to_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    for sel in paragraph_selectors() {
        let paras: Vec<String> = doc
            .select(sel)
            .map(|p| {
                p.text()
                    .collect::<String>()
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .filter(|t| !t.is_empty())
            .collect();
        if !paras.is_empty() {
            return paras.join("\n");
        }
    }
    String::new()
}
