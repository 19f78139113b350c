//! Display-ready news records and their chat rendering.

use serde::{Deserialize, Serialize};

/// Shown in place of a summary when the page yielded no extractable text.
pub const NO_SUMMARY_TEXT: &str = "無法生成摘要";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Summary {
    Text(String),
    Unavailable,
}

impl Summary {
    pub fn as_display(&self) -> &str {
        match self {
            Summary::Text(s) => s,
            Summary::Unavailable => NO_SUMMARY_TEXT,
        }
    }

    /// Text that participates in keyword matching. The sentinel never does.
    pub fn searchable(&self) -> Option<&str> {
        match self {
            Summary::Text(s) => Some(s),
            Summary::Unavailable => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewsItem {
    pub title: String,
    /// Link after redirects were followed.
    pub source_url: String,
    pub source_name: String,
    pub summary: Summary,
}

/// What the article adapter hands back for one candidate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ArticleOutcome {
    Summarized(NewsItem),
    /// Download or summarization gave up; only the candidate's own fields survive.
    ExtractionFailed {
        title: String,
        url: String,
        source: String,
    },
}

impl ArticleOutcome {
    pub fn source_name(&self) -> &str {
        match self {
            ArticleOutcome::Summarized(item) => &item.source_name,
            ArticleOutcome::ExtractionFailed { source, .. } => source,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            ArticleOutcome::Summarized(item) => &item.title,
            ArticleOutcome::ExtractionFailed { title, .. } => title,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            ArticleOutcome::Summarized(item) => &item.source_url,
            ArticleOutcome::ExtractionFailed { url, .. } => url,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, ArticleOutcome::ExtractionFailed { .. })
    }

    /// Case-insensitive substring match of any keyword against title, source,
    /// link and summary text.
    pub fn matches_any(&self, keywords: &[String]) -> bool {
        let mut hay = format!("{}\n{}\n{}", self.title(), self.source_name(), self.url());
        if let ArticleOutcome::Summarized(item) = self {
            if let Some(s) = item.summary.searchable() {
                hay.push('\n');
                hay.push_str(s);
            }
        }
        let hay = hay.to_lowercase();
        keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .any(|k| hay.contains(&k))
    }

    /// Chat message text: title and source, link, then the summary line.
    pub fn render(&self) -> String {
        match self {
            ArticleOutcome::Summarized(item) => format!(
                "📰 標題: {} (來源: {})\n🔗 連結: {}\n📑 新聞摘要: {}",
                item.title,
                item.source_name,
                item.source_url,
                item.summary.as_display()
            ),
            ArticleOutcome::ExtractionFailed { title, url, source } => {
                format!("📰 標題: {} (來源: {})\n🔗 連結: {}", title, source, url)
            }
        }
    }
}
