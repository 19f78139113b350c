// src/sources/mod.rs
pub mod providers;
pub mod types;

use crate::config::app::BROWSER_USER_AGENT;
use crate::error::Result;
use metrics::counter;
use once_cell::sync::OnceCell;
use std::time::Duration;

pub use providers::{BlogSearchClient, PressSearchClient, RssFeedClient};
pub use types::{ArticleCandidate, SourceClient};

/// Normalize a title: decode entities, strip HTML tags, ASCII quotes, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    re_ws.replace_all(&out, " ").trim().to_string()
}

/// Case-insensitive substring match of any non-empty keyword in `title`.
pub fn title_matches(title: &str, keywords: &[String]) -> bool {
    let t = title.to_lowercase();
    keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .any(|k| !k.is_empty() && t.contains(&k))
}

/// Shared HTTP client for source fetches, identified with a browser-like User-Agent.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(BROWSER_USER_AGENT)
        .connect_timeout(Duration::from_secs(4).min(timeout))
        .timeout(timeout)
        .build()?;
    Ok(client)
}

/// Log and count one isolated source failure.
pub(crate) fn record_source_error(source: &str, err: &crate::error::NewsError) {
    tracing::warn!(error = %err, source, "source fetch failed");
    counter!("news_source_errors_total", "source" => source.to_string()).increment(1);
}
