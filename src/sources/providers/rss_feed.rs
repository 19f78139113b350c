// src/sources/providers/rss_feed.rs
use async_trait::async_trait;
use chrono::DateTime;
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use serde::Deserialize;
use std::time::Duration;
use tokio::task::JoinSet;

use crate::config::FeedConfig;
use crate::error::{NewsError, Result};
use crate::sources::types::{ArticleCandidate, SourceClient};
use crate::sources::{build_http_client, normalize_text, record_source_error, title_matches};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}
#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}
#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entry: Vec<AtomEntry>,
}
#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<AtomText>,
    #[serde(default)]
    link: Vec<AtomLink>,
    updated: Option<String>,
    published: Option<String>,
}
#[derive(Debug, Deserialize)]
struct AtomText {
    #[serde(rename = "$text", default)]
    value: String,
}
#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

/// One parsed feed entry before it is tagged with a source name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    pub published_at: Option<i64>,
}

fn parse_feed_date(ts: &str) -> Option<i64> {
    let ts = ts.trim();
    DateTime::parse_from_rfc2822(ts)
        .or_else(|_| DateTime::parse_from_rfc3339(ts))
        .ok()
        .map(|dt| dt.timestamp())
}

/// Parse RSS 2.0 or Atom XML into entries, in document order.
/// Entries without a title or link are skipped.
pub fn parse_feed(xml: &str) -> Result<Vec<FeedEntry>> {
    let t0 = std::time::Instant::now();
    let xml_clean = scrub_html_entities_for_xml(xml);

    let is_rss = xml_clean.contains("<rss") || xml_clean.contains("<channel");
    let is_atom = xml_clean.contains("<feed");

    let entries = if is_rss {
        let rss: Rss = from_str(&xml_clean)
            .map_err(|e| NewsError::Parse(format!("rss xml: {e}")))?;
        rss
            .channel
            .item
            .into_iter()
            .filter_map(|it| {
                let title = normalize_text(it.title.as_deref().unwrap_or_default());
                let link = it.link.unwrap_or_default().trim().to_string();
                if title.is_empty() || link.is_empty() {
                    return None;
                }
                Some(FeedEntry {
                    title,
                    link,
                    published_at: it.pub_date.as_deref().and_then(parse_feed_date),
                })
            })
            .collect::<Vec<_>>()
    } else if is_atom {
        let feed: AtomFeed = from_str(&xml_clean)
            .map_err(|e| NewsError::Parse(format!("atom xml: {e}")))?;
        feed.entry
            .into_iter()
            .filter_map(|e| {
                let title = normalize_text(&e.title.map(|t| t.value).unwrap_or_default());
                let link = e
                    .link
                    .iter()
                    .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
                    .or_else(|| e.link.first())
                    .and_then(|l| l.href.clone())
                    .unwrap_or_default();
                if title.is_empty() || link.trim().is_empty() {
                    return None;
                }
                let ts = e.published.or(e.updated);
                Some(FeedEntry {
                    title,
                    link: link.trim().to_string(),
                    published_at: ts.as_deref().and_then(parse_feed_date),
                })
            })
            .collect()
    } else {
        return Err(NewsError::Parse("unrecognized feed format".to_string()));
    };

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("news_feed_parse_ms").record(ms);
    Ok(entries)
}

/// Keep entries in feed order, optionally only those whose title matches, capped at `limit`.
pub fn select_entries(
    entries: Vec<FeedEntry>,
    keywords: Option<&[String]>,
    pre_filter: bool,
    limit: usize,
) -> Vec<FeedEntry> {
    match keywords {
        Some(kws) if pre_filter && !kws.is_empty() => entries
            .into_iter()
            .filter(|e| title_matches(&e.title, kws))
            .take(limit)
            .collect(),
        _ => entries.into_iter().take(limit).collect(),
    }
}

/// RSS aggregator over a fixed list of named feeds. Feeds are fetched
/// concurrently, each bounded by its own request timeout.
pub struct RssFeedClient {
    feeds: Vec<FeedConfig>,
    per_feed_limit: usize,
    client: reqwest::Client,
}

impl RssFeedClient {
    pub const NAME: &'static str = "rss";

    pub fn new(
        feeds: Vec<FeedConfig>,
        per_feed_limit: usize,
        feed_timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            feeds,
            per_feed_limit,
            client: build_http_client(feed_timeout)?,
        })
    }
}

async fn fetch_feed(client: reqwest::Client, url: String) -> Result<Vec<FeedEntry>> {
    let body = client
        .get(&url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    parse_feed(&body)
}

#[async_trait]
impl SourceClient for RssFeedClient {
    async fn fetch(&self, keywords: Option<&[String]>, pre_filter: bool) -> Vec<ArticleCandidate> {
        let mut set = JoinSet::new();
        for (idx, feed) in self.feeds.iter().enumerate() {
            let client = self.client.clone();
            let url = feed.url.clone();
            set.spawn(async move { (idx, fetch_feed(client, url).await) });
        }

        let mut fetched: Vec<Option<Vec<FeedEntry>>> = vec![None; self.feeds.len()];
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((idx, Ok(entries))) => fetched[idx] = Some(entries),
                Ok((idx, Err(e))) => record_source_error(&self.feeds[idx].name, &e),
                Err(e) => tracing::error!(error = %e, "feed task failed"),
            }
        }

        let mut out = Vec::new();
        for (feed, entries) in self.feeds.iter().zip(fetched) {
            let Some(entries) = entries else { continue };
            let total = entries.len();
            let picked = select_entries(entries, keywords, pre_filter, self.per_feed_limit);
            tracing::debug!(feed = %feed.name, total, kept = picked.len(), "feed parsed");
            counter!("news_candidates_total", "source" => feed.name.clone())
                .increment(picked.len() as u64);
            out.extend(picked.into_iter().map(|e| {
                ArticleCandidate::new(e.title, e.link, feed.name.clone())
                    .with_published_at(e.published_at)
            }));
        }
        out
    }

    fn name(&self) -> &str {
        Self::NAME
    }

    fn limits_itself(&self) -> bool {
        true
    }
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&hellip;", "...")
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel><title>t</title>
<item><title>GPU launch&nbsp;today</title><link>https://a.example/1</link><pubDate>Tue, 01 Jul 2025 10:00:00 +0000</pubDate></item>
<item><title><![CDATA[CPU roadmap]]></title><link>https://a.example/2</link></item>
<item><title></title><link>https://a.example/3</link></item>
</channel></rss>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom"><title>x</title>
<entry><title type="html">AI server</title><link rel="alternate" href="https://b.example/ai"/><updated>2025-07-01T10:00:00Z</updated></entry>
</feed>"#;

    #[test]
    fn parses_rss_items_and_skips_empty_titles() {
        let entries = parse_feed(RSS).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "GPU launch today");
        assert_eq!(entries[0].published_at, Some(1_751_364_000));
        assert_eq!(entries[1].title, "CPU roadmap");
        assert_eq!(entries[1].published_at, None);
    }

    #[test]
    fn parses_atom_entries() {
        let entries = parse_feed(ATOM).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].link, "https://b.example/ai");
        assert_eq!(entries[0].published_at, Some(1_751_364_000));
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(parse_feed("not xml at all").is_err());
    }

    #[test]
    fn pre_filter_keeps_matching_titles_only() {
        let entries = parse_feed(RSS).unwrap();
        let kws = vec!["gpu".to_string()];
        let picked = select_entries(entries.clone(), Some(kws.as_slice()), true, 5);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].link, "https://a.example/1");

        let unfiltered = select_entries(entries, Some(kws.as_slice()), false, 1);
        assert_eq!(unfiltered.len(), 1);
        assert_eq!(unfiltered[0].link, "https://a.example/1");
    }
}
