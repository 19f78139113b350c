// src/sources/providers/blog_search.rs
//! WordPress-style blog search. One request per configured keyword; results
//! are merged, de-duplicated by link and ordered newest first.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime};
use metrics::counter;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;

use crate::config::BlogApiConfig;
use crate::error::Result;
use crate::sources::types::{ArticleCandidate, SourceClient};
use crate::sources::{build_http_client, normalize_text, record_source_error};

#[derive(Debug, Deserialize)]
struct Post {
    #[serde(default)]
    title: Rendered,
    #[serde(default)]
    link: String,
    #[serde(default)]
    date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Rendered {
    #[serde(default)]
    rendered: String,
}

fn parse_post_date(s: &str) -> Option<i64> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .map(|dt| dt.and_utc().timestamp())
        .or_else(|_| DateTime::parse_from_rfc3339(s).map(|dt| dt.timestamp()))
        .ok()
}

/// Merge per-keyword result pages: first occurrence of a link wins, untitled
/// posts are dropped, then a stable newest-first sort (undated last) capped at `limit`.
pub fn merge_posts(pages: Vec<Vec<ArticleCandidate>>, limit: usize) -> Vec<ArticleCandidate> {
    let mut seen = HashSet::new();
    let mut merged: Vec<ArticleCandidate> = pages
        .into_iter()
        .flatten()
        .filter(|c| !c.title.is_empty() && seen.insert(c.url.clone()))
        .collect();
    merged.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    merged.truncate(limit);
    merged
}

pub struct BlogSearchClient {
    cfg: BlogApiConfig,
    client: reqwest::Client,
}

impl BlogSearchClient {
    pub fn new(cfg: BlogApiConfig) -> Result<Self> {
        let client = build_http_client(Duration::from_secs(cfg.timeout_secs))?;
        Ok(Self { cfg, client })
    }

    async fn search(&self, keyword: &str) -> Result<Vec<ArticleCandidate>> {
        let per_page = self.cfg.per_page.to_string();
        let posts: Vec<Post> = self
            .client
            .get(&self.cfg.endpoint)
            .query(&[
                ("_embed", "true"),
                ("per_page", per_page.as_str()),
                ("page", "1"),
                ("search", keyword),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(posts
            .into_iter()
            .filter(|p| !p.link.trim().is_empty())
            .map(|p| {
                ArticleCandidate::new(normalize_text(&p.title.rendered), p.link.trim(), self.cfg.name.clone())
                    .with_published_at(p.date.as_deref().and_then(parse_post_date))
            })
            .collect())
    }
}

#[async_trait]
impl SourceClient for BlogSearchClient {
    async fn fetch(&self, _keywords: Option<&[String]>, _pre_filter: bool) -> Vec<ArticleCandidate> {
        let mut pages = Vec::with_capacity(self.cfg.keywords.len());
        for kw in &self.cfg.keywords {
            match self.search(kw).await {
                Ok(v) => pages.push(v),
                Err(e) => record_source_error(&self.cfg.name, &e),
            }
        }
        let out = merge_posts(pages, self.cfg.limit);
        counter!("news_candidates_total", "source" => self.cfg.name.clone())
            .increment(out.len() as u64);
        out
    }

    fn name(&self) -> &str {
        &self.cfg.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(title: &str, url: &str, ts: Option<i64>) -> ArticleCandidate {
        ArticleCandidate::new(title, url, "NVIDIA").with_published_at(ts)
    }

    #[test]
    fn wordpress_dates_parse_as_utc() {
        assert_eq!(parse_post_date("2025-07-01T10:00:00"), Some(1_751_364_000));
        assert_eq!(parse_post_date("2025-07-01T10:00:00+00:00"), Some(1_751_364_000));
        assert_eq!(parse_post_date("yesterday"), None);
    }

    #[test]
    fn merge_dedups_by_link_and_sorts_newest_first() {
        let pages = vec![
            vec![c("old", "https://n.example/1", Some(10)), c("", "https://n.example/x", Some(99))],
            vec![c("dup", "https://n.example/1", Some(50)), c("new", "https://n.example/2", Some(20))],
            vec![c("undated", "https://n.example/3", None)],
        ];
        let out = merge_posts(pages, 5);
        let titles: Vec<_> = out.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["new", "old", "undated"]);
    }

    #[test]
    fn merge_respects_limit() {
        let pages: Vec<Vec<ArticleCandidate>> = vec![(0..8).map(|i| c("t", &format!("https://n.example/{i}"), Some(i))).collect()];
        assert_eq!(merge_posts(pages, 5).len(), 5);
    }
}
