// src/sources/providers/press_search.rs
//! Press-release search API. The provider filters on its side: every default
//! keyword goes into one `OR` query.

use async_trait::async_trait;
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::PressApiConfig;
use crate::error::Result;
use crate::sources::types::{ArticleCandidate, SourceClient};
use crate::sources::{build_http_client, normalize_text, record_source_error};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    locale: &'a str,
    cq: &'a str,
    context: SearchContext<'a>,
    q: String,
    sort_criteria: &'a str,
    number_of_results: u32,
    first_result: u32,
}

#[derive(Debug, Serialize)]
struct SearchContext<'a> {
    amd_lang: &'a str,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    click_uri: Option<String>,
    #[serde(default)]
    uri: Option<String>,
}

/// Join keywords into the provider's boolean query syntax.
pub fn or_query(keywords: &[String]) -> String {
    keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .collect::<Vec<_>>()
        .join(" OR ")
}

pub struct PressSearchClient {
    cfg: PressApiConfig,
    query_keywords: Vec<String>,
    client: reqwest::Client,
}

impl PressSearchClient {
    /// `query_keywords` is the fixed keyword set sent with every request.
    pub fn new(cfg: PressApiConfig, query_keywords: Vec<String>) -> Result<Self> {
        let client = build_http_client(Duration::from_secs(cfg.timeout_secs))?;
        Ok(Self {
            cfg,
            query_keywords,
            client,
        })
    }

    async fn search(&self) -> Result<Vec<ArticleCandidate>> {
        let body = SearchRequest {
            locale: &self.cfg.locale,
            cq: &self.cfg.result_type_filter,
            context: SearchContext {
                amd_lang: &self.cfg.locale,
            },
            q: or_query(&self.query_keywords),
            sort_criteria: &self.cfg.sort_criteria,
            number_of_results: self.cfg.number_of_results,
            first_result: 0,
        };

        let mut req = self
            .client
            .post(&self.cfg.endpoint)
            .header("accept", "*/*")
            .json(&body);
        if !self.cfg.token.is_empty() {
            req = req.bearer_auth(&self.cfg.token);
        }

        let resp: SearchResponse = req.send().await?.error_for_status()?.json().await?;

        let out = resp
            .results
            .into_iter()
            .filter_map(|r| {
                let title = normalize_text(&r.title);
                let link = r
                    .click_uri
                    .filter(|u| !u.trim().is_empty())
                    .or(r.uri)
                    .unwrap_or_default();
                if title.is_empty() || link.trim().is_empty() {
                    return None;
                }
                Some(ArticleCandidate::new(title, link.trim(), self.cfg.name.clone()))
            })
            .take(self.cfg.limit)
            .collect();
        Ok(out)
    }
}

#[async_trait]
impl SourceClient for PressSearchClient {
    async fn fetch(&self, _keywords: Option<&[String]>, _pre_filter: bool) -> Vec<ArticleCandidate> {
        match self.search().await {
            Ok(v) => {
                counter!("news_candidates_total", "source" => self.cfg.name.clone())
                    .increment(v.len() as u64);
                v
            }
            Err(e) => {
                record_source_error(&self.cfg.name, &e);
                Vec::new()
            }
        }
    }

    fn name(&self) -> &str {
        &self.cfg.name
    }
}
