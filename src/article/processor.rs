//! Candidate -> outcome: cache lookup, extraction with retries, summarization.

use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};

use crate::article::cache::ArticleCache;
use crate::article::extractor::ArticleExtractor;
use crate::article::summarizer::{truncate_chars, Summarizer};
use crate::config::{ExtractConfig, SummaryConfig};
use crate::error::{NewsError, Result};
use crate::news::{ArticleOutcome, NewsItem, Summary};
use crate::sources::ArticleCandidate;

pub struct ArticleProcessor {
    cache: Arc<ArticleCache>,
    extractor: Arc<dyn ArticleExtractor>,
    summarizer: Arc<dyn Summarizer>,
    summary: SummaryConfig,
    extract: ExtractConfig,
}

impl ArticleProcessor {
    pub fn new(
        cache: Arc<ArticleCache>,
        extractor: Arc<dyn ArticleExtractor>,
        summarizer: Arc<dyn Summarizer>,
        summary: SummaryConfig,
        extract: ExtractConfig,
    ) -> Self {
        Self {
            cache,
            extractor,
            summarizer,
            summary,
            extract,
        }
    }

    pub fn cache(&self) -> &Arc<ArticleCache> {
        &self.cache
    }

    /// Never fails: after the last attempt, or once the overall extraction
    /// deadline passes, the candidate degrades to a placeholder carrying its
    /// original link. Either result is cached.
    pub async fn process(&self, candidate: &ArticleCandidate) -> ArticleOutcome {
        if let Some(hit) = self.cache.get(&candidate.url) {
            return hit;
        }

        let t0 = Instant::now();
        let deadline = self.extract.deadline();
        let outcome = match tokio::time::timeout(deadline, self.attempt_all(candidate)).await {
            Ok(found) => found,
            Err(_) => {
                tracing::warn!(
                    url = %candidate.url,
                    source = %candidate.source,
                    deadline_secs = deadline.as_secs(),
                    "article processing gave up at deadline"
                );
                None
            }
        };

        let outcome = outcome.map(ArticleOutcome::Summarized).unwrap_or_else(|| {
            counter!("article_extract_failures_total", "source" => candidate.source.clone())
                .increment(1);
            ArticleOutcome::ExtractionFailed {
                title: candidate.title.clone(),
                url: candidate.url.clone(),
                source: candidate.source.clone(),
            }
        });

        self.cache.insert(&candidate.url, outcome.clone());
        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("article_process_ms").record(ms);
        tracing::debug!(url = %candidate.url, elapsed_ms = ms, "article processed");
        outcome
    }

    /// Up to `max_attempts` tries with a pause in between; `None` when all fail.
    async fn attempt_all(&self, candidate: &ArticleCandidate) -> Option<NewsItem> {
        let attempts = self.extract.max_attempts.max(1);
        for attempt in 1..=attempts {
            match self.try_once(candidate).await {
                Ok(item) => return Some(item),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        url = %candidate.url,
                        source = %candidate.source,
                        attempt,
                        "article processing failed"
                    );
                    if attempt < attempts {
                        tokio::time::sleep(self.extract.retry_delay()).await;
                    }
                }
            }
        }
        None
    }

    async fn try_once(&self, candidate: &ArticleCandidate) -> Result<NewsItem> {
        let host = url::Url::parse(&candidate.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default();
        let timeout = self.extract.timeout_for_host(&host);
        let extracted = self.extractor.extract(&candidate.url, timeout).await?;

        let summary = if extracted.text.trim().is_empty() {
            Summary::Unavailable
        } else {
            let text: String = extracted
                .text
                .chars()
                .take(self.summary.max_input_chars)
                .collect();
            let summarizer = Arc::clone(&self.summarizer);
            let (ratio, words) = (self.summary.ratio, self.summary.words);
            let raw = tokio::task::spawn_blocking(move || summarizer.summarize(&text, ratio, words))
                .await
                .map_err(|e| NewsError::Summarization(format!("summarizer task: {e}")))??;
            let raw = raw.trim();
            if raw.is_empty() {
                Summary::Unavailable
            } else {
                Summary::Text(truncate_chars(raw, self.summary.max_chars))
            }
        };

        Ok(NewsItem {
            title: candidate.title.clone(),
            source_url: extracted.final_url,
            source_name: candidate.source.clone(),
            summary,
        })
    }
}
