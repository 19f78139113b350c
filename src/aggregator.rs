//! Fan-out over all source clients, then over all candidates.
//!
//! Both stages run on a `JoinSet` bounded by a semaphore, and every task has
//! its own timeout. A source that times out or panics contributes nothing; a
//! summarization task that times out is dropped from the result.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::timeout;

use crate::article::cache::normalize_url;
use crate::article::ArticleProcessor;
use crate::config::PipelineConfig;
use crate::error::NewsError;
use crate::news::ArticleOutcome;
use crate::sources::{record_source_error, title_matches, ArticleCandidate, SourceClient};

pub struct Aggregator {
    sources: Vec<Arc<dyn SourceClient>>,
    processor: Arc<ArticleProcessor>,
    cfg: PipelineConfig,
}

impl Aggregator {
    /// `sources` are queried concurrently but their candidates are
    /// concatenated in this order.
    pub fn new(
        sources: Vec<Arc<dyn SourceClient>>,
        processor: Arc<ArticleProcessor>,
        cfg: PipelineConfig,
    ) -> Self {
        Self {
            sources,
            processor,
            cfg,
        }
    }

    /// Every candidate from every source, summarized. With `pre_filter_at_source`
    /// the sources that support it drop non-matching titles before summarization.
    pub async fn collect_news(
        &self,
        keywords: &[String],
        pre_filter_at_source: bool,
    ) -> Vec<ArticleOutcome> {
        let kws = (!keywords.is_empty()).then(|| keywords.to_vec());
        let candidates: Vec<ArticleCandidate> = self
            .fetch_all(kws, pre_filter_at_source)
            .await
            .into_iter()
            .flatten()
            .collect();
        self.summarize_all(dedup_by_url(candidates)).await
    }

    /// One summarized article per source name: the best keyword match of each.
    pub async fn collect_best_per_source(&self, keywords: &[String]) -> Vec<ArticleOutcome> {
        let kws = (!keywords.is_empty()).then(|| keywords.to_vec());
        let all: Vec<ArticleCandidate> = self
            .fetch_all(kws, true)
            .await
            .into_iter()
            .flatten()
            .collect();

        let mut order: Vec<String> = Vec::new();
        for c in &all {
            if !order.contains(&c.source) {
                order.push(c.source.clone());
            }
        }
        let picked: Vec<ArticleCandidate> = order
            .iter()
            .filter_map(|name| {
                let group: Vec<&ArticleCandidate> =
                    all.iter().filter(|c| &c.source == name).collect();
                best_candidate(&group, keywords).cloned()
            })
            .collect();

        self.summarize_all(dedup_by_url(picked)).await
    }

    async fn fetch_all(
        &self,
        keywords: Option<Vec<String>>,
        pre_filter: bool,
    ) -> Vec<Vec<ArticleCandidate>> {
        let sem = Arc::new(Semaphore::new(self.cfg.source_workers.max(1)));
        let limit = Duration::from_secs(self.cfg.source_timeout_secs);
        let mut set = JoinSet::new();
        let mut task_source = HashMap::new();

        for (idx, src) in self.sources.iter().enumerate() {
            let src = Arc::clone(src);
            let sem = Arc::clone(&sem);
            let kws = keywords.clone();
            let handle = set.spawn(async move {
                let _permit = sem.acquire_owned().await.ok();
                let res = timeout(limit, src.fetch(kws.as_deref(), pre_filter)).await;
                (idx, res)
            });
            task_source.insert(handle.id(), idx);
        }

        let mut slots: Vec<Vec<ArticleCandidate>> = vec![Vec::new(); self.sources.len()];
        while let Some(joined) = set.join_next_with_id().await {
            match joined {
                Ok((_, (idx, Ok(mut list)))) => {
                    if !self.sources[idx].limits_itself() {
                        list.truncate(self.cfg.per_source_limit);
                    }
                    slots[idx] = list;
                }
                Ok((_, (idx, Err(_)))) => {
                    let name = self.sources[idx].name();
                    let err = NewsError::source_fetch(
                        name,
                        format!("no answer within {}s", limit.as_secs()),
                    );
                    record_source_error(name, &err);
                }
                Err(e) => match task_source.get(&e.id()) {
                    Some(&idx) => {
                        let name = self.sources[idx].name();
                        let err = NewsError::source_fetch(name, format!("task failed: {e}"));
                        record_source_error(name, &err);
                    }
                    None => tracing::error!(error = %e, "source task failed"),
                },
            }
        }
        slots
    }

    async fn summarize_all(&self, candidates: Vec<ArticleCandidate>) -> Vec<ArticleOutcome> {
        let sem = Arc::new(Semaphore::new(self.cfg.summary_workers.max(1)));
        let limit = Duration::from_secs(self.cfg.summary_timeout_secs);
        let mut set = JoinSet::new();

        for c in candidates {
            let sem = Arc::clone(&sem);
            let processor = Arc::clone(&self.processor);
            set.spawn(async move {
                let _permit = sem.acquire_owned().await.ok();
                match timeout(limit, processor.process(&c)).await {
                    Ok(outcome) => Some(outcome),
                    Err(_) => {
                        tracing::warn!(url = %c.url, source = %c.source, "summary task timed out");
                        None
                    }
                }
            });
        }

        let mut out = Vec::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(Some(outcome)) => out.push(outcome),
                Ok(None) => counter!("news_tasks_dropped_total").increment(1),
                Err(e) => {
                    tracing::error!(error = %e, "summary task failed");
                    counter!("news_tasks_dropped_total").increment(1);
                }
            }
        }
        out
    }
}

/// First title match, else the most recent, else the first candidate.
pub fn best_candidate<'a>(
    group: &[&'a ArticleCandidate],
    keywords: &[String],
) -> Option<&'a ArticleCandidate> {
    if let Some(hit) = group.iter().find(|c| title_matches(&c.title, keywords)) {
        return Some(*hit);
    }
    group
        .iter()
        .filter(|c| c.published_at.is_some())
        .min_by_key(|c| std::cmp::Reverse(c.published_at))
        .or_else(|| group.first())
        .copied()
}

/// Keep the first candidate per normalized URL.
pub fn dedup_by_url(candidates: Vec<ArticleCandidate>) -> Vec<ArticleCandidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| seen.insert(normalize_url(&c.url)))
        .collect()
}
