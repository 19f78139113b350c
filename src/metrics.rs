use anyhow::{Context, Result};
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder and publish the cache TTL gauge.
    /// Fails if a recorder is already installed.
    pub fn init(cache_ttl_secs: u64) -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        describe_metrics();
        gauge!("article_cache_ttl_secs").set(cache_ttl_secs as f64);
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

fn describe_metrics() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("news_source_errors_total", "Source fetch/parse failures and timeouts.");
        describe_counter!("news_candidates_total", "Candidates returned per source.");
        describe_counter!("article_cache_hits_total", "Article cache hits.");
        describe_counter!("article_cache_misses_total", "Article cache misses.");
        describe_counter!(
            "article_extract_failures_total",
            "Articles that degraded to a placeholder after all attempts."
        );
        describe_counter!(
            "news_tasks_dropped_total",
            "Summarization tasks dropped on timeout or panic."
        );
        describe_counter!(
            "webhook_signature_rejected_total",
            "Webhook calls rejected for a missing or bad signature."
        );
        describe_histogram!("article_process_ms", "Extraction + summarization time per article.");
        describe_histogram!("news_feed_parse_ms", "Feed XML parse time in milliseconds.");
        describe_gauge!("article_cache_entries", "Entries currently held by the article cache.");
        describe_gauge!("article_cache_ttl_secs", "Configured article cache TTL.");
    });
}
