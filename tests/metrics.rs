// tests/metrics.rs
mod common;

use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use common::{aggregator_with, FakeExtractor, PanickingSource, ARTICLE_TEXT};
use tech_news_bot::config::PipelineConfig;
use tech_news_bot::sources::SourceClient;

use tech_news_bot::article::ArticleCache;
use tech_news_bot::metrics::Metrics;
use tech_news_bot::news::ArticleOutcome;

#[tokio::test]
async fn metrics_endpoint_exposes_cache_series() {
    let metrics = Metrics::init(3600).expect("recorder installs once per process");

    let cache = ArticleCache::new(Duration::from_secs(3600), 100);
    let url = "https://news.example/m";
    assert!(cache.get(url).is_none());
    cache.insert(
        url,
        ArticleOutcome::ExtractionFailed {
            title: "t".into(),
            url: url.into(),
            source: "Intel".into(),
        },
    );
    assert!(cache.get(url).is_some());

    let broken: Arc<dyn SourceClient> = Arc::new(PanickingSource);
    let agg = aggregator_with(
        vec![broken],
        Arc::new(FakeExtractor::text(ARTICLE_TEXT)),
        PipelineConfig::default(),
    );
    assert!(agg.collect_news(&[], false).await.is_empty());

    let resp = metrics
        .router()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body::to_bytes(resp.into_body(), 1_048_576).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    for needle in [
        "article_cache_hits_total",
        "article_cache_misses_total",
        "article_cache_entries",
        "article_cache_ttl_secs",
        "news_source_errors_total{source=\"broken\"}",
    ] {
        assert!(text.contains(needle), "missing {needle} in /metrics:\n{text}");
    }
}
