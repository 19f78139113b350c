// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod aggregator;
pub mod api;
pub mod article;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod gateway;
pub mod metrics;
pub mod news;
pub mod selector;
pub mod sources;

use std::sync::Arc;

use anyhow::Result;
use axum::Router;

use crate::aggregator::Aggregator;
use crate::article::{ArticleCache, ArticleProcessor, FrequencySummarizer, HttpExtractor};
use crate::config::AppConfig;
use crate::dispatcher::Dispatcher;
use crate::gateway::{LineGateway, MessagingGateway};
use crate::sources::{BlogSearchClient, PressSearchClient, RssFeedClient, SourceClient};

pub use crate::api::router;
pub use crate::error::NewsError;
pub use crate::news::{ArticleOutcome, NewsItem, Summary};

/// Source clients in the order their candidates are concatenated:
/// RSS feeds, then the press-release API, then the blog API.
pub fn build_sources(cfg: &AppConfig) -> Result<Vec<Arc<dyn SourceClient>>> {
    let mut sources: Vec<Arc<dyn SourceClient>> = Vec::new();
    if !cfg.feeds.is_empty() {
        sources.push(Arc::new(RssFeedClient::new(
            cfg.feeds.clone(),
            cfg.pipeline.per_source_limit,
            cfg.pipeline.feed_timeout(),
        )?));
    }
    if cfg.press_api.enabled {
        sources.push(Arc::new(PressSearchClient::new(
            cfg.press_api.clone(),
            cfg.keywords.defaults.clone(),
        )?));
    }
    if cfg.blog_api.enabled {
        sources.push(Arc::new(BlogSearchClient::new(cfg.blog_api.clone())?));
    }
    Ok(sources)
}

/// Aggregator over the configured sources, with a fresh article cache.
pub fn build_aggregator(cfg: &AppConfig) -> Result<Aggregator> {
    let cache = Arc::new(ArticleCache::new(cfg.cache.ttl(), cfg.cache.high_water));
    let processor = ArticleProcessor::new(
        cache,
        Arc::new(HttpExtractor::new()?),
        Arc::new(FrequencySummarizer),
        cfg.summary.clone(),
        cfg.extract.clone(),
    );
    Ok(Aggregator::new(
        build_sources(cfg)?,
        Arc::new(processor),
        cfg.pipeline.clone(),
    ))
}

/// Webhook router wired to the real sources and the LINE gateway.
pub fn app(cfg: &AppConfig) -> Result<Router> {
    if cfg.line.channel_secret.is_empty() {
        tracing::warn!("channel secret is empty; every webhook call will be rejected");
    }
    let gateway: Arc<dyn MessagingGateway> = Arc::new(LineGateway::new(&cfg.line));
    Ok(app_with(cfg, build_aggregator(cfg)?, gateway))
}

/// Router over an explicit aggregator and gateway.
pub fn app_with(
    cfg: &AppConfig,
    aggregator: Aggregator,
    gateway: Arc<dyn MessagingGateway>,
) -> Router {
    let dispatcher = Dispatcher::new(
        Arc::new(aggregator),
        gateway,
        cfg.keywords.defaults.clone(),
        cfg.server.trigger.clone(),
        cfg.pipeline.target_count,
    );
    router(api::AppState {
        dispatcher: Arc::new(dispatcher),
    })
}
