// tests/common/mod.rs
//
// In-process doubles shared by the integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use tech_news_bot::aggregator::Aggregator;
use tech_news_bot::article::{
    ArticleCache, ArticleExtractor, ArticleProcessor, Extracted, FrequencySummarizer,
};
use tech_news_bot::config::{ExtractConfig, PipelineConfig, SummaryConfig};
use tech_news_bot::error::{NewsError, Result};
use tech_news_bot::gateway::{sign, verify_signature, MessagingGateway};
use tech_news_bot::sources::{ArticleCandidate, SourceClient};

/// Source returning a fixed list, optionally after a delay.
pub struct FixedSource {
    pub name: String,
    pub items: Vec<ArticleCandidate>,
    pub delay: Duration,
    pub calls: AtomicUsize,
}

impl FixedSource {
    pub fn new(name: &str, items: Vec<(&str, &str)>) -> Self {
        Self {
            name: name.to_string(),
            items: items
                .into_iter()
                .map(|(title, url)| ArticleCandidate::new(title, url, name))
                .collect(),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl SourceClient for FixedSource {
    async fn fetch(&self, keywords: Option<&[String]>, pre_filter: bool) -> Vec<ArticleCandidate> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match keywords {
            Some(kws) if pre_filter => self
                .items
                .iter()
                .filter(|c| tech_news_bot::sources::title_matches(&c.title, kws))
                .cloned()
                .collect(),
            _ => self.items.clone(),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Source whose fetch always panics.
pub struct PanickingSource;

#[async_trait]
impl SourceClient for PanickingSource {
    async fn fetch(&self, _k: Option<&[String]>, _p: bool) -> Vec<ArticleCandidate> {
        panic!("source exploded");
    }

    fn name(&self) -> &str {
        "broken"
    }
}

/// Extractor serving text from a closure, counting calls per run.
pub struct FakeExtractor {
    pub calls: AtomicUsize,
    pub delay: Duration,
    pub respond: Box<dyn Fn(&str) -> Result<Extracted> + Send + Sync>,
}

impl FakeExtractor {
    pub fn text(text: &'static str) -> Self {
        Self::with(move |url| {
            Ok(Extracted {
                final_url: url.to_string(),
                text: text.to_string(),
            })
        })
    }

    pub fn failing() -> Self {
        Self::with(|url| Err(NewsError::extraction(url, "boom")))
    }

    pub fn with(f: impl Fn(&str) -> Result<Extracted> + Send + Sync + 'static) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
            respond: Box::new(f),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArticleExtractor for FakeExtractor {
    async fn extract(&self, url: &str, _timeout: Duration) -> Result<Extracted> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        (self.respond)(url)
    }
}

/// Extractor that uses up the whole request timeout it is given, then fails.
#[derive(Default)]
pub struct HangingExtractor {
    pub calls: AtomicUsize,
}

impl HangingExtractor {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArticleExtractor for HangingExtractor {
    async fn extract(&self, url: &str, timeout: Duration) -> Result<Extracted> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(timeout).await;
        Err(NewsError::extraction(url, format!("no response within {timeout:?}")))
    }
}

pub const ARTICLE_TEXT: &str = "The new accelerator doubles throughput for training. \
    Pricing was not announced. \
    The accelerator ships with more memory for inference workloads.";

pub fn fast_extract_config() -> ExtractConfig {
    ExtractConfig {
        retry_delay_ms: 1,
        ..ExtractConfig::default()
    }
}

pub fn processor_with(extractor: Arc<FakeExtractor>, ttl: Duration) -> Arc<ArticleProcessor> {
    Arc::new(ArticleProcessor::new(
        Arc::new(ArticleCache::new(ttl, 100)),
        extractor,
        Arc::new(FrequencySummarizer),
        SummaryConfig::default(),
        fast_extract_config(),
    ))
}

pub fn aggregator_with(
    sources: Vec<Arc<dyn SourceClient>>,
    extractor: Arc<FakeExtractor>,
    pipeline: PipelineConfig,
) -> Aggregator {
    Aggregator::new(
        sources,
        processor_with(extractor, Duration::from_secs(3600)),
        pipeline,
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Reply { token: String, text: String },
    Push { to: String, text: String },
}

/// Gateway that records every message instead of sending it.
pub struct RecordingGateway {
    pub secret: String,
    pub sent: Mutex<Vec<Sent>>,
}

impl RecordingGateway {
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.to_string(),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().clone()
    }

    pub fn sign(&self, body: &[u8]) -> String {
        sign(&self.secret, body)
    }

    /// Poll until at least `n` messages were recorded or `wait` elapses.
    pub async fn wait_for(&self, n: usize, wait: Duration) -> Vec<Sent> {
        let deadline = tokio::time::Instant::now() + wait;
        loop {
            let sent = self.sent();
            if sent.len() >= n || tokio::time::Instant::now() >= deadline {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

#[async_trait]
impl MessagingGateway for RecordingGateway {
    fn verify(&self, signature: &str, body: &[u8]) -> bool {
        verify_signature(&self.secret, body, signature)
    }

    async fn reply(&self, reply_token: &str, text: &str) -> Result<()> {
        self.sent.lock().push(Sent::Reply {
            token: reply_token.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn push(&self, to: &str, text: &str) -> Result<()> {
        self.sent.lock().push(Sent::Push {
            to: to.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }
}
