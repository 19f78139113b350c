// src/config/app.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

use crate::error::{NewsError, Result as NewsResult};

pub const ENV_CONFIG_PATH: &str = "NEWS_BOT_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/news_bot.toml";

pub const ENV_CHANNEL_SECRET: &str = "LINE_CHANNEL_SECRET";
pub const ENV_CHANNEL_ACCESS_TOKEN: &str = "LINE_CHANNEL_ACCESS_TOKEN";
pub const ENV_PORT: &str = "PORT";
pub const ENV_CACHE_TTL_SECS: &str = "NEWS_CACHE_TTL_SECS";
pub const ENV_PRESS_API_TOKEN: &str = "PRESS_API_TOKEN";

pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub line: LineConfig,
    pub keywords: KeywordConfig,
    pub feeds: Vec<FeedConfig>,
    pub press_api: PressApiConfig,
    pub blog_api: BlogApiConfig,
    pub cache: CacheConfig,
    pub summary: SummaryConfig,
    pub extract: ExtractConfig,
    pub pipeline: PipelineConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            line: LineConfig::default(),
            keywords: KeywordConfig::default(),
            feeds: default_feeds(),
            press_api: PressApiConfig::default(),
            blog_api: BlogApiConfig::default(),
            cache: CacheConfig::default(),
            summary: SummaryConfig::default(),
            extract: ExtractConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    /// Chat command that asks for the default keyword digest.
    pub trigger: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            trigger: "news".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LineConfig {
    pub api_base: String,
    pub channel_secret: String,
    pub access_token: String,
    pub timeout_secs: u64,
    pub max_retries: u8,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.line.me".to_string(),
            channel_secret: String::new(),
            access_token: String::new(),
            timeout_secs: 5,
            max_retries: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordConfig {
    pub defaults: Vec<String>,
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            defaults: ["gpu", "電腦", "ai", "workstation", "顯卡"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedConfig {
    pub name: String,
    pub url: String,
}

pub fn default_feeds() -> Vec<FeedConfig> {
    vec![
        FeedConfig {
            name: "Intel".to_string(),
            url: "https://newsroom.intel.com/zh-tw/feed/".to_string(),
        },
        FeedConfig {
            name: "Tom's Hardware".to_string(),
            url: "https://www.tomshardware.com/feeds/all".to_string(),
        },
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PressApiConfig {
    pub enabled: bool,
    pub name: String,
    pub endpoint: String,
    /// "ENV" means: read from PRESS_API_TOKEN
    pub token: String,
    pub locale: String,
    pub result_type_filter: String,
    pub sort_criteria: String,
    pub number_of_results: u32,
    pub limit: usize,
    pub timeout_secs: u64,
}

impl Default for PressApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            name: "AMD".to_string(),
            endpoint: "https://xilinxcomprode2rjoqok.org.coveo.com/rest/search/v2?organizationId=xilinxcomprode2rjoqok".to_string(),
            token: "ENV".to_string(),
            locale: "zh-TW".to_string(),
            result_type_filter: "(@amd_result_type==\"Press Releases\")".to_string(),
            sort_criteria: "@amd_release_date descending".to_string(),
            number_of_results: 10,
            limit: 5,
            timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlogApiConfig {
    pub enabled: bool,
    pub name: String,
    pub endpoint: String,
    /// The search endpoint takes one term per call.
    pub keywords: Vec<String>,
    pub per_page: u32,
    pub limit: usize,
    pub timeout_secs: u64,
}

impl Default for BlogApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            name: "NVIDIA".to_string(),
            endpoint: "https://blogs.nvidia.com.tw/wp-json/wp/v2/posts".to_string(),
            keywords: vec!["GPU".to_string(), "AI".to_string(), "顯卡".to_string()],
            per_page: 5,
            limit: 5,
            timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_secs: u64,
    /// Entry count above which expired entries are swept on insert.
    pub high_water: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 3600,
            high_water: 100,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    pub ratio: f32,
    pub words: usize,
    /// Longer summaries are cut and suffixed with "...".
    pub max_chars: usize,
    /// Article text is truncated to this many chars before summarizing.
    pub max_input_chars: usize,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            ratio: 0.1,
            words: 30,
            max_chars: 150,
            max_input_chars: 10_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    pub timeout_secs: u64,
    pub slow_timeout_secs: u64,
    pub slow_domains: Vec<String>,
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
    /// Budget for all attempts on one article, retry pauses included.
    /// Kept below `pipeline.summary_timeout_secs` so the placeholder is cached.
    pub deadline_secs: u64,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            slow_timeout_secs: 15,
            slow_domains: vec!["newsroom.intel.com".to_string()],
            max_attempts: 2,
            retry_delay_ms: 1_000,
            deadline_secs: 25,
        }
    }
}

impl ExtractConfig {
    /// Request timeout for `host`; listed slow domains (and their subdomains) get the longer one.
    pub fn timeout_for_host(&self, host: &str) -> Duration {
        let host = host.to_ascii_lowercase();
        let slow = self.slow_domains.iter().any(|d| {
            let d = d.trim().to_ascii_lowercase();
            !d.is_empty() && (host == d || host.ends_with(&format!(".{d}")))
        });
        if slow {
            Duration::from_secs(self.slow_timeout_secs)
        } else {
            Duration::from_secs(self.timeout_secs)
        }
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub source_workers: usize,
    pub summary_workers: usize,
    pub source_timeout_secs: u64,
    pub summary_timeout_secs: u64,
    pub per_source_limit: usize,
    pub target_count: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_workers: 4,
            summary_workers: 10,
            source_timeout_secs: 20,
            summary_timeout_secs: 30,
            per_source_limit: 5,
            target_count: 5,
        }
    }
}

impl PipelineConfig {
    /// Request timeout for a single RSS feed: at most 10 s, and strictly
    /// inside the source timeout so one slow feed cannot void the others.
    pub fn feed_timeout(&self) -> Duration {
        let secs = self.source_timeout_secs.saturating_sub(1).clamp(1, 10);
        Duration::from_secs(secs)
    }
}

impl AppConfig {
    /// Load using env var + fallbacks:
    /// 1) $NEWS_BOT_CONFIG_PATH
    /// 2) config/news_bot.toml
    /// 3) built-in defaults
    ///
    /// Env overrides (secrets, port, cache TTL) are applied afterwards.
    pub fn load() -> Result<Self> {
        let mut cfg = if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from_file(&pb)?
        } else {
            let pb = PathBuf::from(DEFAULT_CONFIG_PATH);
            if pb.exists() {
                Self::load_from_file(&pb)?
            } else {
                Self::default()
            }
        };
        cfg.apply_env();
        cfg.sanitize();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from an explicit path. Supports TOML or JSON formats.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        if ext == "json" {
            serde_json::from_str(&content).context("parsing json config")
        } else {
            toml::from_str(&content).context("parsing toml config")
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: AppConfig = toml::from_str(s)?;
        cfg.sanitize();
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_env(&mut self) {
        if let Ok(v) = env::var(ENV_CHANNEL_SECRET) {
            self.line.channel_secret = v;
        }
        if let Ok(v) = env::var(ENV_CHANNEL_ACCESS_TOKEN) {
            self.line.access_token = v;
        }
        if let Some(port) = env::var(ENV_PORT).ok().and_then(|v| v.trim().parse().ok()) {
            self.server.port = port;
        }
        if let Some(ttl) = env::var(ENV_CACHE_TTL_SECS)
            .ok()
            .and_then(|v| v.trim().parse().ok())
        {
            self.cache.ttl_secs = ttl;
        }
        if self.press_api.token.trim().eq_ignore_ascii_case("env") {
            self.press_api.token = env::var(ENV_PRESS_API_TOKEN).unwrap_or_default();
        }
    }

    fn sanitize(&mut self) {
        let d = SummaryConfig::default();
        if !self.summary.ratio.is_finite() || !(0.0..=1.0).contains(&self.summary.ratio) {
            self.summary.ratio = d.ratio;
        }
        if self.summary.max_chars == 0 {
            self.summary.max_chars = d.max_chars;
        }
        if self.summary.max_input_chars == 0 {
            self.summary.max_input_chars = d.max_input_chars;
        }
        self.extract.max_attempts = self.extract.max_attempts.max(1);
        self.pipeline.source_workers = self.pipeline.source_workers.max(1);
        self.pipeline.summary_workers = self.pipeline.summary_workers.max(1);
        self.server.trigger = self.server.trigger.trim().to_lowercase();
        if self.server.trigger.is_empty() {
            self.server.trigger = ServerConfig::default().trigger;
        }
        self.keywords.defaults.retain(|k| !k.trim().is_empty());

        let pool = self.pipeline.summary_timeout_secs;
        if pool > 1 && self.extract.deadline_secs >= pool {
            self.extract.deadline_secs = pool - 1;
        }
    }

    /// Reject settings that cannot be repaired by clamping.
    pub fn validate(&self) -> NewsResult<()> {
        if self.pipeline.source_timeout_secs == 0 || self.pipeline.summary_timeout_secs == 0 {
            return Err(NewsError::Config(
                "pipeline timeouts must be at least one second".to_string(),
            ));
        }
        if let Some(feed) = self
            .feeds
            .iter()
            .find(|f| f.name.trim().is_empty() || f.url.trim().is_empty())
        {
            return Err(NewsError::Config(format!(
                "feed entry needs both a name and a url (got name={:?}, url={:?})",
                feed.name, feed.url
            )));
        }
        Ok(())
    }
}
