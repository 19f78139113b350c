pub mod app;

pub use app::{
    AppConfig, BlogApiConfig, CacheConfig, ExtractConfig, FeedConfig, KeywordConfig, LineConfig,
    PipelineConfig, PressApiConfig, ServerConfig, SummaryConfig,
};
