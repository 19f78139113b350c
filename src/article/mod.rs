// src/article/mod.rs
pub mod cache;
pub mod extractor;
pub mod processor;
pub mod summarizer;

pub use cache::ArticleCache;
pub use extractor::{ArticleExtractor, Extracted, HttpExtractor};
pub use processor::ArticleProcessor;
pub use summarizer::{FrequencySummarizer, Summarizer};
