// src/sources/providers/mod.rs
pub mod blog_search;
pub mod press_search;
pub mod rss_feed;

pub use blog_search::BlogSearchClient;
pub use press_search::PressSearchClient;
pub use rss_feed::RssFeedClient;
