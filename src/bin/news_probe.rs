//! One-shot run of the pipeline from the command line, printing each message
//! instead of pushing it.
//!
//! Usage: `news-probe [keyword]`. Without a keyword the per-source digest runs.

use anyhow::Result;
use tech_news_bot::config::AppConfig;
use tech_news_bot::selector::select_random;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let cfg = AppConfig::load()?;
    let aggregator = tech_news_bot::build_aggregator(&cfg)?;

    let outcomes = match std::env::args().nth(1) {
        Some(kw) => {
            let keywords = vec![kw.trim().to_lowercase()];
            let all = aggregator.collect_news(&keywords, false).await;
            select_random(all, &keywords, cfg.pipeline.target_count, false)
        }
        None => {
            aggregator
                .collect_best_per_source(&cfg.keywords.defaults)
                .await
        }
    };

    for o in &outcomes {
        println!("{}\n", o.render());
    }
    println!("news-probe done: {} item(s)", outcomes.len());
    Ok(())
}
