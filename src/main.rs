use clap::{Parser, Subcommand};
use hotspot_collector::{
    ArticleStore, CollectionScheduler, Collector, CollectorConfig, HttpItemFetcher,
    KeywordEnricher, LastRunCache, LlmKeywordExtractor,
};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "hotspot-collector", about = "Collects hotspot articles from configured feeds and JSON APIs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the background collection scheduler until interrupted
    Run,
    /// Run one collection cycle (all sources, or one) and print the report
    Collect {
        /// Collect a single source by id instead of all eligible sources
        #[arg(long)]
        source: Option<i64>,
    },
    /// Extract keywords for every article that has no tags yet
    Enrich,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = CollectorConfig::from_env();

    let store = Arc::new(ArticleStore::connect(&config.database_url).await?);
    store.init_schema().await?;

    let fetcher = Arc::new(HttpItemFetcher::new(&config)?);
    let extractor = Arc::new(LlmKeywordExtractor::new(config.extraction.clone())?);
    let enricher = Arc::new(KeywordEnricher::new(store.clone(), extractor));
    let collector = Arc::new(Collector::new(store.clone(), fetcher).with_enricher(enricher.clone()));
    let cache = LastRunCache::new();

    match cli.command {
        Command::Run => {
            let scheduler = CollectionScheduler::new(
                collector,
                cache,
                config.startup_delay(),
                config.collect_interval(),
            );
            let handle = scheduler.start();

            tokio::signal::ctrl_c().await?;
            info!("Shutdown signal received");
            handle.shutdown(config.shutdown_timeout()).await;
        }
        Command::Collect { source } => match source {
            Some(source_id) => {
                let report = collector.run_one(source_id).await?;
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            None => {
                let result = collector.run_all().await;
                cache.publish(result.clone()).await;
                println!("{}", serde_json::to_string_pretty(&result)?);
            }
        },
        Command::Enrich => {
            let report = enricher.enrich_untagged().await;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
