pub mod adapters;
pub mod collector;
pub mod config;
pub mod enrichment;
pub mod scheduler;
pub mod state;
pub mod store;
pub mod types;

pub use adapters::{HttpItemFetcher, ItemFetcher};
pub use collector::Collector;
pub use config::CollectorConfig;
pub use enrichment::{ExtractionOutcome, KeywordEnricher, KeywordExtract, LlmKeywordExtractor};
pub use scheduler::{CollectionScheduler, SchedulerHandle};
pub use state::LastRunCache;
pub use store::ArticleStore;
pub use types::*;
