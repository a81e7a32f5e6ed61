use crate::adapters::ItemFetcher;
use crate::enrichment::KeywordEnricher;
use crate::store::ArticleStore;
use crate::types::{CollectorError, Result, RunResult, Source, SourceRunReport};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Drives one collection cycle: selects eligible sources, fetches and
/// normalizes per source, hands batches to the dedup/insert engine and
/// aggregates the outcome. A single source failing must never abort the rest
/// of the run; that isolation is the whole point of this type.
pub struct Collector {
    store: Arc<ArticleStore>,
    fetcher: Arc<dyn ItemFetcher>,
    enricher: Option<Arc<KeywordEnricher>>,
}

impl Collector {
    pub fn new(store: Arc<ArticleStore>, fetcher: Arc<dyn ItemFetcher>) -> Self {
        Self {
            store,
            fetcher,
            enricher: None,
        }
    }

    /// Attach the post-insert keyword enrichment hook. Enrichment is
    /// best-effort: its failures are invisible in the run report.
    pub fn with_enricher(mut self, enricher: Arc<KeywordEnricher>) -> Self {
        self.enricher = Some(enricher);
        self
    }

    /// Run one full collection cycle over every eligible source. Always
    /// returns a well-formed report, even when every source fails.
    pub async fn run_all(&self) -> RunResult {
        let run_id = Uuid::new_v4();
        let mut sources_ok = 0u32;
        let mut sources_fail = 0u32;
        let mut articles_added = 0u64;
        let mut errors = Vec::new();

        let sources = match self.store.list_collectable_sources().await {
            Ok(sources) => sources,
            Err(e) => {
                // Without the source list there is nothing to iterate; the
                // run still reports instead of raising.
                warn!("Collection run {} could not list sources: {}", run_id, e);
                errors.push(format!("failed to list sources: {}", e));
                Vec::new()
            }
        };

        info!(
            "Collection run {} starting over {} sources",
            run_id,
            sources.len()
        );

        for source in &sources {
            match self.collect_source(source).await {
                Ok(added) => {
                    sources_ok += 1;
                    articles_added += added;
                }
                Err(e) => {
                    sources_fail += 1;
                    warn!("Source id={} ({}) failed: {}", source.id, source.name, e);
                    errors.push(format!("source id={} ({}): {}", source.id, source.name, e));
                }
            }
        }

        info!(
            "Collection run {} finished: ok={} fail={} added={}",
            run_id, sources_ok, sources_fail, articles_added
        );

        RunResult {
            run_id,
            sources_ok,
            sources_fail,
            articles_added,
            errors,
            finished_at: Utc::now(),
        }
    }

    /// Run a targeted collection against one source. An unknown id is the
    /// only condition that propagates as an error; everything else comes back
    /// inside the report.
    pub async fn run_one(&self, source_id: i64) -> Result<SourceRunReport> {
        let source = self
            .store
            .get_source(source_id)
            .await?
            .ok_or(CollectorError::SourceNotFound { id: source_id })?;

        if !source.is_collectable() {
            return Ok(SourceRunReport {
                ok: false,
                source_id,
                articles_added: 0,
                error: Some(format!(
                    "source id={} ({}) is not collectable: kind={}, endpoint={}",
                    source.id,
                    source.name,
                    source.kind.as_str(),
                    source.trimmed_endpoint().unwrap_or("<empty>")
                )),
            });
        }

        match self.collect_source(&source).await {
            Ok(added) => Ok(SourceRunReport {
                ok: true,
                source_id,
                articles_added: added,
                error: None,
            }),
            Err(e) => Ok(SourceRunReport {
                ok: false,
                source_id,
                articles_added: 0,
                error: Some(format!("source id={} ({}): {}", source.id, source.name, e)),
            }),
        }
    }

    /// Fetch, dedup and insert one source's batch, then enrich whatever was
    /// newly inserted. Insert atomicity lives in the store; by the time
    /// enrichment runs the batch is committed, so an enrichment problem can
    /// never roll it back.
    async fn collect_source(&self, source: &Source) -> Result<u64> {
        let items = self.fetcher.fetch(source).await?;
        let inserted = self.store.insert_new_articles(source.id, &items).await?;
        let added = inserted.len() as u64;

        if let Some(enricher) = &self.enricher {
            for article in &inserted {
                let keywords = enricher.enrich_article(article).await;
                if !keywords.is_empty() {
                    info!(
                        "Attached {} keywords to article id={}",
                        keywords.len(),
                        article.id
                    );
                }
            }
        }

        Ok(added)
    }
}
