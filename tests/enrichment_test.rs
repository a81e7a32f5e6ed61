mod common;

use common::{item, FixedExtractor, Scripted, ScriptedFetcher};
use hotspot_collector::{ArticleStore, Collector, KeywordEnricher, SourceKind};
use std::collections::HashMap;
use std::sync::Arc;

async fn store() -> Arc<ArticleStore> {
    let _ = tracing_subscriber::fmt().try_init();
    Arc::new(ArticleStore::in_memory().await.expect("in-memory store"))
}

#[tokio::test]
async fn keywords_become_tags_on_the_article() {
    let store = store().await;
    let article = store
        .insert_article("AI advances", "https://x/ai", None, None, Some("Deep learning."))
        .await
        .unwrap();

    let enricher = KeywordEnricher::new(
        store.clone(),
        Arc::new(FixedExtractor::keywords(&["artificial intelligence", "deep learning"])),
    );

    let names = enricher.enrich_article(&article).await;
    assert_eq!(names, vec!["artificial intelligence", "deep learning"]);

    let tags = store.tags_for_article(article.id).await.unwrap();
    let tag_names: Vec<_> = tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(tag_names, vec!["artificial intelligence", "deep learning"]);
}

#[tokio::test]
async fn keyword_casing_dedups_first_occurrence_wins() {
    let store = store().await;
    let article = store
        .insert_article("Rust news", "https://x/rust", None, None, None)
        .await
        .unwrap();

    let enricher = KeywordEnricher::new(
        store.clone(),
        Arc::new(FixedExtractor::keywords(&["Rust", "rust", "RUST", "AI"])),
    );

    let names = enricher.enrich_article(&article).await;
    assert_eq!(names, vec!["Rust", "AI"]);
    assert_eq!(store.list_tags().await.unwrap().len(), 2);
}

#[tokio::test]
async fn enrichment_is_idempotent() {
    let store = store().await;
    let article = store
        .insert_article("Title", "https://x/t", None, None, Some("Summary"))
        .await
        .unwrap();

    let enricher = KeywordEnricher::new(
        store.clone(),
        Arc::new(FixedExtractor::keywords(&["alpha", "beta"])),
    );

    let first = enricher.enrich_article(&article).await;
    let second = enricher.enrich_article(&article).await;
    assert_eq!(first, second);

    // Same final tag set, no duplicated tags or links.
    assert_eq!(store.tags_for_article(article.id).await.unwrap().len(), 2);
    assert_eq!(store.list_tags().await.unwrap().len(), 2);
}

#[tokio::test]
async fn tags_are_shared_between_articles_never_duplicated() {
    let store = store().await;
    let first = store
        .insert_article("One", "https://x/1", None, None, None)
        .await
        .unwrap();
    let second = store
        .insert_article("Two", "https://x/2", None, None, None)
        .await
        .unwrap();

    let enricher = KeywordEnricher::new(
        store.clone(),
        Arc::new(FixedExtractor::keywords(&["shared"])),
    );

    enricher.enrich_article(&first).await;
    enricher.enrich_article(&second).await;

    let tags = store.list_tags().await.unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].name, "shared");
}

#[tokio::test]
async fn disabled_extraction_leaves_existing_tags_alone() {
    let store = store().await;
    let article = store
        .insert_article("Keep my tags", "https://x/keep", None, None, None)
        .await
        .unwrap();

    let working = KeywordEnricher::new(
        store.clone(),
        Arc::new(FixedExtractor::keywords(&["existing"])),
    );
    assert_eq!(working.enrich_article(&article).await, vec!["existing"]);

    let disabled = KeywordEnricher::new(store.clone(), Arc::new(FixedExtractor::disabled()));
    assert!(disabled.enrich_article(&article).await.is_empty());

    let failed = KeywordEnricher::new(store.clone(), Arc::new(FixedExtractor::failed("api down")));
    assert!(failed.enrich_article(&article).await.is_empty());

    // The previous call's result survives both degraded modes.
    let tags = store.tags_for_article(article.id).await.unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].name, "existing");
}

#[tokio::test]
async fn successful_empty_extraction_replaces_the_tag_set() {
    let store = store().await;
    let article = store
        .insert_article("Shrinking", "https://x/shrink", None, None, None)
        .await
        .unwrap();

    let working = KeywordEnricher::new(
        store.clone(),
        Arc::new(FixedExtractor::keywords(&["old"])),
    );
    working.enrich_article(&article).await;

    let empty = KeywordEnricher::new(store.clone(), Arc::new(FixedExtractor::keywords(&[])));
    assert!(empty.enrich_article(&article).await.is_empty());

    assert!(store.tags_for_article(article.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn sweep_only_touches_untagged_articles() {
    let store = store().await;
    let tagged = store
        .insert_article("Already tagged", "https://x/tagged", None, None, None)
        .await
        .unwrap();
    store
        .replace_article_tags(tagged.id, &["manual-tag".to_string()])
        .await
        .unwrap();

    store
        .insert_article("Untagged one", "https://x/u1", None, None, None)
        .await
        .unwrap();
    store
        .insert_article("Untagged two", "https://x/u2", None, None, None)
        .await
        .unwrap();

    let enricher = KeywordEnricher::new(
        store.clone(),
        Arc::new(FixedExtractor::keywords(&["swept"])),
    );

    let report = enricher.enrich_untagged().await;
    assert_eq!(report.articles_seen, 2);
    assert_eq!(report.articles_tagged, 2);
    assert!(report.errors.is_empty());

    // The already-tagged article keeps its original tag.
    let tags = store.tags_for_article(tagged.id).await.unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].name, "manual-tag");
}

#[tokio::test]
async fn sweep_with_disabled_extractor_tags_nothing_and_reports_no_errors() {
    let store = store().await;
    store
        .insert_article("Untagged", "https://x/u", None, None, None)
        .await
        .unwrap();

    let enricher = KeywordEnricher::new(store.clone(), Arc::new(FixedExtractor::disabled()));
    let report = enricher.enrich_untagged().await;

    assert_eq!(report.articles_seen, 1);
    assert_eq!(report.articles_tagged, 0);
    assert!(report.errors.is_empty());
}

#[tokio::test]
async fn collection_enriches_newly_inserted_articles() {
    let store = store().await;
    let source_id = store
        .add_source("Feed", &SourceKind::Feed, Some("https://x/feed"))
        .await
        .unwrap();

    let mut plan = HashMap::new();
    plan.insert(source_id, Scripted::Items(vec![item("https://x/new", "New")]));
    let (fetcher, _) = ScriptedFetcher::new(plan);

    let enricher = Arc::new(KeywordEnricher::new(
        store.clone(),
        Arc::new(FixedExtractor::keywords(&["fresh"])),
    ));
    let collector = Collector::new(store.clone(), Arc::new(fetcher)).with_enricher(enricher);

    let result = collector.run_all().await;
    assert_eq!(result.articles_added, 1);

    let articles = store.articles_for_source(source_id).await.unwrap();
    let tags = store.tags_for_article(articles[0].id).await.unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].name, "fresh");
}

#[tokio::test]
async fn disabled_extraction_never_blocks_insertion() {
    let store = store().await;
    let source_id = store
        .add_source("Feed", &SourceKind::Feed, Some("https://x/feed"))
        .await
        .unwrap();

    let mut plan = HashMap::new();
    plan.insert(source_id, Scripted::Items(vec![item("https://x/no-kw", "No keywords")]));
    let (fetcher, _) = ScriptedFetcher::new(plan);

    let enricher = Arc::new(KeywordEnricher::new(
        store.clone(),
        Arc::new(FixedExtractor::disabled()),
    ));
    let collector = Collector::new(store.clone(), Arc::new(fetcher)).with_enricher(enricher);

    let result = collector.run_all().await;
    assert_eq!(result.sources_ok, 1);
    assert_eq!(result.articles_added, 1);

    let articles = store.articles_for_source(source_id).await.unwrap();
    assert_eq!(articles.len(), 1);
    assert!(store.tags_for_article(articles[0].id).await.unwrap().is_empty());
}
