#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use hotspot_collector::{
    CollectorError, ExtractionOutcome, ItemFetcher, KeywordExtract, NormalizedItem, Result, Source,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// What a scripted fetch should do for one source.
#[derive(Clone)]
pub enum Scripted {
    Items(Vec<NormalizedItem>),
    Fail(String),
}

/// Fetcher standing in for the HTTP adapters: returns scripted batches per
/// source id and records which sources it was asked to fetch.
pub struct ScriptedFetcher {
    plan: HashMap<i64, Scripted>,
    calls: Arc<Mutex<Vec<i64>>>,
}

impl ScriptedFetcher {
    pub fn new(plan: HashMap<i64, Scripted>) -> (Self, Arc<Mutex<Vec<i64>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                plan,
                calls: calls.clone(),
            },
            calls,
        )
    }
}

#[async_trait]
impl ItemFetcher for ScriptedFetcher {
    async fn fetch(&self, source: &Source) -> Result<Vec<NormalizedItem>> {
        self.calls.lock().await.push(source.id);
        match self.plan.get(&source.id) {
            Some(Scripted::Items(items)) => Ok(items.clone()),
            Some(Scripted::Fail(message)) => Err(CollectorError::General(message.clone())),
            None => Ok(Vec::new()),
        }
    }
}

/// Extractor that always yields the same outcome.
pub struct FixedExtractor {
    outcome: ExtractionOutcome,
}

impl FixedExtractor {
    pub fn keywords(keywords: &[&str]) -> Self {
        Self {
            outcome: ExtractionOutcome::Keywords(
                keywords.iter().map(|k| k.to_string()).collect(),
            ),
        }
    }

    pub fn disabled() -> Self {
        Self {
            outcome: ExtractionOutcome::Disabled,
        }
    }

    pub fn failed(message: &str) -> Self {
        Self {
            outcome: ExtractionOutcome::Failed(message.to_string()),
        }
    }
}

#[async_trait]
impl KeywordExtract for FixedExtractor {
    async fn extract(&self, _text: &str) -> ExtractionOutcome {
        self.outcome.clone()
    }
}

pub fn item(url: &str, title: &str) -> NormalizedItem {
    NormalizedItem {
        title: title.to_string(),
        url: url.to_string(),
        published_at: Some(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()),
        summary: Some(format!("Summary of {}", title)),
    }
}
