use crate::config::ExtractionConfig;
use crate::store::ArticleStore;
use crate::types::{Article, EnrichmentSweepReport, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const MAX_KEYWORDS: usize = 10;

/// What a keyword extraction attempt produced. Callers can tell "extraction
/// is turned off" and "extraction crashed" apart from "it ran and returned
/// these keywords", even though all three persist the same way when empty.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionOutcome {
    Keywords(Vec<String>),
    Disabled,
    Failed(String),
}

/// The opaque text-analysis capability: text in, keyword strings out.
#[async_trait]
pub trait KeywordExtract: Send + Sync {
    async fn extract(&self, text: &str) -> ExtractionOutcome;
}

/// Production extractor calling an OpenAI-compatible chat-completions API.
/// Without an API key it is deterministically disabled.
pub struct LlmKeywordExtractor {
    client: Client,
    config: ExtractionConfig,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

impl LlmKeywordExtractor {
    pub fn new(config: ExtractionConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { client, config })
    }

    async fn call_api(&self, api_key: &str, text: &str) -> std::result::Result<Vec<String>, String> {
        let prompt = format!(
            "Extract 3 to 10 keywords or short phrases from the following text, \
             for categorizing and aggregating articles. Only output words that \
             appear in or are closely related to the text, with no explanation. \
             Respond with a JSON array of strings.\n\nText:\n{}",
            text
        );

        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&json!({
                "model": self.config.model,
                "messages": [{"role": "user", "content": prompt}],
                "temperature": 0.2,
            }))
            .send()
            .await
            .map_err(|e| e.to_string())?
            .error_for_status()
            .map_err(|e| e.to_string())?;

        let body: ChatResponse = response.json().await.map_err(|e| e.to_string())?;
        let content = body
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| "response contained no choices".to_string())?;

        Ok(parse_keyword_response(content))
    }
}

#[async_trait]
impl KeywordExtract for LlmKeywordExtractor {
    async fn extract(&self, text: &str) -> ExtractionOutcome {
        let text = text.trim();
        if text.is_empty() {
            return ExtractionOutcome::Keywords(Vec::new());
        }
        let api_key = match &self.config.api_key {
            Some(key) => key.clone(),
            None => return ExtractionOutcome::Disabled,
        };

        match self.call_api(&api_key, text).await {
            Ok(keywords) => ExtractionOutcome::Keywords(keywords),
            Err(e) => {
                debug!("Keyword extraction failed: {}", e);
                ExtractionOutcome::Failed(e)
            }
        }
    }
}

/// Pull keyword strings out of a model response: ideally a JSON string
/// array (possibly fenced), otherwise one keyword per line or comma-separated
/// with list markers stripped.
fn parse_keyword_response(content: &str) -> Vec<String> {
    let trimmed = content
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    if let Ok(parsed) = serde_json::from_str::<Vec<String>>(trimmed) {
        return parsed
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .take(MAX_KEYWORDS)
            .collect();
    }

    let separator = if trimmed.contains('\n') { '\n' } else { ',' };
    trimmed
        .split(separator)
        .map(|line| {
            line.trim()
                .trim_start_matches(|c: char| c.is_ascii_digit() || c == '-' || c == '*' || c == '.')
                .trim()
                .to_string()
        })
        .filter(|k| !k.is_empty())
        .take(MAX_KEYWORDS)
        .collect()
}

/// Attaches extracted keywords to articles as tags. Replace-not-append: each
/// successful extraction computes the article's full tag set from scratch, so
/// repeat calls with the same output converge instead of accumulating.
pub struct KeywordEnricher {
    store: Arc<ArticleStore>,
    extractor: Arc<dyn KeywordExtract>,
}

impl KeywordEnricher {
    pub fn new(store: Arc<ArticleStore>, extractor: Arc<dyn KeywordExtract>) -> Self {
        Self { store, extractor }
    }

    /// Enrich one article, swallowing every failure mode: on a disabled or
    /// failed extraction (or a storage error) the article's existing tag
    /// associations stay exactly as they were and the caller sees an empty
    /// list. This must never disturb the caller's control flow.
    pub async fn enrich_article(&self, article: &Article) -> Vec<String> {
        match self.try_enrich(article).await {
            Ok(keywords) => keywords,
            Err(e) => {
                warn!("Enrichment failed for article id={}: {}", article.id, e);
                Vec::new()
            }
        }
    }

    /// Sweep every article that currently has zero tags, isolating failures
    /// per article the same way the orchestrator isolates sources.
    pub async fn enrich_untagged(&self) -> EnrichmentSweepReport {
        let mut report = EnrichmentSweepReport::default();

        let articles = match self.store.untagged_articles().await {
            Ok(articles) => articles,
            Err(e) => {
                report.errors.push(format!("failed to list untagged articles: {}", e));
                return report;
            }
        };

        for article in &articles {
            report.articles_seen += 1;
            match self.try_enrich(article).await {
                Ok(keywords) if !keywords.is_empty() => report.articles_tagged += 1,
                Ok(_) => {}
                Err(e) => report
                    .errors
                    .push(format!("article id={}: {}", article.id, e)),
            }
        }

        report
    }

    /// Extraction plus tag replacement. Disabled or failed extraction maps to
    /// an empty result without touching storage; only storage errors surface
    /// as `Err`, for the sweep to record.
    async fn try_enrich(&self, article: &Article) -> Result<Vec<String>> {
        let text = format!(
            "{}\n{}",
            article.title,
            article.summary.as_deref().unwrap_or("")
        );

        let keywords = match self.extractor.extract(&text).await {
            ExtractionOutcome::Keywords(keywords) => keywords,
            ExtractionOutcome::Disabled => {
                debug!("Keyword extraction disabled, leaving article id={} as is", article.id);
                return Ok(Vec::new());
            }
            ExtractionOutcome::Failed(e) => {
                debug!("Extraction failed for article id={}: {}", article.id, e);
                return Ok(Vec::new());
            }
        };

        let deduped = dedup_keywords(keywords);
        let tags = self.store.replace_article_tags(article.id, &deduped).await?;
        Ok(tags.into_iter().map(|t| t.name).collect())
    }
}

/// Case-insensitive dedup, first occurrence wins, original casing kept.
fn dedup_keywords(keywords: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut deduped = Vec::new();
    for keyword in keywords {
        let keyword = keyword.trim().to_string();
        if keyword.is_empty() {
            continue;
        }
        if seen.insert(keyword.to_lowercase()) {
            deduped.push(keyword);
        }
    }
    deduped
}
