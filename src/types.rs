use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of a configured source, stored as free text in the sources table.
/// Only `feed` and `api-json` sources are ever collected automatically;
/// `manual` and anything unrecognized are inert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    Feed,
    ApiJson,
    Manual,
    #[serde(untagged)]
    Other(String),
}

impl SourceKind {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "feed" => SourceKind::Feed,
            "api-json" => SourceKind::ApiJson,
            "manual" => SourceKind::Manual,
            other => SourceKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SourceKind::Feed => "feed",
            SourceKind::ApiJson => "api-json",
            SourceKind::Manual => "manual",
            SourceKind::Other(raw) => raw,
        }
    }

    /// Whether sources of this kind participate in automatic collection.
    pub fn is_collectable(&self) -> bool {
        matches!(self, SourceKind::Feed | SourceKind::ApiJson)
    }
}

/// A configured external origin of articles. Rows are created and deleted by
/// the CRUD surface; the collector only ever reads them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub id: i64,
    pub name: String,
    pub kind: SourceKind,
    pub endpoint: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Source {
    /// Endpoint with surrounding whitespace stripped, `None` if blank.
    pub fn trimmed_endpoint(&self) -> Option<&str> {
        self.endpoint
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
    }

    /// The eligibility invariant: collectable kind and a usable endpoint.
    pub fn is_collectable(&self) -> bool {
        self.kind.is_collectable() && self.trimmed_endpoint().is_some()
    }
}

/// Adapter output: one candidate article, normalized but not yet persisted.
/// Items without a resolvable URL never reach this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedItem {
    pub title: String,
    pub url: String,
    pub published_at: Option<DateTime<Utc>>,
    pub summary: Option<String>,
}

/// A persisted article. `source_id` is a weak reference: deleting the owning
/// source nulls it out rather than cascading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub source_id: Option<i64>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub summary: Option<String>,
}

/// A keyword label, unique by name, created lazily by enrichment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Aggregated outcome of one full collection cycle. Replaced wholesale in the
/// last-run cache after every run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub run_id: Uuid,
    pub sources_ok: u32,
    pub sources_fail: u32,
    pub articles_added: u64,
    pub errors: Vec<String>,
    pub finished_at: DateTime<Utc>,
}

/// Outcome of a targeted run against a single source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRunReport {
    pub ok: bool,
    pub source_id: i64,
    pub articles_added: u64,
    pub error: Option<String>,
}

/// Outcome of one batch enrichment sweep over untagged articles.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnrichmentSweepReport {
    pub articles_seen: u64,
    pub articles_tagged: u64,
    pub errors: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("feed parse error: {0}")]
    FeedParse(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("source not found: id={id}")]
    SourceNotFound { id: i64 },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    General(String),
}

pub type Result<T> = std::result::Result<T, CollectorError>;
