pub mod api_json;
pub mod feed;

use crate::config::CollectorConfig;
use crate::types::{CollectorError, NormalizedItem, Result, Source, SourceKind};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Titles longer than this are truncated with a trailing ellipsis marker.
pub const MAX_TITLE_LEN: usize = 512;

/// Placeholder for entries that arrive without a usable title.
pub const UNTITLED: &str = "(untitled)";

/// Turns one configured source into a batch of normalized candidate items.
/// The feed path propagates fetch and parse failures; the api-json path
/// swallows them and yields an empty batch. Both are deliberate and
/// observable behavior, not an accident of implementation.
#[async_trait]
pub trait ItemFetcher: Send + Sync {
    async fn fetch(&self, source: &Source) -> Result<Vec<NormalizedItem>>;
}

/// Production fetcher: one shared HTTP client, dispatching on source kind.
pub struct HttpItemFetcher {
    client: Client,
}

impl HttpItemFetcher {
    pub fn new(config: &CollectorConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl ItemFetcher for HttpItemFetcher {
    async fn fetch(&self, source: &Source) -> Result<Vec<NormalizedItem>> {
        let endpoint = source.trimmed_endpoint().ok_or_else(|| {
            CollectorError::General(format!("source id={} has no endpoint", source.id))
        })?;

        match source.kind {
            SourceKind::Feed => {
                let feed_url = feed::resolve_feed_url(endpoint);
                feed::fetch_feed_items(&self.client, feed_url).await
            }
            SourceKind::ApiJson => Ok(api_json::fetch_api_items(&self.client, endpoint).await),
            _ => {
                debug!(
                    "Source id={} has inert kind {}, nothing to fetch",
                    source.id,
                    source.kind.as_str()
                );
                Ok(Vec::new())
            }
        }
    }
}

/// Trim a raw title, substitute the placeholder when empty and cap the
/// length. Truncation counts characters, not bytes, so multibyte titles
/// never split inside a code point.
pub fn normalize_title(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return UNTITLED.to_string();
    }
    if trimmed.chars().count() > MAX_TITLE_LEN {
        let mut truncated: String = trimmed.chars().take(MAX_TITLE_LEN - 3).collect();
        truncated.push_str("...");
        return truncated;
    }
    trimmed.to_string()
}

/// Trim an optional text field, mapping blank values to `None`.
pub fn normalize_optional(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
