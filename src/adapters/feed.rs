use crate::adapters::{normalize_optional, normalize_title};
use crate::types::{CollectorError, NormalizedItem, Result};
use feed_rs::parser;
use reqwest::Client;
use tracing::{debug, info};
use url::Url;

/// Known-stale feed endpoints remapped to working replacements. Some
/// upstreams moved their feeds without redirecting; correcting here keeps
/// those sources collectable without a config edit.
const FEED_URL_CORRECTIONS: &[(&str, &str)] = &[
    ("https://openai.com/blog", "https://openai.com/news/rss.xml"),
    (
        "https://www.anthropic.com/feed.xml",
        "https://raw.githubusercontent.com/Olshansk/rss-feeds/main/feeds/feed_anthropic_news.xml",
    ),
];

/// Apply the correction table to a configured feed endpoint. The lookup key
/// ignores a trailing slash.
pub fn resolve_feed_url(endpoint: &str) -> &str {
    let key = endpoint.trim_end_matches('/');
    FEED_URL_CORRECTIONS
        .iter()
        .find(|(stale, _)| *stale == key)
        .map(|(_, replacement)| *replacement)
        .unwrap_or(endpoint)
}

/// Fetch and parse one RSS/Atom feed. Unlike the api-json adapter, every
/// failure here propagates: a feed that cannot be fetched or parsed is a
/// source-level error worth recording in the run report.
pub async fn fetch_feed_items(client: &Client, feed_url: &str) -> Result<Vec<NormalizedItem>> {
    Url::parse(feed_url)?;

    debug!("Fetching feed: {}", feed_url);
    let response = client
        .get(feed_url)
        .header(
            reqwest::header::ACCEPT,
            "application/rss+xml, application/xml, text/xml, */*",
        )
        .send()
        .await?
        .error_for_status()?;

    let body = response.text().await?;
    let items = parse_feed_items(&body)?;
    info!("Fetched {} items from feed {}", items.len(), feed_url);
    Ok(items)
}

/// Normalize the entries of a raw RSS/Atom document. Entries without a link
/// are dropped; publication time falls back from `published` to `updated`
/// and is absent, not an error, when neither is usable.
pub fn parse_feed_items(content: &str) -> Result<Vec<NormalizedItem>> {
    let feed = parser::parse(content.as_bytes())
        .map_err(|e| CollectorError::FeedParse(e.to_string()))?;

    let mut items = Vec::new();
    for entry in feed.entries {
        let url = match entry.links.first() {
            Some(link) => link.href.trim().to_string(),
            None => continue,
        };
        if url.is_empty() {
            continue;
        }

        let title = normalize_title(entry.title.as_ref().map(|t| t.content.as_str()).unwrap_or(""));
        let summary = normalize_optional(entry.summary.as_ref().map(|s| s.content.as_str()));
        let published_at = entry.published.or(entry.updated);

        items.push(NormalizedItem {
            title,
            url,
            published_at,
            summary,
        });
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::UNTITLED;

    const RSS_FIXTURE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Example Feed</title>
    <item>
      <title>First article</title>
      <link>https://example.com/first</link>
      <description>Something happened.</description>
      <pubDate>Mon, 01 Jan 2024 12:00:00 GMT</pubDate>
    </item>
    <item>
      <title>No link here</title>
      <description>Should be skipped.</description>
    </item>
    <item>
      <title></title>
      <link>https://example.com/untitled</link>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn parses_entries_and_skips_linkless_ones() {
        let items = parse_feed_items(RSS_FIXTURE).unwrap();
        assert_eq!(items.len(), 2);

        assert_eq!(items[0].title, "First article");
        assert_eq!(items[0].url, "https://example.com/first");
        assert_eq!(items[0].summary.as_deref(), Some("Something happened."));
        assert!(items[0].published_at.is_some());

        assert_eq!(items[1].title, UNTITLED);
        assert!(items[1].published_at.is_none());
    }

    #[test]
    fn atom_updated_is_fallback_timestamp() {
        let atom = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Feed</title>
  <id>urn:feed</id>
  <updated>2024-03-01T00:00:00Z</updated>
  <entry>
    <title>Updated only</title>
    <id>urn:entry-1</id>
    <link href="https://example.com/atom-entry"/>
    <updated>2024-03-01T10:30:00Z</updated>
  </entry>
</feed>"#;

        let items = parse_feed_items(atom).unwrap();
        assert_eq!(items.len(), 1);
        let published = items[0].published_at.expect("updated should be used");
        assert_eq!(published.to_rfc3339(), "2024-03-01T10:30:00+00:00");
    }

    #[test]
    fn long_titles_are_capped() {
        let long_title = "a".repeat(700);
        let rss = format!(
            r#"<rss version="2.0"><channel><title>T</title>
<item><title>{}</title><link>https://example.com/long</link></item>
</channel></rss>"#,
            long_title
        );

        let items = parse_feed_items(&rss).unwrap();
        assert_eq!(items[0].title.chars().count(), 512);
        assert!(items[0].title.ends_with("..."));
    }

    #[test]
    fn garbage_body_is_a_parse_error() {
        let err = parse_feed_items("this is not xml").unwrap_err();
        assert!(matches!(err, CollectorError::FeedParse(_)));
    }

    #[test]
    fn correction_table_remaps_known_stale_endpoints() {
        assert_eq!(
            resolve_feed_url("https://openai.com/blog"),
            "https://openai.com/news/rss.xml"
        );
        assert_eq!(
            resolve_feed_url("https://openai.com/blog/"),
            "https://openai.com/news/rss.xml"
        );
        assert_eq!(
            resolve_feed_url("https://example.com/feed.xml"),
            "https://example.com/feed.xml"
        );
    }
}
