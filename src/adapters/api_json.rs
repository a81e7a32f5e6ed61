use crate::adapters::{normalize_optional, normalize_title};
use crate::types::NormalizedItem;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info};

/// Fetch items from a generic JSON API endpoint. The body is expected to be
/// an array of objects; any network, status or parse problem yields an empty
/// batch instead of an error; a malformed API response means "nothing to
/// ingest this cycle", not a failed source.
pub async fn fetch_api_items(client: &Client, api_url: &str) -> Vec<NormalizedItem> {
    let response = match client.get(api_url).send().await {
        Ok(response) => response,
        Err(e) => {
            debug!("API fetch failed for {}: {}", api_url, e);
            return Vec::new();
        }
    };

    let response = match response.error_for_status() {
        Ok(response) => response,
        Err(e) => {
            debug!("API returned error status for {}: {}", api_url, e);
            return Vec::new();
        }
    };

    let body: Value = match response.json().await {
        Ok(body) => body,
        Err(e) => {
            debug!("API body is not valid JSON for {}: {}", api_url, e);
            return Vec::new();
        }
    };

    let items = parse_api_items(&body);
    info!("Fetched {} items from API {}", items.len(), api_url);
    items
}

/// Normalize a JSON payload into candidate items. Elements must be objects;
/// the URL comes from `url` with `link` as fallback and elements without one
/// are skipped.
pub fn parse_api_items(body: &Value) -> Vec<NormalizedItem> {
    let rows = match body.as_array() {
        Some(rows) => rows,
        None => return Vec::new(),
    };

    let mut items = Vec::new();
    for row in rows {
        let obj = match row.as_object() {
            Some(obj) => obj,
            None => continue,
        };

        let url = obj
            .get("url")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .or_else(|| {
                obj.get("link")
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|u| !u.is_empty())
            });
        let url = match url {
            Some(url) => url.to_string(),
            None => continue,
        };

        let title =
            normalize_title(obj.get("title").and_then(Value::as_str).unwrap_or_default());

        let summary = match obj.get("summary") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => normalize_optional(Some(s)),
            Some(other) => normalize_optional(Some(&other.to_string())),
        };

        let published_at = ["published_at", "published", "date"]
            .iter()
            .find_map(|key| obj.get(*key))
            .and_then(parse_published);

        items.push(NormalizedItem {
            title,
            url,
            published_at,
            summary,
        });
    }

    items
}

/// Accepts a numeric epoch (seconds, integer or float) or an ISO-8601 string;
/// a trailing `Z` and offset-less timestamps are both treated as UTC.
/// Anything unparseable is an absent timestamp, never an error.
fn parse_published(raw: &Value) -> Option<DateTime<Utc>> {
    match raw {
        Value::Number(n) => {
            if let Some(secs) = n.as_i64() {
                DateTime::from_timestamp(secs, 0)
            } else {
                n.as_f64()
                    .and_then(|f| DateTime::from_timestamp(f as i64, 0))
            }
        }
        Value::String(s) => parse_iso_timestamp(s.trim()),
        _ => None,
    }
}

fn parse_iso_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    None
}
