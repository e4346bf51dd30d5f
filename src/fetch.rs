//! Ranking API fetcher
//!
//! This module handles:
//! - Normalizing a configured base URL into the `/api/ranking` endpoint
//! - Cache-busting request URLs so proxies never serve a stale board
//! - Fetching and parsing the payload, with a fallback URL on failure

use std::error::Error;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, CACHE_CONTROL};
use serde_json::Value;

static RANKING_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)/api/ranking$").unwrap());

/// Normalize a configured base URL to the ranking endpoint: URLs already
/// pointing at `/api/ranking` (or any `/api/` path) pass through, otherwise
/// trailing slashes are stripped and the suffix appended. Empty input stays
/// empty so a missing configuration disables the fallback.
pub fn build_api_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    if RANKING_SUFFIX.is_match(trimmed) || trimmed.contains("/api/") {
        return trimmed.to_string();
    }
    format!("{}/api/ranking", trimmed.trim_end_matches('/'))
}

/// Append a timestamp query parameter so intermediaries cannot cache.
pub fn build_request_url(base_url: &str) -> String {
    let joiner = if base_url.contains('?') { '&' } else { '?' };
    format!("{base_url}{joiner}t={}", chrono::Utc::now().timestamp_millis())
}

pub fn build_client() -> Result<reqwest::Client, Box<dyn Error>> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?)
}

async fn fetch_json(client: &reqwest::Client, base_url: &str) -> Result<Value, Box<dyn Error>> {
    if base_url.is_empty() {
        Err("ranking API URL not configured")?;
    }
    let mut headers = HeaderMap::new();
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));

    let url = build_request_url(base_url);
    let resp = client.get(&url).headers(headers).send().await?;

    let status = resp.status();
    let text = resp.text().await?;

    if !status.is_success() {
        Err(format!(
            "Error - ranking request failed [CODE: {}]: {}",
            status, text
        ))?
    }
    Ok(serde_json::from_str(&text)
        .map_err(|e| format!("ranking response is not valid JSON: {e}"))?)
}

/// Fetch the payload from the primary URL, falling through to the fallback
/// when one is configured and distinct.
pub async fn fetch_payload(
    client: &reqwest::Client,
    primary_url: &str,
    fallback_url: &str,
) -> Result<Value, Box<dyn Error>> {
    match fetch_json(client, primary_url).await {
        Ok(payload) => Ok(payload),
        Err(err) => {
            if !fallback_url.is_empty() && fallback_url != primary_url {
                eprintln!("[FETCH] primary URL failed ({err}); trying fallback");
                fetch_json(client, fallback_url).await
            } else {
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_url_appends_suffix_once() {
        assert_eq!(build_api_url("http://host:3000"), "http://host:3000/api/ranking");
        assert_eq!(build_api_url("http://host:3000/"), "http://host:3000/api/ranking");
        assert_eq!(
            build_api_url("http://host:3000/api/ranking"),
            "http://host:3000/api/ranking"
        );
        assert_eq!(
            build_api_url("http://host:3000/API/RANKING"),
            "http://host:3000/API/RANKING"
        );
        assert_eq!(
            build_api_url("http://host/api/custom"),
            "http://host/api/custom"
        );
        assert_eq!(build_api_url("   "), "");
    }

    #[test]
    fn request_url_picks_the_right_joiner() {
        assert!(build_request_url("http://host/api/ranking").contains("?t="));
        assert!(build_request_url("http://host/api/ranking?dia=hoje").contains("&t="));
    }
}
