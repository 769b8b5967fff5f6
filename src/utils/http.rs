// src/utils/http.rs

//! HTTP helpers shared by the Telegram web extractor and the TGStat client.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::{ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use scraper::Html;

use crate::error::Result;
use crate::models::HttpConfig;

/// Build the shared client.
///
/// Channel pages localize their counters, so Russian and English are the
/// only accepted languages.
pub fn build_client(config: &HttpConfig) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("ru,en;q=0.8"));

    let client = Client::builder()
        .user_agent(&config.user_agent)
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// GET a URL with query parameters and return the body.
///
/// Non-success statuses are errors.
pub async fn get_bytes(client: &Client, url: &str, query: &[(&str, &str)]) -> Result<Vec<u8>> {
    let body = client
        .get(url)
        .query(query)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;
    Ok(body.to_vec())
}

/// GET a page and parse it as HTML.
pub async fn get_html(client: &Client, url: &str) -> Result<Html> {
    let body = get_bytes(client, url, &[]).await?;
    Ok(Html::parse_document(&String::from_utf8_lossy(&body)))
}
