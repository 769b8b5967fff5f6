//! Telegram extractor that reads the public `t.me` preview page directly.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};

use crate::error::{AppError, Result};
use crate::extractors::StatisticExtractor;
use crate::models::{ChannelInfo, Platform, UNKNOWN_NAME};
use crate::utils::http::get_html;
use crate::utils::url::normalize_link;

const TITLE_SELECTOR: &str = "div.tgme_page_title";
const EXTRA_SELECTOR: &str = "div.tgme_page_extra";

static DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d\s]*").expect("static regex is valid"));

/// Scrapes channel title and subscriber count from `https://t.me/<handle>`.
pub struct TelegramWebExtractor {
    client: Client,
}

impl TelegramWebExtractor {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn try_extract(&self, link: &str) -> Result<ChannelInfo> {
        let url = normalize_link(link);
        let document = get_html(&self.client, &url).await?;
        let (name, followers) = parse_preview(&document)?;
        Ok(ChannelInfo::new(name, followers, link))
    }
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// Read `(channel name, followers)` from a preview page.
///
/// Missing elements fall back to `"Unknown"` and `"0"`.
pub(crate) fn parse_preview(document: &Html) -> Result<(String, String)> {
    let title_sel = parse_selector(TITLE_SELECTOR)?;
    let extra_sel = parse_selector(EXTRA_SELECTOR)?;

    let name = document
        .select(&title_sel)
        .last()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| UNKNOWN_NAME.to_string());

    let mut followers = "0".to_string();
    for el in document.select(&extra_sel) {
        let text: String = el.text().collect();
        let lower = text.to_lowercase();
        if ["subscriber", "member", "follower"]
            .iter()
            .any(|w| lower.contains(w))
        {
            if let Some(m) = DIGITS.find(&text) {
                followers = m.as_str().split_whitespace().collect();
            }
        }
    }

    Ok((name, followers))
}

#[async_trait]
impl StatisticExtractor for TelegramWebExtractor {
    fn platform(&self) -> Platform {
        Platform::Telegram
    }

    fn can_handle(&self, link: &str) -> bool {
        let link = link.to_lowercase();
        link.contains("t.me/") || link.contains("telegram.me/")
    }

    async fn extract(&self, link: &str) -> ChannelInfo {
        match self.try_extract(link).await {
            Ok(info) => info,
            Err(e) => {
                log::warn!("telegram page fetch failed for {}: {}", link, e);
                ChannelInfo::error(link)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_preview() {
        let html = Html::parse_document(
            r#"<html><body>
                <div class="tgme_page_title"><span dir="auto">Durov's Channel</span></div>
                <div class="tgme_page_extra">1 234 567 subscribers</div>
            </body></html>"#,
        );
        let (name, followers) = parse_preview(&html).unwrap();
        assert_eq!(name, "Durov's Channel");
        assert_eq!(followers, "1234567");
    }

    #[test]
    fn test_parse_preview_ignores_unrelated_extra() {
        let html = Html::parse_document(
            r#"<div class="tgme_page_title">Someone</div>
               <div class="tgme_page_extra">@someone</div>"#,
        );
        let (name, followers) = parse_preview(&html).unwrap();
        assert_eq!(name, "Someone");
        assert_eq!(followers, "0");
    }

    #[test]
    fn test_parse_preview_empty_page() {
        let html = Html::parse_document("<html></html>");
        let (name, followers) = parse_preview(&html).unwrap();
        assert_eq!(name, "Unknown");
        assert_eq!(followers, "0");
    }

    #[test]
    fn test_can_handle() {
        let extractor = TelegramWebExtractor::new(Client::new());
        assert!(extractor.can_handle("https://t.me/x"));
        assert!(!extractor.can_handle("https://vk.com/x"));
    }
}
