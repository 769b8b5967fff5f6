//! Engagement metrics for checked channels.
//!
//! Metrics come from the TGStat channel statistics API and are cached per
//! channel handle for much longer than channel statistics.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::cache::StatsCache;
use crate::error::{AppError, Result};
use crate::models::TgStatConfig;
use crate::utils::http::get_bytes;

/// Reach and engagement rate of a channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EngagementMetrics {
    pub avg_post_reach: f32,
    pub er_percent: f32,
}

/// A source of engagement metrics keyed by channel handle.
#[async_trait]
pub trait EngagementSource: Send + Sync {
    async fn metrics(&self, channel: &str) -> Result<EngagementMetrics>;
}

#[derive(Debug, Deserialize)]
struct StatEnvelope {
    status: String,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    response: Option<EngagementMetrics>,
}

/// Parse a `channels/stat` response body.
pub fn parse_stat_response(body: &[u8]) -> Result<EngagementMetrics> {
    let envelope: StatEnvelope = serde_json::from_slice(body)?;
    if envelope.status != "ok" {
        return Err(AppError::api(format!(
            "tgstat returned status '{}': {}",
            envelope.status,
            envelope.error.as_deref().unwrap_or("no details")
        )));
    }
    envelope
        .response
        .ok_or_else(|| AppError::api("tgstat response has no payload"))
}

/// Client for the TGStat channel statistics endpoint.
pub struct TgStatClient {
    client: Client,
    url: String,
    token: String,
}

impl TgStatClient {
    pub fn new(client: Client, config: &TgStatConfig) -> Self {
        Self {
            client,
            url: config.url.clone(),
            token: config.token.clone(),
        }
    }
}

#[async_trait]
impl EngagementSource for TgStatClient {
    async fn metrics(&self, channel: &str) -> Result<EngagementMetrics> {
        let channel_id = format!("@{}", channel.trim_start_matches('@'));
        log::debug!("Requesting tgstat metrics for {}", channel_id);

        let body = get_bytes(
            &self.client,
            &self.url,
            &[("token", self.token.as_str()), ("channelId", channel_id.as_str())],
        )
        .await?;

        parse_stat_response(&body)
    }
}

/// Serves metrics from a cache before asking the wrapped source.
pub struct CachedEngagement {
    source: Arc<dyn EngagementSource>,
    cache: Arc<dyn StatsCache<EngagementMetrics>>,
    horizon: chrono::Duration,
}

impl CachedEngagement {
    pub fn new(
        source: Arc<dyn EngagementSource>,
        cache: Arc<dyn StatsCache<EngagementMetrics>>,
        horizon: chrono::Duration,
    ) -> Self {
        Self {
            source,
            cache,
            horizon,
        }
    }
}

#[async_trait]
impl EngagementSource for CachedEngagement {
    async fn metrics(&self, channel: &str) -> Result<EngagementMetrics> {
        if let Some(metrics) = self.cache.lookup(channel).await {
            log::debug!("Engagement cache hit for {}", channel);
            return Ok(metrics);
        }

        let metrics = self.source.metrics(channel).await?;
        self.cache
            .store(channel, &metrics, Utc::now() + self.horizon)
            .await;
        Ok(metrics)
    }
}
