//! Link processing orchestrator.
//!
//! Each link moves through
//!
//! ```text
//! Pending -> (CacheHit | Extracted) -> (Skipped | Checking) -> Finalized
//! ```
//!
//! Extraction runs through an ordered stream bounded by
//! `extract_concurrency`. Skipped links are finalized inline. Every other
//! link gets its own task that waits for a slot in the [`RegistrationGate`],
//! runs the check, enriches the record and writes the row into a pre-sized
//! slot vector at the link's input index. No per-link failure aborts the
//! batch.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::cache::{LocalCache, StatsCache};
use crate::enrichment::{CachedEngagement, EngagementMetrics, EngagementSource, TgStatClient};
use crate::error::Result;
use crate::extractors::ExtractorRegistry;
use crate::models::{
    ChannelInfo, Config, Platform, RegistrationStatus, Report, ResultRow, RunStats,
};
use crate::pipeline::skip::SkipPolicy;
use crate::registration::{RegistrationGate, ScriptRegistrationChecker};
use crate::utils::http;
use crate::utils::url::channel_handle;

/// Cache namespace for channel statistics.
pub const CHANNEL_NAMESPACE: &str = "channels";
/// Cache namespace for engagement metrics.
pub const ENGAGEMENT_NAMESPACE: &str = "engagement";

type Slots = Arc<Mutex<Vec<Option<ResultRow>>>>;

/// Where a link's base record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    CacheHit,
    Extracted,
}

/// What a checking task reports back for the run statistics.
#[derive(Debug, Clone, Copy)]
struct CheckOutcome {
    registered: bool,
    failed: bool,
}

/// Drives links through extraction, the skip rule and registration checks.
pub struct LinkProcessor {
    registry: Arc<ExtractorRegistry>,
    gate: Arc<RegistrationGate>,
    cache: Option<Arc<dyn StatsCache<ChannelInfo>>>,
    cache_horizon: chrono::Duration,
    engagement: Option<Arc<dyn EngagementSource>>,
    enrich_platform: Platform,
    policy: SkipPolicy,
    cooldown: Duration,
    extract_concurrency: usize,
}

impl LinkProcessor {
    /// Processor without cache or enrichment and with no cooldown.
    pub fn new(registry: ExtractorRegistry, gate: RegistrationGate) -> Self {
        Self {
            registry: Arc::new(registry),
            gate: Arc::new(gate),
            cache: None,
            cache_horizon: chrono::Duration::hours(72),
            engagement: None,
            enrich_platform: Platform::Telegram,
            policy: SkipPolicy::default(),
            cooldown: Duration::ZERO,
            extract_concurrency: 4,
        }
    }

    /// Build the production processor from configuration.
    ///
    /// `use_cache = false` bypasses both caches for this run.
    pub fn from_config(config: &Config, use_cache: bool) -> Result<Self> {
        let processor = &config.processor;
        let use_cache = use_cache && config.cache.enabled;

        let registry = ExtractorRegistry::with_defaults(config)?;
        log::info!("Registered extractors: {}", registry.names().join(", "));

        let checker = Arc::new(ScriptRegistrationChecker::new(&config.scripts));
        let gate = RegistrationGate::new(checker, processor.check_concurrency)
            .with_timeout(processor.check_timeout());

        let mut built = Self::new(registry, gate)
            .with_policy(SkipPolicy::new(
                processor.low_value_platform()?,
                processor.min_followers,
            ))
            .with_cooldown(processor.cooldown())
            .with_extract_concurrency(processor.extract_concurrency);

        if use_cache {
            let cache: LocalCache<ChannelInfo> =
                LocalCache::new(&config.cache.dir, CHANNEL_NAMESPACE);
            built = built.with_cache(Arc::new(cache), config.cache.horizon());
        }

        if config.tgstat.enabled {
            let client = TgStatClient::new(http::build_client(&config.http)?, &config.tgstat);
            let source: Arc<dyn EngagementSource> = if use_cache {
                let cache: LocalCache<EngagementMetrics> =
                    LocalCache::new(&config.cache.dir, ENGAGEMENT_NAMESPACE);
                Arc::new(CachedEngagement::new(
                    Arc::new(client),
                    Arc::new(cache),
                    config.cache.engagement_horizon(),
                ))
            } else {
                Arc::new(client)
            };
            built = built.with_engagement(source, processor.enrich_platform()?);
        }

        Ok(built)
    }

    pub fn with_cache(
        mut self,
        cache: Arc<dyn StatsCache<ChannelInfo>>,
        horizon: chrono::Duration,
    ) -> Self {
        self.cache = Some(cache);
        self.cache_horizon = horizon;
        self
    }

    /// Enrich checked rows of `platform` with engagement metrics.
    pub fn with_engagement(mut self, source: Arc<dyn EngagementSource>, platform: Platform) -> Self {
        self.engagement = Some(source);
        self.enrich_platform = platform;
        self
    }

    pub fn with_policy(mut self, policy: SkipPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Pause each checking task after its check completes.
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn with_extract_concurrency(mut self, concurrency: usize) -> Self {
        self.extract_concurrency = concurrency.max(1);
        self
    }

    pub fn gate(&self) -> &RegistrationGate {
        &self.gate
    }

    /// Process links into rows in submission order.
    ///
    /// The report always holds exactly one row per input link, and
    /// `rows[i]` describes `links[i]`.
    pub async fn process(&self, links: &[String]) -> Report {
        let mut stats = RunStats {
            link_count: links.len(),
            start_time: Some(Utc::now()),
            ..RunStats::default()
        };
        log::info!(
            "Processing {} links ({} check slots)",
            links.len(),
            self.gate.capacity()
        );

        let slots: Slots = Arc::new(Mutex::new(vec![None; links.len()]));
        let mut pending: Vec<(usize, ResultRow, JoinHandle<CheckOutcome>)> = Vec::new();

        let mut resolved = stream::iter(links.iter().enumerate())
            .map(|(index, link)| async move { (index, self.base_record(link).await) })
            .buffered(self.extract_concurrency);

        while let Some((index, (mut info, origin))) = resolved.next().await {
            match origin {
                Origin::CacheHit => stats.cache_hits += 1,
                Origin::Extracted => stats.extracted += 1,
            }

            if let Some(reason) = self.policy.evaluate(&info) {
                log::debug!("Skipping check for {}: {:?}", info.original_link, reason);
                info.set_status(RegistrationStatus::NotApplicable);
                slots.lock().await[index] =
                    Some(ResultRow::finalize(&info, RegistrationStatus::NotApplicable));
                stats.skipped += 1;
                continue;
            }

            let fallback = ResultRow::finalize(&info, RegistrationStatus::NotRegistered);
            let handle = tokio::spawn(check_task(
                index,
                info,
                Arc::clone(&self.gate),
                self.engagement.clone(),
                self.enrich_platform,
                Arc::clone(&slots),
                self.cooldown,
            ));
            pending.push((index, fallback, handle));
        }
        drop(resolved);

        stats.checked = pending.len();
        let (meta, handles): (Vec<_>, Vec<_>) = pending
            .into_iter()
            .map(|(index, fallback, handle)| ((index, fallback), handle))
            .unzip();

        for ((index, fallback), joined) in meta.into_iter().zip(join_all(handles).await) {
            match joined {
                Ok(outcome) => {
                    if outcome.registered {
                        stats.registered += 1;
                    }
                    if outcome.failed {
                        stats.check_failures += 1;
                    }
                }
                Err(e) => {
                    log::error!("Check task for {} aborted: {}", fallback.original_link, e);
                    stats.check_failures += 1;
                    let mut slots = slots.lock().await;
                    if slots[index].is_none() {
                        slots[index] = Some(fallback);
                    }
                }
            }
        }

        let rows = std::mem::take(&mut *slots.lock().await)
            .into_iter()
            .zip(links)
            .map(|(row, link)| {
                row.unwrap_or_else(|| {
                    ResultRow::finalize(
                        &ChannelInfo::error(link.as_str()),
                        RegistrationStatus::NotRegistered,
                    )
                })
            })
            .collect();

        stats.end_time = Some(Utc::now());
        log::info!(
            "Processed {} links: {} cached, {} extracted, {} skipped, {} checked ({} registered, {} failed)",
            stats.link_count,
            stats.cache_hits,
            stats.extracted,
            stats.skipped,
            stats.checked,
            stats.registered,
            stats.check_failures
        );

        Report {
            rows,
            with_engagement: self.engagement.is_some(),
            stats,
        }
    }

    /// Fresh cached record for the link, or a new extraction.
    async fn base_record(&self, link: &str) -> (ChannelInfo, Origin) {
        if let Some(cache) = &self.cache {
            if let Some(mut info) = cache.lookup(link).await {
                log::debug!("Cache hit for {}", link);
                info.original_link = link.to_string();
                info.is_registered = false;
                info.registration_status = None;
                return (info, Origin::CacheHit);
            }
        }

        let mut info = self.registry.resolve(link).await;
        info.original_link = link.to_string();

        if let Some(cache) = &self.cache {
            if info.is_cacheable() {
                let expires_at = Utc::now() + self.cache_horizon;
                info.expires_at = Some(expires_at);
                cache.store(link, &info, expires_at).await;
            }
        }
        (info, Origin::Extracted)
    }
}

/// Check one link, finalize its row and cool down.
async fn check_task(
    index: usize,
    mut info: ChannelInfo,
    gate: Arc<RegistrationGate>,
    engagement: Option<Arc<dyn EngagementSource>>,
    enrich_platform: Platform,
    slots: Slots,
    cooldown: Duration,
) -> CheckOutcome {
    let (registered, failed) = match gate.check(&info.original_link).await {
        Ok(registered) => (registered, false),
        Err(e) => {
            log::warn!("Registration check failed for {}: {}", info.original_link, e);
            (false, true)
        }
    };
    let status = RegistrationStatus::from_check(registered);
    info.set_status(status);

    if info.platform == enrich_platform {
        if let Some(source) = engagement {
            enrich(&mut info, source.as_ref()).await;
        }
    }

    slots.lock().await[index] = Some(ResultRow::finalize(&info, status));

    if !cooldown.is_zero() {
        tokio::time::sleep(cooldown).await;
    }
    CheckOutcome { registered, failed }
}

/// Fill engagement metrics, leaving zeros on any failure.
async fn enrich(info: &mut ChannelInfo, source: &dyn EngagementSource) {
    let Some(handle) = channel_handle(&info.original_link) else {
        log::warn!("No channel handle in {}, skipping enrichment", info.original_link);
        return;
    };
    match source.metrics(&handle).await {
        Ok(metrics) => {
            info.avg_post_reach = metrics.avg_post_reach;
            info.er_percent = metrics.er_percent;
        }
        Err(e) => log::warn!("Engagement lookup failed for {}: {}", handle, e),
    }
}
