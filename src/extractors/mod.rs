//! Platform extractors and the first-match registry.
//!
//! An extractor declares which links it handles and turns a link into
//! [`ChannelInfo`]. The registry asks extractors in registration order and
//! uses the first one that accepts the link.
//!
//! Default registration order (see [`ExtractorRegistry::with_defaults`]):
//! telegram, rutube, vk, instagram, tiktok.

mod followers;
mod script;
mod telegram_web;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ChannelInfo, Config, Platform, TelegramBackend};
use crate::utils::http;

pub use followers::normalize_followers;
pub use script::{ScriptExtractor, ScriptSpec};
pub use telegram_web::TelegramWebExtractor;

/// A platform-specific source of channel statistics.
#[async_trait]
pub trait StatisticExtractor: Send + Sync {
    /// Platform this extractor produces records for.
    fn platform(&self) -> Platform;

    /// Stable identifier of the platform.
    fn name(&self) -> &'static str {
        self.platform().as_str()
    }

    /// Cheap, side-effect free check whether the link belongs to this extractor.
    fn can_handle(&self, link: &str) -> bool;

    /// Fetch statistics for the link.
    ///
    /// Never fails: internal errors produce [`ChannelInfo::error`].
    async fn extract(&self, link: &str) -> ChannelInfo;
}

/// Ordered collection of extractors with first-match dispatch.
#[derive(Clone, Default)]
pub struct ExtractorRegistry {
    extractors: Vec<Arc<dyn StatisticExtractor>>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an extractor. Earlier registrations win over later ones.
    pub fn register(mut self, extractor: impl StatisticExtractor + 'static) -> Self {
        self.extractors.push(Arc::new(extractor));
        self
    }

    /// Append an already shared extractor.
    pub fn register_arc(mut self, extractor: Arc<dyn StatisticExtractor>) -> Self {
        self.extractors.push(extractor);
        self
    }

    /// Registry with every built-in extractor in the documented order.
    pub fn with_defaults(config: &Config) -> Result<Self> {
        let scripts = &config.scripts;
        let telegram: Arc<dyn StatisticExtractor> = match config.telegram.backend {
            TelegramBackend::Script => Arc::new(ScriptExtractor::telegram(scripts)),
            TelegramBackend::Web => Arc::new(TelegramWebExtractor::new(
                http::build_client(&config.http)?,
            )),
        };

        Ok(Self::new()
            .register_arc(telegram)
            .register(ScriptExtractor::rutube(scripts))
            .register(ScriptExtractor::vk(scripts))
            .register(ScriptExtractor::instagram(scripts, &config.instagram))
            .register(ScriptExtractor::tiktok(scripts)))
    }

    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }

    /// Names in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.extractors.iter().map(|e| e.name()).collect()
    }

    /// First extractor that accepts the link.
    pub fn find(&self, link: &str) -> Option<&Arc<dyn StatisticExtractor>> {
        self.extractors.iter().find(|e| e.can_handle(link))
    }

    /// Extract statistics with the first matching extractor.
    ///
    /// The record's platform is stamped from the accepting extractor. Links
    /// nobody accepts get the "Unknown" default record.
    pub async fn resolve(&self, link: &str) -> ChannelInfo {
        match self.find(link) {
            Some(extractor) => {
                log::debug!("{} handled by {}", link, extractor.name());
                let mut info = extractor.extract(link).await;
                info.platform = extractor.platform();
                if info.original_link.is_empty() {
                    info.original_link = link.to_string();
                }
                info
            }
            None => {
                log::debug!("No extractor accepts {}", link);
                ChannelInfo::unknown(link)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed {
        platform: Platform,
        marker: &'static str,
        name: &'static str,
        calls: Arc<AtomicUsize>,
    }

    impl Fixed {
        fn new(platform: Platform, marker: &'static str, name: &'static str) -> Self {
            Self {
                platform,
                marker,
                name,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl StatisticExtractor for Fixed {
        fn platform(&self) -> Platform {
            self.platform
        }

        fn can_handle(&self, link: &str) -> bool {
            link.contains(self.marker)
        }

        async fn extract(&self, link: &str) -> ChannelInfo {
            self.calls.fetch_add(1, Ordering::SeqCst);
            ChannelInfo::new(self.name, "100", link)
        }
    }

    #[tokio::test]
    async fn test_first_match_wins() {
        let first = Fixed::new(Platform::Telegram, "t.me/", "first");
        let second = Fixed::new(Platform::Vk, "t.me/", "second");
        let second_calls = Arc::clone(&second.calls);
        let registry = ExtractorRegistry::new().register(first).register(second);

        let info = registry.resolve("https://t.me/a").await;

        assert_eq!(info.channel_name, "first");
        assert_eq!(info.platform, Platform::Telegram);
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unmatched_link_gets_default_record() {
        let registry =
            ExtractorRegistry::new().register(Fixed::new(Platform::Vk, "vk.com/", "v"));

        let info = registry.resolve("https://example.com/x").await;

        assert_eq!(info.channel_name, "Unknown");
        assert_eq!(info.followers_count, "0");
        assert_eq!(info.platform, Platform::Unknown);
        assert_eq!(info.original_link, "https://example.com/x");
    }

    #[tokio::test]
    async fn test_platform_stamped_on_error_record() {
        struct Broken;

        #[async_trait]
        impl StatisticExtractor for Broken {
            fn platform(&self) -> Platform {
                Platform::Rutube
            }
            fn can_handle(&self, _link: &str) -> bool {
                true
            }
            async fn extract(&self, link: &str) -> ChannelInfo {
                ChannelInfo::error(link)
            }
        }

        let registry = ExtractorRegistry::new().register(Broken);
        let info = registry.resolve("rutube.ru/c").await;

        assert!(info.is_error());
        assert_eq!(info.platform, Platform::Rutube);
    }

    #[test]
    fn test_default_order() {
        let registry = ExtractorRegistry::with_defaults(&Config::default()).unwrap();
        assert_eq!(
            registry.names(),
            vec!["telegram", "rutube", "vk", "instagram", "tiktok"]
        );
    }
}
