//! Skip rule for the registration check.
//!
//! A link bypasses the check and is reported "not applicable" when:
//!
//! - it resolved to the low-value platform, regardless of its followers, or
//! - its followers count is below the threshold, or
//! - its followers count does not parse as an integer.
//!
//! An unparsable count is treated as below the threshold, so failed and
//! unknown extractions never reach the expensive check.

use crate::models::{ChannelInfo, Platform};

/// Why a link skipped the registration check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    LowValuePlatform,
    BelowThreshold { followers: u64, threshold: u64 },
    UnparsableFollowers,
}

/// Decides which links go through the registration check.
#[derive(Debug, Clone)]
pub struct SkipPolicy {
    pub low_value_platform: Platform,
    pub min_followers: u64,
}

impl Default for SkipPolicy {
    fn default() -> Self {
        Self {
            low_value_platform: Platform::Instagram,
            min_followers: 10_000,
        }
    }
}

impl SkipPolicy {
    pub fn new(low_value_platform: Platform, min_followers: u64) -> Self {
        Self {
            low_value_platform,
            min_followers,
        }
    }

    /// `Some(reason)` if the record skips the check, `None` if it must be checked.
    pub fn evaluate(&self, info: &ChannelInfo) -> Option<SkipReason> {
        if info.platform == self.low_value_platform {
            return Some(SkipReason::LowValuePlatform);
        }
        match info.followers() {
            None => Some(SkipReason::UnparsableFollowers),
            Some(followers) if followers < self.min_followers => Some(SkipReason::BelowThreshold {
                followers,
                threshold: self.min_followers,
            }),
            Some(_) => None,
        }
    }

    pub fn should_skip(&self, info: &ChannelInfo) -> bool {
        self.evaluate(info).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(platform: Platform, followers: &str) -> ChannelInfo {
        let mut info = ChannelInfo::new("name", followers, "link");
        info.platform = platform;
        info
    }

    #[test]
    fn test_threshold_boundary() {
        let policy = SkipPolicy::default();

        assert_eq!(policy.evaluate(&record(Platform::Telegram, "10000")), None);
        assert_eq!(
            policy.evaluate(&record(Platform::Telegram, "9999")),
            Some(SkipReason::BelowThreshold {
                followers: 9999,
                threshold: 10_000
            })
        );
    }

    #[test]
    fn test_unparsable_followers_skip() {
        let policy = SkipPolicy::default();

        assert_eq!(
            policy.evaluate(&record(Platform::Vk, "N/A")),
            Some(SkipReason::UnparsableFollowers)
        );
        assert_eq!(
            policy.evaluate(&record(Platform::Telegram, "1.5K")),
            Some(SkipReason::UnparsableFollowers)
        );
        assert!(policy.should_skip(&ChannelInfo::error("t.me/x")));
    }

    #[test]
    fn test_low_value_platform_is_sufficient() {
        let policy = SkipPolicy::default();

        assert_eq!(
            policy.evaluate(&record(Platform::Instagram, "200000")),
            Some(SkipReason::LowValuePlatform)
        );
        assert_eq!(
            policy.evaluate(&record(Platform::Instagram, "garbage")),
            Some(SkipReason::LowValuePlatform)
        );
    }

    #[test]
    fn test_unknown_default_record_skips() {
        let policy = SkipPolicy::default();
        let info = ChannelInfo::unknown("example.com/x");
        assert!(matches!(
            policy.evaluate(&info),
            Some(SkipReason::BelowThreshold { followers: 0, .. })
        ));
    }

    #[test]
    fn test_custom_policy() {
        let policy = SkipPolicy::new(Platform::Tiktok, 100);
        assert!(policy.should_skip(&record(Platform::Tiktok, "5000")));
        assert!(!policy.should_skip(&record(Platform::Instagram, "100")));
        assert!(policy.should_skip(&record(Platform::Instagram, "99")));
    }
}
