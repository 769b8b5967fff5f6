//! Channel record, platform identifiers and registration status.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Channel name used when no extractor accepted a link.
pub const UNKNOWN_NAME: &str = "Unknown";
/// Channel name of the sentinel record produced by a failed extraction.
pub const ERROR_NAME: &str = "Error";
/// Followers value of the sentinel record produced by a failed extraction.
pub const ERROR_FOLLOWERS: &str = "N/A";

/// Platform a link belongs to.
///
/// Identifiers are lowercase on the wire and in reports. Parsing is
/// case-insensitive so `"Instagram"` and `"instagram"` are the same platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Telegram,
    Vk,
    Rutube,
    Instagram,
    Tiktok,
    #[default]
    #[serde(rename = "Unknown")]
    Unknown,
}

impl Platform {
    /// Stable identifier used in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Telegram => "telegram",
            Platform::Vk => "vk",
            Platform::Rutube => "rutube",
            Platform::Instagram => "instagram",
            Platform::Tiktok => "tiktok",
            Platform::Unknown => "Unknown",
        }
    }

    /// Guess the platform from the link text alone.
    pub fn detect(link: &str) -> Self {
        let link = link.to_lowercase();
        if link.contains("t.me/") || link.contains("telegram.me/") {
            Platform::Telegram
        } else if link.contains("vk.com/") {
            Platform::Vk
        } else if link.contains("rutube.ru/") {
            Platform::Rutube
        } else if link.contains("instagram.com/") {
            Platform::Instagram
        } else if link.contains("tiktok.com/") {
            Platform::Tiktok
        } else {
            Platform::Unknown
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "telegram" => Ok(Platform::Telegram),
            "vk" => Ok(Platform::Vk),
            "rutube" => Ok(Platform::Rutube),
            "instagram" => Ok(Platform::Instagram),
            "tiktok" => Ok(Platform::Tiktok),
            "unknown" => Ok(Platform::Unknown),
            other => Err(AppError::validation(format!("unknown platform '{other}'"))),
        }
    }
}

/// Outcome of the registration step for one link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    Registered,
    NotRegistered,
    NotApplicable,
}

impl RegistrationStatus {
    pub fn from_check(is_registered: bool) -> Self {
        if is_registered {
            RegistrationStatus::Registered
        } else {
            RegistrationStatus::NotRegistered
        }
    }

    /// Human readable label written to reports.
    pub fn label(&self) -> &'static str {
        match self {
            RegistrationStatus::Registered => "registered",
            RegistrationStatus::NotRegistered => "not registered",
            RegistrationStatus::NotApplicable => "not applicable",
        }
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Working record for a single link.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChannelInfo {
    /// Display name of the channel
    pub channel_name: String,

    /// Followers count as reported by the extractor (integer text on success)
    pub followers_count: String,

    /// The link exactly as it was submitted
    pub original_link: String,

    /// Platform of the extractor that accepted the link
    #[serde(default)]
    pub platform: Platform,

    #[serde(default)]
    pub is_registered: bool,

    /// Set once, either by the skip rule or after the registration check
    #[serde(default)]
    pub registration_status: Option<RegistrationStatus>,

    /// Average post reach (engagement enrichment)
    #[serde(default)]
    pub avg_post_reach: f32,

    /// Engagement rate in percent (engagement enrichment)
    #[serde(default)]
    pub er_percent: f32,

    /// When a cached copy of this record stops being valid
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl ChannelInfo {
    /// Record for a successful extraction.
    pub fn new(
        channel_name: impl Into<String>,
        followers_count: impl Into<String>,
        original_link: impl Into<String>,
    ) -> Self {
        Self {
            channel_name: channel_name.into(),
            followers_count: followers_count.into(),
            original_link: original_link.into(),
            platform: Platform::Unknown,
            is_registered: false,
            registration_status: None,
            avg_post_reach: 0.0,
            er_percent: 0.0,
            expires_at: None,
        }
    }

    /// Default record used when no extractor accepts the link.
    pub fn unknown(link: impl Into<String>) -> Self {
        Self::new(UNKNOWN_NAME, "0", link)
    }

    /// Sentinel record returned by an extractor that failed internally.
    pub fn error(link: impl Into<String>) -> Self {
        Self::new(ERROR_NAME, ERROR_FOLLOWERS, link)
    }

    pub fn is_error(&self) -> bool {
        self.channel_name == ERROR_NAME && self.followers_count == ERROR_FOLLOWERS
    }

    /// Whether this record came out of a real extraction worth caching.
    pub fn is_cacheable(&self) -> bool {
        !self.is_error()
            && self.followers_count != ERROR_FOLLOWERS
            && self.platform != Platform::Unknown
            && !self.channel_name.is_empty()
    }

    /// Followers count as an integer, if it parses.
    pub fn followers(&self) -> Option<u64> {
        self.followers_count.trim().parse().ok()
    }

    /// Record the registration outcome.
    pub fn set_status(&mut self, status: RegistrationStatus) {
        self.is_registered = status == RegistrationStatus::Registered;
        self.registration_status = Some(status);
    }
}
