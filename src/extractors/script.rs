//! Extractors backed by external headless-browser scripts.
//!
//! Each script receives the link as its first argument and prints
//! `{"channelName": "...", "followersCount": "..."}` on stdout.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};

use crate::error::{AppError, Result};
use crate::extractors::{StatisticExtractor, normalize_followers};
use crate::models::{ChannelInfo, ERROR_FOLLOWERS, InstagramConfig, Platform, ScriptConfig};
use crate::utils::process::run_json;
use crate::utils::url::{ensure_scheme, normalize_link};

/// Static description of one script-backed platform.
#[derive(Debug, Clone)]
pub struct ScriptSpec {
    pub platform: Platform,
    /// Script file name inside the scripts directory
    pub script: &'static str,
    /// Substrings that mark a link as belonging to this platform
    pub markers: &'static [&'static str],
    /// Rewrite the link to the platform's canonical host before running
    pub canonicalize: bool,
    /// Convert "10K"-style followers text into an integer string
    pub normalize_followers: bool,
}

#[derive(Debug, Deserialize)]
struct ScriptOutput {
    #[serde(rename = "channelName", default)]
    channel_name: String,
    #[serde(
        rename = "followersCount",
        alias = "followersText",
        default,
        deserialize_with = "text_or_number"
    )]
    followers_count: String,
}

fn text_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Runs a platform script and maps its answer to [`ChannelInfo`].
#[derive(Debug, Clone)]
pub struct ScriptExtractor {
    spec: ScriptSpec,
    node_bin: String,
    script_path: PathBuf,
    extra_args: Vec<String>,
    timeout: Duration,
}

impl ScriptExtractor {
    pub fn new(spec: ScriptSpec, config: &ScriptConfig) -> Self {
        Self {
            script_path: config.dir.join(spec.script),
            spec,
            node_bin: config.node_bin.clone(),
            extra_args: Vec::new(),
            timeout: config.timeout(),
        }
    }

    /// Arguments passed after the link.
    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    pub fn telegram(config: &ScriptConfig) -> Self {
        Self::new(
            ScriptSpec {
                platform: Platform::Telegram,
                script: "telegram.js",
                markers: &["t.me/", "telegram.me/"],
                canonicalize: false,
                normalize_followers: false,
            },
            config,
        )
    }

    pub fn rutube(config: &ScriptConfig) -> Self {
        Self::new(
            ScriptSpec {
                platform: Platform::Rutube,
                script: "rutube.js",
                markers: &["rutube.ru/"],
                canonicalize: false,
                normalize_followers: false,
            },
            config,
        )
    }

    pub fn vk(config: &ScriptConfig) -> Self {
        Self::new(
            ScriptSpec {
                platform: Platform::Vk,
                script: "puppeteer_scraper.js",
                markers: &["vk.com/"],
                canonicalize: true,
                normalize_followers: true,
            },
            config,
        )
    }

    pub fn instagram(config: &ScriptConfig, login: &InstagramConfig) -> Self {
        Self::new(
            ScriptSpec {
                platform: Platform::Instagram,
                script: "instagram.js",
                markers: &["instagram.com/"],
                canonicalize: false,
                normalize_followers: true,
            },
            config,
        )
        .with_extra_args(vec![login.username.clone(), login.password.clone()])
    }

    pub fn tiktok(config: &ScriptConfig) -> Self {
        Self::new(
            ScriptSpec {
                platform: Platform::Tiktok,
                script: "tiktok.js",
                markers: &["tiktok.com/"],
                canonicalize: true,
                normalize_followers: true,
            },
            config,
        )
    }

    /// Link as handed to the script.
    fn prepare_link(&self, link: &str) -> String {
        if self.spec.canonicalize {
            normalize_link(link)
        } else {
            ensure_scheme(link)
        }
    }

    async fn try_extract(&self, link: &str) -> Result<ChannelInfo> {
        let target = self.prepare_link(link);
        let mut args = Vec::with_capacity(1 + self.extra_args.len());
        args.push(target);
        args.extend(self.extra_args.iter().cloned());

        let output: ScriptOutput =
            run_json(&self.node_bin, &self.script_path, &args, self.timeout).await?;
        self.to_info(link, output)
    }

    fn to_info(&self, link: &str, output: ScriptOutput) -> Result<ChannelInfo> {
        let name = output.channel_name.trim();
        if name.is_empty() {
            return Err(AppError::script(self.spec.script, "empty channel name"));
        }
        // Scripts report their own failures as a normal answer and exit 0.
        if output.followers_count.trim() == ERROR_FOLLOWERS || name.ends_with(" Error") {
            return Err(AppError::script(
                self.spec.script,
                format!("script reported failure: {name}"),
            ));
        }

        let followers = if self.spec.normalize_followers {
            normalize_followers(&output.followers_count)
        } else {
            output.followers_count.trim().to_string()
        };

        Ok(ChannelInfo::new(name, followers, link))
    }
}

#[async_trait]
impl StatisticExtractor for ScriptExtractor {
    fn platform(&self) -> Platform {
        self.spec.platform
    }

    fn can_handle(&self, link: &str) -> bool {
        let link = link.to_lowercase();
        self.spec.markers.iter().any(|m| link.contains(m))
    }

    async fn extract(&self, link: &str) -> ChannelInfo {
        match self.try_extract(link).await {
            Ok(info) => info,
            Err(e) => {
                log::warn!("{} extraction failed for {}: {}", self.name(), link, e);
                ChannelInfo::error(link)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ScriptConfig {
        ScriptConfig::default()
    }

    #[test]
    fn test_can_handle_markers() {
        let tg = ScriptExtractor::telegram(&config());
        assert!(tg.can_handle("https://t.me/abc"));
        assert!(tg.can_handle("telegram.me/abc"));
        assert!(tg.can_handle("HTTPS://T.ME/abc"));
        assert!(!tg.can_handle("https://vk.com/abc"));

        let vk = ScriptExtractor::vk(&config());
        assert!(vk.can_handle("https://m.vk.com/club1"));
    }

    #[test]
    fn test_prepare_link() {
        let vk = ScriptExtractor::vk(&config());
        assert_eq!(vk.prepare_link("http://m.vk.com/club1"), "https://vk.com/club1");

        let tg = ScriptExtractor::telegram(&config());
        assert_eq!(tg.prepare_link("t.me/a"), "https://t.me/a");
    }

    #[test]
    fn test_output_accepts_followers_text_alias() {
        let output: ScriptOutput =
            serde_json::from_str(r#"{"channelName":"Club","followersText":"3,700"}"#).unwrap();
        let info = ScriptExtractor::vk(&config())
            .to_info("vk.com/club", output)
            .unwrap();
        assert_eq!(info.channel_name, "Club");
        assert_eq!(info.followers_count, "3700");
        assert_eq!(info.original_link, "vk.com/club");
    }

    #[test]
    fn test_output_numeric_followers() {
        let output: ScriptOutput =
            serde_json::from_str(r#"{"channelName":"A","followersCount":50000}"#).unwrap();
        let info = ScriptExtractor::telegram(&config())
            .to_info("t.me/a", output)
            .unwrap();
        assert_eq!(info.followers_count, "50000");
    }

    #[test]
    fn test_empty_name_is_error() {
        let output: ScriptOutput = serde_json::from_str(r#"{"followersCount":"1"}"#).unwrap();
        assert!(
            ScriptExtractor::rutube(&config())
                .to_info("rutube.ru/x", output)
                .is_err()
        );
    }

    #[test]
    fn test_reported_failure_is_error() {
        let tg = ScriptExtractor::telegram(&config());
        for body in [
            r#"{"channelName":"Telegram Error","followersCount":"N/A"}"#,
            r#"{"channelName":"Script Error","followersCount":"0"}"#,
            r#"{"channelName":"Some Channel","followersCount":"N/A"}"#,
        ] {
            let output: ScriptOutput = serde_json::from_str(body).unwrap();
            let err = tg.to_info("t.me/a", output).unwrap_err();
            assert!(matches!(err, AppError::Script { .. }), "{body}");
        }

        let output: ScriptOutput =
            serde_json::from_str(r#"{"channelName":"Errors and Fixes","followersCount":"12"}"#)
                .unwrap();
        assert!(tg.to_info("t.me/a", output).is_ok());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failure_answer_with_zero_exit_yields_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("telegram.js"),
            "echo '{\"channelName\": \"Telegram Error\", \"followersCount\": \"N/A\"}'\n",
        )
        .unwrap();
        let cfg = ScriptConfig {
            node_bin: "sh".into(),
            dir: dir.path().to_path_buf(),
            timeout_secs: 5,
        };

        let info = ScriptExtractor::telegram(&cfg).extract("t.me/a").await;

        assert!(info.is_error());
        assert_eq!(info.channel_name, "Error");
        assert_eq!(info.original_link, "t.me/a");
    }

    #[tokio::test]
    async fn test_missing_interpreter_yields_sentinel() {
        let mut cfg = config();
        cfg.node_bin = "definitely-not-a-real-binary-xyz".into();
        let extractor = ScriptExtractor::rutube(&cfg);

        let info = extractor.extract("rutube.ru/channel/1").await;

        assert!(info.is_error());
        assert_eq!(info.channel_name, "Error");
        assert_eq!(info.followers_count, "N/A");
        assert_eq!(info.original_link, "rutube.ru/channel/1");
    }

    #[test]
    fn test_instagram_passes_credentials() {
        let login = InstagramConfig {
            username: "user".into(),
            password: "pass".into(),
        };
        let ig = ScriptExtractor::instagram(&config(), &login);
        assert_eq!(ig.extra_args, vec!["user", "pass"]);
        assert!(ig.script_path.ends_with("instagram.js"));
    }
}
