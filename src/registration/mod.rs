//! Registration status checks.
//!
//! A check is slow and rate sensitive, so every call goes through a
//! [`RegistrationGate`] that caps how many run at once.

mod gate;

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::Result;
use crate::models::ScriptConfig;
use crate::utils::process::run_json;

pub use gate::RegistrationGate;

/// Decides whether a channel is registered with the authority.
#[async_trait]
pub trait RegistrationChecker: Send + Sync {
    async fn check(&self, link: &str) -> Result<bool>;
}

#[derive(Debug, Deserialize)]
struct CheckOutput {
    #[serde(rename = "isRegistered")]
    is_registered: bool,
}

/// Checker that runs the registry lookup script and reads
/// `{"isRegistered": bool}` from its output.
#[derive(Debug, Clone)]
pub struct ScriptRegistrationChecker {
    node_bin: String,
    script_path: PathBuf,
    timeout: Duration,
}

impl ScriptRegistrationChecker {
    pub const SCRIPT: &'static str = "ru-registration.js";

    pub fn new(config: &ScriptConfig) -> Self {
        Self {
            node_bin: config.node_bin.clone(),
            script_path: config.dir.join(Self::SCRIPT),
            timeout: config.timeout(),
        }
    }
}

#[async_trait]
impl RegistrationChecker for ScriptRegistrationChecker {
    async fn check(&self, link: &str) -> Result<bool> {
        let output: CheckOutput = run_json(
            &self.node_bin,
            &self.script_path,
            &[link.to_string()],
            self.timeout,
        )
        .await?;
        Ok(output.is_registered)
    }
}
