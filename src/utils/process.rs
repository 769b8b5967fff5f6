// src/utils/process.rs

//! Running external scripts that answer with a JSON document on stdout.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio::process::Command;

use crate::error::{AppError, Result};

/// Run `program script args...` and parse its stdout as JSON.
///
/// The child is killed if the deadline passes. A non-zero exit status,
/// a spawn failure and unparseable output are all errors.
pub async fn run_json<T: DeserializeOwned>(
    program: &str,
    script: &Path,
    args: &[String],
    timeout: Duration,
) -> Result<T> {
    let script_name = script.display().to_string();

    let mut command = Command::new(program);
    command
        .arg(script)
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true);

    log::debug!("Running {} {} {:?}", program, script_name, args);

    let output = match tokio::time::timeout(timeout, command.output()).await {
        Ok(result) => result.map_err(|e| AppError::script(&script_name, e))?,
        Err(_) => {
            return Err(AppError::timeout(format!(
                "{} did not finish within {}s",
                script_name,
                timeout.as_secs()
            )));
        }
    };

    if !output.status.success() {
        return Err(AppError::script(
            &script_name,
            format!(
                "exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        ));
    }

    parse_json_output(&script_name, &output.stdout)
}

/// Parse script output, falling back to the last non-empty line when the
/// script printed progress chatter before its JSON answer.
pub fn parse_json_output<T: DeserializeOwned>(script: &str, stdout: &[u8]) -> Result<T> {
    let text = String::from_utf8_lossy(stdout);
    match serde_json::from_str(text.trim()) {
        Ok(value) => Ok(value),
        Err(full_err) => {
            let last_line = text.lines().rev().find(|l| !l.trim().is_empty());
            match last_line.map(|line| serde_json::from_str(line.trim())) {
                Some(Ok(value)) => Ok(value),
                _ => Err(AppError::script(
                    script,
                    format!("unparseable output ({full_err}): {}", text.trim()),
                )),
            }
        }
    }
}
