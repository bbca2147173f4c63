//! Azure CLI based authorizer.
//!
//! Reuses the session of a logged-in `az` by shelling out to
//! `az account get-access-token`. The first token is fetched at construction time,
//! so a missing CLI or an expired login surfaces immediately.

use super::Authorizer;
use super::cache::{AccessToken, TokenCache};
use crate::error::{AuthError, Result};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

#[cfg(windows)]
const AZ_PROGRAM: &str = "az.cmd";
#[cfg(not(windows))]
const AZ_PROGRAM: &str = "az";

/// Captured result of one CLI invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Runs an external program. Swapped out in tests.
pub trait CliRunner: Send + Sync {
    fn run(&self, program: &str, args: &[&str]) -> std::io::Result<CliOutput>;
}

/// Runs programs with `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessCliRunner;

impl CliRunner for ProcessCliRunner {
    fn run(&self, program: &str, args: &[&str]) -> std::io::Result<CliOutput> {
        let output = std::process::Command::new(program).args(args).output()?;
        Ok(CliOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CliToken {
    access_token: String,
    /// Local time, `2024-01-31 13:45:10.123456`.
    #[serde(default)]
    expires_on: Option<String>,
    /// Unix seconds; only emitted by newer CLI versions.
    #[serde(default, rename = "expires_on")]
    expires_on_unix: Option<i64>,
}

impl CliToken {
    fn expires_at(&self) -> Result<DateTime<Utc>> {
        if let Some(secs) = self.expires_on_unix {
            return Utc.timestamp_opt(secs, 0).single().ok_or_else(|| {
                AuthError::ParseError(format!("Invalid expires_on timestamp: {secs}"))
            });
        }
        let raw = self.expires_on.as_deref().ok_or_else(|| {
            AuthError::ParseError("Azure CLI token has no expiry".to_string())
        })?;
        let naive = NaiveDateTime::parse_from_str(raw.trim(), "%Y-%m-%d %H:%M:%S%.f")
            .map_err(|e| AuthError::ParseError(format!("Invalid expiresOn '{raw}': {e}")))?;
        Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|t| t.with_timezone(&Utc))
            .ok_or_else(|| AuthError::ParseError(format!("Invalid local time '{raw}'")))
    }
}

/// Parses the JSON printed by `az account get-access-token --output json`.
pub(crate) fn parse_cli_token(stdout: &str) -> Result<AccessToken> {
    let tok: CliToken = serde_json::from_str(stdout)
        .map_err(|e| AuthError::ParseError(format!("Failed to parse Azure CLI output: {e}")))?;
    let expires_at = tok.expires_at()?;
    Ok(AccessToken::new(tok.access_token, expires_at))
}

/// Authorizer backed by the Azure CLI's cached login.
pub struct CliAuthorizer {
    resource: String,
    runner: Arc<dyn CliRunner>,
    cache: TokenCache,
}

impl CliAuthorizer {
    /// Fetches the first token for `resource` right away.
    pub fn new(resource: impl Into<String>, runner: Arc<dyn CliRunner>) -> Result<Self> {
        let resource = resource.into();
        let first = fetch_token(runner.as_ref(), &resource)?;
        Ok(Self {
            resource,
            runner,
            cache: TokenCache::with_token(first),
        })
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }
}

impl Authorizer for CliAuthorizer {
    fn token(&self) -> Result<String> {
        self.cache
            .get_or_refresh(|| fetch_token(self.runner.as_ref(), &self.resource))
    }
}

fn fetch_token(runner: &dyn CliRunner, resource: &str) -> Result<AccessToken> {
    debug!(resource = %resource, "requesting token from Azure CLI");
    let args = [
        "account",
        "get-access-token",
        "--resource",
        resource,
        "--output",
        "json",
    ];
    let out = runner.run(AZ_PROGRAM, &args).map_err(|e| {
        AuthError::CliError(format!("Failed to run '{AZ_PROGRAM}': {e}"))
    })?;
    if !out.success {
        let stderr = out.stderr.trim().to_string();
        warn!(resource = %resource, "Azure CLI token request failed");
        return Err(AuthError::CliError(if stderr.is_empty() {
            "az account get-access-token exited with an error".to_string()
        } else {
            stderr
        }));
    }
    parse_cli_token(&out.stdout)
}
