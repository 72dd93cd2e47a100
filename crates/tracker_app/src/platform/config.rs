//! Console configuration loaded from `tracker.ron`.
//!
//! Every field is optional in the file; missing ones take the defaults
//! below. The API token can also come from `TRACKER_API_TOKEN`, which wins
//! over the file so the secret does not have to live on disk.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracker_core::PollPolicy;
use tracker_engine::ApiSettings;
use tracker_logging::LogDestination;

pub const CONFIG_FILENAME: &str = "tracker.ron";
pub const TOKEN_ENV: &str = "TRACKER_API_TOKEN";

/// Which page the console mirrors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
pub enum ViewKind {
    /// Registration form with its job list: fast refresh that stops once
    /// every job settled.
    #[default]
    Registration,
    /// Aggregate dashboard: slow refresh for as long as it is open.
    Dashboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
pub enum LogTarget {
    #[default]
    File,
    Terminal,
    Both,
}

impl From<LogTarget> for LogDestination {
    fn from(target: LogTarget) -> Self {
        match target {
            LogTarget::File => LogDestination::File,
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::Both => LogDestination::Both,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub api_token: Option<String>,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub view: ViewKind,
    pub log: LogTarget,
}

impl Default for AppConfig {
    fn default() -> Self {
        let api = ApiSettings::default();
        Self {
            base_url: api.base_url,
            api_token: None,
            connect_timeout_secs: api.connect_timeout.as_secs(),
            request_timeout_secs: api.request_timeout.as_secs(),
            view: ViewKind::default(),
            log: LogTarget::default(),
        }
    }
}

impl AppConfig {
    /// Replaces the file token with `token` unless it is missing or blank.
    pub fn apply_token_override(&mut self, token: Option<String>) {
        if let Some(token) = token.filter(|token| !token.trim().is_empty()) {
            self.api_token = Some(token);
        }
    }

    pub fn api_settings(&self) -> ApiSettings {
        ApiSettings {
            base_url: self.base_url.clone(),
            token: self.api_token.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn policy(&self) -> PollPolicy {
        match self.view {
            ViewKind::Registration => PollPolicy::REGISTRATION,
            ViewKind::Dashboard => PollPolicy::DASHBOARD,
        }
    }
}

/// Reads the configuration at `path`. A missing file yields the defaults; an
/// unreadable or malformed one is an error.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(AppConfig::default());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read config {}", path.display()))
        }
    };

    ron::from_str(&content).with_context(|| format!("failed to parse config {}", path.display()))
}
