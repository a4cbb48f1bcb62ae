use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::api::FetchOptions;
use crate::engine::EngineOptions;
use crate::internal::sentinel::{SCROLL_THRESHOLD_PX, TICK_INTERVAL_MS};

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    /// Platform origin the gateway talks to.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Browser-style location the snapshot was served under, e.g. "/latest".
    #[serde(default = "default_location")]
    pub location: String,
    pub scroll: ScrollConfig,
    pub fetch: FetchConfig,
    pub harness: HarnessConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ScrollConfig {
    #[serde(default = "default_threshold_px")]
    pub threshold_px: f64,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FetchConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct HarnessConfig {
    /// Stop after this many pages even if the server has more.
    pub max_pages: Option<u32>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Directory for the rolling log file; "logs" when unset.
    pub log_directory: Option<String>,
    /// Per-module level overrides, appended to the base filter.
    pub module_levels: HashMap<String, String>,
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_location() -> String {
    "/".to_string()
}

fn default_threshold_px() -> f64 {
    SCROLL_THRESHOLD_PX
}

fn default_tick_interval_ms() -> u64 {
    TICK_INTERVAL_MS
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    500
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            location: default_location(),
            scroll: ScrollConfig::default(),
            fetch: FetchConfig::default(),
            harness: HarnessConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            threshold_px: default_threshold_px(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_directory: None,
            module_levels: HashMap::new(),
        }
    }
}

impl AppConfig {
    /// Look for config.ron in the current directory, then next to the
    /// executable. Missing or unparsable files fall back to defaults.
    pub fn load() -> Self {
        let mut candidates = Vec::new();
        candidates.push(PathBuf::from("config.ron"));
        if let Ok(exe) = std::env::current_exe()
            && let Some(dir) = exe.parent()
        {
            candidates.push(dir.join("config.ron"));
        }

        for path in candidates {
            if path.exists()
                && let Ok(content) = fs::read_to_string(&path)
            {
                match ron::from_str::<AppConfig>(&content) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {}", path.display());
                        return config;
                    }
                    Err(e) => {
                        tracing::error!("Failed to parse config at {}: {}", path.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Self::default()
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            threshold_px: self.scroll.threshold_px,
            tick_interval: Duration::from_millis(self.scroll.tick_interval_ms),
            max_pages: self.harness.max_pages,
        }
    }

    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            timeout: Duration::from_secs(self.fetch.timeout_secs),
            max_retries: self.fetch.max_retries,
            backoff_base: Duration::from_millis(self.fetch.backoff_ms),
        }
    }
}
