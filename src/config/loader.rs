// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::{
    DEFAULT_LOG_LEVEL, DEFAULT_REGISTRATION_TIMEOUT_SECONDS, DEFAULT_SHUTDOWN_PAUSE_MS,
    DEFAULT_STAGE_TIMEOUT_SECONDS,
};
use crate::engine::{CoordinatorOptions, DriverOptions};
use crate::errors::ConfigError;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Top-level configuration of a cluster run.
///
/// Every field is optional; an empty document yields [`Config::default`].
///
/// # Fields
/// * `workers` - Number of in-process compute workers (defaults to the available parallelism)
/// * `log_level` - `tracing` filter directive used when `RUST_LOG` is unset
/// * `coordinator` - Coordinator behaviour
/// * `driver` - Stage driver timing
///
/// # Example
/// ```yaml
/// workers: 8
/// log_level: "the_octopus=debug,info"
/// coordinator:
///   abort_policy: broadcast
///   shutdown_pause_ms: 1000
/// driver:
///   stage_timeout_seconds: 3600
///   min_workers: 8
///   registration_timeout_seconds: 30
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub coordinator: CoordinatorConfig,
    #[serde(default)]
    pub driver: DriverConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            log_level: default_log_level(),
            coordinator: CoordinatorConfig::default(),
            driver: DriverConfig::default(),
        }
    }
}

impl Config {
    pub fn coordinator_options(&self) -> CoordinatorOptions {
        CoordinatorOptions {
            abort_policy: self.coordinator.abort_policy,
            shutdown_pause: Duration::from_millis(self.coordinator.shutdown_pause_ms),
        }
    }

    /// `min_workers` falls back to the size of the configured pool.
    pub fn driver_options(&self) -> DriverOptions {
        DriverOptions {
            stage_timeout: Duration::from_secs(self.driver.stage_timeout_seconds),
            min_workers: self.driver.min_workers.unwrap_or(self.workers),
            registration_timeout: Duration::from_secs(self.driver.registration_timeout_seconds),
        }
    }
}

/// Which workers receive an abort once the Linear stage is solved.
///
/// # Variants
/// * `Broadcast` - Every registered worker, so in-flight searches stop early
/// * `IdleOnly` - Only workers that are idle at that moment
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AbortPolicy {
    #[default]
    Broadcast,
    IdleOnly,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CoordinatorConfig {
    #[serde(default)]
    pub abort_policy: AbortPolicy,
    #[serde(default = "default_shutdown_pause_ms")]
    pub shutdown_pause_ms: u64,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            abort_policy: AbortPolicy::default(),
            shutdown_pause_ms: DEFAULT_SHUTDOWN_PAUSE_MS,
        }
    }
}

/// Timing knobs of the stage driver.
///
/// # Fields
/// * `stage_timeout_seconds` - Upper bound on a single stage
/// * `min_workers` - Workers that must register before the first dispatch (optional)
/// * `registration_timeout_seconds` - How long to wait for them
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DriverConfig {
    #[serde(default = "default_stage_timeout_seconds")]
    pub stage_timeout_seconds: u64,
    #[serde(default)]
    pub min_workers: Option<usize>,
    #[serde(default = "default_registration_timeout_seconds")]
    pub registration_timeout_seconds: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            stage_timeout_seconds: DEFAULT_STAGE_TIMEOUT_SECONDS,
            min_workers: None,
            registration_timeout_seconds: DEFAULT_REGISTRATION_TIMEOUT_SECONDS,
        }
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_shutdown_pause_ms() -> u64 {
    DEFAULT_SHUTDOWN_PAUSE_MS
}

fn default_stage_timeout_seconds() -> u64 {
    DEFAULT_STAGE_TIMEOUT_SECONDS
}

fn default_registration_timeout_seconds() -> u64 {
    DEFAULT_REGISTRATION_TIMEOUT_SECONDS
}

/// Parse a config from YAML text. Blank input yields the defaults.
pub fn parse_config(yaml: &str) -> Result<Config, ConfigError> {
    if yaml.trim().is_empty() {
        return Ok(Config::default());
    }
    Ok(serde_yaml::from_str(yaml)?)
}

/// Load a config from a YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content)
}

/// Load and validate a config from a YAML file
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let cfg = load_config(path)?;
    crate::config::validate_config(&cfg).map_err(ConfigError::Invalid)?;
    Ok(cfg)
}
