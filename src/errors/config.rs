// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::path::PathBuf;
use thiserror::Error;

/// Problems found while validating a parsed configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The in-process pool must contain at least one worker.
    #[error("workers must be at least 1")]
    NoWorkers,
    #[error("driver.stage_timeout_seconds must be greater than zero")]
    ZeroStageTimeout,
    /// The driver would wait for workers that can never join.
    #[error("driver.min_workers ({min_workers}) exceeds the configured pool of {workers} workers")]
    MinWorkersExceedPool { min_workers: usize, workers: usize },
    #[error("log_level '{level}' is not a valid filter directive")]
    InvalidLogLevel { level: String },
}

/// Errors raised while loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("configuration validation failed: {}", join_errors(.0))]
    Invalid(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
