// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Semantic checks applied after a config has been parsed.
//!
//! All checks run and every failure is reported, so a broken file can be
//! fixed in one pass.

use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::errors::ValidationError;

pub fn validate_config(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.workers == 0 {
        errors.push(ValidationError::NoWorkers);
    }

    if config.driver.stage_timeout_seconds == 0 {
        errors.push(ValidationError::ZeroStageTimeout);
    }

    if let Some(min_workers) = config.driver.min_workers {
        if min_workers > config.workers {
            errors.push(ValidationError::MinWorkersExceedPool {
                min_workers,
                workers: config.workers,
            });
        }
    }

    if EnvFilter::try_new(&config.log_level).is_err() {
        errors.push(ValidationError::InvalidLogLevel {
            level: config.log_level.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_collects_every_failure() {
        let cfg = parse_config(
            r#"
workers: 2
log_level: "the_octopus=loud"
driver:
  stage_timeout_seconds: 0
  min_workers: 5
"#,
        )
        .unwrap();

        let errors = validate_config(&cfg).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ValidationError::ZeroStageTimeout));
        assert!(errors.contains(&ValidationError::MinWorkersExceedPool {
            min_workers: 5,
            workers: 2
        }));
        assert!(errors.contains(&ValidationError::InvalidLogLevel {
            level: "the_octopus=loud".to_string()
        }));
    }

    #[test]
    fn test_directive_style_log_level_is_accepted() {
        let cfg = parse_config("log_level: \"the_octopus=debug,info\"\n").unwrap();
        assert!(validate_config(&cfg).is_ok());
    }
}
