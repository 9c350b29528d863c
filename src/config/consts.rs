// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Number of records in the shipped data set.
pub const RECORD_COUNT: usize = 42;

/// Inclusive upper bound of the Secrets search space.
pub const SECRETS_UPPER_BOUND: u64 = 1_000_000;
/// Inclusive upper bound of the Linear search space (`2^43 - 1`).
pub const LINEAR_UPPER_BOUND: u64 = (1 << 43) - 1;
/// Sign positions decoded from a Linear candidate, lowest bit first.
pub const SIGN_POSITIONS: usize = 42;

/// Length of the digest prefix the Hash stage has to hit.
pub const HASH_PREFIX_LEN: usize = 5;

pub const ADDRESS_SCHEME: &str = "octopus";
pub const SYSTEM_NAME: &str = "octopus";
pub const COORDINATOR_NAME: &str = "master";
pub const WORKER_NAME_PREFIX: &str = "worker";

pub const DEFAULT_LOG_LEVEL: &str = "info";
/// Pause between consecutive `Stop` messages during shutdown.
pub const DEFAULT_SHUTDOWN_PAUSE_MS: u64 = 1_000;
pub const DEFAULT_STAGE_TIMEOUT_SECONDS: u64 = 3_600;
pub const DEFAULT_REGISTRATION_TIMEOUT_SECONDS: u64 = 30;
/// Interval at which the driver polls the coordinator while waiting for workers.
pub const STATUS_POLL_INTERVAL_MS: u64 = 50;
