// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use crate::backends::local::Sha256Hash;
use crate::config::Config;
use crate::engine::ClusterRuntime;
use crate::traits::HashFunction;

/// Cluster runtime builder - starts a complete in-process cluster from configuration.
///
/// # Examples
///
/// ```
/// use the_octopus::config::{Config, RuntimeBuilder};
///
/// # tokio_test_block(async {
/// let config = Config { workers: 2, ..Config::default() };
/// let runtime = RuntimeBuilder::from_config(&config);
/// runtime.driver().await_workers().await.unwrap();
///
/// runtime.shutdown();
/// runtime.terminated().await;
/// assert!(runtime.is_terminated());
/// # });
/// # fn tokio_test_block<F: std::future::Future>(future: F) -> F::Output {
/// #     tokio::runtime::Runtime::new().unwrap().block_on(future)
/// # }
/// ```
pub struct RuntimeBuilder;

impl RuntimeBuilder {
    /// Build a cluster that hashes with SHA-256.
    ///
    /// Must be called from within a tokio runtime.
    pub fn from_config(cfg: &Config) -> ClusterRuntime {
        Self::with_hash(cfg, Arc::new(Sha256Hash))
    }

    /// Build a cluster around a caller-supplied hash capability.
    pub fn with_hash(cfg: &Config, hash: Arc<dyn HashFunction>) -> ClusterRuntime {
        ClusterRuntime::start(
            cfg.workers,
            cfg.coordinator_options(),
            cfg.driver_options(),
            hash,
        )
    }
}
