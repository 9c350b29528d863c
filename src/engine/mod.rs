// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod coordinator;
pub mod driver;
pub mod partition;
pub mod progress;
pub mod runtime;
pub mod worker;
#[cfg(test)]
pub mod integration_tests;

pub use coordinator::{Coordinator, CoordinatorOptions};
pub use driver::{DriverOptions, PipelineDriver, PipelineReport};
pub use partition::partition;
pub use progress::{Absorbed, LinearState, StageProgress};
pub use runtime::ClusterRuntime;
pub use worker::Worker;
