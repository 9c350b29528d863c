// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::time::Duration;
use thiserror::Error;

use super::DispatchError;
use crate::protocol::Stage;

/// Failures surfaced to whoever drives the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error("{stage} stage did not complete within {timeout:?}")]
    StageTimeout { stage: Stage, timeout: Duration },
    /// The coordinator mailbox is closed or it dropped the reply channel.
    #[error("coordinator is not reachable")]
    CoordinatorUnavailable,
    #[error("only {registered} of {expected} workers registered within {waited:?}")]
    WorkersUnavailable {
        expected: usize,
        registered: usize,
        waited: Duration,
    },
    #[error("coordinator answered the {expected} stage with a {actual} result")]
    UnexpectedOutput { expected: Stage, actual: Stage },
}
