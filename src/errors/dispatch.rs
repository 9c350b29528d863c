// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

use crate::protocol::Stage;

/// Reasons the coordinator refuses or fails a stage dispatch.
///
/// These travel back to the requester over the dispatch reply channel, which
/// is why the type is `Clone`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// No routable worker at dispatch time; the stage is not started.
    #[error("cannot dispatch {stage} stage: no workers are registered")]
    NoWorkersAvailable { stage: Stage },
    /// Only one stage is in flight at a time.
    #[error("cannot dispatch {requested} stage while {current} stage is in flight")]
    StageInFlight { current: Stage, requested: Stage },
    #[error("cannot dispatch {stage} stage: the input domain is empty")]
    EmptyDomain { stage: Stage },
    /// Every chunk reported back without satisfying the completion condition.
    #[error("{stage} stage exhausted its search space with {resolved} of {expected} results")]
    StageIncomplete {
        stage: Stage,
        resolved: usize,
        expected: usize,
    },
}
