// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use tokio::sync::oneshot;

use super::{Chunk, DispatchId, PartialResult, Stage, StageInput, StageOutput, StageRequest};
use crate::cluster::{NodeAddress, WorkerHandle};
use crate::engine::LinearState;
use crate::errors::DispatchError;

/// Reply channel for a stage dispatch.
pub type DispatchReply = oneshot::Sender<Result<StageOutput, DispatchError>>;

/// Mailbox protocol of a compute worker.
#[derive(Debug)]
pub enum WorkerMessage {
    /// Process one chunk. Requests queue up in arrival order.
    Compute(StageRequest),
    /// Abandon the Linear search belonging to `dispatch` (and anything older).
    Abort { dispatch: DispatchId },
    /// Stop the actor. Whatever chunk is running is abandoned.
    Stop,
}

/// Mailbox protocol of the coordinator.
#[derive(Debug)]
pub enum CoordinatorMessage {
    Register {
        worker: WorkerHandle,
    },
    Dispatch {
        input: StageInput,
        reply: DispatchReply,
    },
    Partial {
        dispatch: DispatchId,
        worker: NodeAddress,
        result: PartialResult,
    },
    /// Sent by a worker once a chunk has been fully processed (or aborted).
    ChunkFinished {
        dispatch: DispatchId,
        worker: NodeAddress,
        chunk: Chunk,
    },
    WorkerTerminated {
        worker: NodeAddress,
    },
    Status {
        reply: oneshot::Sender<CoordinatorStatus>,
    },
    Shutdown,
}

/// Point-in-time view of the coordinator, answered to `Status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorStatus {
    /// Routable slots, duplicates included.
    pub registered: usize,
    pub idle: usize,
    pub in_flight: Option<Stage>,
    /// Chunks waiting for an idle worker.
    pub unassigned: usize,
    pub linear: LinearState,
}
