// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the coordinator.
//!
//! This module contains message types for logging events related to:
//! * Worker registration and loss
//! * Stage dispatch and chunk assignment
//! * Result merging and stage completion
//! * Shutdown

use crate::cluster::NodeAddress;
use crate::config::AbortPolicy;
use crate::errors::DispatchError;
use crate::observability::messages::StructuredLog;
use crate::protocol::{Chunk, DispatchId, Stage};
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// Coordinator actor is running.
///
/// # Log Level
/// `info!` - Important operational event
pub struct CoordinatorStarted<'a> {
    pub address: &'a NodeAddress,
}

impl Display for CoordinatorStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Coordinator started at {}", self.address)
    }
}

impl StructuredLog for CoordinatorStarted<'_> {
    fn log(&self) {
        tracing::info!(address = %self.address, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("coordinator", span_name = name, address = %self.address)
    }
}

/// Coordinator actor has exited its loop.
///
/// # Log Level
/// `info!` - Important operational event
pub struct CoordinatorStopped<'a> {
    pub address: &'a NodeAddress,
}

impl Display for CoordinatorStopped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Coordinator at {} stopped", self.address)
    }
}

impl StructuredLog for CoordinatorStopped<'_> {
    fn log(&self) {
        tracing::info!(address = %self.address, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("coordinator_stopped", span_name = name, address = %self.address)
    }
}

/// A worker registered and got a routing slot.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_octopus::cluster::NodeAddress;
/// use the_octopus::observability::messages::coordinator::WorkerRegistered;
///
/// let worker = NodeAddress::new("octopus://octopus/user/worker0");
/// let msg = WorkerRegistered { worker: &worker, routable: 3, idle: 2 };
///
/// tracing::info!("{}", msg);
/// ```
pub struct WorkerRegistered<'a> {
    pub worker: &'a NodeAddress,
    pub routable: usize,
    pub idle: usize,
}

impl Display for WorkerRegistered<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Worker {} registered: {} routable slots, {} idle",
            self.worker, self.routable, self.idle
        )
    }
}

impl StructuredLog for WorkerRegistered<'_> {
    fn log(&self) {
        tracing::info!(
            worker = %self.worker,
            routable = self.routable,
            idle = self.idle,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "worker_registered",
            span_name = name,
            worker = %self.worker,
            routable = self.routable,
            idle = self.idle,
        )
    }
}

/// The same worker registered more than once. Each registration is routable.
///
/// # Log Level
/// `warn!` - Unexpected but tolerated
pub struct DuplicateRegistration<'a> {
    pub worker: &'a NodeAddress,
    pub slots: usize,
}

impl Display for DuplicateRegistration<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Worker {} registered again; it now occupies an extra slot ({} total)",
            self.worker, self.slots
        )
    }
}

impl StructuredLog for DuplicateRegistration<'_> {
    fn log(&self) {
        tracing::warn!(worker = %self.worker, slots = self.slots, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "duplicate_registration",
            span_name = name,
            worker = %self.worker,
            slots = self.slots,
        )
    }
}

/// A stage dispatch was refused.
///
/// # Log Level
/// `warn!` - The requester receives the error
pub struct DispatchRejected<'a> {
    pub stage: Stage,
    pub error: &'a DispatchError,
}

impl Display for DispatchRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Rejected {} dispatch: {}", self.stage, self.error)
    }
}

impl StructuredLog for DispatchRejected<'_> {
    fn log(&self) {
        tracing::warn!(stage = %self.stage, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "dispatch_rejected",
            span_name = name,
            stage = %self.stage,
            error = %self.error,
        )
    }
}

/// A stage was accepted and partitioned.
///
/// # Log Level
/// `info!` - Important operational event
pub struct StageDispatched {
    pub stage: Stage,
    pub dispatch: DispatchId,
    pub records: usize,
    pub chunks: usize,
}

impl Display for StageDispatched {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Dispatching {} stage {}: {} records in {} chunks",
            self.stage, self.dispatch, self.records, self.chunks
        )
    }
}

impl StructuredLog for StageDispatched {
    fn log(&self) {
        tracing::info!(
            stage = %self.stage,
            dispatch = self.dispatch.0,
            records = self.records,
            chunks = self.chunks,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "stage_dispatch",
            span_name = name,
            stage = %self.stage,
            dispatch = self.dispatch.0,
            records = self.records,
            chunks = self.chunks,
        )
    }
}

/// A chunk was handed to a worker.
///
/// # Log Level
/// `debug!` - Per-chunk detail
pub struct ChunkAssigned<'a> {
    pub stage: Stage,
    pub dispatch: DispatchId,
    pub worker: &'a NodeAddress,
    pub chunk: Chunk,
}

impl Display for ChunkAssigned<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Assigned {} chunk {} of {} to {}",
            self.stage, self.chunk, self.dispatch, self.worker
        )
    }
}

impl StructuredLog for ChunkAssigned<'_> {
    fn log(&self) {
        tracing::debug!(
            stage = %self.stage,
            dispatch = self.dispatch.0,
            worker = %self.worker,
            chunk = %self.chunk,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "chunk_assigned",
            span_name = name,
            stage = %self.stage,
            dispatch = self.dispatch.0,
            worker = %self.worker,
            chunk = %self.chunk,
        )
    }
}

/// Chunks are pending but no worker is idle.
///
/// # Log Level
/// `warn!` - Progress is stalled until a worker frees up or registers
pub struct AwaitingWorkers {
    pub stage: Stage,
    pub pending: usize,
}

impl Display for AwaitingWorkers {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} stage has {} unassigned chunks and no idle worker",
            self.stage, self.pending
        )
    }
}

impl StructuredLog for AwaitingWorkers {
    fn log(&self) {
        tracing::warn!(stage = %self.stage, pending = self.pending, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "awaiting_workers",
            span_name = name,
            stage = %self.stage,
            pending = self.pending,
        )
    }
}

/// A result arrived for a dispatch that is no longer in flight.
///
/// # Log Level
/// `debug!` - Expected after early completion
pub struct ResultDiscarded<'a> {
    pub stage: Stage,
    pub dispatch: DispatchId,
    pub worker: &'a NodeAddress,
}

impl Display for ResultDiscarded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Discarding late {} result of {} from {}",
            self.stage, self.dispatch, self.worker
        )
    }
}

impl StructuredLog for ResultDiscarded<'_> {
    fn log(&self) {
        tracing::debug!(
            stage = %self.stage,
            dispatch = self.dispatch.0,
            worker = %self.worker,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "result_discarded",
            span_name = name,
            stage = %self.stage,
            dispatch = self.dispatch.0,
            worker = %self.worker,
        )
    }
}

/// A result for an already resolved record; the first value is kept.
///
/// # Log Level
/// `debug!` - Harmless
pub struct DuplicateResult<'a> {
    pub stage: Stage,
    pub dispatch: DispatchId,
    pub worker: &'a NodeAddress,
}

impl Display for DuplicateResult<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Ignoring duplicate {} result of {} from {}",
            self.stage, self.dispatch, self.worker
        )
    }
}

impl StructuredLog for DuplicateResult<'_> {
    fn log(&self) {
        tracing::debug!(
            stage = %self.stage,
            dispatch = self.dispatch.0,
            worker = %self.worker,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "duplicate_result",
            span_name = name,
            stage = %self.stage,
            dispatch = self.dispatch.0,
            worker = %self.worker,
        )
    }
}

/// The Linear stage accepted a sign assignment and sent aborts.
///
/// # Log Level
/// `info!` - Important operational event
pub struct LinearSolved<'a> {
    pub dispatch: DispatchId,
    pub worker: &'a NodeAddress,
    pub aborted: usize,
    pub policy: AbortPolicy,
}

impl Display for LinearSolved<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Linear stage {} solved by {}; abort sent to {} workers ({:?})",
            self.dispatch, self.worker, self.aborted, self.policy
        )
    }
}

impl StructuredLog for LinearSolved<'_> {
    fn log(&self) {
        tracing::info!(
            dispatch = self.dispatch.0,
            worker = %self.worker,
            aborted = self.aborted,
            policy = ?self.policy,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "linear_solved",
            span_name = name,
            dispatch = self.dispatch.0,
            worker = %self.worker,
            aborted = self.aborted,
            policy = ?self.policy,
        )
    }
}

/// A stage met its completion condition and was released.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_octopus::observability::messages::coordinator::StageCompleted;
/// use the_octopus::protocol::{DispatchId, Stage};
/// use std::time::Duration;
///
/// let msg = StageCompleted {
///     stage: Stage::Secrets,
///     dispatch: DispatchId(1),
///     results: 42,
///     duration: Duration::from_millis(900),
/// };
///
/// assert!(msg.to_string().starts_with("secrets stage #1 completed"));
/// ```
pub struct StageCompleted {
    pub stage: Stage,
    pub dispatch: DispatchId,
    pub results: usize,
    pub duration: Duration,
}

impl Display for StageCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} stage {} completed with {} results in {:?}",
            self.stage, self.dispatch, self.results, self.duration
        )
    }
}

impl StructuredLog for StageCompleted {
    fn log(&self) {
        tracing::info!(
            stage = %self.stage,
            dispatch = self.dispatch.0,
            results = self.results,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "stage_completed",
            span_name = name,
            stage = %self.stage,
            dispatch = self.dispatch.0,
            results = self.results,
            duration = ?self.duration,
        )
    }
}

/// Every chunk came back and the stage is still unsatisfied.
///
/// # Log Level
/// `warn!` - The requester receives `StageIncomplete`
pub struct StageExhausted {
    pub stage: Stage,
    pub dispatch: DispatchId,
    pub resolved: usize,
    pub expected: usize,
}

impl Display for StageExhausted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} stage {} exhausted its search space: {} of {} resolved",
            self.stage, self.dispatch, self.resolved, self.expected
        )
    }
}

impl StructuredLog for StageExhausted {
    fn log(&self) {
        tracing::warn!(
            stage = %self.stage,
            dispatch = self.dispatch.0,
            resolved = self.resolved,
            expected = self.expected,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "stage_exhausted",
            span_name = name,
            stage = %self.stage,
            dispatch = self.dispatch.0,
            resolved = self.resolved,
            expected = self.expected,
        )
    }
}

/// The requester of the stage in flight stopped waiting; the stage is
/// dropped so a new dispatch can take its place.
///
/// # Log Level
/// `warn!` - Usually follows a driver-side timeout
pub struct StaleDispatchDropped {
    pub stage: Stage,
    pub dispatch: DispatchId,
    pub outstanding: usize,
}

impl Display for StaleDispatchDropped {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Dropping abandoned {} stage {} with {} chunks outstanding",
            self.stage, self.dispatch, self.outstanding
        )
    }
}

impl StructuredLog for StaleDispatchDropped {
    fn log(&self) {
        tracing::warn!(
            stage = %self.stage,
            dispatch = self.dispatch.0,
            outstanding = self.outstanding,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "stale_dispatch_dropped",
            span_name = name,
            stage = %self.stage,
            dispatch = self.dispatch.0,
            outstanding = self.outstanding,
        )
    }
}

/// A worker went away; its chunks went back to the queue.
///
/// # Log Level
/// `warn!` - Capacity lost
pub struct WorkerLost<'a> {
    pub worker: &'a NodeAddress,
    pub requeued: usize,
    pub remaining: usize,
}

impl Display for WorkerLost<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Lost worker {}: requeued {} chunks, {} slots remain",
            self.worker, self.requeued, self.remaining
        )
    }
}

impl StructuredLog for WorkerLost<'_> {
    fn log(&self) {
        tracing::warn!(
            worker = %self.worker,
            requeued = self.requeued,
            remaining = self.remaining,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "worker_lost",
            span_name = name,
            worker = %self.worker,
            requeued = self.requeued,
            remaining = self.remaining,
        )
    }
}

/// Shutdown began.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ShutdownStarted {
    pub workers: usize,
}

impl Display for ShutdownStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Shutting down: stopping {} workers", self.workers)
    }
}

impl StructuredLog for ShutdownStarted {
    fn log(&self) {
        tracing::info!(workers = self.workers, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("shutdown", span_name = name, workers = self.workers)
    }
}

/// # Log Level
/// `debug!` - Per-worker detail
pub struct StopSent<'a> {
    pub worker: &'a NodeAddress,
}

impl Display for StopSent<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Sent stop to {}", self.worker)
    }
}

impl StructuredLog for StopSent<'_> {
    fn log(&self) {
        tracing::debug!(worker = %self.worker, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("stop_sent", span_name = name, worker = %self.worker)
    }
}
