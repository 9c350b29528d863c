// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for worker lifecycle and kernel execution.

use crate::cluster::NodeAddress;
use crate::observability::messages::StructuredLog;
use crate::protocol::{Chunk, DispatchId, RecordId, Stage};
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tokio::task::JoinError;
use tracing::Span;

/// # Log Level
/// `debug!` - Lifecycle detail
pub struct WorkerStarted<'a> {
    pub worker: &'a NodeAddress,
    pub hash: &'a str,
}

impl Display for WorkerStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Worker {} started with {} hashing", self.worker, self.hash)
    }
}

impl StructuredLog for WorkerStarted<'_> {
    fn log(&self) {
        tracing::debug!(worker = %self.worker, hash = self.hash, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "worker",
            span_name = name,
            worker = %self.worker,
            hash = self.hash,
        )
    }
}

/// # Log Level
/// `info!` - Important operational event
pub struct WorkerStopped<'a> {
    pub worker: &'a NodeAddress,
}

impl Display for WorkerStopped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Worker {} stopped", self.worker)
    }
}

impl StructuredLog for WorkerStopped<'_> {
    fn log(&self) {
        tracing::info!(worker = %self.worker, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("worker_stopped", span_name = name, worker = %self.worker)
    }
}

/// A worker announced itself to a coordinator that came up.
///
/// # Log Level
/// `info!` - Important operational event
pub struct RegistrationSent<'a> {
    pub worker: &'a NodeAddress,
    pub coordinator: &'a NodeAddress,
}

impl Display for RegistrationSent<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Worker {} registered with coordinator {}",
            self.worker, self.coordinator
        )
    }
}

impl StructuredLog for RegistrationSent<'_> {
    fn log(&self) {
        tracing::info!(
            worker = %self.worker,
            coordinator = %self.coordinator,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "registration",
            span_name = name,
            worker = %self.worker,
            coordinator = %self.coordinator,
        )
    }
}

/// A coordinator came up but its mailbox could not be resolved.
///
/// # Log Level
/// `warn!` - The worker stays unregistered with that coordinator
pub struct CoordinatorUnresolved<'a> {
    pub worker: &'a NodeAddress,
    pub coordinator: &'a NodeAddress,
}

impl Display for CoordinatorUnresolved<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Worker {} could not resolve coordinator {}",
            self.worker, self.coordinator
        )
    }
}

impl StructuredLog for CoordinatorUnresolved<'_> {
    fn log(&self) {
        tracing::warn!(
            worker = %self.worker,
            coordinator = %self.coordinator,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "coordinator_unresolved",
            span_name = name,
            worker = %self.worker,
            coordinator = %self.coordinator,
        )
    }
}

/// # Log Level
/// `debug!` - Per-dispatch detail
pub struct AbortReceived<'a> {
    pub worker: &'a NodeAddress,
    pub dispatch: DispatchId,
}

impl Display for AbortReceived<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Worker {} told to abort {}", self.worker, self.dispatch)
    }
}

impl StructuredLog for AbortReceived<'_> {
    fn log(&self) {
        tracing::debug!(worker = %self.worker, dispatch = self.dispatch.0, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "abort_received",
            span_name = name,
            worker = %self.worker,
            dispatch = self.dispatch.0,
        )
    }
}

/// A worker began running a stage kernel over a chunk.
///
/// The span built from this message wraps the blocking kernel so every
/// event the kernel logs carries the worker and chunk.
///
/// # Log Level
/// `debug!` - Per-chunk detail
///
/// # Example
/// ```
/// use the_octopus::cluster::NodeAddress;
/// use the_octopus::observability::messages::worker::KernelStarted;
/// use the_octopus::observability::messages::StructuredLog;
/// use the_octopus::protocol::{Chunk, DispatchId, Stage};
///
/// let worker = NodeAddress::new("octopus://octopus/user/worker1");
/// let msg = KernelStarted {
///     worker: &worker,
///     stage: Stage::Secrets,
///     dispatch: DispatchId(3),
///     chunk: Chunk::new(0, 499_999),
/// };
///
/// let span = msg.span("kernel");
/// let _entered = span.enter();
/// msg.log();
/// ```
pub struct KernelStarted<'a> {
    pub worker: &'a NodeAddress,
    pub stage: Stage,
    pub dispatch: DispatchId,
    pub chunk: Chunk,
}

impl Display for KernelStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Worker {} running {} over {} for {}",
            self.worker, self.stage, self.chunk, self.dispatch
        )
    }
}

impl StructuredLog for KernelStarted<'_> {
    fn log(&self) {
        tracing::debug!(
            worker = %self.worker,
            stage = %self.stage,
            dispatch = self.dispatch.0,
            chunk = %self.chunk,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "kernel",
            span_name = name,
            worker = %self.worker,
            stage = %self.stage,
            dispatch = self.dispatch.0,
            chunk = %self.chunk,
        )
    }
}

/// # Log Level
/// `debug!` - Per-chunk detail
pub struct KernelFinished<'a> {
    pub worker: &'a NodeAddress,
    pub stage: Stage,
    pub reported: usize,
    pub duration: Duration,
}

impl Display for KernelFinished<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Worker {} finished {} chunk: {} results in {:?}",
            self.worker, self.stage, self.reported, self.duration
        )
    }
}

impl StructuredLog for KernelFinished<'_> {
    fn log(&self) {
        tracing::debug!(
            worker = %self.worker,
            stage = %self.stage,
            reported = self.reported,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "kernel_finished",
            span_name = name,
            worker = %self.worker,
            stage = %self.stage,
            reported = self.reported,
            duration = ?self.duration,
        )
    }
}

/// The blocking kernel task panicked or was cancelled.
///
/// # Log Level
/// `error!` - The chunk produced no further results
pub struct KernelFailed<'a> {
    pub worker: &'a NodeAddress,
    pub stage: Stage,
    pub error: &'a JoinError,
}

impl Display for KernelFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Worker {} {} kernel failed: {}",
            self.worker, self.stage, self.error
        )
    }
}

impl StructuredLog for KernelFailed<'_> {
    fn log(&self) {
        tracing::error!(
            worker = %self.worker,
            stage = %self.stage,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "kernel_failed",
            span_name = name,
            worker = %self.worker,
            stage = %self.stage,
            error = %self.error,
        )
    }
}

/// A stop arrived while a kernel was running.
///
/// # Log Level
/// `warn!` - Work in progress is dropped
pub struct ChunkAbandoned<'a> {
    pub worker: &'a NodeAddress,
    pub stage: Stage,
    pub chunk: Chunk,
}

impl Display for ChunkAbandoned<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Worker {} stopping mid-chunk, abandoning {} {}",
            self.worker, self.stage, self.chunk
        )
    }
}

impl StructuredLog for ChunkAbandoned<'_> {
    fn log(&self) {
        tracing::warn!(
            worker = %self.worker,
            stage = %self.stage,
            chunk = %self.chunk,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "chunk_abandoned",
            span_name = name,
            worker = %self.worker,
            stage = %self.stage,
            chunk = %self.chunk,
        )
    }
}

/// A sequence has no other record to compare against.
///
/// # Log Level
/// `warn!` - The record gets no partner
pub struct PartnerUnavailable {
    pub id: RecordId,
}

impl Display for PartnerUnavailable {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "No partner candidate for record {}", self.id)
    }
}

impl StructuredLog for PartnerUnavailable {
    fn log(&self) {
        tracing::warn!(id = self.id.value(), "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("partner_unavailable", span_name = name, id = self.id.value())
    }
}

/// A record in the hash chunk has no sign to pick its prefix.
///
/// # Log Level
/// `warn!` - The record is skipped
pub struct SignUnavailable {
    pub id: RecordId,
}

impl Display for SignUnavailable {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "No sign for record {}, skipping", self.id)
    }
}

impl StructuredLog for SignUnavailable {
    fn log(&self) {
        tracing::warn!(id = self.id.value(), "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("sign_unavailable", span_name = name, id = self.id.value())
    }
}
