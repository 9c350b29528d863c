// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The coordinator actor.
//!
//! Owns the worker pool, partitions each dispatched stage into chunks,
//! hands chunks to idle workers, merges the partial results and answers the
//! requester once the stage's completion condition holds.
//!
//! # Chunk lifecycle
//!
//! ```text
//! unassigned --(idle worker)--> assigned --(ChunkFinished)--> done
//!                 ^                 |
//!                 +--(worker lost)--+
//! ```
//!
//! Exactly one stage is in flight at a time. Requests for a second stage are
//! refused rather than queued, unless the requester of the current one has
//! stopped waiting; that stage is then dropped and its workers aborted.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use crate::cluster::{
    CoordinatorHandle, MembershipEvent, NodeAddress, Role, WatchGuard, WorkerHandle, WorkerPool,
};
use crate::config::AbortPolicy;
use crate::engine::partition;
use crate::engine::progress::{Absorbed, LinearState, StageProgress};
use crate::errors::DispatchError;
use crate::observability::messages::coordinator::{
    AwaitingWorkers, ChunkAssigned, CoordinatorStarted, CoordinatorStopped, DispatchRejected,
    DuplicateRegistration, DuplicateResult, LinearSolved, ResultDiscarded, ShutdownStarted,
    StaleDispatchDropped,
    StageCompleted, StageDispatched, StageExhausted, StopSent, WorkerLost, WorkerRegistered,
};
use crate::observability::messages::StructuredLog;
use crate::protocol::{
    Chunk, CoordinatorMessage, CoordinatorStatus, DispatchId, DispatchReply, PartialResult,
    Stage, StageInput, StageRequest, WorkerMessage,
};

#[derive(Debug, Clone)]
pub struct CoordinatorOptions {
    pub abort_policy: AbortPolicy,
    pub shutdown_pause: Duration,
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        Self {
            abort_policy: AbortPolicy::Broadcast,
            shutdown_pause: Duration::from_millis(crate::config::consts::DEFAULT_SHUTDOWN_PAUSE_MS),
        }
    }
}

struct InFlight {
    dispatch: DispatchId,
    input: Arc<StageInput>,
    progress: StageProgress,
    requester: DispatchReply,
    unassigned: VecDeque<Chunk>,
    assigned: Vec<(NodeAddress, Chunk)>,
    started: Instant,
}

enum Flow {
    Continue,
    Stop,
}

pub struct Coordinator {
    address: NodeAddress,
    handle: CoordinatorHandle,
    mailbox: mpsc::UnboundedReceiver<CoordinatorMessage>,
    events: mpsc::UnboundedReceiver<MembershipEvent>,
    options: CoordinatorOptions,
    pool: WorkerPool,
    next_dispatch: DispatchId,
    in_flight: Option<InFlight>,
    linear: LinearState,
    watch: Option<WatchGuard>,
}

impl Coordinator {
    /// Creates the actor and the handle used to reach it.
    ///
    /// `events` delivers membership changes; a `NodeDown` for a worker is
    /// treated like `WorkerTerminated`.
    pub fn new(
        address: NodeAddress,
        options: CoordinatorOptions,
        events: mpsc::UnboundedReceiver<MembershipEvent>,
    ) -> (Self, CoordinatorHandle) {
        let (tx, mailbox) = mpsc::unbounded_channel();
        let handle = CoordinatorHandle::new(address.clone(), tx);
        let coordinator = Self {
            address,
            handle: handle.clone(),
            mailbox,
            events,
            options,
            pool: WorkerPool::new(),
            next_dispatch: DispatchId(1),
            in_flight: None,
            linear: LinearState::Idle,
            watch: None,
        };
        (coordinator, handle)
    }

    /// Keeps `guard` alive for as long as the actor runs.
    pub fn with_watch(mut self, guard: WatchGuard) -> Self {
        self.watch = Some(guard);
        self
    }

    pub async fn run(mut self) {
        CoordinatorStarted {
            address: &self.address,
        }
        .log();

        loop {
            let flow = tokio::select! {
                message = self.mailbox.recv() => match message {
                    Some(message) => self.handle_message(message).await,
                    None => Flow::Stop,
                },
                Some(event) = self.events.recv() => {
                    self.handle_membership(event);
                    Flow::Continue
                }
            };
            if let Flow::Stop = flow {
                break;
            }
        }

        CoordinatorStopped {
            address: &self.address,
        }
        .log();
        drop(self.watch.take());
    }

    async fn handle_message(&mut self, message: CoordinatorMessage) -> Flow {
        match message {
            CoordinatorMessage::Register { worker } => self.handle_register(worker),
            CoordinatorMessage::Dispatch { input, reply } => self.handle_dispatch(input, reply),
            CoordinatorMessage::Partial {
                dispatch,
                worker,
                result,
            } => self.handle_partial(dispatch, &worker, result),
            CoordinatorMessage::ChunkFinished {
                dispatch,
                worker,
                chunk,
            } => self.handle_chunk_finished(dispatch, &worker, chunk),
            CoordinatorMessage::WorkerTerminated { worker } => self.handle_worker_lost(&worker),
            CoordinatorMessage::Status { reply } => {
                let _ = reply.send(self.status());
            }
            CoordinatorMessage::Shutdown => {
                self.handle_shutdown().await;
                return Flow::Stop;
            }
        }
        Flow::Continue
    }

    fn handle_membership(&mut self, event: MembershipEvent) {
        if let MembershipEvent::NodeDown {
            role: Role::Worker,
            address,
        } = event
        {
            self.handle_worker_lost(&address);
        }
    }

    fn handle_register(&mut self, worker: WorkerHandle) {
        let address = worker.address().clone();
        if self.pool.register(worker) {
            DuplicateRegistration {
                worker: &address,
                slots: self.pool.len(),
            }
            .log();
        }
        WorkerRegistered {
            worker: &address,
            routable: self.pool.len(),
            idle: self.pool.idle_count(),
        }
        .log();
        self.assign_pending();
    }

    fn handle_dispatch(&mut self, input: StageInput, reply: DispatchReply) {
        let stage = input.stage();
        if let Some(current) = &self.in_flight {
            if current.requester.is_closed() {
                self.drop_stale();
            } else {
                let error = DispatchError::StageInFlight {
                    current: current.progress.stage(),
                    requested: stage,
                };
                self.reject(stage, error, reply);
                return;
            }
        }

        let Some(space) = input.search_space() else {
            self.reject(stage, DispatchError::EmptyDomain { stage }, reply);
            return;
        };
        // One chunk per routable slot; slots still busy with an earlier
        // stage pick theirs up from the unassigned queue once free.
        let chunks = match partition(stage, space, self.pool.len()) {
            Ok(chunks) => chunks,
            Err(error) => {
                self.reject(stage, error, reply);
                return;
            }
        };

        let dispatch = self.next_dispatch;
        self.next_dispatch = dispatch.next();
        if stage == Stage::Linear {
            self.linear = LinearState::Searching(dispatch);
        }

        StageDispatched {
            stage,
            dispatch,
            records: input.record_count(),
            chunks: chunks.len(),
        }
        .log();

        self.in_flight = Some(InFlight {
            dispatch,
            progress: StageProgress::for_input(&input),
            input: Arc::new(input),
            requester: reply,
            unassigned: chunks.into(),
            assigned: Vec::new(),
            started: Instant::now(),
        });
        self.assign_pending();
    }

    /// Forgets the stage in flight and aborts the workers still holding its
    /// chunks. Their late results no longer match any dispatch.
    fn drop_stale(&mut self) {
        let Some(flight) = self.in_flight.take() else {
            return;
        };
        let stage = flight.progress.stage();
        if self.linear == LinearState::Searching(flight.dispatch) {
            self.linear = LinearState::Idle;
        }
        for worker in self.pool.workers() {
            if flight
                .assigned
                .iter()
                .any(|(owner, _)| owner == worker.address())
            {
                worker.tell(WorkerMessage::Abort {
                    dispatch: flight.dispatch,
                });
            }
        }
        StaleDispatchDropped {
            stage,
            dispatch: flight.dispatch,
            outstanding: flight.assigned.len() + flight.unassigned.len(),
        }
        .log();
    }

    fn reject(&self, stage: Stage, error: DispatchError, reply: DispatchReply) {
        DispatchRejected {
            stage,
            error: &error,
        }
        .log();
        let _ = reply.send(Err(error));
    }

    /// Hands unassigned chunks to idle workers until one of the two runs out.
    fn assign_pending(&mut self) {
        let Some(flight) = self.in_flight.as_mut() else {
            return;
        };

        let mut unreachable = Vec::new();
        while let Some(chunk) = flight.unassigned.pop_front() {
            let Some(worker) = self.pool.acquire_idle() else {
                flight.unassigned.push_front(chunk);
                break;
            };
            let request = StageRequest {
                dispatch: flight.dispatch,
                input: Arc::clone(&flight.input),
                chunk,
                reply_to: self.handle.clone(),
            };
            if worker.tell(WorkerMessage::Compute(request)) {
                ChunkAssigned {
                    stage: flight.progress.stage(),
                    dispatch: flight.dispatch,
                    worker: worker.address(),
                    chunk,
                }
                .log();
                flight.assigned.push((worker.address().clone(), chunk));
            } else {
                flight.unassigned.push_front(chunk);
                self.pool.remove(worker.address());
                unreachable.push(worker.address().clone());
            }
        }

        if !flight.unassigned.is_empty() && self.pool.idle_count() == 0 {
            AwaitingWorkers {
                stage: flight.progress.stage(),
                pending: flight.unassigned.len(),
            }
            .log();
        }

        for address in unreachable {
            self.handle_worker_lost(&address);
        }
    }

    fn handle_partial(&mut self, dispatch: DispatchId, worker: &NodeAddress, result: PartialResult) {
        let stage = result.stage();
        let current = self
            .in_flight
            .as_mut()
            .filter(|flight| flight.dispatch == dispatch);
        let Some(flight) = current else {
            ResultDiscarded {
                stage,
                dispatch,
                worker,
            }
            .log();
            return;
        };

        match flight.progress.absorb(result) {
            Absorbed::Accepted => {}
            Absorbed::Duplicate => DuplicateResult {
                stage,
                dispatch,
                worker,
            }
            .log(),
            Absorbed::Ignored => return,
        }

        if flight.progress.is_complete() {
            if stage == Stage::Linear {
                self.solve_linear(dispatch, worker);
            }
            self.finish_in_flight();
        }
    }

    fn solve_linear(&mut self, dispatch: DispatchId, solver: &NodeAddress) {
        self.linear = LinearState::Solved(dispatch);
        let targets = match self.options.abort_policy {
            AbortPolicy::Broadcast => self.pool.workers(),
            AbortPolicy::IdleOnly => self.pool.idle_workers(),
        };
        for worker in &targets {
            worker.tell(WorkerMessage::Abort { dispatch });
        }
        LinearSolved {
            dispatch,
            worker: solver,
            aborted: targets.len(),
            policy: self.options.abort_policy,
        }
        .log();
    }

    fn handle_chunk_finished(&mut self, dispatch: DispatchId, worker: &NodeAddress, chunk: Chunk) {
        self.pool.release(worker);
        if let Some(flight) = self
            .in_flight
            .as_mut()
            .filter(|flight| flight.dispatch == dispatch)
        {
            if let Some(position) = flight
                .assigned
                .iter()
                .position(|(owner, assigned)| owner == worker && *assigned == chunk)
            {
                flight.assigned.remove(position);
            }
        }
        self.assign_pending();
        self.release_if_exhausted();
    }

    /// Fails the stage when every chunk came back without completing it.
    fn release_if_exhausted(&mut self) {
        let exhausted = self.in_flight.as_ref().map_or(false, |flight| {
            !flight.progress.is_complete()
                && flight.assigned.is_empty()
                && flight.unassigned.is_empty()
        });
        if exhausted {
            self.finish_in_flight();
        }
    }

    fn finish_in_flight(&mut self) {
        let Some(flight) = self.in_flight.take() else {
            return;
        };
        let stage = flight.progress.stage();
        let resolved = flight.progress.resolved();
        let expected = flight.progress.expected();

        let outcome = match flight.progress.into_output() {
            Some(output) => {
                StageCompleted {
                    stage,
                    dispatch: flight.dispatch,
                    results: output.len(),
                    duration: flight.started.elapsed(),
                }
                .log();
                Ok(output)
            }
            None => {
                StageExhausted {
                    stage,
                    dispatch: flight.dispatch,
                    resolved,
                    expected,
                }
                .log();
                if stage == Stage::Linear {
                    self.linear = LinearState::Idle;
                }
                Err(DispatchError::StageIncomplete {
                    stage,
                    resolved,
                    expected,
                })
            }
        };
        let _ = flight.requester.send(outcome);
    }

    /// Drops every slot of `worker` and requeues the chunks it held.
    fn handle_worker_lost(&mut self, worker: &NodeAddress) {
        let removed = self.pool.remove(worker);
        let mut requeued = 0;
        if let Some(flight) = self.in_flight.as_mut() {
            let (lost, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut flight.assigned)
                .into_iter()
                .partition(|(owner, _)| owner == worker);
            flight.assigned = kept;
            requeued = lost.len();
            for (_, chunk) in lost {
                flight.unassigned.push_back(chunk);
            }
        }
        if removed == 0 && requeued == 0 {
            return;
        }
        WorkerLost {
            worker,
            requeued,
            remaining: self.pool.len(),
        }
        .log();
        self.assign_pending();
    }

    fn status(&self) -> CoordinatorStatus {
        CoordinatorStatus {
            registered: self.pool.len(),
            idle: self.pool.idle_count(),
            in_flight: self.in_flight.as_ref().map(|flight| flight.progress.stage()),
            unassigned: self
                .in_flight
                .as_ref()
                .map_or(0, |flight| flight.unassigned.len()),
            linear: self.linear,
        }
    }

    /// Sends `Stop` to every registered worker, pausing between sends.
    /// A stage still in flight is abandoned; its requester sees the reply
    /// channel close.
    async fn handle_shutdown(&mut self) {
        let workers = self.pool.workers();
        ShutdownStarted {
            workers: workers.len(),
        }
        .log();

        for (index, worker) in workers.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.options.shutdown_pause).await;
            }
            worker.tell(WorkerMessage::Stop);
            StopSent {
                worker: worker.address(),
            }
            .log();
        }
        self.in_flight = None;
    }
}
