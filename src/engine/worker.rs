// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The compute worker actor.
//!
//! A worker registers with every coordinator it sees come up, then processes
//! `Compute` requests one at a time in arrival order. Kernels run on the
//! blocking pool while the actor keeps reading its mailbox, so `Abort` and
//! `Stop` take effect during a long search.

use std::collections::VecDeque;
use std::ops::ControlFlow;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::backends::local::kernels::{self, KernelControl};
use crate::cluster::{MembershipEvent, NodeAddress, Role, WatchGuard, WorkerHandle};
use crate::observability::messages::worker::{
    AbortReceived, ChunkAbandoned, CoordinatorUnresolved, KernelFailed, KernelFinished,
    KernelStarted, RegistrationSent, WorkerStarted, WorkerStopped,
};
use crate::observability::messages::StructuredLog;
use crate::protocol::{CoordinatorMessage, DispatchId, StageRequest, WorkerMessage};
use crate::traits::{Directory, HashFunction, MembershipSource};

pub struct Worker {
    address: NodeAddress,
    handle: WorkerHandle,
    mailbox: mpsc::UnboundedReceiver<WorkerMessage>,
    events: mpsc::UnboundedReceiver<MembershipEvent>,
    directory: Arc<dyn Directory>,
    hash: Arc<dyn HashFunction>,
    pending: VecDeque<StageRequest>,
    aborted_through: Option<DispatchId>,
    stop: CancellationToken,
    watch: Option<WatchGuard>,
}

impl Worker {
    /// Creates the actor and subscribes it to `membership` right away, so a
    /// coordinator that is already up is replayed to it.
    pub fn new(
        address: NodeAddress,
        hash: Arc<dyn HashFunction>,
        membership: &dyn MembershipSource,
        directory: Arc<dyn Directory>,
    ) -> (Self, WorkerHandle) {
        let (tx, mailbox) = mpsc::unbounded_channel();
        let handle = WorkerHandle::new(address.clone(), tx);
        let worker = Self {
            address,
            handle: handle.clone(),
            mailbox,
            events: membership.subscribe(),
            directory,
            hash,
            pending: VecDeque::new(),
            aborted_through: None,
            stop: CancellationToken::new(),
            watch: None,
        };
        (worker, handle)
    }

    pub fn with_watch(mut self, guard: WatchGuard) -> Self {
        self.watch = Some(guard);
        self
    }

    pub async fn run(mut self) {
        WorkerStarted {
            worker: &self.address,
            hash: self.hash.name(),
        }
        .log();

        loop {
            if let Some(request) = self.pending.pop_front() {
                if self.execute(request).await.is_break() {
                    break;
                }
                continue;
            }

            let flow = tokio::select! {
                message = self.mailbox.recv() => match message {
                    Some(message) => self.handle_message(message),
                    None => ControlFlow::Break(()),
                },
                Some(event) = self.events.recv() => {
                    self.handle_membership(event);
                    ControlFlow::Continue(())
                }
            };
            if flow.is_break() {
                break;
            }
        }

        WorkerStopped {
            worker: &self.address,
        }
        .log();
        drop(self.watch.take());
    }

    fn handle_message(&mut self, message: WorkerMessage) -> ControlFlow<()> {
        match message {
            WorkerMessage::Compute(request) => self.pending.push_back(request),
            WorkerMessage::Abort { dispatch } => self.note_abort(dispatch),
            WorkerMessage::Stop => {
                self.stop.cancel();
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    fn handle_membership(&mut self, event: MembershipEvent) {
        let MembershipEvent::NodeUp {
            role: Role::Coordinator,
            address,
        } = event
        else {
            return;
        };
        match self.directory.resolve_coordinator(&address) {
            Some(coordinator) => {
                coordinator.tell(CoordinatorMessage::Register {
                    worker: self.handle.clone(),
                });
                RegistrationSent {
                    worker: &self.address,
                    coordinator: &address,
                }
                .log();
            }
            None => CoordinatorUnresolved {
                worker: &self.address,
                coordinator: &address,
            }
            .log(),
        }
    }

    fn note_abort(&mut self, dispatch: DispatchId) {
        AbortReceived {
            worker: &self.address,
            dispatch,
        }
        .log();
        self.aborted_through = self.aborted_through.max(Some(dispatch));
    }

    fn is_aborted(&self, dispatch: DispatchId) -> bool {
        self.aborted_through.map_or(false, |through| dispatch <= through)
    }

    /// Runs one request to completion, or until `Stop` arrives.
    async fn execute(&mut self, request: StageRequest) -> ControlFlow<()> {
        let stage = request.stage();
        let control = KernelControl::new(
            Arc::new(AtomicBool::new(self.is_aborted(request.dispatch))),
            self.stop.clone(),
        );
        let started = Instant::now();

        let announcement = KernelStarted {
            worker: &self.address,
            stage,
            dispatch: request.dispatch,
            chunk: request.chunk,
        };
        announcement.log();
        let span = announcement.span("kernel");

        let mut job = {
            let input = Arc::clone(&request.input);
            let hash = Arc::clone(&self.hash);
            let reply_to = request.reply_to.clone();
            let worker = self.address.clone();
            let dispatch = request.dispatch;
            let chunk = request.chunk;
            let control = control.clone();
            tokio::task::spawn_blocking(move || {
                let _entered = span.enter();
                kernels::run(&input, chunk, hash.as_ref(), &control, &mut |result| {
                    reply_to.tell(CoordinatorMessage::Partial {
                        dispatch,
                        worker: worker.clone(),
                        result,
                    });
                })
            })
        };

        let joined = loop {
            tokio::select! {
                joined = &mut job => break joined,
                message = self.mailbox.recv() => match message {
                    Some(WorkerMessage::Compute(next)) => self.pending.push_back(next),
                    Some(WorkerMessage::Abort { dispatch }) => {
                        self.note_abort(dispatch);
                        if self.is_aborted(request.dispatch) {
                            control.request_abort();
                        }
                    }
                    Some(WorkerMessage::Stop) | None => {
                        self.stop.cancel();
                        ChunkAbandoned {
                            worker: &self.address,
                            stage,
                            chunk: request.chunk,
                        }
                        .log();
                        return ControlFlow::Break(());
                    }
                },
                Some(event) = self.events.recv() => self.handle_membership(event),
            }
        };

        match joined {
            Ok(reported) => KernelFinished {
                worker: &self.address,
                stage,
                reported,
                duration: started.elapsed(),
            }
            .log(),
            Err(error) => KernelFailed {
                worker: &self.address,
                stage,
                error: &error,
            }
            .log(),
        }

        request.reply_to.tell(CoordinatorMessage::ChunkFinished {
            dispatch: request.dispatch,
            worker: self.address.clone(),
            chunk: request.chunk,
        });
        ControlFlow::Continue(())
    }
}
