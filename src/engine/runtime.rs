// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Wiring of one in-process cluster: reaper, membership, coordinator and a
//! pool of workers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::cluster::{
    CoordinatorHandle, LocalCluster, NodeAddress, Reaper, ReaperHandle, WorkerHandle,
};
use crate::config::consts::SYSTEM_NAME;
use crate::engine::{Coordinator, CoordinatorOptions, DriverOptions, PipelineDriver, Worker};
use crate::protocol::CoordinatorMessage;
use crate::traits::{HashFunction, MembershipSource};

pub struct ClusterRuntime {
    cluster: Arc<LocalCluster>,
    coordinator: CoordinatorHandle,
    reaper: ReaperHandle,
    terminated: CancellationToken,
    hash: Arc<dyn HashFunction>,
    driver_options: DriverOptions,
    next_worker: AtomicUsize,
}

impl ClusterRuntime {
    /// Starts the coordinator and `workers` compute workers.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        workers: usize,
        coordinator_options: CoordinatorOptions,
        driver_options: DriverOptions,
        hash: Arc<dyn HashFunction>,
    ) -> Self {
        let terminated = CancellationToken::new();
        let (reaper, _reaper_task) = Reaper::spawn(terminated.clone());
        let cluster = LocalCluster::new();

        let address = NodeAddress::coordinator(SYSTEM_NAME);
        let (coordinator, handle) =
            Coordinator::new(address.clone(), coordinator_options, cluster.subscribe());
        let coordinator = coordinator.with_watch(reaper.watch(address.clone()));
        cluster.join_coordinator(handle.clone());
        spawn_member(Arc::clone(&cluster), address, coordinator.run());

        let runtime = Self {
            cluster,
            coordinator: handle,
            reaper,
            terminated,
            hash,
            driver_options,
            next_worker: AtomicUsize::new(0),
        };
        for _ in 0..workers {
            runtime.spawn_worker();
        }
        runtime
    }

    /// Adds one more worker; it registers with the coordinator on its own.
    pub fn spawn_worker(&self) -> WorkerHandle {
        let index = self.next_worker.fetch_add(1, Ordering::SeqCst);
        let address = NodeAddress::worker(SYSTEM_NAME, index);
        let (worker, handle) = Worker::new(
            address.clone(),
            Arc::clone(&self.hash),
            self.cluster.as_ref(),
            self.cluster.clone(),
        );
        let worker = worker.with_watch(self.reaper.watch(address.clone()));
        self.cluster.join_worker(address.clone());
        spawn_member(Arc::clone(&self.cluster), address, worker.run());
        handle
    }

    pub fn coordinator(&self) -> CoordinatorHandle {
        self.coordinator.clone()
    }

    pub fn cluster(&self) -> &Arc<LocalCluster> {
        &self.cluster
    }

    pub fn driver(&self) -> PipelineDriver<CoordinatorHandle> {
        PipelineDriver::new(self.coordinator(), self.driver_options.clone())
    }

    /// Asks the coordinator to stop every worker and then itself.
    pub fn shutdown(&self) {
        self.coordinator.tell(CoordinatorMessage::Shutdown);
    }

    /// Resolves once the reaper has seen every actor stop.
    pub async fn terminated(&self) {
        self.terminated.cancelled().await
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.is_cancelled()
    }
}

fn spawn_member(
    cluster: Arc<LocalCluster>,
    address: NodeAddress,
    actor: impl std::future::Future<Output = ()> + Send + 'static,
) {
    tokio::spawn(async move {
        actor.await;
        cluster.leave(&address);
    });
}
