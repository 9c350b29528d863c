// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! In-process membership service.
//!
//! [`LocalCluster`] plays both roles the actors rely on: it publishes
//! `NodeUp`/`NodeDown` events to every subscriber and it resolves the
//! coordinator's address to a live mailbox. Subscribers that join late get
//! the current membership replayed first, so a worker started after the
//! coordinator still learns about it.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;

use super::{CoordinatorHandle, NodeAddress, Role};
use crate::observability::messages::cluster::{MemberJoined, MemberLeft};
use crate::observability::messages::StructuredLog;
use crate::traits::{Directory, MembershipSource};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipEvent {
    NodeUp { role: Role, address: NodeAddress },
    NodeDown { role: Role, address: NodeAddress },
}

impl MembershipEvent {
    pub fn role(&self) -> Role {
        match self {
            MembershipEvent::NodeUp { role, .. } | MembershipEvent::NodeDown { role, .. } => *role,
        }
    }

    pub fn address(&self) -> &NodeAddress {
        match self {
            MembershipEvent::NodeUp { address, .. } | MembershipEvent::NodeDown { address, .. } => {
                address
            }
        }
    }
}

struct Member {
    role: Role,
    coordinator: Option<CoordinatorHandle>,
}

#[derive(Default)]
struct ClusterState {
    members: BTreeMap<NodeAddress, Member>,
    subscribers: Vec<mpsc::UnboundedSender<MembershipEvent>>,
}

impl ClusterState {
    fn publish(&mut self, event: MembershipEvent) {
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }
}

#[derive(Default)]
pub struct LocalCluster {
    state: Mutex<ClusterState>,
}

impl LocalCluster {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn join_coordinator(&self, handle: CoordinatorHandle) {
        let address = handle.address().clone();
        self.join(address, Role::Coordinator, Some(handle));
    }

    pub fn join_worker(&self, address: NodeAddress) {
        self.join(address, Role::Worker, None);
    }

    /// Removes `address` and publishes `NodeDown`. Unknown addresses are ignored.
    pub fn leave(&self, address: &NodeAddress) {
        let mut state = self.lock();
        if let Some(member) = state.members.remove(address) {
            MemberLeft {
                address,
                role: member.role,
            }
            .log();
            state.publish(MembershipEvent::NodeDown {
                role: member.role,
                address: address.clone(),
            });
        }
    }

    pub fn members(&self) -> Vec<(Role, NodeAddress)> {
        self.lock()
            .members
            .iter()
            .map(|(address, member)| (member.role, address.clone()))
            .collect()
    }

    fn join(&self, address: NodeAddress, role: Role, coordinator: Option<CoordinatorHandle>) {
        let mut state = self.lock();
        MemberJoined {
            address: &address,
            role,
        }
        .log();
        state
            .members
            .insert(address.clone(), Member { role, coordinator });
        state.publish(MembershipEvent::NodeUp { role, address });
    }

    fn lock(&self) -> MutexGuard<'_, ClusterState> {
        // state stays consistent across a panicking subscriber send
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl MembershipSource for LocalCluster {
    fn subscribe(&self) -> mpsc::UnboundedReceiver<MembershipEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.lock();
        for (address, member) in &state.members {
            let _ = tx.send(MembershipEvent::NodeUp {
                role: member.role,
                address: address.clone(),
            });
        }
        state.subscribers.push(tx);
        rx
    }
}

impl Directory for LocalCluster {
    fn resolve_coordinator(&self, address: &NodeAddress) -> Option<CoordinatorHandle> {
        self.lock()
            .members
            .get(address)
            .and_then(|member| member.coordinator.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coordinator_handle(name: &str) -> (CoordinatorHandle, mpsc::UnboundedReceiver<crate::protocol::CoordinatorMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (CoordinatorHandle::new(NodeAddress::new(name), tx), rx)
    }

    #[tokio::test]
    async fn test_subscribe_replays_current_members() {
        let cluster = LocalCluster::new();
        let (handle, _rx) = coordinator_handle("master");
        cluster.join_coordinator(handle);
        cluster.join_worker(NodeAddress::new("worker0"));

        let mut events = cluster.subscribe();
        let first = events.recv().await.expect("replayed event");
        let second = events.recv().await.expect("replayed event");

        let mut replayed = vec![first, second];
        replayed.sort_by(|a, b| a.address().cmp(b.address()));
        assert_eq!(
            replayed,
            vec![
                MembershipEvent::NodeUp {
                    role: Role::Coordinator,
                    address: NodeAddress::new("master"),
                },
                MembershipEvent::NodeUp {
                    role: Role::Worker,
                    address: NodeAddress::new("worker0"),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_leave_publishes_node_down() {
        let cluster = LocalCluster::new();
        let mut events = cluster.subscribe();
        let address = NodeAddress::new("worker7");

        cluster.join_worker(address.clone());
        cluster.leave(&address);
        cluster.leave(&address);

        assert_eq!(
            events.recv().await,
            Some(MembershipEvent::NodeUp {
                role: Role::Worker,
                address: address.clone()
            })
        );
        assert_eq!(
            events.recv().await,
            Some(MembershipEvent::NodeDown {
                role: Role::Worker,
                address
            })
        );
        assert!(events.try_recv().is_err());
        assert!(cluster.members().is_empty());
    }

    #[test]
    fn test_directory_resolves_only_coordinators() {
        let cluster = LocalCluster::new();
        let (handle, _rx) = coordinator_handle("master");
        cluster.join_coordinator(handle.clone());
        cluster.join_worker(NodeAddress::new("worker0"));

        assert_eq!(cluster.resolve_coordinator(&NodeAddress::new("master")), Some(handle));
        assert_eq!(cluster.resolve_coordinator(&NodeAddress::new("worker0")), None);
        assert_eq!(cluster.resolve_coordinator(&NodeAddress::new("nobody")), None);
    }
}
