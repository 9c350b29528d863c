// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Liveness tracking for the actors of one process.
//!
//! Every actor is watched from the moment it is created. When the last
//! watched actor stops, the reaper cancels the process termination token and
//! ignores everything that happens afterwards.
//!
//! ```text
//! Watching --(watched set becomes empty)--> Terminated
//! ```

use std::collections::BTreeSet;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::NodeAddress;
use crate::observability::messages::cluster::{ReaperReleased, ReaperTerminated, ReaperWatching};
use crate::observability::messages::StructuredLog;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReaperState {
    #[default]
    Watching,
    Terminated,
}

/// Pure state machine behind the reaper task.
#[derive(Debug, Default)]
pub struct LivenessRegistry {
    watched: BTreeSet<NodeAddress>,
    state: ReaperState,
}

impl LivenessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `address` to the watched set. Ignored once terminated.
    pub fn watch(&mut self, address: NodeAddress) -> bool {
        if self.state == ReaperState::Terminated {
            return false;
        }
        self.watched.insert(address)
    }

    /// Removes `address`; returns `true` when this call terminated the registry.
    pub fn mark_stopped(&mut self, address: &NodeAddress) -> bool {
        if self.state == ReaperState::Terminated || !self.watched.remove(address) {
            return false;
        }
        if self.watched.is_empty() {
            self.state = ReaperState::Terminated;
            return true;
        }
        false
    }

    pub fn state(&self) -> ReaperState {
        self.state
    }

    pub fn watched_count(&self) -> usize {
        self.watched.len()
    }

    pub fn is_watching(&self, address: &NodeAddress) -> bool {
        self.watched.contains(address)
    }
}

#[derive(Debug)]
enum ReaperCommand {
    Watch(NodeAddress),
    Stopped(NodeAddress),
}

#[derive(Debug, Clone)]
pub struct ReaperHandle {
    commands: mpsc::UnboundedSender<ReaperCommand>,
}

impl ReaperHandle {
    /// Watches `address` until the returned guard is dropped.
    pub fn watch(&self, address: NodeAddress) -> WatchGuard {
        let _ = self.commands.send(ReaperCommand::Watch(address.clone()));
        WatchGuard {
            address,
            commands: self.commands.clone(),
        }
    }
}

/// Keeps an actor in the watched set; dropping it reports the actor stopped.
#[derive(Debug)]
pub struct WatchGuard {
    address: NodeAddress,
    commands: mpsc::UnboundedSender<ReaperCommand>,
}

impl WatchGuard {
    pub fn address(&self) -> &NodeAddress {
        &self.address
    }
}

impl Drop for WatchGuard {
    fn drop(&mut self) {
        let _ = self
            .commands
            .send(ReaperCommand::Stopped(self.address.clone()));
    }
}

pub struct Reaper;

impl Reaper {
    /// Spawns the reaper task; `terminated` is cancelled once every watched
    /// actor has stopped. Must be called from within a tokio runtime.
    pub fn spawn(terminated: CancellationToken) -> (ReaperHandle, JoinHandle<()>) {
        let (commands, mailbox) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(mailbox, terminated));
        (ReaperHandle { commands }, task)
    }
}

async fn run(mut mailbox: mpsc::UnboundedReceiver<ReaperCommand>, terminated: CancellationToken) {
    let mut registry = LivenessRegistry::new();
    while let Some(command) = mailbox.recv().await {
        match command {
            ReaperCommand::Watch(address) => {
                if registry.watch(address.clone()) {
                    ReaperWatching {
                        address: &address,
                        watched: registry.watched_count(),
                    }
                    .log();
                }
            }
            ReaperCommand::Stopped(address) => {
                let finished = registry.mark_stopped(&address);
                ReaperReleased {
                    address: &address,
                    remaining: registry.watched_count(),
                }
                .log();
                if finished {
                    ReaperTerminated.log();
                    terminated.cancel();
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_registry_terminates_when_last_actor_stops() {
        let mut registry = LivenessRegistry::new();
        let a = NodeAddress::new("a");
        let b = NodeAddress::new("b");

        assert!(registry.watch(a.clone()));
        assert!(registry.watch(b.clone()));
        assert!(!registry.mark_stopped(&a));
        assert_eq!(registry.state(), ReaperState::Watching);
        assert!(registry.mark_stopped(&b));
        assert_eq!(registry.state(), ReaperState::Terminated);
    }

    #[test]
    fn test_registry_ignores_events_after_termination() {
        let mut registry = LivenessRegistry::new();
        let a = NodeAddress::new("a");
        registry.watch(a.clone());
        registry.mark_stopped(&a);

        assert!(!registry.watch(NodeAddress::new("late")));
        assert!(!registry.mark_stopped(&a));
        assert_eq!(registry.watched_count(), 0);
        assert_eq!(registry.state(), ReaperState::Terminated);
    }

    #[test]
    fn test_registry_never_watched_stays_watching() {
        let mut registry = LivenessRegistry::new();
        assert!(!registry.mark_stopped(&NodeAddress::new("stranger")));
        assert_eq!(registry.state(), ReaperState::Watching);
    }

    #[tokio::test]
    async fn test_dropping_all_guards_cancels_token() {
        let terminated = CancellationToken::new();
        let (reaper, task) = Reaper::spawn(terminated.clone());

        let first = reaper.watch(NodeAddress::new("coordinator"));
        let second = reaper.watch(NodeAddress::new("worker0"));

        drop(first);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!terminated.is_cancelled());

        drop(second);
        tokio::time::timeout(Duration::from_secs(1), terminated.cancelled())
            .await
            .expect("reaper should terminate");
        task.await.expect("reaper task");
    }
}
