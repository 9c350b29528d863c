// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Cluster plumbing shared by the coordinator and the workers.
//!
//! * [`address`] - node addresses and roles
//! * [`handles`] - cloneable mailbox handles
//! * [`membership`] - in-process membership source and directory
//! * [`router`] - round-robin pool of registered workers
//! * [`reaper`] - liveness registry that ends the process

pub mod address;
pub mod handles;
pub mod membership;
pub mod reaper;
pub mod router;

pub use address::{NodeAddress, Role};
pub use handles::{CoordinatorHandle, WorkerHandle};
pub use membership::{LocalCluster, MembershipEvent};
pub use reaper::{LivenessRegistry, Reaper, ReaperHandle, ReaperState, WatchGuard};
pub use router::{WorkerPool, WorkerState};
