// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Round-robin pool of registered workers.
//!
//! Each registration adds one routing slot. A slot is `Busy` from the moment
//! a chunk is assigned to it until the worker reports the chunk finished.
//! Selection continues from where the previous one stopped, so successive
//! dispatches rotate through the pool.

use super::{NodeAddress, WorkerHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Busy,
}

#[derive(Debug, Clone)]
struct Slot {
    handle: WorkerHandle,
    state: WorkerState,
}

#[derive(Debug, Default)]
pub struct WorkerPool {
    slots: Vec<Slot>,
    cursor: usize,
}

impl WorkerPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a routing slot for `handle`. Returns `true` when the worker
    /// already owned a slot.
    pub fn register(&mut self, handle: WorkerHandle) -> bool {
        let duplicate = self.contains(handle.address());
        self.slots.push(Slot {
            handle,
            state: WorkerState::Idle,
        });
        duplicate
    }

    /// Drops every slot owned by `address` and returns how many were removed.
    pub fn remove(&mut self, address: &NodeAddress) -> usize {
        let mut removed = 0;
        let mut index = 0;
        while index < self.slots.len() {
            if self.slots[index].handle.address() == address {
                self.slots.remove(index);
                if index < self.cursor {
                    self.cursor -= 1;
                }
                removed += 1;
            } else {
                index += 1;
            }
        }
        if self.cursor >= self.slots.len() {
            self.cursor = 0;
        }
        removed
    }

    pub fn contains(&self, address: &NodeAddress) -> bool {
        self.slots
            .iter()
            .any(|slot| slot.handle.address() == address)
    }

    /// Number of routable slots, duplicates included.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn idle_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.state == WorkerState::Idle)
            .count()
    }

    /// Index of the next idle slot at or after the cursor, wrapping around.
    pub fn next_idle_index(&self) -> Option<usize> {
        let len = self.slots.len();
        (0..len)
            .map(|offset| (self.cursor + offset) % len)
            .find(|&index| self.slots[index].state == WorkerState::Idle)
    }

    /// Picks the next idle slot, marks it busy and advances the cursor past it.
    pub fn acquire_idle(&mut self) -> Option<WorkerHandle> {
        let index = self.next_idle_index()?;
        self.cursor = (index + 1) % self.slots.len();
        let slot = &mut self.slots[index];
        slot.state = WorkerState::Busy;
        Some(slot.handle.clone())
    }

    /// Marks one busy slot of `address` idle again.
    pub fn release(&mut self, address: &NodeAddress) -> bool {
        match self
            .slots
            .iter_mut()
            .find(|slot| slot.handle.address() == address && slot.state == WorkerState::Busy)
        {
            Some(slot) => {
                slot.state = WorkerState::Idle;
                true
            }
            None => false,
        }
    }

    pub fn state_of(&self, address: &NodeAddress) -> Option<WorkerState> {
        self.slots
            .iter()
            .find(|slot| slot.handle.address() == address)
            .map(|slot| slot.state)
    }

    /// Distinct workers with at least one idle slot, in slot order.
    pub fn idle_workers(&self) -> Vec<WorkerHandle> {
        self.distinct(|slot| slot.state == WorkerState::Idle)
    }

    /// Every distinct registered mailbox, in slot order. A worker that
    /// re-registered with a new mailbox appears once per mailbox.
    pub fn workers(&self) -> Vec<WorkerHandle> {
        self.distinct(|_| true)
    }

    fn distinct(&self, keep: impl Fn(&Slot) -> bool) -> Vec<WorkerHandle> {
        let mut seen: Vec<WorkerHandle> = Vec::new();
        for slot in self.slots.iter().filter(|slot| keep(slot)) {
            if !seen.iter().any(|handle| handle.same_mailbox(&slot.handle)) {
                seen.push(slot.handle.clone());
            }
        }
        seen
    }
}
