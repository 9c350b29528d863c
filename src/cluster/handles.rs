// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Cloneable handles onto actor mailboxes.
//!
//! Handles compare by address, so the same worker registered twice yields
//! two equal handles occupying two routing slots. Use
//! [`WorkerHandle::same_mailbox`] to tell whether two handles reach the same
//! actor.

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use super::NodeAddress;
use crate::errors::PipelineError;
use crate::protocol::{CoordinatorMessage, CoordinatorStatus, StageInput, StageOutput, WorkerMessage};
use crate::traits::StageDispatcher;

#[derive(Debug, Clone)]
pub struct WorkerHandle {
    address: NodeAddress,
    mailbox: mpsc::UnboundedSender<WorkerMessage>,
}

impl WorkerHandle {
    pub fn new(address: NodeAddress, mailbox: mpsc::UnboundedSender<WorkerMessage>) -> Self {
        Self { address, mailbox }
    }

    pub fn address(&self) -> &NodeAddress {
        &self.address
    }

    pub fn same_mailbox(&self, other: &WorkerHandle) -> bool {
        self.mailbox.same_channel(&other.mailbox)
    }

    /// Fire-and-forget delivery. `false` means the mailbox is closed.
    pub fn tell(&self, message: WorkerMessage) -> bool {
        self.mailbox.send(message).is_ok()
    }
}

impl PartialEq for WorkerHandle {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
    }
}

impl Eq for WorkerHandle {}

#[derive(Debug, Clone)]
pub struct CoordinatorHandle {
    address: NodeAddress,
    mailbox: mpsc::UnboundedSender<CoordinatorMessage>,
}

impl CoordinatorHandle {
    pub fn new(address: NodeAddress, mailbox: mpsc::UnboundedSender<CoordinatorMessage>) -> Self {
        Self { address, mailbox }
    }

    pub fn address(&self) -> &NodeAddress {
        &self.address
    }

    pub fn tell(&self, message: CoordinatorMessage) -> bool {
        self.mailbox.send(message).is_ok()
    }
}

impl PartialEq for CoordinatorHandle {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
    }
}

impl Eq for CoordinatorHandle {}

#[async_trait]
impl StageDispatcher for CoordinatorHandle {
    async fn dispatch(&self, input: StageInput) -> Result<StageOutput, PipelineError> {
        let (reply, response) = oneshot::channel();
        if !self.tell(CoordinatorMessage::Dispatch { input, reply }) {
            return Err(PipelineError::CoordinatorUnavailable);
        }
        match response.await {
            Ok(outcome) => outcome.map_err(PipelineError::from),
            Err(_) => Err(PipelineError::CoordinatorUnavailable),
        }
    }

    async fn status(&self) -> Result<CoordinatorStatus, PipelineError> {
        let (reply, response) = oneshot::channel();
        if !self.tell(CoordinatorMessage::Status { reply }) {
            return Err(PipelineError::CoordinatorUnavailable);
        }
        response
            .await
            .map_err(|_| PipelineError::CoordinatorUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dispatch_to_closed_mailbox_is_unavailable() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let handle = CoordinatorHandle::new(NodeAddress::new("closed"), tx);
        let input = StageInput::Linear {
            weights: Default::default(),
        };

        let result = handle.dispatch(input).await;
        assert!(matches!(result, Err(PipelineError::CoordinatorUnavailable)));
    }

    #[test]
    fn test_handles_compare_by_address() {
        let (tx_a, _rx_a) = mpsc::unbounded_channel();
        let (tx_b, _rx_b) = mpsc::unbounded_channel();
        let a = WorkerHandle::new(NodeAddress::new("w"), tx_a);
        let b = WorkerHandle::new(NodeAddress::new("w"), tx_b);
        assert_eq!(a, b);
    }
}
