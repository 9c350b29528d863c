use tokio::sync::mpsc;

use crate::cluster::{CoordinatorHandle, MembershipEvent, NodeAddress};

/// Source of cluster membership notifications.
pub trait MembershipSource: Send + Sync {
    /// New subscribers first receive a `NodeUp` for every current member,
    /// then live events in the order they happen.
    fn subscribe(&self) -> mpsc::UnboundedReceiver<MembershipEvent>;
}

/// Resolves announced addresses to live mailboxes.
pub trait Directory: Send + Sync {
    fn resolve_coordinator(&self, address: &NodeAddress) -> Option<CoordinatorHandle>;
}
