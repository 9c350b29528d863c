// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for membership and liveness events.

use crate::cluster::{NodeAddress, Role};
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A member joined the in-process cluster.
///
/// # Log Level
/// `info!` - Important operational event
pub struct MemberJoined<'a> {
    pub address: &'a NodeAddress,
    pub role: Role,
}

impl Display for MemberJoined<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Member up: {} {}", self.role, self.address)
    }
}

impl StructuredLog for MemberJoined<'_> {
    fn log(&self) {
        tracing::info!(
            address = %self.address,
            role = %self.role,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "member_joined",
            span_name = name,
            address = %self.address,
            role = %self.role,
        )
    }
}

/// A member left the in-process cluster.
///
/// # Log Level
/// `info!` - Important operational event
pub struct MemberLeft<'a> {
    pub address: &'a NodeAddress,
    pub role: Role,
}

impl Display for MemberLeft<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Member down: {} {}", self.role, self.address)
    }
}

impl StructuredLog for MemberLeft<'_> {
    fn log(&self) {
        tracing::info!(
            address = %self.address,
            role = %self.role,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "member_left",
            span_name = name,
            address = %self.address,
            role = %self.role,
        )
    }
}

/// The reaper started watching an actor.
///
/// # Log Level
/// `debug!` - Lifecycle detail
pub struct ReaperWatching<'a> {
    pub address: &'a NodeAddress,
    pub watched: usize,
}

impl Display for ReaperWatching<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Reaper watching {} ({} watched)", self.address, self.watched)
    }
}

impl StructuredLog for ReaperWatching<'_> {
    fn log(&self) {
        tracing::debug!(
            address = %self.address,
            watched = self.watched,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "reaper_watching",
            span_name = name,
            address = %self.address,
            watched = self.watched,
        )
    }
}

/// A watched actor stopped.
///
/// # Log Level
/// `debug!` - Lifecycle detail
pub struct ReaperReleased<'a> {
    pub address: &'a NodeAddress,
    pub remaining: usize,
}

impl Display for ReaperReleased<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Reaper saw {} stop, {} still watched",
            self.address, self.remaining
        )
    }
}

impl StructuredLog for ReaperReleased<'_> {
    fn log(&self) {
        tracing::debug!(
            address = %self.address,
            remaining = self.remaining,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "reaper_released",
            span_name = name,
            address = %self.address,
            remaining = self.remaining,
        )
    }
}

/// Every watched actor has stopped; the process may exit.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_octopus::observability::messages::cluster::ReaperTerminated;
///
/// assert_eq!(ReaperTerminated.to_string(), "All actors stopped, terminating");
/// ```
pub struct ReaperTerminated;

impl Display for ReaperTerminated {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "All actors stopped, terminating")
    }
}

impl StructuredLog for ReaperTerminated {
    fn log(&self) {
        tracing::info!("{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("reaper_terminated", span_name = name)
    }
}
