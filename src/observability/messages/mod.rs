// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for the human-readable line and
//! [`StructuredLog`] for emitting it with its fields at the right level.
//!
//! # Organization
//!
//! * `cluster` - membership and liveness events
//! * `coordinator` - worker registration, stage dispatch and completion
//! * `worker` - kernel execution and worker lifecycle
//! * `pipeline` - driver progress and record loading

use tracing::Span;

pub mod cluster;
pub mod coordinator;
pub mod pipeline;
pub mod worker;

/// A log event that knows its level and its structured fields.
pub trait StructuredLog {
    /// Emit the event at its documented level.
    fn log(&self);

    /// A span carrying the same fields, for instrumenting the work the event
    /// announces.
    fn span(&self, name: &str) -> Span;
}
