// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! This module provides centralized message types for all diagnostic and
//! operational logging in the cluster. Message types follow a struct-based
//! pattern with a `Display` implementation to:
//!
//! * Keep log wording out of the actor code
//! * Emit the same fields every time an event is logged
//! * Provide consistent, structured logging output
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::cluster` - membership and reaper events
//! * `messages::coordinator` - registration, dispatch and completion events
//! * `messages::worker` - worker lifecycle and kernel execution
//! * `messages::pipeline` - driver and record feed events
//!
//! # Usage
//!
//! ```rust
//! use the_octopus::observability::messages::StructuredLog;
//! use the_octopus::observability::messages::pipeline::PipelineStarted;
//!
//! let msg = PipelineStarted { records: 42 };
//! msg.log();
//! tracing::info!("{}", msg);
//! ```

pub mod messages;
