// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::consts::{ADDRESS_SCHEME, COORDINATOR_NAME, WORKER_NAME_PREFIX};

/// Opaque, comparable address of a cluster member.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeAddress(String);

impl NodeAddress {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Well-known path of the coordinator in `system`.
    pub fn coordinator(system: &str) -> Self {
        Self(format!("{ADDRESS_SCHEME}://{system}/user/{COORDINATOR_NAME}"))
    }

    pub fn worker(system: &str, index: usize) -> Self {
        Self(format!("{ADDRESS_SCHEME}://{system}/user/{WORKER_NAME_PREFIX}{index}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Coordinator,
    Worker,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Coordinator => f.write_str("coordinator"),
            Role::Worker => f.write_str("worker"),
        }
    }
}
