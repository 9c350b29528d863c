// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod backends;      // hash capability + stage kernels
pub mod cluster;       // membership, handles, router, reaper
pub mod config;        // yaml config + runtime builder
pub mod engine;        // coordinator, worker, driver
pub mod errors;        // error handling
pub mod input;         // record feed
pub mod observability;
pub mod protocol;      // shared messages
pub mod traits;        // seams between components
