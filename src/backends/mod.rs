// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Compute backends for the stage pipeline.
//!
//! # Available Backends
//!
//! ## Local Backend
//! In-process implementations used by every worker:
//! - **Sha256Hash**: The `HashFunction` capability backed by `sha2`
//! - **Kernels**: One brute-force kernel per stage, run on the blocking pool
//!
//! ## Stub Backend (Test-Only)
//! Cheap, deterministic hash functions so stage tests do not pay for real
//! digests:
//! - **EchoHash**: Hex of the input bytes
//! - **PatternHash**: Parity-driven prefix for exercising the Hash stage
//!
//! # Examples
//!
//! ```rust
//! use the_octopus::backends::local::Sha256Hash;
//! use the_octopus::traits::HashFunction;
//!
//! let digest = Sha256Hash.hex_digest(b"0");
//! assert!(digest.starts_with("5feceb66"));
//! ```

pub mod local;
#[cfg(test)]
pub mod stub;
