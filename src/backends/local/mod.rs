// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod kernels;
pub mod sha256;

pub use kernels::KernelControl;
pub use sha256::Sha256Hash;
