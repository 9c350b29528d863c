// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod dispatch;
mod input;
mod pipeline;

pub use config::{ConfigError, ValidationError};
pub use dispatch::DispatchError;
pub use input::InputError;
pub use pipeline::PipelineError;
