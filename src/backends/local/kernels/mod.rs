// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Brute-force kernels, one per stage.
//!
//! Kernels are synchronous and CPU bound; workers run them on the blocking
//! pool. Each kernel walks its chunk, streams every result through `emit`
//! as soon as it is found and returns how many results it emitted.
//!
//! | Stage    | Chunk covers   | Emits                                   |
//! |----------|----------------|-----------------------------------------|
//! | Secrets  | candidates     | every `(id, candidate)` whose hash matches |
//! | Sequence | record ids     | one partner per id                      |
//! | Linear   | sign encodings | the first zero-sum assignment, else empty |
//! | Hash     | record ids     | one accepted digest per id              |

pub mod linear;
pub mod mining;
pub mod secrets;
pub mod sequence;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::protocol::{Chunk, PartialResult, StageInput};
use crate::traits::HashFunction;

/// Cooperative interruption signals checked by the kernels between candidates.
///
/// `abort` ends a Linear search early with an empty report. `stop` abandons
/// any kernel without reporting anything further.
#[derive(Debug, Clone)]
pub struct KernelControl {
    abort: Arc<AtomicBool>,
    stop: CancellationToken,
}

impl KernelControl {
    pub fn new(abort: Arc<AtomicBool>, stop: CancellationToken) -> Self {
        Self { abort, stop }
    }

    /// Control that never interrupts.
    pub fn unbounded() -> Self {
        Self::new(Arc::new(AtomicBool::new(false)), CancellationToken::new())
    }

    pub fn request_abort(&self) {
        self.abort.store(true, Ordering::Relaxed);
    }

    pub fn abort_requested(&self) -> bool {
        self.abort.load(Ordering::Relaxed)
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.is_cancelled()
    }
}

/// Runs the kernel matching `input` over `chunk`.
pub fn run(
    input: &StageInput,
    chunk: Chunk,
    hash: &dyn HashFunction,
    control: &KernelControl,
    emit: &mut dyn FnMut(PartialResult),
) -> usize {
    match input {
        StageInput::Secrets { targets } => secrets::crack(targets, chunk, hash, control, emit),
        StageInput::Sequence { sequences } => sequence::find_partners(sequences, chunk, control, emit),
        StageInput::Linear { weights } => linear::solve(weights, chunk, control, emit),
        StageInput::Hash { partners, signs } => {
            mining::mine(partners, signs, chunk, hash, control, emit)
        }
    }
}
