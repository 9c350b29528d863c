// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Result accumulation for the stage in flight.

use crate::protocol::{
    Aggregate, DispatchId, PartialResult, RecordId, Stage, StageInput, StageOutput,
};

/// Lifecycle of the Linear stage across dispatches.
///
/// Once `Solved`, every further report for that dispatch is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinearState {
    #[default]
    Idle,
    Searching(DispatchId),
    Solved(DispatchId),
}

/// What happened to a partial result handed to [`StageProgress::absorb`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Absorbed {
    Accepted,
    /// The record was already resolved; the first value stands.
    Duplicate,
    /// Wrong stage, or an empty Linear report.
    Ignored,
}

/// Aggregate of the dispatch in flight plus its completion condition.
///
/// Secrets, Sequence and Hash complete once every record of the domain is
/// resolved. Linear completes with the first non-empty sign assignment.
#[derive(Debug)]
pub enum StageProgress {
    Secrets {
        resolved: Aggregate<u64>,
        expected: usize,
    },
    Sequence {
        partners: Aggregate<RecordId>,
        expected: usize,
    },
    Linear {
        solution: Option<Aggregate<i8>>,
    },
    Hash {
        hashes: Aggregate<String>,
        expected: usize,
    },
}

impl StageProgress {
    pub fn for_input(input: &StageInput) -> Self {
        let expected = input.record_count();
        match input {
            StageInput::Secrets { .. } => StageProgress::Secrets {
                resolved: Aggregate::new(),
                expected,
            },
            StageInput::Sequence { .. } => StageProgress::Sequence {
                partners: Aggregate::new(),
                expected,
            },
            StageInput::Linear { .. } => StageProgress::Linear { solution: None },
            StageInput::Hash { .. } => StageProgress::Hash {
                hashes: Aggregate::new(),
                expected,
            },
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            StageProgress::Secrets { .. } => Stage::Secrets,
            StageProgress::Sequence { .. } => Stage::Sequence,
            StageProgress::Linear { .. } => Stage::Linear,
            StageProgress::Hash { .. } => Stage::Hash,
        }
    }

    pub fn absorb(&mut self, result: PartialResult) -> Absorbed {
        let inserted = match (self, result) {
            (StageProgress::Secrets { resolved, .. }, PartialResult::Secret { id, value }) => {
                resolved.insert(id, value)
            }
            (StageProgress::Sequence { partners, .. }, PartialResult::Partner { id, partner }) => {
                partners.insert(id, partner)
            }
            (StageProgress::Linear { solution }, PartialResult::Signs { signs }) => {
                if signs.is_empty() {
                    return Absorbed::Ignored;
                }
                if solution.is_some() {
                    false
                } else {
                    *solution = Some(Aggregate::from(signs));
                    true
                }
            }
            (StageProgress::Hash { hashes, .. }, PartialResult::Hash { id, hash }) => {
                hashes.insert(id, hash)
            }
            _ => return Absorbed::Ignored,
        };
        if inserted {
            Absorbed::Accepted
        } else {
            Absorbed::Duplicate
        }
    }

    pub fn resolved(&self) -> usize {
        match self {
            StageProgress::Secrets { resolved, .. } => resolved.len(),
            StageProgress::Sequence { partners, .. } => partners.len(),
            StageProgress::Linear { solution } => usize::from(solution.is_some()),
            StageProgress::Hash { hashes, .. } => hashes.len(),
        }
    }

    /// Results needed before the stage is released. Linear needs a single solution.
    pub fn expected(&self) -> usize {
        match self {
            StageProgress::Secrets { expected, .. }
            | StageProgress::Sequence { expected, .. }
            | StageProgress::Hash { expected, .. } => *expected,
            StageProgress::Linear { .. } => 1,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.resolved() >= self.expected()
    }

    /// The finished output, or `None` while the completion condition does not hold.
    pub fn into_output(self) -> Option<StageOutput> {
        if !self.is_complete() {
            return None;
        }
        let output = match self {
            StageProgress::Secrets { resolved, .. } => StageOutput::Secrets(resolved),
            StageProgress::Sequence { partners, .. } => StageOutput::Sequence(partners),
            StageProgress::Linear { solution } => StageOutput::Linear(solution?),
            StageProgress::Hash { hashes, .. } => StageOutput::Hash(hashes),
        };
        Some(output)
    }
}
