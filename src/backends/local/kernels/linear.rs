// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Zero-sum sign assignment search.
//!
//! Candidate `i` encodes a sign vector: bit `p` of `i` (lowest bit first)
//! set means position `p` is `-1`, clear means `+1`. Positions are bound to
//! records in ascending id order.

use std::collections::BTreeMap;

use super::KernelControl;
use crate::config::consts::SIGN_POSITIONS;
use crate::protocol::{Chunk, PartialResult, RecordId};

/// Decodes the first `len` signs of `candidate`. Positions past
/// [`SIGN_POSITIONS`] are always `+1`.
pub fn sign_vector(candidate: u64, len: usize) -> Vec<i8> {
    (0..len).map(|position| sign_at(candidate, position)).collect()
}

fn sign_at(candidate: u64, position: usize) -> i8 {
    if position < SIGN_POSITIONS && (candidate >> position) & 1 == 1 {
        -1
    } else {
        1
    }
}

pub fn weighted_sum(weights: &[i64], signs: &[i8]) -> i64 {
    weights
        .iter()
        .zip(signs)
        .map(|(weight, sign)| weight * i64::from(*sign))
        .sum()
}

/// Scans `chunk` for the first candidate whose signed weight sum is zero.
///
/// Always emits exactly one `Signs` report unless stopped: the solution, or
/// an empty map when the chunk holds none or the search was aborted.
pub fn solve(
    weights: &BTreeMap<RecordId, i64>,
    chunk: Chunk,
    control: &KernelControl,
    emit: &mut dyn FnMut(PartialResult),
) -> usize {
    let ids: Vec<RecordId> = weights.keys().copied().collect();
    let values: Vec<i64> = weights.values().copied().collect();

    for candidate in chunk.lower..=chunk.upper {
        if control.stop_requested() {
            return 0;
        }
        if control.abort_requested() {
            break;
        }
        let sum: i64 = values
            .iter()
            .enumerate()
            .map(|(position, weight)| weight * i64::from(sign_at(candidate, position)))
            .sum();
        if sum == 0 {
            let signs = ids
                .iter()
                .copied()
                .zip(sign_vector(candidate, ids.len()))
                .collect();
            emit(PartialResult::Signs { signs });
            return 1;
        }
    }

    emit(PartialResult::Signs {
        signs: BTreeMap::new(),
    });
    0
}
