// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::{BTreeMap, HashMap};

use super::KernelControl;
use crate::protocol::{Chunk, PartialResult, RecordId};
use crate::traits::HashFunction;

/// Hashes the decimal form of every candidate in `chunk` and reports each
/// record whose target digest matches. Records sharing a target all match.
pub fn crack(
    targets: &BTreeMap<RecordId, String>,
    chunk: Chunk,
    hash: &dyn HashFunction,
    control: &KernelControl,
    emit: &mut dyn FnMut(PartialResult),
) -> usize {
    let mut by_digest: HashMap<String, Vec<RecordId>> = HashMap::new();
    for (id, target) in targets {
        by_digest
            .entry(target.to_ascii_lowercase())
            .or_default()
            .push(*id);
    }

    let mut reported = 0;
    for candidate in chunk.lower..=chunk.upper {
        if control.stop_requested() {
            break;
        }
        let digest = hash.hex_digest(candidate.to_string().as_bytes());
        if let Some(ids) = by_digest.get(digest.as_str()) {
            for id in ids {
                emit(PartialResult::Secret {
                    id: *id,
                    value: candidate,
                });
                reported += 1;
            }
        }
    }
    reported
}
