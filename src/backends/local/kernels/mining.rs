// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Prefix-constrained hash mining.

use rand::Rng;
use std::collections::BTreeMap;

use super::KernelControl;
use crate::config::consts::HASH_PREFIX_LEN;
use crate::observability::messages::worker::SignUnavailable;
use crate::observability::messages::StructuredLog;
use crate::protocol::{Chunk, PartialResult, RecordId};
use crate::traits::HashFunction;

/// Digest prefix a record with `sign` must hit: zeros for `-1`, ones otherwise.
pub fn required_prefix(sign: i8) -> String {
    let digit = if sign < 0 { '0' } else { '1' };
    std::iter::repeat(digit).take(HASH_PREFIX_LEN).collect()
}

pub fn accepts(digest: &str, sign: i8) -> bool {
    digest.starts_with(&required_prefix(sign))
}

/// For every id in `chunk`, draws random nonces until
/// `hash(partner + nonce)` carries the prefix demanded by the id's sign.
///
/// The search per id is unbounded; only `stop` interrupts it. The candidate
/// is summed in `i64`, so `partner + nonce` never wraps.
pub fn mine(
    partners: &BTreeMap<RecordId, RecordId>,
    signs: &BTreeMap<RecordId, i8>,
    chunk: Chunk,
    hash: &dyn HashFunction,
    control: &KernelControl,
    emit: &mut dyn FnMut(PartialResult),
) -> usize {
    let mut rng = rand::thread_rng();
    let mut reported = 0;

    for (id, partner) in partners.range(chunk.id_range()) {
        let Some(&sign) = signs.get(id) else {
            SignUnavailable { id: *id }.log();
            continue;
        };
        let prefix = required_prefix(sign);

        loop {
            if control.stop_requested() {
                return reported;
            }
            let nonce: i32 = rng.gen();
            let candidate = i64::from(partner.value()) + i64::from(nonce);
            let digest = hash.hex_digest(candidate.to_string().as_bytes());
            if digest.starts_with(&prefix) {
                emit(PartialResult::Hash {
                    id: *id,
                    hash: digest,
                });
                reported += 1;
                break;
            }
        }
    }
    reported
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::PatternHash;

    #[test]
    fn test_required_prefix_follows_sign() {
        assert_eq!(required_prefix(-1), "00000");
        assert_eq!(required_prefix(1), "11111");
        assert!(accepts("00000abc", -1));
        assert!(!accepts("00000abc", 1));
        assert!(!accepts("0000", -1));
    }

    #[test]
    fn test_every_reported_hash_matches_its_sign() {
        let partners: BTreeMap<RecordId, RecordId> = (1..=6)
            .map(|id| (RecordId(id), RecordId(7 - id)))
            .collect();
        let signs: BTreeMap<RecordId, i8> = (1..=6)
            .map(|id| (RecordId(id), if id % 2 == 0 { -1 } else { 1 }))
            .collect();
        let mut found = BTreeMap::new();

        let reported = mine(
            &partners,
            &signs,
            Chunk::new(1, 6),
            &PatternHash,
            &KernelControl::unbounded(),
            &mut |result| {
                if let PartialResult::Hash { id, hash } = result {
                    found.insert(id, hash);
                }
            },
        );

        assert_eq!(reported, 6);
        for (id, hash) in &found {
            assert!(accepts(hash, signs[id]), "record {id} got {hash}");
        }
    }

    #[test]
    fn test_missing_sign_is_skipped() {
        let partners = BTreeMap::from([(RecordId(1), RecordId(2)), (RecordId(2), RecordId(1))]);
        let signs = BTreeMap::from([(RecordId(2), 1)]);
        let mut ids = Vec::new();

        mine(
            &partners,
            &signs,
            Chunk::new(1, 2),
            &PatternHash,
            &KernelControl::unbounded(),
            &mut |result| {
                if let PartialResult::Hash { id, .. } = result {
                    ids.push(id);
                }
            },
        );

        assert_eq!(ids, vec![RecordId(2)]);
    }

    #[test]
    fn test_stop_ends_unbounded_search() {
        struct NeverHash;
        impl HashFunction for NeverHash {
            fn hex_digest(&self, _input: &[u8]) -> String {
                "ffffffff".to_string()
            }
            fn name(&self) -> &'static str {
                "never"
            }
        }

        let partners = BTreeMap::from([(RecordId(1), RecordId(2))]);
        let signs = BTreeMap::from([(RecordId(1), -1)]);
        let control = KernelControl::unbounded();
        control.stop.cancel();

        let reported = mine(&partners, &signs, Chunk::new(1, 1), &NeverHash, &control, &mut |_| {});
        assert_eq!(reported, 0);
    }
}
