// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Partner search by longest common substring.

use std::collections::BTreeMap;

use super::KernelControl;
use crate::observability::messages::worker::PartnerUnavailable;
use crate::observability::messages::StructuredLog;
use crate::protocol::{Chunk, PartialResult, RecordId};

/// Longest common contiguous substring of `a` and `b`.
///
/// Symmetric in its arguments: on equal-length ties the leftmost occurrence in
/// the shorter (or, for equal lengths, lexicographically smaller) argument wins.
pub fn longest_overlap(a: &str, b: &str) -> String {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (shorter, longer) = canonical(&a, &b);
    let (start, len) = overlap_span(shorter, longer);
    shorter[start..start + len].iter().collect()
}

fn canonical<'a>(a: &'a [char], b: &'a [char]) -> (&'a [char], &'a [char]) {
    if (a.len(), a) <= (b.len(), b) {
        (a, b)
    } else {
        (b, a)
    }
}

/// `(start, len)` of the longest common run inside `shorter`.
/// Two rolling rows keep memory linear in the shorter input.
fn overlap_span(shorter: &[char], longer: &[char]) -> (usize, usize) {
    if shorter.is_empty() || longer.is_empty() {
        return (0, 0);
    }
    let mut previous = vec![0usize; shorter.len()];
    let mut current = vec![0usize; shorter.len()];
    let (mut best_start, mut best_len) = (0, 0);

    for &c in longer {
        for (i, &s) in shorter.iter().enumerate() {
            current[i] = if s != c {
                0
            } else if i == 0 {
                1
            } else {
                previous[i - 1] + 1
            };
            if current[i] > best_len {
                best_len = current[i];
                best_start = i + 1 - best_len;
            }
        }
        std::mem::swap(&mut previous, &mut current);
    }
    (best_start, best_len)
}

fn overlap_len(a: &[char], b: &[char]) -> usize {
    let (shorter, longer) = canonical(a, b);
    overlap_span(shorter, longer).1
}

/// For every id in `chunk`, reports the other record sharing the longest
/// substring with it. Ties go to the smallest partner id.
pub fn find_partners(
    sequences: &BTreeMap<RecordId, String>,
    chunk: Chunk,
    control: &KernelControl,
    emit: &mut dyn FnMut(PartialResult),
) -> usize {
    let decoded: BTreeMap<RecordId, Vec<char>> = sequences
        .iter()
        .map(|(id, sequence)| (*id, sequence.chars().collect()))
        .collect();

    let mut reported = 0;
    for (id, sequence) in decoded.range(chunk.id_range()) {
        if control.stop_requested() {
            break;
        }

        let mut best: Option<(usize, RecordId)> = None;
        for (other_id, other) in &decoded {
            if other_id == id {
                continue;
            }
            let len = overlap_len(sequence, other);
            if best.map_or(true, |(best_len, _)| len > best_len) {
                best = Some((len, *other_id));
            }
        }

        match best {
            Some((_, partner)) => {
                emit(PartialResult::Partner { id: *id, partner });
                reported += 1;
            }
            None => PartnerUnavailable { id: *id }.log(),
        }
    }
    reported
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequences(entries: &[(u32, &str)]) -> BTreeMap<RecordId, String> {
        entries
            .iter()
            .map(|(id, s)| (RecordId(*id), s.to_string()))
            .collect()
    }

    fn partners_of(domain: &BTreeMap<RecordId, String>, chunk: Chunk) -> Vec<(RecordId, RecordId)> {
        let mut found = Vec::new();
        find_partners(domain, chunk, &KernelControl::unbounded(), &mut |result| {
            if let PartialResult::Partner { id, partner } = result {
                found.push((id, partner));
            }
        });
        found
    }

    #[test]
    fn test_longest_overlap_basic() {
        assert_eq!(longest_overlap("ABABC", "BABCA"), "BABC");
        assert_eq!(longest_overlap("XYZ", "ABC"), "");
        assert_eq!(longest_overlap("", "ABC"), "");
    }

    #[test]
    fn test_longest_overlap_is_symmetric() {
        let pairs = [
            ("ACGTAC", "TACG"),
            ("AB", "BA"),
            ("GATTACA", "TACAGAT"),
            ("CCAA", "AACC"),
        ];
        for (a, b) in pairs {
            assert_eq!(longest_overlap(a, b), longest_overlap(b, a), "{a} vs {b}");
        }
    }

    #[test]
    fn test_longest_overlap_with_itself_is_whole_string() {
        for s in ["A", "GATTACA", "ABCABC"] {
            assert_eq!(longest_overlap(s, s), s);
        }
    }

    #[test]
    fn test_longest_overlap_counts_characters() {
        assert_eq!(longest_overlap("mañana", "añadir"), "aña");
    }

    #[test]
    fn test_find_partners_picks_longest_overlap() {
        let domain = sequences(&[
            (1, "AAAACCCC"),
            (2, "CCCCGGGG"),
            (3, "GGGGGGTT"),
            (4, "TTTTAAAA"),
        ]);

        let found = partners_of(&domain, Chunk::new(1, 4));
        assert_eq!(
            found,
            vec![
                (RecordId(1), RecordId(2)),
                (RecordId(2), RecordId(1)),
                (RecordId(3), RecordId(2)),
                (RecordId(4), RecordId(1)),
            ]
        );
    }

    #[test]
    fn test_find_partners_breaks_ties_by_smallest_id() {
        let domain = sequences(&[(1, "XY"), (2, "XY"), (3, "XY")]);

        let found = partners_of(&domain, Chunk::new(3, 3));
        assert_eq!(found, vec![(RecordId(3), RecordId(1))]);
    }

    #[test]
    fn test_find_partners_respects_chunk_and_sparse_ids() {
        let domain = sequences(&[(2, "AB"), (5, "AB"), (9, "ZZ")]);

        let found = partners_of(&domain, Chunk::new(3, 9));
        assert_eq!(found, vec![(RecordId(5), RecordId(2)), (RecordId(9), RecordId(2))]);
    }

    #[test]
    fn test_single_record_has_no_partner() {
        let domain = sequences(&[(1, "ACGT")]);
        assert!(partners_of(&domain, Chunk::new(1, 1)).is_empty());
    }
}
