// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::DispatchError;
use crate::protocol::{Chunk, Stage};

/// Splits `space` into at most `workers` contiguous chunks.
///
/// Chunk `i` covers `[lower + i*size, lower + i*size + size - 1]` with
/// `size = width / workers`; the last chunk absorbs the remainder and always
/// ends at `space.upper`. Spaces narrower than the pool get one chunk per
/// value. Chunks are disjoint and their union is exactly `space`.
///
/// ```
/// use the_octopus::engine::partition;
/// use the_octopus::protocol::{Chunk, Stage};
///
/// let chunks = partition(Stage::Secrets, Chunk::new(0, 1_000_000), 3).unwrap();
/// assert_eq!(chunks[0], Chunk::new(0, 333_332));
/// assert_eq!(chunks[2], Chunk::new(666_666, 1_000_000));
/// ```
pub fn partition(stage: Stage, space: Chunk, workers: usize) -> Result<Vec<Chunk>, DispatchError> {
    if workers == 0 {
        return Err(DispatchError::NoWorkersAvailable { stage });
    }
    let width = space.width();
    if width == 0 {
        return Err(DispatchError::EmptyDomain { stage });
    }

    let count = (workers as u64).min(width);
    let size = width / count;
    let chunks = (0..count)
        .map(|i| {
            let lower = space.lower + i * size;
            let upper = if i == count - 1 {
                space.upper
            } else {
                lower + size - 1
            };
            Chunk::new(lower, upper)
        })
        .collect();
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::consts::LINEAR_UPPER_BOUND;

    fn assert_exact_cover(space: Chunk, chunks: &[Chunk]) {
        assert_eq!(chunks.first().map(|c| c.lower), Some(space.lower));
        assert_eq!(chunks.last().map(|c| c.upper), Some(space.upper));
        for pair in chunks.windows(2) {
            assert_eq!(pair[0].upper + 1, pair[1].lower, "gap or overlap in {:?}", chunks);
        }
        let covered: u64 = chunks.iter().map(Chunk::width).sum();
        assert_eq!(covered, space.width());
    }

    #[test]
    fn test_secrets_space_three_workers() {
        let chunks = partition(Stage::Secrets, Chunk::new(0, 1_000_000), 3).unwrap();
        assert_eq!(
            chunks,
            vec![
                Chunk::new(0, 333_332),
                Chunk::new(333_333, 666_665),
                Chunk::new(666_666, 1_000_000),
            ]
        );
    }

    #[test]
    fn test_record_ids_across_pool_sizes() {
        let space = Chunk::new(1, 42);
        for workers in 1..=12 {
            let chunks = partition(Stage::Sequence, space, workers).unwrap();
            assert_eq!(chunks.len(), workers);
            assert_exact_cover(space, &chunks);
        }
    }

    #[test]
    fn test_linear_space_is_covered() {
        let space = Chunk::new(0, LINEAR_UPPER_BOUND);
        for workers in [1, 3, 7, 16] {
            let chunks = partition(Stage::Linear, space, workers).unwrap();
            assert_exact_cover(space, &chunks);
        }
    }

    #[test]
    fn test_more_workers_than_values() {
        let space = Chunk::new(5, 7);
        let chunks = partition(Stage::Hash, space, 10).unwrap();
        assert_eq!(chunks, vec![Chunk::new(5, 5), Chunk::new(6, 6), Chunk::new(7, 7)]);
    }

    #[test]
    fn test_zero_workers_is_rejected() {
        let result = partition(Stage::Linear, Chunk::new(0, 10), 0);
        assert_eq!(result, Err(DispatchError::NoWorkersAvailable { stage: Stage::Linear }));
    }
}
