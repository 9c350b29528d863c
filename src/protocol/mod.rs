// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Shared data definitions for the stage pipeline.
//!
//! Everything the driver, the coordinator and the compute workers exchange is
//! defined here. Plain data types derive `Serialize`/`Deserialize` so they can
//! cross a process boundary; the mailbox messages in [`messages`] embed
//! channel handles and therefore stay in-process.
//!
//! # Flow
//!
//! ```text
//! driver --StageInput--> coordinator --StageRequest(chunk)--> worker
//!                        coordinator <--PartialResult------- worker
//! driver <--StageOutput-- coordinator
//! ```

mod messages;

pub use messages::{CoordinatorMessage, CoordinatorStatus, DispatchReply, WorkerMessage};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;
use std::sync::Arc;

use crate::cluster::CoordinatorHandle;
use crate::config::consts::{LINEAR_UPPER_BOUND, SECRETS_UPPER_BOUND};

/// Stable identifier of an input record (1..=42 for the shipped data set).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u32);

impl RecordId {
    pub fn value(self) -> u32 {
        self.0
    }
}

impl From<u32> for RecordId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The four sequential sub-problems of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Secrets,
    Sequence,
    Linear,
    Hash,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Secrets => "secrets",
            Stage::Sequence => "sequence",
            Stage::Linear => "linear",
            Stage::Hash => "hash",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Monotonic number the coordinator assigns to every stage it dispatches.
///
/// Requests and reports carry it so results that belong to an earlier
/// dispatch can be recognised and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DispatchId(pub u64);

impl DispatchId {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for DispatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Inclusive integer range handed to one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Chunk {
    pub lower: u64,
    pub upper: u64,
}

impl Chunk {
    pub fn new(lower: u64, upper: u64) -> Self {
        Self { lower, upper }
    }

    /// Number of integers covered by the chunk.
    pub fn width(&self) -> u64 {
        if self.upper < self.lower {
            0
        } else {
            (self.upper - self.lower).saturating_add(1)
        }
    }

    pub fn contains(&self, value: u64) -> bool {
        self.lower <= value && value <= self.upper
    }

    /// The chunk interpreted as a range of record ids.
    pub fn id_range(&self) -> RangeInclusive<RecordId> {
        let lower = u32::try_from(self.lower).unwrap_or(u32::MAX);
        let upper = u32::try_from(self.upper).unwrap_or(u32::MAX);
        RecordId(lower)..=RecordId(upper)
    }
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.lower, self.upper)
    }
}

/// The full domain of a stage. The coordinator receives it from the driver
/// and ships one shared copy with every chunk it hands out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageInput {
    Secrets {
        targets: BTreeMap<RecordId, String>,
    },
    Sequence {
        sequences: BTreeMap<RecordId, String>,
    },
    Linear {
        weights: BTreeMap<RecordId, i64>,
    },
    Hash {
        partners: BTreeMap<RecordId, RecordId>,
        signs: BTreeMap<RecordId, i8>,
    },
}

impl StageInput {
    pub fn stage(&self) -> Stage {
        match self {
            StageInput::Secrets { .. } => Stage::Secrets,
            StageInput::Sequence { .. } => Stage::Sequence,
            StageInput::Linear { .. } => Stage::Linear,
            StageInput::Hash { .. } => Stage::Hash,
        }
    }

    /// Number of records the stage has to resolve.
    pub fn record_count(&self) -> usize {
        match self {
            StageInput::Secrets { targets } => targets.len(),
            StageInput::Sequence { sequences } => sequences.len(),
            StageInput::Linear { weights } => weights.len(),
            StageInput::Hash { partners, .. } => partners.len(),
        }
    }

    /// Inclusive search space that gets partitioned across workers.
    ///
    /// Secrets and Linear search integer spaces; Sequence and Hash walk the
    /// record ids themselves. `None` when the domain has no records.
    pub fn search_space(&self) -> Option<Chunk> {
        if self.record_count() == 0 {
            return None;
        }
        match self {
            StageInput::Secrets { .. } => Some(Chunk::new(0, SECRETS_UPPER_BOUND)),
            StageInput::Linear { .. } => Some(Chunk::new(0, LINEAR_UPPER_BOUND)),
            StageInput::Sequence { sequences } => id_span(sequences),
            StageInput::Hash { partners, .. } => id_span(partners),
        }
    }
}

fn id_span<V>(domain: &BTreeMap<RecordId, V>) -> Option<Chunk> {
    let first = domain.keys().next()?;
    let last = domain.keys().next_back()?;
    Some(Chunk::new(u64::from(first.0), u64::from(last.0)))
}

/// One chunk of work addressed to a worker.
#[derive(Debug, Clone)]
pub struct StageRequest {
    pub dispatch: DispatchId,
    pub input: Arc<StageInput>,
    pub chunk: Chunk,
    /// Whoever sent the work; partial results stream back here.
    pub reply_to: CoordinatorHandle,
}

impl StageRequest {
    pub fn stage(&self) -> Stage {
        self.input.stage()
    }
}

/// A worker's answer for one record (or, for Linear, one sign assignment).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartialResult {
    Secret { id: RecordId, value: u64 },
    Partner { id: RecordId, partner: RecordId },
    /// Empty when the chunk was exhausted or aborted without a solution.
    Signs { signs: BTreeMap<RecordId, i8> },
    Hash { id: RecordId, hash: String },
}

impl PartialResult {
    pub fn stage(&self) -> Stage {
        match self {
            PartialResult::Secret { .. } => Stage::Secrets,
            PartialResult::Partner { .. } => Stage::Sequence,
            PartialResult::Signs { .. } => Stage::Linear,
            PartialResult::Hash { .. } => Stage::Hash,
        }
    }
}

/// Ordered `id -> value` map accumulated for one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Aggregate<V>(pub BTreeMap<RecordId, V>);

impl<V> Aggregate<V> {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Records `value` for `id` unless the id is already resolved.
    /// Returns `true` when the id was new.
    pub fn insert(&mut self, id: RecordId, value: V) -> bool {
        match self.0.entry(id) {
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
            std::collections::btree_map::Entry::Occupied(_) => false,
        }
    }

    pub fn get(&self, id: &RecordId) -> Option<&V> {
        self.0.get(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RecordId, &V)> {
        self.0.iter()
    }

    pub fn into_inner(self) -> BTreeMap<RecordId, V> {
        self.0
    }
}

impl<V> Default for Aggregate<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> FromIterator<(RecordId, V)> for Aggregate<V> {
    fn from_iter<I: IntoIterator<Item = (RecordId, V)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<V> From<BTreeMap<RecordId, V>> for Aggregate<V> {
    fn from(map: BTreeMap<RecordId, V>) -> Self {
        Self(map)
    }
}

/// Completed result of one stage as released to the driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageOutput {
    Secrets(Aggregate<u64>),
    Sequence(Aggregate<RecordId>),
    Linear(Aggregate<i8>),
    Hash(Aggregate<String>),
}

impl StageOutput {
    pub fn stage(&self) -> Stage {
        match self {
            StageOutput::Secrets(_) => Stage::Secrets,
            StageOutput::Sequence(_) => Stage::Sequence,
            StageOutput::Linear(_) => Stage::Linear,
            StageOutput::Hash(_) => Stage::Hash,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            StageOutput::Secrets(aggregate) => aggregate.len(),
            StageOutput::Sequence(aggregate) => aggregate.len(),
            StageOutput::Linear(aggregate) => aggregate.len(),
            StageOutput::Hash(aggregate) => aggregate.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_width_and_contains() {
        let chunk = Chunk::new(10, 19);
        assert_eq!(chunk.width(), 10);
        assert!(chunk.contains(10));
        assert!(chunk.contains(19));
        assert!(!chunk.contains(20));
        assert_eq!(Chunk::new(5, 4).width(), 0);
    }

    #[test]
    fn test_search_space_per_stage() {
        let targets = BTreeMap::from([(RecordId(1), "aa".to_string())]);
        let secrets = StageInput::Secrets { targets };
        assert_eq!(secrets.search_space(), Some(Chunk::new(0, SECRETS_UPPER_BOUND)));

        let sequences = BTreeMap::from([
            (RecordId(3), "ACGT".to_string()),
            (RecordId(7), "GTTA".to_string()),
        ]);
        let sequence = StageInput::Sequence { sequences };
        assert_eq!(sequence.search_space(), Some(Chunk::new(3, 7)));

        let linear = StageInput::Linear { weights: BTreeMap::new() };
        assert_eq!(linear.search_space(), None);
    }

    #[test]
    fn test_aggregate_keeps_first_value() {
        let mut aggregate = Aggregate::new();
        assert!(aggregate.insert(RecordId(1), 10u64));
        assert!(!aggregate.insert(RecordId(1), 99u64));
        assert_eq!(aggregate.get(&RecordId(1)), Some(&10));
        assert_eq!(aggregate.len(), 1);
    }

    #[test]
    fn test_partial_result_serializes_with_stage_tag() {
        let result = PartialResult::Secret { id: RecordId(4), value: 1234 };
        let json = serde_json::to_string(&result).expect("serialize");
        assert_eq!(json, r#"{"secret":{"id":4,"value":1234}}"#);
        assert_eq!(result.stage(), Stage::Secrets);
    }
}
