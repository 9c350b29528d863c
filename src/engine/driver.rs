// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Sequential stage driver.
//!
//! Feeds the four stages to a [`StageDispatcher`] in order, deriving each
//! stage's domain from the records and the outputs of earlier stages:
//!
//! ```text
//! records --secrets--> values --+--> linear weights --> signs --+
//! records --sequences-> partners +---------------------------->+--> hash
//! ```

use serde::Serialize;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::Instrument;

use crate::config::consts::{
    DEFAULT_REGISTRATION_TIMEOUT_SECONDS, DEFAULT_STAGE_TIMEOUT_SECONDS, STATUS_POLL_INTERVAL_MS,
};
use crate::errors::PipelineError;
use crate::input::RecordSet;
use crate::observability::messages::pipeline::{
    PipelineCompleted, PipelineStarted, StageFinished, StageRequested, WorkersReady,
};
use crate::observability::messages::StructuredLog;
use crate::protocol::{Aggregate, RecordId, Stage, StageInput, StageOutput};
use crate::traits::StageDispatcher;

#[derive(Debug, Clone)]
pub struct DriverOptions {
    pub stage_timeout: Duration,
    /// Workers that must be registered before the first dispatch.
    pub min_workers: usize,
    pub registration_timeout: Duration,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            stage_timeout: Duration::from_secs(DEFAULT_STAGE_TIMEOUT_SECONDS),
            min_workers: 1,
            registration_timeout: Duration::from_secs(DEFAULT_REGISTRATION_TIMEOUT_SECONDS),
        }
    }
}

/// Everything the pipeline resolved, in record-id order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineReport {
    pub secrets: Aggregate<u64>,
    pub partners: Aggregate<RecordId>,
    pub signs: Aggregate<i8>,
    pub hashes: Aggregate<String>,
    pub stage_millis: BTreeMap<Stage, u64>,
}

impl PipelineReport {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

pub struct PipelineDriver<D: StageDispatcher> {
    dispatcher: D,
    options: DriverOptions,
}

impl<D: StageDispatcher> PipelineDriver<D> {
    pub fn new(dispatcher: D, options: DriverOptions) -> Self {
        Self {
            dispatcher,
            options,
        }
    }

    /// Polls the dispatcher until `min_workers` are registered.
    pub async fn await_workers(&self) -> Result<usize, PipelineError> {
        let started = Instant::now();
        let poll = Duration::from_millis(STATUS_POLL_INTERVAL_MS);
        loop {
            let status = self.dispatcher.status().await?;
            if status.registered >= self.options.min_workers {
                WorkersReady {
                    registered: status.registered,
                    waited: started.elapsed(),
                }
                .log();
                return Ok(status.registered);
            }
            if started.elapsed() >= self.options.registration_timeout {
                return Err(PipelineError::WorkersUnavailable {
                    expected: self.options.min_workers,
                    registered: status.registered,
                    waited: started.elapsed(),
                });
            }
            tokio::time::sleep(poll).await;
        }
    }

    pub async fn dispatch_secrets(
        &self,
        targets: BTreeMap<RecordId, String>,
    ) -> Result<Aggregate<u64>, PipelineError> {
        match self.dispatch(StageInput::Secrets { targets }).await? {
            StageOutput::Secrets(values) => Ok(values),
            other => Err(unexpected(Stage::Secrets, &other)),
        }
    }

    pub async fn dispatch_sequence(
        &self,
        sequences: BTreeMap<RecordId, String>,
    ) -> Result<Aggregate<RecordId>, PipelineError> {
        match self.dispatch(StageInput::Sequence { sequences }).await? {
            StageOutput::Sequence(partners) => Ok(partners),
            other => Err(unexpected(Stage::Sequence, &other)),
        }
    }

    pub async fn dispatch_linear(
        &self,
        weights: BTreeMap<RecordId, i64>,
    ) -> Result<Aggregate<i8>, PipelineError> {
        match self.dispatch(StageInput::Linear { weights }).await? {
            StageOutput::Linear(signs) => Ok(signs),
            other => Err(unexpected(Stage::Linear, &other)),
        }
    }

    pub async fn dispatch_hash(
        &self,
        partners: BTreeMap<RecordId, RecordId>,
        signs: BTreeMap<RecordId, i8>,
    ) -> Result<Aggregate<String>, PipelineError> {
        match self.dispatch(StageInput::Hash { partners, signs }).await? {
            StageOutput::Hash(hashes) => Ok(hashes),
            other => Err(unexpected(Stage::Hash, &other)),
        }
    }

    /// Runs Secrets, Sequence, Linear and Hash in that order.
    ///
    /// The Linear weights are the cracked secret values; the Hash stage pairs
    /// each record's partner with its sign.
    pub async fn run(&self, records: &RecordSet) -> Result<PipelineReport, PipelineError> {
        let started = Instant::now();
        PipelineStarted {
            records: records.len(),
        }
        .log();

        let mut stage_millis = BTreeMap::new();

        let clock = Instant::now();
        let secrets = self.dispatch_secrets(records.secret_hashes()).await?;
        stage_millis.insert(Stage::Secrets, elapsed_millis(clock));

        let clock = Instant::now();
        let partners = self.dispatch_sequence(records.sequences()).await?;
        stage_millis.insert(Stage::Sequence, elapsed_millis(clock));

        let weights = secrets
            .iter()
            .map(|(id, value)| (*id, i64::try_from(*value).unwrap_or(i64::MAX)))
            .collect();
        let clock = Instant::now();
        let signs = self.dispatch_linear(weights).await?;
        stage_millis.insert(Stage::Linear, elapsed_millis(clock));

        let clock = Instant::now();
        let hashes = self
            .dispatch_hash(partners.0.clone(), signs.0.clone())
            .await?;
        stage_millis.insert(Stage::Hash, elapsed_millis(clock));

        PipelineCompleted {
            duration: started.elapsed(),
        }
        .log();

        Ok(PipelineReport {
            secrets,
            partners,
            signs,
            hashes,
            stage_millis,
        })
    }

    async fn dispatch(&self, input: StageInput) -> Result<StageOutput, PipelineError> {
        let stage = input.stage();
        let timeout = self.options.stage_timeout;
        let requested = StageRequested {
            stage,
            records: input.record_count(),
        };
        requested.log();
        let span = requested.span("stage");

        let started = Instant::now();
        let output = tokio::time::timeout(timeout, self.dispatcher.dispatch(input))
            .instrument(span)
            .await
            .map_err(|_| PipelineError::StageTimeout { stage, timeout })??;

        StageFinished {
            stage,
            results: output.len(),
            duration: started.elapsed(),
        }
        .log();
        Ok(output)
    }
}

fn unexpected(expected: Stage, output: &StageOutput) -> PipelineError {
    PipelineError::UnexpectedOutput {
        expected,
        actual: output.stage(),
    }
}

fn elapsed_millis(since: Instant) -> u64 {
    u64::try_from(since.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::LinearState;
    use crate::errors::DispatchError;
    use crate::protocol::CoordinatorStatus;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn status_with(registered: usize) -> CoordinatorStatus {
        CoordinatorStatus {
            registered,
            idle: registered,
            in_flight: None,
            unassigned: 0,
            linear: LinearState::Idle,
        }
    }

    /// Answers every stage from canned outputs and records the order of requests.
    struct ScriptedDispatcher {
        seen: Mutex<Vec<StageInput>>,
    }

    #[async_trait]
    impl StageDispatcher for ScriptedDispatcher {
        async fn dispatch(&self, input: StageInput) -> Result<StageOutput, PipelineError> {
            self.seen.lock().unwrap().push(input.clone());
            let output = match input {
                StageInput::Secrets { targets } => StageOutput::Secrets(
                    targets.keys().map(|id| (*id, u64::from(id.0) * 10)).collect(),
                ),
                StageInput::Sequence { sequences } => StageOutput::Sequence(
                    sequences.keys().map(|id| (*id, RecordId(id.0 % 2 + 1))).collect(),
                ),
                StageInput::Linear { weights } => {
                    StageOutput::Linear(weights.keys().map(|id| (*id, -1)).collect())
                }
                StageInput::Hash { partners, .. } => StageOutput::Hash(
                    partners.keys().map(|id| (*id, format!("00000{id}"))).collect(),
                ),
            };
            Ok(output)
        }

        async fn status(&self) -> Result<CoordinatorStatus, PipelineError> {
            Ok(status_with(1))
        }
    }

    struct StalledDispatcher;

    #[async_trait]
    impl StageDispatcher for StalledDispatcher {
        async fn dispatch(&self, _input: StageInput) -> Result<StageOutput, PipelineError> {
            std::future::pending().await
        }

        async fn status(&self) -> Result<CoordinatorStatus, PipelineError> {
            Ok(status_with(0))
        }
    }

    struct GrowingPool {
        polls: AtomicUsize,
    }

    #[async_trait]
    impl StageDispatcher for GrowingPool {
        async fn dispatch(&self, input: StageInput) -> Result<StageOutput, PipelineError> {
            Err(DispatchError::NoWorkersAvailable {
                stage: input.stage(),
            }
            .into())
        }

        async fn status(&self) -> Result<CoordinatorStatus, PipelineError> {
            Ok(status_with(self.polls.fetch_add(1, Ordering::SeqCst)))
        }
    }

    fn records() -> RecordSet {
        crate::input::parse_records(
            "id;name;password;gene\n1;Ada;aa;ACGT\n2;Grace;bb;CGTA\n3;Linus;cc;GTAC\n",
        )
        .unwrap()
    }

    fn options(stage_timeout: Duration, min_workers: usize) -> DriverOptions {
        DriverOptions {
            stage_timeout,
            min_workers,
            registration_timeout: Duration::from_millis(300),
        }
    }

    #[tokio::test]
    async fn test_run_chains_stage_outputs() {
        let dispatcher = ScriptedDispatcher {
            seen: Mutex::new(Vec::new()),
        };
        let driver = PipelineDriver::new(dispatcher, options(Duration::from_secs(5), 1));

        let report = driver.run(&records()).await.unwrap();
        assert_eq!(report.secrets.get(&RecordId(2)), Some(&20));
        assert_eq!(report.hashes.len(), 3);
        assert_eq!(report.stage_millis.len(), 4);

        let seen = driver.dispatcher.seen.lock().unwrap();
        let stages: Vec<Stage> = seen.iter().map(StageInput::stage).collect();
        assert_eq!(stages, vec![Stage::Secrets, Stage::Sequence, Stage::Linear, Stage::Hash]);

        match &seen[2] {
            StageInput::Linear { weights } => {
                assert_eq!(weights.get(&RecordId(3)), Some(&30));
            }
            other => panic!("unexpected input {:?}", other),
        }
        match &seen[3] {
            StageInput::Hash { partners, signs } => {
                assert_eq!(partners.get(&RecordId(1)), Some(&RecordId(2)));
                assert_eq!(signs.get(&RecordId(1)), Some(&-1));
            }
            other => panic!("unexpected input {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stage_timeout_is_reported() {
        let driver = PipelineDriver::new(StalledDispatcher, options(Duration::from_millis(50), 1));

        let result = driver.dispatch_secrets(records().secret_hashes()).await;
        assert!(matches!(
            result,
            Err(PipelineError::StageTimeout {
                stage: Stage::Secrets,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_await_workers_times_out() {
        let driver = PipelineDriver::new(StalledDispatcher, options(Duration::from_secs(1), 2));

        let result = driver.await_workers().await;
        assert!(matches!(
            result,
            Err(PipelineError::WorkersUnavailable {
                expected: 2,
                registered: 0,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_await_workers_returns_once_enough_registered() {
        let pool = GrowingPool {
            polls: AtomicUsize::new(0),
        };
        let driver = PipelineDriver::new(pool, options(Duration::from_secs(1), 2));

        assert_eq!(driver.await_workers().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_dispatch_error_is_propagated() {
        let pool = GrowingPool {
            polls: AtomicUsize::new(0),
        };
        let driver = PipelineDriver::new(pool, options(Duration::from_secs(1), 1));

        let result = driver.run(&records()).await;
        assert!(matches!(
            result,
            Err(PipelineError::Dispatch(DispatchError::NoWorkersAvailable {
                stage: Stage::Secrets
            }))
        ));
    }

    #[test]
    fn test_report_serializes_stage_names() {
        let report = PipelineReport {
            secrets: Aggregate::from(BTreeMap::from([(RecordId(1), 7)])),
            partners: Aggregate::new(),
            signs: Aggregate::new(),
            hashes: Aggregate::new(),
            stage_millis: BTreeMap::from([(Stage::Secrets, 12)]),
        };
        let json = report.to_json_pretty().unwrap();
        assert!(json.contains("\"secrets\": {\n    \"1\": 7\n  }"));
        assert!(json.contains("\"secrets\": 12"));
    }
}
