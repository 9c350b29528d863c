// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use crate::backends::local::kernels::mining::required_prefix;
use crate::backends::local::Sha256Hash;
use crate::backends::stub::{EchoHash, PatternHash};
use crate::cluster::CoordinatorHandle;
use crate::config::AbortPolicy;
use crate::engine::{ClusterRuntime, CoordinatorOptions, DriverOptions, LinearState, PipelineDriver};
use crate::errors::{DispatchError, PipelineError};
use crate::input::{Record, RecordSet};
use crate::protocol::{RecordId, Stage};
use crate::traits::{HashFunction, StageDispatcher};

/// End-to-end tests running real workers and kernels inside one cluster.
#[cfg(test)]
mod tests {
    use super::*;

    const DEADLINE: Duration = Duration::from_secs(30);

    fn start(workers: usize, abort_policy: AbortPolicy, hash: Arc<dyn HashFunction>) -> ClusterRuntime {
        ClusterRuntime::start(
            workers,
            CoordinatorOptions {
                abort_policy,
                shutdown_pause: Duration::from_millis(10),
            },
            DriverOptions {
                stage_timeout: DEADLINE,
                min_workers: workers,
                registration_timeout: Duration::from_secs(5),
            },
            hash,
        )
    }

    async fn ready(
        workers: usize,
        abort_policy: AbortPolicy,
        hash: Arc<dyn HashFunction>,
    ) -> (ClusterRuntime, PipelineDriver<CoordinatorHandle>) {
        let runtime = start(workers, abort_policy, hash);
        let driver = runtime.driver();
        let registered = driver.await_workers().await.expect("workers did not register");
        assert_eq!(registered, workers);
        (runtime, driver)
    }

    async fn stop(runtime: ClusterRuntime) {
        runtime.shutdown();
        timeout(Duration::from_secs(10), runtime.terminated())
            .await
            .expect("cluster did not terminate");
        assert!(runtime.is_terminated());
    }

    fn pattern_target(value: u64) -> String {
        PatternHash.hex_digest(value.to_string().as_bytes())
    }

    /// Decimal candidate carried in the suffix of a `PatternHash` digest.
    fn pattern_candidate(digest: &str) -> i64 {
        let bytes = hex::decode(&digest[5..]).unwrap();
        String::from_utf8(bytes).unwrap().parse().unwrap()
    }

    #[tokio::test]
    async fn test_secrets_stage_cracks_every_record() {
        let (runtime, driver) = ready(3, AbortPolicy::Broadcast, Arc::new(Sha256Hash)).await;

        let mut targets: BTreeMap<RecordId, String> = (1..=42u32)
            .map(|id| (RecordId(id), Sha256Hash.hex_digest((id - 1).to_string().as_bytes())))
            .collect();
        // Digests are matched case-insensitively.
        if let Some(target) = targets.get_mut(&RecordId(42)) {
            *target = target.to_ascii_uppercase();
        }

        let secrets = driver.dispatch_secrets(targets).await.unwrap();

        assert_eq!(secrets.len(), 42);
        for id in 1..=42u32 {
            assert_eq!(secrets.get(&RecordId(id)), Some(&u64::from(id - 1)));
        }
        stop(runtime).await;
    }

    #[tokio::test]
    async fn test_unreachable_secret_reports_incomplete_and_frees_coordinator() {
        let (runtime, driver) = ready(2, AbortPolicy::Broadcast, Arc::new(EchoHash)).await;

        let targets = BTreeMap::from([
            (RecordId(1), hex::encode("7")),
            (RecordId(2), hex::encode("1000001")),
        ]);
        let outcome = driver.dispatch_secrets(targets).await;

        assert!(matches!(
            outcome,
            Err(PipelineError::Dispatch(DispatchError::StageIncomplete {
                stage: Stage::Secrets,
                resolved: 1,
                expected: 2,
            }))
        ));
        let status = runtime.coordinator().status().await.unwrap();
        assert_eq!(status.in_flight, None);

        let retry = BTreeMap::from([(RecordId(1), hex::encode("7"))]);
        let secrets = driver.dispatch_secrets(retry).await.unwrap();
        assert_eq!(secrets.get(&RecordId(1)), Some(&7));
        stop(runtime).await;
    }

    #[tokio::test]
    async fn test_sequence_stage_pairs_longest_overlaps() {
        let (runtime, driver) = ready(2, AbortPolicy::Broadcast, Arc::new(EchoHash)).await;

        let sequences = BTreeMap::from([
            (RecordId(1), "AAAAGGG".to_string()),
            (RecordId(2), "CCCCTTT".to_string()),
            (RecordId(3), "AAAAC".to_string()),
            (RecordId(4), "CCCCA".to_string()),
        ]);
        let partners = driver.dispatch_sequence(sequences).await.unwrap();

        assert_eq!(
            partners.into_inner(),
            BTreeMap::from([
                (RecordId(1), RecordId(3)),
                (RecordId(2), RecordId(4)),
                (RecordId(3), RecordId(1)),
                (RecordId(4), RecordId(2)),
            ])
        );
        stop(runtime).await;
    }

    #[tokio::test]
    async fn test_hash_stage_meets_sign_prefixes() {
        let (runtime, driver) = ready(2, AbortPolicy::Broadcast, Arc::new(PatternHash)).await;

        let partners = BTreeMap::from([
            (RecordId(1), RecordId(2)),
            (RecordId(2), RecordId(1)),
            (RecordId(3), RecordId(1)),
        ]);
        let signs = BTreeMap::from([(RecordId(1), -1), (RecordId(2), 1), (RecordId(3), 1)]);
        let hashes = driver
            .dispatch_hash(partners.clone(), signs.clone())
            .await
            .unwrap();

        assert_eq!(hashes.len(), 3);
        for (id, digest) in hashes.iter() {
            assert!(digest.starts_with(&required_prefix(signs[id])), "{id}: {digest}");
            let nonce = pattern_candidate(digest) - i64::from(partners[id].value());
            assert!(i32::try_from(nonce).is_ok());
        }
        stop(runtime).await;
    }

    fn balanced_weights() -> BTreeMap<RecordId, i64> {
        let mut weights: BTreeMap<RecordId, i64> = (1..=41u32).map(|id| (RecordId(id), 1)).collect();
        weights.insert(RecordId(42), -41);
        weights
    }

    #[tokio::test]
    async fn test_linear_solution_aborts_every_worker() {
        let (runtime, driver) = ready(3, AbortPolicy::Broadcast, Arc::new(EchoHash)).await;

        let signs = driver.dispatch_linear(balanced_weights()).await.unwrap();
        assert_eq!(signs.len(), 42);
        assert!(signs.iter().all(|(_, sign)| *sign == 1));

        // Aborted workers return their chunks and become idle again.
        let coordinator = runtime.coordinator();
        timeout(DEADLINE, async {
            loop {
                let status = coordinator.status().await.unwrap();
                if status.idle == 3 {
                    assert!(matches!(status.linear, LinearState::Solved(_)));
                    break;
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .expect("aborted workers never became idle");
        stop(runtime).await;
    }

    #[tokio::test]
    async fn test_idle_only_policy_leaves_busy_workers_searching() {
        let (runtime, driver) = ready(3, AbortPolicy::IdleOnly, Arc::new(EchoHash)).await;

        let signs = driver.dispatch_linear(balanced_weights()).await.unwrap();
        assert_eq!(signs.len(), 42);

        tokio::time::sleep(Duration::from_millis(200)).await;
        let status = runtime.coordinator().status().await.unwrap();
        assert!(status.idle < 3);
        assert!(matches!(status.linear, LinearState::Solved(_)));

        // Stop still reaches the workers stuck in their chunks.
        stop(runtime).await;
    }

    fn pipeline_records() -> RecordSet {
        let secret = |id: u32| match id {
            1 => 3,
            2 => 1,
            3 => 2,
            _ => 0,
        };
        RecordSet::from_records((1..=42u32).map(|id| Record {
            id: RecordId(id),
            name: format!("student{id}"),
            secret_hash: pattern_target(secret(id)),
            sequence: format!("GATTACA{}", "CGT".repeat(id as usize % 5)),
        }))
    }

    #[tokio::test]
    async fn test_full_pipeline_produces_consistent_report() {
        let (runtime, driver) = ready(3, AbortPolicy::Broadcast, Arc::new(PatternHash)).await;
        let records = pipeline_records();

        let report = driver.run(&records).await.unwrap();

        assert_eq!(report.secrets.len(), 42);
        assert_eq!(report.secrets.get(&RecordId(1)), Some(&3));
        assert_eq!(report.secrets.get(&RecordId(2)), Some(&1));
        assert_eq!(report.secrets.get(&RecordId(3)), Some(&2));
        assert_eq!(report.secrets.get(&RecordId(40)), Some(&0));

        assert_eq!(report.partners.len(), 42);
        assert!(report.partners.iter().all(|(id, partner)| id != partner));

        // 3 - 1 - 2 is the lowest-numbered zero sum: only record 1 flips.
        assert_eq!(report.signs.get(&RecordId(1)), Some(&-1));
        assert!(report
            .signs
            .iter()
            .filter(|(id, _)| **id != RecordId(1))
            .all(|(_, sign)| *sign == 1));

        assert_eq!(report.hashes.len(), 42);
        for (id, digest) in report.hashes.iter() {
            let sign = *report.signs.get(id).unwrap();
            assert!(digest.starts_with(&required_prefix(sign)), "{id}: {digest}");
        }

        assert_eq!(report.stage_millis.len(), 4);
        let json = report.to_json_pretty().unwrap();
        assert!(json.contains("\"stage_millis\""));
        stop(runtime).await;
    }

    #[tokio::test]
    async fn test_late_worker_registers_and_runtime_terminates() {
        let runtime = start(1, AbortPolicy::Broadcast, Arc::new(EchoHash));
        runtime.driver().await_workers().await.unwrap();
        runtime.spawn_worker();

        let coordinator = runtime.coordinator();
        timeout(Duration::from_secs(5), async {
            while coordinator.status().await.unwrap().registered < 2 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("late worker never registered");

        assert!(!runtime.is_terminated());
        stop(runtime).await;
    }
}
