// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::Context;
use std::env;
use std::time::Duration;
use the_octopus::config::{load_and_validate_config, Config, RuntimeBuilder};
use the_octopus::engine::ClusterRuntime;
use the_octopus::input::load_records;
use tracing_subscriber::EnvFilter;

/// Upper bound on how long shutdown may take once the driver is done.
const TERMINATION_GRACE: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args.len() > 3 {
        eprintln!("Usage: {} <records.csv> [config.yaml]", args[0]);
        eprintln!("Example: {} data/students.csv configs/local.yaml", args[0]);
        std::process::exit(1);
    }

    let config = match args.get(2) {
        Some(path) => match load_and_validate_config(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("❌ Invalid configuration {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => Config::default(),
    };

    init_tracing(&config);

    let code = match run(&args[1], &config).await {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!("{:#}", e);
            1
        }
    };
    std::process::exit(code);
}

/// `RUST_LOG` wins over the configured level.
fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(records_path: &str, config: &Config) -> anyhow::Result<()> {
    let records = load_records(records_path)
        .with_context(|| format!("failed to load records from {}", records_path))?;

    let runtime = RuntimeBuilder::from_config(config);
    let driver = runtime.driver();

    let outcome = async {
        driver
            .await_workers()
            .await
            .context("workers did not register")?;
        driver.run(&records).await.context("pipeline failed")
    }
    .await;

    shut_down(&runtime).await;

    let report = outcome?;
    let json = report
        .to_json_pretty()
        .context("failed to serialise the pipeline report")?;
    println!("{}", json);
    Ok(())
}

async fn shut_down(runtime: &ClusterRuntime) {
    runtime.shutdown();
    if tokio::time::timeout(TERMINATION_GRACE, runtime.terminated())
        .await
        .is_err()
    {
        tracing::warn!(
            grace_seconds = TERMINATION_GRACE.as_secs(),
            "Cluster did not terminate in time, exiting anyway"
        );
    }
}
