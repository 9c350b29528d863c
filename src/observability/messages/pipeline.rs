// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the pipeline driver and the record feed.

use crate::observability::messages::StructuredLog;
use crate::protocol::Stage;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::time::Duration;
use tracing::Span;

/// The driver is about to chain the four stages.
///
/// # Log Level
/// `info!` - Important operational event
pub struct PipelineStarted {
    pub records: usize,
}

impl Display for PipelineStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Starting pipeline over {} records", self.records)
    }
}

impl StructuredLog for PipelineStarted {
    fn log(&self) {
        tracing::info!(records = self.records, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("pipeline", span_name = name, records = self.records)
    }
}

/// # Log Level
/// `info!` - Important operational event
pub struct PipelineCompleted {
    pub duration: Duration,
}

impl Display for PipelineCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Pipeline completed in {:?}", self.duration)
    }
}

impl StructuredLog for PipelineCompleted {
    fn log(&self) {
        tracing::info!(
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "pipeline_completed",
            span_name = name,
            duration = ?self.duration,
        )
    }
}

/// The driver sent a stage to the coordinator.
///
/// # Log Level
/// `info!` - Important operational event
pub struct StageRequested {
    pub stage: Stage,
    pub records: usize,
}

impl Display for StageRequested {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Requesting {} stage for {} records", self.stage, self.records)
    }
}

impl StructuredLog for StageRequested {
    fn log(&self) {
        tracing::info!(stage = %self.stage, records = self.records, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "stage",
            span_name = name,
            stage = %self.stage,
            records = self.records,
        )
    }
}

/// # Log Level
/// `info!` - Important operational event
pub struct StageFinished {
    pub stage: Stage,
    pub results: usize,
    pub duration: Duration,
}

impl Display for StageFinished {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} stage returned {} results in {:?}",
            self.stage, self.results, self.duration
        )
    }
}

impl StructuredLog for StageFinished {
    fn log(&self) {
        tracing::info!(
            stage = %self.stage,
            results = self.results,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "stage_finished",
            span_name = name,
            stage = %self.stage,
            results = self.results,
            duration = ?self.duration,
        )
    }
}

/// Enough workers registered for the driver to start.
///
/// # Log Level
/// `info!` - Important operational event
pub struct WorkersReady {
    pub registered: usize,
    pub waited: Duration,
}

impl Display for WorkersReady {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} workers registered after {:?}",
            self.registered, self.waited
        )
    }
}

impl StructuredLog for WorkersReady {
    fn log(&self) {
        tracing::info!(
            registered = self.registered,
            waited_ms = self.waited.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "workers_ready",
            span_name = name,
            registered = self.registered,
            waited = ?self.waited,
        )
    }
}

/// The input file does not hold the expected number of records.
///
/// # Log Level
/// `warn!` - The pipeline still runs over what was read
pub struct RecordCountMismatch {
    pub expected: usize,
    pub found: usize,
}

impl Display for RecordCountMismatch {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Expected {} records, found {}",
            self.expected, self.found
        )
    }
}

impl StructuredLog for RecordCountMismatch {
    fn log(&self) {
        tracing::warn!(expected = self.expected, found = self.found, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "record_count_mismatch",
            span_name = name,
            expected = self.expected,
            found = self.found,
        )
    }
}

/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_octopus::observability::messages::pipeline::RecordsLoaded;
/// use std::path::Path;
///
/// let msg = RecordsLoaded { path: Path::new("students.csv"), records: 42 };
/// assert_eq!(msg.to_string(), "Loaded 42 records from students.csv");
/// ```
pub struct RecordsLoaded<'a> {
    pub path: &'a Path,
    pub records: usize,
}

impl Display for RecordsLoaded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Loaded {} records from {}",
            self.records,
            self.path.display()
        )
    }
}

impl StructuredLog for RecordsLoaded<'_> {
    fn log(&self) {
        tracing::info!(
            path = %self.path.display(),
            records = self.records,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "records_loaded",
            span_name = name,
            path = %self.path.display(),
            records = self.records,
        )
    }
}
