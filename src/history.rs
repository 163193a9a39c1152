//! Run history aggregation
//!
//! Records the outcome of each completed pipeline run in an append-only
//! in-memory list and derives aggregate metrics from it: success rate,
//! last-run duration, and per-stage-name average durations.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::stage::{PipelineStage, StageName};

/// Terminal outcome of a whole pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Every stage completed, no checkpoint failed
    Success,
    /// A checkpoint failed or a provider fault aborted the run
    Failed,
}

/// Timing snapshot of one stage, as recorded in a finished run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTiming {
    /// Stage name
    pub name: StageName,
    /// When the stage entered `Running`, if it ran at all
    pub started_at: Option<DateTime<Utc>>,
    /// When the stage reached a terminal status
    pub ended_at: Option<DateTime<Utc>>,
}

impl From<&PipelineStage> for StageTiming {
    fn from(stage: &PipelineStage) -> Self {
        Self {
            name: stage.name,
            started_at: stage.started_at,
            ended_at: stage.ended_at,
        }
    }
}

/// Immutable summary of one completed pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineRun {
    /// Terminal outcome
    pub status: RunStatus,
    /// Timing snapshot of every stage that existed at run end, in order
    pub stages: Vec<StageTiming>,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// Wall-clock duration from run start to finalization, in milliseconds
    pub total_duration_ms: i64,
}

impl PipelineRun {
    /// Total duration in fractional seconds.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn total_duration_secs(&self) -> f64 {
        self.total_duration_ms as f64 / 1000.0
    }
}

/// Average duration for one stage name across historical runs.
#[derive(Debug, Clone, PartialEq)]
pub struct StageAverage {
    /// Stage name
    pub name: StageName,
    /// Mean duration in fractional seconds
    pub avg_secs: f64,
}

/// Aggregate metrics derived from the run history.
#[derive(Debug, Clone, PartialEq)]
pub struct RunMetrics {
    /// Number of recorded runs
    pub total_runs: usize,
    /// Number of runs that finished with `RunStatus::Success`
    pub successful_runs: usize,
    /// Successful runs / total runs, as a percentage
    pub success_rate: f64,
    /// Duration of the most recent run in fractional seconds
    pub last_run_duration_secs: f64,
    /// Per-stage-name averages, ascending by duration. Stage names that
    /// never recorded both timestamps are omitted, not reported as zero.
    pub average_stage_secs: Vec<StageAverage>,
}

/// Append-only in-memory record of completed pipeline runs.
///
/// No deduplication, no eviction; the list lives for the process lifetime
/// and is never persisted.
#[derive(Debug, Default)]
pub struct RunHistory {
    runs: Vec<PipelineRun>,
}

impl RunHistory {
    /// Create an empty history.
    #[must_use]
    pub const fn new() -> Self {
        Self { runs: Vec::new() }
    }

    /// Append a completed run.
    pub fn append(&mut self, run: PipelineRun) {
        self.runs.push(run);
    }

    /// All recorded runs, in insertion order.
    #[must_use]
    pub fn runs(&self) -> &[PipelineRun] {
        &self.runs
    }

    /// Number of recorded runs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    /// Whether no runs have been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Derive aggregate metrics, or `None` when the history is empty.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn metrics(&self) -> Option<RunMetrics> {
        let last = self.runs.last()?;

        let total_runs = self.runs.len();
        let successful_runs = self
            .runs
            .iter()
            .filter(|run| run.status == RunStatus::Success)
            .count();
        let success_rate = successful_runs as f64 / total_runs as f64 * 100.0;

        // Sum durations per stage name over occurrences with both timestamps
        let mut timings: HashMap<StageName, (i64, u32)> = HashMap::new();
        for run in &self.runs {
            for timing in &run.stages {
                if let (Some(start), Some(end)) = (timing.started_at, timing.ended_at) {
                    let entry = timings.entry(timing.name).or_insert((0, 0));
                    entry.0 += (end - start).num_milliseconds();
                    entry.1 += 1;
                }
            }
        }

        let mut average_stage_secs: Vec<StageAverage> = timings
            .into_iter()
            .map(|(name, (total_ms, count))| StageAverage {
                name,
                avg_secs: total_ms as f64 / f64::from(count) / 1000.0,
            })
            .collect();
        average_stage_secs.sort_by(|a, b| {
            a.avg_secs
                .total_cmp(&b.avg_secs)
                .then_with(|| a.name.label().cmp(b.name.label()))
        });

        Some(RunMetrics {
            total_runs,
            successful_runs,
            success_rate,
            last_run_duration_secs: last.total_duration_secs(),
            average_stage_secs,
        })
    }
}
