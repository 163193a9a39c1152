//! JSONL (JSON Lines) logging for completed pipeline runs
//!
//! Provides append-only logging of run outcomes to
//! `<log_dir>/history.jsonl`. This is observability output: the metrics
//! panel always works from the in-memory history, never from this file.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};

use crate::history::{PipelineRun, RunStatus, StageTiming};

/// One completed pipeline run, as written to the log
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunRecord {
    /// The run number within this invocation (1-indexed)
    pub run_index: u32,
    /// The commit message that drove the run
    pub commit_message: String,
    /// The selected project type
    pub project_type: String,
    /// Terminal outcome of the run
    pub status: RunStatus,
    /// ISO 8601 timestamp of when the run started
    pub started_at: DateTime<Utc>,
    /// Wall-clock duration of the run in milliseconds
    pub total_duration_ms: i64,
    /// Per-stage timing snapshots, in stage order
    pub stages: Vec<StageTiming>,
}

impl RunRecord {
    /// Build a log record from a finalized run and its request inputs.
    #[must_use]
    pub fn from_run(
        run: &PipelineRun,
        run_index: u32,
        commit_message: &str,
        project_type: &str,
    ) -> Self {
        Self {
            run_index,
            commit_message: commit_message.to_string(),
            project_type: project_type.to_string(),
            status: run.status,
            started_at: run.started_at,
            total_duration_ms: run.total_duration_ms,
            stages: run.stages.clone(),
        }
    }
}

/// JSONL logger for pipeline run history
///
/// Provides append-only logging to `<log_dir>/history.jsonl`.
/// Each line is a JSON object representing a single completed run.
pub struct JsonlLogger {
    log_path: PathBuf,
}

impl JsonlLogger {
    /// Create a new JSONL logger
    ///
    /// # Arguments
    /// * `log_dir` - Directory where history.jsonl will be stored
    ///   (typically `.greenlight`)
    ///
    /// # Errors
    /// Returns an error if the log directory cannot be created
    pub fn new<P: AsRef<Path>>(log_dir: P) -> Result<Self> {
        let log_dir = log_dir.as_ref();

        fs::create_dir_all(log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

        let log_path = log_dir.join("history.jsonl");

        Ok(Self { log_path })
    }

    /// Append a run record to the log
    ///
    /// # Errors
    /// Returns an error if:
    /// - The log file cannot be opened or created
    /// - The record cannot be serialized to JSON
    /// - Writing to the file fails
    pub fn append(&self, record: &RunRecord) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .with_context(|| format!("Failed to open log file: {}", self.log_path.display()))?;

        let json =
            serde_json::to_string(record).context("Failed to serialize run record to JSON")?;

        writeln!(file, "{json}").context("Failed to write to log file")?;

        Ok(())
    }

    /// Read all run records from the log
    ///
    /// # Returns
    /// A vector of all run records, in chronological order
    ///
    /// # Errors
    /// Returns an error if:
    /// - The log file cannot be read
    /// - Any line cannot be parsed as valid JSON
    pub fn read_all(&self) -> Result<Vec<RunRecord>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.log_path)
            .with_context(|| format!("Failed to read log file: {}", self.log_path.display()))?;

        let mut records = Vec::new();

        for (line_num, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            let record: RunRecord = serde_json::from_str(line)
                .with_context(|| format!("Failed to parse line {} as JSON", line_num + 1))?;

            records.push(record);
        }

        Ok(records)
    }

    /// Get the path to the log file
    #[must_use]
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::StageName;
    use tempfile::TempDir;

    fn make_record(run_index: u32, status: RunStatus) -> RunRecord {
        RunRecord {
            run_index,
            commit_message: "feat: add avatars".to_string(),
            project_type: "React Frontend".to_string(),
            status,
            started_at: Utc::now(),
            total_duration_ms: 12_500,
            stages: vec![StageTiming {
                name: StageName::ProjectSetup,
                started_at: Some(Utc::now()),
                ended_at: Some(Utc::now()),
            }],
        }
    }

    #[test]
    fn test_new_logger_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let log_dir = temp_dir.path().join(".greenlight");

        let logger = JsonlLogger::new(&log_dir).unwrap();

        assert!(log_dir.exists());
        assert_eq!(logger.log_path(), log_dir.join("history.jsonl"));
    }

    #[test]
    fn test_append_creates_file_and_writes_json() {
        let temp_dir = TempDir::new().unwrap();
        let logger = JsonlLogger::new(temp_dir.path()).unwrap();

        logger.append(&make_record(1, RunStatus::Success)).unwrap();

        assert!(logger.log_path().exists());
    }

    #[test]
    fn test_append_multiple_records() {
        let temp_dir = TempDir::new().unwrap();
        let logger = JsonlLogger::new(temp_dir.path()).unwrap();

        logger.append(&make_record(1, RunStatus::Success)).unwrap();
        logger.append(&make_record(2, RunStatus::Failed)).unwrap();

        let content = fs::read_to_string(logger.log_path()).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn test_read_all_empty_log() {
        let temp_dir = TempDir::new().unwrap();
        let logger = JsonlLogger::new(temp_dir.path()).unwrap();

        let records = logger.read_all().unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_read_all_returns_records_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let logger = JsonlLogger::new(temp_dir.path()).unwrap();

        logger.append(&make_record(1, RunStatus::Success)).unwrap();
        logger.append(&make_record(2, RunStatus::Failed)).unwrap();

        let records = logger.read_all().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].run_index, 1);
        assert_eq!(records[0].status, RunStatus::Success);
        assert_eq!(records[1].run_index, 2);
        assert_eq!(records[1].status, RunStatus::Failed);
    }

    #[test]
    fn test_round_trip_preserves_stage_timings() {
        let temp_dir = TempDir::new().unwrap();
        let logger = JsonlLogger::new(temp_dir.path()).unwrap();

        let original = make_record(7, RunStatus::Failed);
        logger.append(&original).unwrap();

        let records = logger.read_all().unwrap();
        assert_eq!(records.len(), 1);

        let recovered = &records[0];
        assert_eq!(recovered.run_index, original.run_index);
        assert_eq!(recovered.commit_message, original.commit_message);
        assert_eq!(recovered.project_type, original.project_type);
        assert_eq!(recovered.total_duration_ms, original.total_duration_ms);
        assert_eq!(recovered.stages.len(), 1);
        assert_eq!(recovered.stages[0].name, StageName::ProjectSetup);
    }

    #[test]
    fn test_from_run_copies_outcome() {
        let run = PipelineRun {
            status: RunStatus::Failed,
            stages: vec![],
            started_at: Utc::now(),
            total_duration_ms: 3000,
        };
        let record = RunRecord::from_run(&run, 3, "fix: x", "Django API");
        assert_eq!(record.run_index, 3);
        assert_eq!(record.status, RunStatus::Failed);
        assert_eq!(record.total_duration_ms, 3000);
        assert_eq!(record.commit_message, "fix: x");
        assert_eq!(record.project_type, "Django API");
    }
}
