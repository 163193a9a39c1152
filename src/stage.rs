//! Pipeline stage data model
//!
//! Defines the status/name enums and the mutable `PipelineStage` record that
//! the runner owns for the duration of one pipeline run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Execution status of a single pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    /// Stage has not started yet
    Pending,
    /// Stage is currently executing
    Running,
    /// Stage finished successfully
    Success,
    /// Stage finished with a failure
    Failed,
}

impl StageStatus {
    /// Whether this status is terminal (`Success` or `Failed`).
    ///
    /// A stage never leaves a terminal status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }
}

/// Names of the simulated pipeline stages.
///
/// `FailureAnalysis` and `AutomatedRollback` are diagnostic stages: they are
/// never part of the initial catalog and only appear when a checkpoint fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageName {
    /// AI-generated project detection and pipeline configuration
    #[serde(rename = "AI Project Setup")]
    ProjectSetup,
    /// AI merge conflict assessment
    #[serde(rename = "AI Merge Conflict Check")]
    MergeCheck,
    /// AI security scan of the commit
    #[serde(rename = "AI Security Scan")]
    SecurityScan,
    /// AI maintainability/performance review
    #[serde(rename = "AI Code Analysis")]
    CodeAnalysis,
    /// AI-generated test cases
    #[serde(rename = "AI Test Generation")]
    TestGeneration,
    /// Simulated build and test checkpoint
    #[serde(rename = "Build & Test")]
    BuildAndTest,
    /// Diagnostic stage inserted after a build failure
    #[serde(rename = "AI Failure Analysis")]
    FailureAnalysis,
    /// AI rollout strategy recommendation
    #[serde(rename = "AI Deployment Strategy")]
    DeploymentStrategy,
    /// Simulated staging deployment (never fails)
    #[serde(rename = "Deploy to Staging")]
    DeployToStaging,
    /// AI-generated release notes
    #[serde(rename = "AI Release Notes")]
    ReleaseNotes,
    /// Simulated production deployment checkpoint
    #[serde(rename = "Deploy to Production")]
    DeployToProduction,
    /// Diagnostic stage inserted after a production deployment failure
    #[serde(rename = "AI Automated Rollback")]
    AutomatedRollback,
}

impl StageName {
    /// Human-readable label, as shown in stage output and logs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ProjectSetup => "AI Project Setup",
            Self::MergeCheck => "AI Merge Conflict Check",
            Self::SecurityScan => "AI Security Scan",
            Self::CodeAnalysis => "AI Code Analysis",
            Self::TestGeneration => "AI Test Generation",
            Self::BuildAndTest => "Build & Test",
            Self::FailureAnalysis => "AI Failure Analysis",
            Self::DeploymentStrategy => "AI Deployment Strategy",
            Self::DeployToStaging => "Deploy to Staging",
            Self::ReleaseNotes => "AI Release Notes",
            Self::DeployToProduction => "Deploy to Production",
            Self::AutomatedRollback => "AI Automated Rollback",
        }
    }
}

impl std::fmt::Display for StageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One named step of a pipeline run.
///
/// Created from the static catalog at run start (cloned per run, never
/// shared) or injected mid-run by the runner. `started_at` is set exactly
/// when the stage enters `Running`; `ended_at` exactly when it enters a
/// terminal status. Transition methods are no-ops on a terminal stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStage {
    /// Unique id within a run; ordering key for catalog stages
    pub id: u32,
    /// Stage name
    pub name: StageName,
    /// Current status
    pub status: StageStatus,
    /// Markdown content produced by the stage (empty until populated)
    pub content: String,
    /// When the stage entered `Running`
    pub started_at: Option<DateTime<Utc>>,
    /// When the stage entered a terminal status
    pub ended_at: Option<DateTime<Utc>>,
}

impl PipelineStage {
    /// Create a fresh `Pending` stage with no content or timestamps.
    #[must_use]
    pub const fn new(id: u32, name: StageName) -> Self {
        Self {
            id,
            name,
            status: StageStatus::Pending,
            content: String::new(),
            started_at: None,
            ended_at: None,
        }
    }

    /// Transition to `Running`, stamping `started_at`.
    pub fn begin(&mut self) {
        if self.status.is_terminal() {
            return;
        }
        self.status = StageStatus::Running;
        self.started_at = Some(Utc::now());
    }

    /// Transition to `Running` with placeholder content (used by the
    /// simulated build/deploy stages that show log output while running).
    pub fn begin_with_content(&mut self, content: impl Into<String>) {
        if self.status.is_terminal() {
            return;
        }
        self.content = content.into();
        self.begin();
    }

    /// Transition to `Success`, storing the stage content and stamping
    /// `ended_at`.
    pub fn succeed(&mut self, content: impl Into<String>) {
        self.finish(StageStatus::Success, content.into());
    }

    /// Transition to `Failed`, storing the failure content and stamping
    /// `ended_at`.
    pub fn fail(&mut self, content: impl Into<String>) {
        self.finish(StageStatus::Failed, content.into());
    }

    fn finish(&mut self, status: StageStatus, content: String) {
        if self.status.is_terminal() {
            return;
        }
        self.status = status;
        self.content = content;
        self.ended_at = Some(Utc::now());
    }

    /// Wall-clock duration of the stage, if both timestamps are set.
    #[must_use]
    pub fn duration(&self) -> Option<chrono::Duration> {
        match (self.started_at, self.ended_at) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }
}
