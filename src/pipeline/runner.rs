//! Pipeline runner
//!
//! The orchestration state machine: walks the stage catalog in order,
//! requests AI content for each AI-driven stage, simulates the build and
//! deployment checkpoints with random failure draws, splices diagnostic
//! stages into the sequence on failure, and finalizes a `PipelineRun`
//! record whatever the outcome.
//!
//! The runner owns the working stage list exclusively for the duration of
//! a run and communicates all progress through `PipelineEvent`s.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use crate::gemini::client::ContentProvider;
use crate::history::{PipelineRun, RunStatus, StageTiming};
use crate::pipeline::catalog::{
    initial_stages, is_known_project_type, BUILD_ERRORS, DEPLOYMENT_ERRORS, DYNAMIC_ID_BASE,
};
use crate::pipeline::chance::{ChanceSource, ThreadRngChance};
use crate::pipeline::config::PipelineConfig;
use crate::pipeline::event::PipelineEvent;
use crate::stage::{PipelineStage, StageName, StageStatus};

const BUILD_RUNNING_LOG: &str =
    "```bash\n> Building application...\n> Running generated tests...\n```";
const BUILD_SUCCESS_LOG: &str = "```bash\n> Build successful.\n> All tests passed.\n```";
const STAGING_START_LOG: &str = "```bash\n> Deploying to staging environment...\n```";
const STAGING_SUCCESS_LOG: &str = "```bash\n> Deployed to staging successfully.\n> Running smoke tests...\n> Smoke tests passed.\n```";
const PRODUCTION_START_LOG: &str = "```bash\n> Starting production deployment...\n```";
const PRODUCTION_SUCCESS_LOG: &str = "```bash\n> Production deployment successful!\n```";

/// Input for one pipeline run.
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// The commit message driving the simulated pipeline (non-empty)
    pub commit_message: String,
    /// One of the fixed project types
    pub project_type: String,
    /// Optional operator context forwarded to failure analysis
    pub failure_context: Option<String>,
}

impl RunRequest {
    /// Create a run request with no failure context.
    #[must_use]
    pub fn new(commit_message: &str, project_type: &str) -> Self {
        Self {
            commit_message: commit_message.to_string(),
            project_type: project_type.to_string(),
            failure_context: None,
        }
    }

    /// Attach operator context for the failure-analysis stage.
    #[must_use]
    pub fn with_failure_context(mut self, context: &str) -> Self {
        self.failure_context = Some(context.to_string());
        self
    }
}

/// Mutable working state of one run, owned by the runner.
struct RunState {
    stages: Vec<PipelineStage>,
    next_dynamic_id: u32,
    status: RunStatus,
    started_at: DateTime<Utc>,
}

impl RunState {
    fn allocate_dynamic_id(&mut self) -> u32 {
        let id = self.next_dynamic_id;
        self.next_dynamic_id += 1;
        id
    }
}

/// Executes simulated pipeline runs.
///
/// At most one run is in flight at a time; a second `run` call while one
/// is active is rejected immediately, never queued.
pub struct PipelineRunner {
    config: PipelineConfig,
    provider: Arc<dyn ContentProvider>,
    chance: Arc<dyn ChanceSource>,
    event_tx: mpsc::UnboundedSender<PipelineEvent>,
    in_flight: AtomicBool,
}

impl PipelineRunner {
    /// Create a runner with the production random source.
    ///
    /// `event_tx` is required; all progress is communicated via events.
    #[must_use]
    pub fn new(
        config: PipelineConfig,
        provider: Arc<dyn ContentProvider>,
        event_tx: mpsc::UnboundedSender<PipelineEvent>,
    ) -> Self {
        Self {
            config,
            provider,
            chance: Arc::new(ThreadRngChance),
            event_tx,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Override the random source (for deterministic tests).
    #[must_use]
    pub fn with_chance(mut self, chance: Arc<dyn ChanceSource>) -> Self {
        self.chance = chance;
        self
    }

    /// Whether a run is currently in flight.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Execute one pipeline run to finalization.
    ///
    /// Returns the finalized `PipelineRun` (also emitted as
    /// `PipelineEvent::RunFinished`). Fails fast on invalid input or when
    /// another run is already in flight.
    pub async fn run(&self, request: &RunRequest) -> Result<PipelineRun> {
        if request.commit_message.trim().is_empty() {
            bail!("Commit message cannot be empty");
        }
        if !is_known_project_type(&request.project_type) {
            bail!("Unknown project type '{}'", request.project_type);
        }

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            bail!("A pipeline run is already in flight");
        }
        let _guard = FlightGuard {
            flag: &self.in_flight,
        };

        let mut state = RunState {
            stages: initial_stages(&self.config.pipeline),
            next_dynamic_id: DYNAMIC_ID_BASE,
            status: RunStatus::Success,
            started_at: Utc::now(),
        };

        self.emit(PipelineEvent::RunStarted {
            commit_message: request.commit_message.clone(),
            project_type: request.project_type.clone(),
            total_stages: state.stages.len(),
        });
        self.emit_snapshot(&state);

        // A provider fault aborts the staged sequence; attribute it to the
        // stage that was running and still finalize through the same path.
        if let Err(err) = self.execute(&mut state, request).await {
            if let Some(stage) = state
                .stages
                .iter_mut()
                .find(|s| s.status == StageStatus::Running)
            {
                stage.fail(format!("Pipeline fault: {err:#}"));
            }
            state.status = RunStatus::Failed;
            self.emit_snapshot(&state);
        }

        let run = finalize(&state);
        self.emit(PipelineEvent::RunFinished { run: run.clone() });
        Ok(run)
    }

    /// Walk the staged sequence. Returns early (with `Ok`) after a
    /// checkpoint failure completes its diagnostic stage.
    async fn execute(&self, state: &mut RunState, request: &RunRequest) -> Result<()> {
        let commit = request.commit_message.as_str();

        self.ai_stage(
            state,
            StageName::ProjectSetup,
            self.provider.project_setup(&request.project_type, commit),
        )
        .await?;

        if self.config.pipeline.merge_check {
            self.ai_stage(state, StageName::MergeCheck, self.provider.merge_check(commit))
                .await?;
        }

        self.ai_stage(
            state,
            StageName::SecurityScan,
            self.provider.security_scan(commit),
        )
        .await?;
        self.ai_stage(
            state,
            StageName::CodeAnalysis,
            self.provider.code_analysis(commit),
        )
        .await?;
        self.ai_stage(
            state,
            StageName::TestGeneration,
            self.provider.test_cases(commit),
        )
        .await?;

        if !self.build_checkpoint(state, request).await? {
            return Ok(());
        }

        self.ai_stage(
            state,
            StageName::DeploymentStrategy,
            self.provider.deployment_strategy(commit),
        )
        .await?;

        self.staging_stage(state).await?;

        self.ai_stage(
            state,
            StageName::ReleaseNotes,
            self.provider.release_notes(commit),
        )
        .await?;

        self.production_checkpoint(state, request).await
    }

    /// Run one AI-driven stage: begin, await content, succeed, pace.
    async fn ai_stage(
        &self,
        state: &mut RunState,
        name: StageName,
        content: impl Future<Output = Result<String>>,
    ) -> Result<()> {
        stage_mut(&mut state.stages, name)?.begin();
        self.emit_snapshot(state);

        let text = content.await?;

        stage_mut(&mut state.stages, name)?.succeed(text);
        self.emit_snapshot(state);
        self.pause(self.config.pacing.stage_pause_ms).await;
        Ok(())
    }

    /// Build & Test checkpoint. Returns `false` when the build failed and
    /// the run must stop after its failure-analysis stage.
    async fn build_checkpoint(&self, state: &mut RunState, request: &RunRequest) -> Result<bool> {
        let build_id = {
            let stage = stage_mut(&mut state.stages, StageName::BuildAndTest)?;
            stage.begin_with_content(BUILD_RUNNING_LOG);
            stage.id
        };
        self.emit_snapshot(state);
        self.pause(self.config.pacing.build_wait_ms).await;

        if self.chance.draw() > self.config.pipeline.build_failure_threshold {
            let error_log = BUILD_ERRORS[self.chance.pick(BUILD_ERRORS.len())];
            stage_mut(&mut state.stages, StageName::BuildAndTest)?
                .fail(format!("```bash\n> Build failed!\n\n{error_log}\n```"));
            self.emit_snapshot(state);

            let analysis = self.provider.failure_analysis(
                &request.commit_message,
                error_log,
                request.failure_context.as_deref(),
            );
            self.diagnostic_stage(state, StageName::FailureAnalysis, build_id, analysis)
                .await?;
            state.status = RunStatus::Failed;
            return Ok(false);
        }

        stage_mut(&mut state.stages, StageName::BuildAndTest)?.succeed(BUILD_SUCCESS_LOG);
        self.emit_snapshot(state);
        self.pause(self.config.pacing.stage_pause_ms).await;
        Ok(true)
    }

    /// Deploy to Staging: two fixed content phases, no failure branch.
    async fn staging_stage(&self, state: &mut RunState) -> Result<()> {
        stage_mut(&mut state.stages, StageName::DeployToStaging)?
            .begin_with_content(STAGING_START_LOG);
        self.emit_snapshot(state);
        self.pause(self.config.pacing.staging_wait_ms).await;

        stage_mut(&mut state.stages, StageName::DeployToStaging)?.succeed(STAGING_SUCCESS_LOG);
        self.emit_snapshot(state);
        self.pause(self.config.pacing.stage_pause_ms).await;
        Ok(())
    }

    /// Deploy to Production checkpoint: its own draw, threshold, and error
    /// catalog, with an automated-rollback diagnostic stage on failure.
    async fn production_checkpoint(&self, state: &mut RunState, request: &RunRequest) -> Result<()> {
        let production_id = {
            let stage = stage_mut(&mut state.stages, StageName::DeployToProduction)?;
            stage.begin_with_content(PRODUCTION_START_LOG);
            stage.id
        };
        self.emit_snapshot(state);
        self.pause(self.config.pacing.production_wait_ms).await;

        if self.chance.draw() > self.config.pipeline.deploy_failure_threshold {
            let error_log = DEPLOYMENT_ERRORS[self.chance.pick(DEPLOYMENT_ERRORS.len())];
            stage_mut(&mut state.stages, StageName::DeployToProduction)?.fail(format!(
                "```bash\n> Production deployment failed!\n\n{error_log}\n```"
            ));
            self.emit_snapshot(state);

            let rollback = self
                .provider
                .rollback_analysis(&request.commit_message, error_log);
            self.diagnostic_stage(state, StageName::AutomatedRollback, production_id, rollback)
                .await?;
            state.status = RunStatus::Failed;
            return Ok(());
        }

        stage_mut(&mut state.stages, StageName::DeployToProduction)?
            .succeed(PRODUCTION_SUCCESS_LOG);
        self.emit_snapshot(state);
        Ok(())
    }

    /// Insert a diagnostic stage immediately after its trigger stage and
    /// run its AI content operation.
    async fn diagnostic_stage(
        &self,
        state: &mut RunState,
        name: StageName,
        after_id: u32,
        content: impl Future<Output = Result<String>>,
    ) -> Result<()> {
        let diagnostic_id = state.allocate_dynamic_id();
        insert_after(&mut state.stages, after_id, PipelineStage::new(diagnostic_id, name));
        self.emit_snapshot(state);

        stage_by_id_mut(&mut state.stages, diagnostic_id)?.begin();
        self.emit_snapshot(state);

        let text = content.await?;

        stage_by_id_mut(&mut state.stages, diagnostic_id)?.succeed(text);
        self.emit_snapshot(state);
        Ok(())
    }

    fn emit(&self, event: PipelineEvent) {
        let _ = self.event_tx.send(event);
    }

    fn emit_snapshot(&self, state: &RunState) {
        self.emit(PipelineEvent::StagesUpdated {
            stages: state.stages.clone(),
        });
    }

    async fn pause(&self, ms: u64) {
        if ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(ms)).await;
        }
    }
}

/// Clears the in-flight flag when the run finishes or unwinds.
struct FlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

fn stage_mut(stages: &mut [PipelineStage], name: StageName) -> Result<&mut PipelineStage> {
    stages
        .iter_mut()
        .find(|s| s.name == name)
        .with_context(|| format!("Stage '{name}' missing from working list"))
}

fn stage_by_id_mut(stages: &mut [PipelineStage], id: u32) -> Result<&mut PipelineStage> {
    stages
        .iter_mut()
        .find(|s| s.id == id)
        .with_context(|| format!("Stage id {id} missing from working list"))
}

/// Insert a stage immediately after the stage with `after_id`, or at the
/// end when that id is not present.
fn insert_after(stages: &mut Vec<PipelineStage>, after_id: u32, stage: PipelineStage) {
    let index = stages
        .iter()
        .position(|s| s.id == after_id)
        .map_or(stages.len(), |i| i + 1);
    stages.insert(index, stage);
}

/// Build the immutable run record from the final working state.
fn finalize(state: &RunState) -> PipelineRun {
    let ended_at = Utc::now();
    PipelineRun {
        status: state.status,
        stages: state.stages.iter().map(StageTiming::from).collect(),
        started_at: state.started_at,
        total_duration_ms: (ended_at - state.started_at).num_milliseconds().max(0),
    }
}
