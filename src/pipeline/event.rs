//! Pipeline progress events
//!
//! All run progress is communicated via these events over an unbounded
//! channel. The runner never prints directly; consumers (the CLI display,
//! tests) decide how to render each event.

use crate::history::PipelineRun;
use crate::stage::PipelineStage;

/// Structured events emitted by the pipeline runner during a run.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// A pipeline run has started.
    RunStarted {
        /// The commit message driving the run
        commit_message: String,
        /// The selected project type
        project_type: String,
        /// Number of stages in the initial catalog
        total_stages: usize,
    },

    /// The working stage list changed. Carries a full snapshot of every
    /// stage, reflecting all mutations up to this point.
    StagesUpdated {
        /// Complete ordered stage list
        stages: Vec<PipelineStage>,
    },

    /// The run finalized (whether it succeeded or failed).
    RunFinished {
        /// Immutable summary of the run
        run: PipelineRun,
    },
}
