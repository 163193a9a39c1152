//! Greenlight - Simulated AI-assisted CI/CD pipeline runner
//!
//! Greenlight walks a mock CI/CD pipeline for a commit message and project
//! type: each stage's narrative content is generated by the Gemini text
//! API, build and production-deploy checkpoints fail on a random draw, and
//! failures splice diagnostic stages into the running sequence.

// Allow multiple crate versions from dependencies (can't easily control)
#![allow(clippy::multiple_crate_versions)]

pub mod cli;
pub mod gemini;
pub mod history;
pub mod log;
pub mod pipeline;
pub mod stage;

#[cfg(test)]
pub(crate) mod testutil;

// Re-export commonly used types
pub use cli::{render_metrics, render_timeline, PipelineDisplay};
pub use gemini::client::{ContentProvider, GeminiClient};
pub use history::{PipelineRun, RunHistory, RunMetrics, RunStatus};
pub use log::{JsonlLogger, RunRecord};
pub use pipeline::config::PipelineConfig;
pub use pipeline::event::PipelineEvent;
pub use pipeline::runner::{PipelineRunner, RunRequest};
pub use stage::{PipelineStage, StageName, StageStatus};
