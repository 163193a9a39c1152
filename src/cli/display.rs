//! Rich CLI display for pipeline runs
//!
//! Renders pipeline events as human-readable terminal output: stage
//! transitions as they happen, generated markdown content, a post-run
//! summary, aggregate metrics, and a last-run timeline. All output goes to
//! stderr so stdout remains clean for piping.

use std::collections::HashMap;

use colored::Colorize;

use crate::history::{PipelineRun, RunMetrics, RunStatus, StageTiming};
use crate::pipeline::event::PipelineEvent;
use crate::stage::{PipelineStage, StageStatus};

const METRIC_BAR_COLS: usize = 30;
const TIMELINE_COLS: usize = 40;
const LABEL_WIDTH: usize = 26;

/// Display handler for pipeline run output.
///
/// Tracks the last rendered status per stage id so each snapshot prints
/// only the transitions since the previous one.
pub struct PipelineDisplay {
    show_content: bool,
    last_seen: HashMap<u32, StageStatus>,
    initialized: bool,
}

impl PipelineDisplay {
    /// Create a new display handler.
    ///
    /// When `show_content` is false, stage content is reduced to a single
    /// truncated line.
    #[must_use]
    pub fn new(show_content: bool) -> Self {
        Self {
            show_content,
            last_seen: HashMap::new(),
            initialized: false,
        }
    }

    /// Render a pipeline event to stderr.
    pub fn render_event(&mut self, event: &PipelineEvent) {
        match event {
            PipelineEvent::RunStarted {
                commit_message,
                project_type,
                total_stages,
            } => {
                self.last_seen.clear();
                self.initialized = false;
                eprintln!(
                    "\n{} {}",
                    "===".bold().cyan(),
                    format!("Pipeline: \"{commit_message}\" ({project_type})")
                        .bold()
                        .cyan()
                );
                eprintln!("{}", format!("{total_stages} stages queued").dimmed());
                eprintln!("{}", "─".repeat(50).dimmed());
            }
            PipelineEvent::StagesUpdated { stages } => self.render_snapshot(stages),
            PipelineEvent::RunFinished { run } => self.render_run_summary(run),
        }
    }

    /// Print the transitions between the previous snapshot and this one.
    fn render_snapshot(&mut self, stages: &[PipelineStage]) {
        for stage in stages {
            let previous = self.last_seen.get(&stage.id).copied();
            match (previous, stage.status) {
                (None | Some(StageStatus::Pending), StageStatus::Running) => {
                    eprintln!("  {} {}", "▶".blue(), stage.name.to_string().bold());
                }
                (prev, StageStatus::Success) if prev != Some(StageStatus::Success) => {
                    eprintln!(
                        "  {} {} {}",
                        "✓".green().bold(),
                        stage.name.to_string().bold(),
                        format_stage_duration(stage).dimmed()
                    );
                    self.print_content(stage);
                }
                (prev, StageStatus::Failed) if prev != Some(StageStatus::Failed) => {
                    eprintln!(
                        "  {} {} {}",
                        "✗".red().bold(),
                        stage.name.to_string().red().bold(),
                        format_stage_duration(stage).dimmed()
                    );
                    self.print_content(stage);
                }
                (None, StageStatus::Pending) if self.initialized => {
                    // A diagnostic stage spliced into the running pipeline
                    eprintln!(
                        "  {} {}",
                        "+".yellow().bold(),
                        format!("{} added to pipeline", stage.name).yellow()
                    );
                }
                _ => {}
            }
            self.last_seen.insert(stage.id, stage.status);
        }
        self.initialized = true;
    }

    /// Print a stage's markdown content, indented under its status line.
    fn print_content(&self, stage: &PipelineStage) {
        if stage.content.is_empty() {
            return;
        }
        if self.show_content {
            for line in stage.content.lines() {
                eprintln!("    {}", line.dimmed());
            }
        } else {
            let first_line = stage.content.lines().next().unwrap_or("");
            eprintln!("    {}", truncate(first_line, 80).dimmed());
        }
    }

    /// Render the post-run summary line.
    fn render_run_summary(&self, run: &PipelineRun) {
        eprintln!("{}", "─".repeat(50).dimmed());
        let status = match run.status {
            RunStatus::Success => "SUCCEEDED".green().bold().to_string(),
            RunStatus::Failed => "FAILED".red().bold().to_string(),
        };
        eprintln!(
            "  {} in {}",
            status,
            format_secs(run.total_duration_secs()).bold()
        );
        eprintln!();
    }
}

/// Render the aggregate metrics panel.
pub fn render_metrics(metrics: &RunMetrics) {
    eprintln!("{}", "Pipeline Performance Metrics".bold().cyan());
    eprintln!(
        "  {} {}",
        "Success rate:".dimmed(),
        format!("{:.1}%", metrics.success_rate).bold()
    );
    eprintln!(
        "  {} {}",
        "Last run duration:".dimmed(),
        format_secs(metrics.last_run_duration_secs).bold()
    );
    eprintln!(
        "  {} {}",
        "Total runs:".dimmed(),
        metrics.total_runs.to_string().bold()
    );

    if metrics.average_stage_secs.is_empty() {
        return;
    }

    eprintln!("\n  {}", "Average Stage Duration".dimmed());
    let max_avg = metrics
        .average_stage_secs
        .iter()
        .map(|s| s.avg_secs)
        .fold(1.0_f64, f64::max);
    let label_width = LABEL_WIDTH;
    for average in &metrics.average_stage_secs {
        let width = scaled_width(average.avg_secs, max_avg, METRIC_BAR_COLS);
        eprintln!(
            "  {:<label_width$} {} {}",
            truncate(average.name.label(), LABEL_WIDTH),
            "█".repeat(width).magenta(),
            format_secs(average.avg_secs).dimmed()
        );
    }
    eprintln!();
}

/// Render the last-run timeline: one offset bar per stage that ran.
pub fn render_timeline(run: &PipelineRun) {
    if run.total_duration_ms <= 0 || run.stages.iter().all(|s| s.started_at.is_none()) {
        eprintln!(
            "{}",
            "Not enough timing data to display a timeline for the last run.".dimmed()
        );
        return;
    }

    eprintln!("{}", "Last Run Timeline".bold().cyan());
    let label_width = LABEL_WIDTH;
    for timing in &run.stages {
        let Some((offset, width)) = timeline_geometry(timing, run, TIMELINE_COLS) else {
            continue;
        };
        let duration_secs = stage_duration_secs(timing).unwrap_or(0.0);
        eprintln!(
            "  {:<label_width$} {}{} {}",
            truncate(timing.name.label(), LABEL_WIDTH),
            " ".repeat(offset),
            "█".repeat(width).magenta(),
            format_secs(duration_secs).dimmed()
        );
    }
    eprintln!();
}

/// Offset and width (in columns) of a stage's timeline bar, or `None` for
/// stages that never ran.
fn timeline_geometry(
    timing: &StageTiming,
    run: &PipelineRun,
    cols: usize,
) -> Option<(usize, usize)> {
    let start = timing.started_at?;
    let end = timing.ended_at?;
    if run.total_duration_ms <= 0 {
        return None;
    }

    #[allow(clippy::cast_precision_loss)]
    let total = run.total_duration_ms as f64;
    #[allow(clippy::cast_precision_loss)]
    let relative_start = (start - run.started_at).num_milliseconds().max(0) as f64;
    #[allow(clippy::cast_precision_loss)]
    let duration = (end - start).num_milliseconds().max(0) as f64;

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let offset = ((relative_start / total * cols as f64) as usize).min(cols.saturating_sub(1));
    let width = scaled_width(duration, total, cols).min(cols - offset);
    Some((offset, width.max(1)))
}

#[allow(clippy::cast_precision_loss)]
fn stage_duration_secs(timing: &StageTiming) -> Option<f64> {
    let start = timing.started_at?;
    let end = timing.ended_at?;
    Some((end - start).num_milliseconds().max(0) as f64 / 1000.0)
}

/// Bar width proportional to `value / max`, at least 1 column for any
/// positive value.
fn scaled_width(value: f64, max: f64, cols: usize) -> usize {
    if value <= 0.0 || max <= 0.0 {
        return 0;
    }
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let width = (value / max * cols as f64).round() as usize;
    width.clamp(1, cols)
}

/// Format fractional seconds as e.g. `2.41s`.
fn format_secs(secs: f64) -> String {
    format!("{secs:.2}s")
}

/// Duration suffix for a completed stage's status line.
fn format_stage_duration(stage: &PipelineStage) -> String {
    stage.duration().map_or_else(String::new, |d| {
        #[allow(clippy::cast_precision_loss)]
        let secs = d.num_milliseconds().max(0) as f64 / 1000.0;
        format!("({})", format_secs(secs))
    })
}

/// Truncate a string to `max` characters, appending `...` when shortened.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}
