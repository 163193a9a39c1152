//! Shared test utilities
//!
//! Canned providers, a scripted chance source, and runner wiring helpers
//! used across test modules. Only compiled in test builds.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::sync::{Notify, Semaphore};

use crate::gemini::client::ContentProvider;
use crate::pipeline::chance::ChanceSource;
use crate::pipeline::config::{PacingConfig, PipelineConfig};
use crate::pipeline::event::PipelineEvent;
use crate::pipeline::runner::PipelineRunner;

/// Provider that answers every prompt with the same canned content and
/// records the prompts it was asked.
pub struct CannedProvider {
    content: String,
    prompts: Mutex<Vec<String>>,
}

impl CannedProvider {
    /// Provider returning `content` for every operation.
    pub fn new(content: &str) -> Self {
        Self {
            content: content.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Provider with generic content, used when only the recorded prompts
    /// matter.
    pub fn recording() -> Self {
        Self::new("## Canned\n\nGenerated stage content.")
    }

    /// All prompts seen so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentProvider for CannedProvider {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.content.clone())
    }
}

/// Provider whose every call fails, for fault-attribution tests.
pub struct FailingProvider {
    message: String,
}

impl FailingProvider {
    /// Provider failing with the given message.
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl ContentProvider for FailingProvider {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        Err(anyhow!("{}", self.message))
    }
}

/// Provider that blocks inside `generate` until released, so tests can
/// observe a run mid-flight deterministically.
pub struct GatedProvider {
    entered: Notify,
    gate: Semaphore,
}

impl GatedProvider {
    pub fn new() -> Self {
        Self {
            entered: Notify::new(),
            gate: Semaphore::new(0),
        }
    }

    /// Wait until a provider call is in progress.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    /// Unblock the pending call and every later one.
    pub fn release(&self) {
        self.gate.add_permits(1024);
    }
}

impl Default for GatedProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentProvider for GatedProvider {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        self.entered.notify_one();
        let _permit = self.gate.acquire().await?;
        Ok("gated content".to_string())
    }
}

/// Chance source replaying a fixed sequence of draws.
///
/// Once the sequence is exhausted the last value repeats. `pick` always
/// selects index 0.
pub struct ScriptedChance {
    draws: Vec<f64>,
    next: AtomicUsize,
}

impl ScriptedChance {
    pub fn new(draws: &[f64]) -> Self {
        Self {
            draws: draws.to_vec(),
            next: AtomicUsize::new(0),
        }
    }
}

impl ChanceSource for ScriptedChance {
    fn draw(&self) -> f64 {
        let index = self.next.fetch_add(1, Ordering::SeqCst);
        self.draws
            .get(index)
            .or_else(|| self.draws.last())
            .copied()
            .unwrap_or(0.0)
    }

    fn pick(&self, _len: usize) -> usize {
        0
    }
}

/// Default config with every pacing delay zeroed for fast tests.
pub fn zero_delay_config() -> PipelineConfig {
    PipelineConfig {
        pacing: PacingConfig {
            stage_pause_ms: 0,
            build_wait_ms: 0,
            staging_wait_ms: 0,
            production_wait_ms: 0,
        },
        ..PipelineConfig::default()
    }
}

/// Runner with a canned provider, zero delays, and scripted draws.
pub fn scripted_runner(draws: &[f64]) -> (PipelineRunner, UnboundedReceiver<PipelineEvent>) {
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let runner = PipelineRunner::new(
        zero_delay_config(),
        Arc::new(CannedProvider::new("## Report\n\nAll clear.")),
        event_tx,
    )
    .with_chance(Arc::new(ScriptedChance::new(draws)));
    (runner, event_rx)
}

/// Drain every event currently buffered in the receiver.
pub fn collect_events(rx: &mut UnboundedReceiver<PipelineEvent>) -> Vec<PipelineEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
