//! Logging and observability
//!
//! This module provides logging functionality for greenlight, including
//! JSONL logging for pipeline run history.

pub mod jsonl;

pub use jsonl::{JsonlLogger, RunRecord};
