//! Gemini integration
//!
//! This module handles prompt construction for each pipeline stage and the
//! HTTP client for the hosted text-generation API.

pub mod client;
pub mod prompts;
