//! Gemini content provider
//!
//! Defines the `ContentProvider` trait the runner consumes (one operation
//! per AI-driven stage, all built on a single `generate` primitive) and the
//! `GeminiClient` adapter for the hosted `generateContent` REST endpoint.
//!
//! The adapter never surfaces configuration or transport problems as `Err`:
//! a missing API key and any communication failure both resolve to
//! displayable error text, which the runner treats as ordinary content.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::gemini::prompts;

/// Environment variable holding the Gemini API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Legacy environment variable, checked when `GEMINI_API_KEY` is unset.
pub const LEGACY_API_KEY_ENV: &str = "API_KEY";

/// Literal content returned when no API key is configured.
pub const MISSING_KEY_MESSAGE: &str =
    "Error: API key is not configured. Please set the GEMINI_API_KEY environment variable.";

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Text generation abstraction behind every AI-driven stage.
///
/// The stage operations are provided methods over the prompt templates;
/// implementors supply `generate`. Implementations may return `Err` for
/// unexpected faults, which the runner attributes to the in-flight stage.
/// Any `Ok` text, including sentinel error strings, is valid stage content.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Generate markdown text for the given prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Project detection and pipeline configuration content.
    async fn project_setup(&self, project_type: &str, commit_message: &str) -> Result<String> {
        self.generate(&prompts::project_setup(project_type, commit_message))
            .await
    }

    /// Merge conflict assessment content.
    async fn merge_check(&self, commit_message: &str) -> Result<String> {
        self.generate(&prompts::merge_check(commit_message)).await
    }

    /// Security scan content.
    async fn security_scan(&self, commit_message: &str) -> Result<String> {
        self.generate(&prompts::security_scan(commit_message)).await
    }

    /// Code review content.
    async fn code_analysis(&self, commit_message: &str) -> Result<String> {
        self.generate(&prompts::code_analysis(commit_message)).await
    }

    /// Generated test case content.
    async fn test_cases(&self, commit_message: &str) -> Result<String> {
        self.generate(&prompts::test_cases(commit_message)).await
    }

    /// Root cause analysis for a build failure.
    async fn failure_analysis(
        &self,
        commit_message: &str,
        error_log: &str,
        operator_context: Option<&str>,
    ) -> Result<String> {
        self.generate(&prompts::failure_analysis(
            commit_message,
            error_log,
            operator_context,
        ))
        .await
    }

    /// Rollout strategy recommendation.
    async fn deployment_strategy(&self, commit_message: &str) -> Result<String> {
        self.generate(&prompts::deployment_strategy(commit_message))
            .await
    }

    /// Release notes content.
    async fn release_notes(&self, commit_message: &str) -> Result<String> {
        self.generate(&prompts::release_notes(commit_message)).await
    }

    /// Rollback report for a production deployment failure.
    async fn rollback_analysis(
        &self,
        commit_message: &str,
        deployment_error: &str,
    ) -> Result<String> {
        self.generate(&prompts::rollback_analysis(commit_message, deployment_error))
            .await
    }
}

/// Client for the Gemini `generateContent` REST endpoint.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
}

impl GeminiClient {
    /// Create a client with an explicit (possibly absent) API key.
    #[must_use]
    pub fn new(api_key: Option<String>, model: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            model: model.to_string(),
        }
    }

    /// Create a client reading the API key from the environment
    /// (`GEMINI_API_KEY`, falling back to `API_KEY`).
    #[must_use]
    pub fn from_env(model: &str) -> Self {
        let api_key = std::env::var(API_KEY_ENV)
            .or_else(|_| std::env::var(LEGACY_API_KEY_ENV))
            .ok();
        Self::new(api_key, model)
    }

    /// Whether a key was configured at construction.
    #[must_use]
    pub const fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    async fn request_text(&self, api_key: &str, prompt: &str) -> Result<String, reqwest::Error> {
        let url = format!("{API_BASE}/{}:generateContent", self.model);
        let body = GenerateRequest::from_prompt(prompt);

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<GenerateResponse>()
            .await?;

        Ok(response.text().unwrap_or_else(|| {
            communication_error_text("the model returned no content")
        }))
    }
}

#[async_trait]
impl ContentProvider for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let Some(api_key) = self.api_key.clone() else {
            return Ok(MISSING_KEY_MESSAGE.to_string());
        };

        match self.request_text(&api_key, prompt).await {
            Ok(text) => Ok(text),
            Err(err) => Ok(communication_error_text(&err.to_string())),
        }
    }
}

/// Literal content returned when the API call itself fails.
fn communication_error_text(details: &str) -> String {
    format!("An error occurred while communicating with the AI. Details: {details}")
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

impl<'a> GenerateRequest<'a> {
    fn from_prompt(prompt: &'a str) -> Self {
        Self {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        }
    }
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate's parts, or `None` when
    /// the response carries no text at all.
    fn text(&self) -> Option<String> {
        let candidate = self.candidates.first()?;
        let text: String = candidate
            .content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_key_resolves_to_literal_message() {
        let client = GeminiClient::new(None, "gemini-2.5-flash");
        let content = client.generate("any prompt").await.unwrap();
        assert_eq!(content, MISSING_KEY_MESSAGE);
    }

    #[tokio::test]
    async fn test_blank_key_counts_as_missing() {
        let client = GeminiClient::new(Some("   ".to_string()), "gemini-2.5-flash");
        assert!(!client.has_api_key());
        let content = client.generate("any prompt").await.unwrap();
        assert_eq!(content, MISSING_KEY_MESSAGE);
    }

    #[test]
    fn test_has_api_key_with_real_key() {
        let client = GeminiClient::new(Some("abc123".to_string()), "gemini-2.5-flash");
        assert!(client.has_api_key());
    }

    #[test]
    fn test_response_text_joins_parts() {
        let response: GenerateResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{
                "content": {
                    "parts": [{"text": "## Report\n"}, {"text": "All clear."}]
                }
            }]
        }))
        .unwrap();
        assert_eq!(response.text().unwrap(), "## Report\nAll clear.");
    }

    #[test]
    fn test_response_text_empty_candidates_is_none() {
        let response: GenerateResponse =
            serde_json::from_value(serde_json::json!({ "candidates": [] })).unwrap();
        assert!(response.text().is_none());
    }

    #[test]
    fn test_response_text_missing_fields_is_none() {
        let response: GenerateResponse =
            serde_json::from_value(serde_json::json!({ "candidates": [{}] })).unwrap();
        assert!(response.text().is_none());
    }

    #[test]
    fn test_request_serialization_shape() {
        let request = GenerateRequest::from_prompt("hello");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hello");
    }

    #[test]
    fn test_communication_error_text_includes_details() {
        let text = communication_error_text("connection refused");
        assert!(text.starts_with("An error occurred while communicating with the AI."));
        assert!(text.contains("connection refused"));
    }
}
