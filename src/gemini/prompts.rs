//! Prompt templates for the pipeline stages
//!
//! One builder per AI-driven stage. Each returns the full prompt text sent
//! to the content provider; all stage reports are requested as markdown.

/// Prompt for the project setup stage.
#[must_use]
pub fn project_setup(project_type: &str, commit_message: &str) -> String {
    format!(
        r#"Act as an AI DevOps Engineer setting up a CI/CD pipeline.
The user has selected a "{project_type}" project type and provided the commit message: "{commit_message}".

Based on this, perform the following actions:
1.  **Project Detection**: Briefly confirm the detected project type and its typical stack (e.g., Node.js with Express, React with Vite).
2.  **Pipeline Configuration**: Generate a simple, generic pipeline configuration file in YAML format (like a GitHub Actions workflow or cloudbuild.yaml). This should include placeholder steps for 'build', 'test', and 'deploy'.

Format the entire output as markdown."#
    )
}

/// Prompt for the merge conflict check stage.
#[must_use]
pub fn merge_check(commit_message: &str) -> String {
    format!(
        r#"Act as an AI version control assistant integrated into a CI/CD pipeline.
For a commit with the message "{commit_message}", assess the likelihood of merge conflicts against the main branch.

Your report, formatted in markdown, should contain:
1.  **Conflict Risk**: A short judgement (low/medium/high) with a one-sentence justification.
2.  **Areas to Watch**: One or two files or modules this kind of change typically touches, where conflicts would most likely appear.

Keep the assessment concise."#
    )
}

/// Prompt for the security scan stage.
#[must_use]
pub fn security_scan(commit_message: &str) -> String {
    format!(
        r#"Act as an AI Security Analyst integrated into a CI/CD pipeline.
For a commit with the message "{commit_message}", perform a focused security scan.

Your report, formatted in markdown, should identify:
1.  **Vulnerability Check**: Identify one potential security vulnerability (e.g., dependency vulnerability (like a CVE in a library), hardcoded secret, or insecure API endpoint).
2.  **Best Practice Recommendation**: Suggest one security best practice relevant to the commit.

Keep the analysis concise and actionable."#
    )
}

/// Prompt for the code analysis stage.
#[must_use]
pub fn code_analysis(commit_message: &str) -> String {
    format!(
        r#"Act as an expert AI code reviewer integrated into a CI/CD pipeline.
A separate security scan has already been performed.
For a commit with the message "{commit_message}", provide a brief, markdown-formatted report focusing on non-security aspects.
The report should have two sections:
1.  **Maintainability**: Suggest one improvement for code clarity, readability, or structure.
2.  **Performance**: Point out one potential performance bottleneck or optimization.

Keep the analysis concise and actionable."#
    )
}

/// Prompt for the test generation stage.
#[must_use]
pub fn test_cases(commit_message: &str) -> String {
    format!(
        r#"Act as an AI QA engineer in a CI/CD pipeline.
For a commit with the message "{commit_message}", generate a list of 3 to 4 critical, high-level test cases to validate the changes.
Format the output as a markdown bulleted list. Prioritize end-to-end and integration tests over simple unit tests."#
    )
}

/// Prompt for the failure analysis stage inserted after a build failure.
///
/// `operator_context` is extra detail supplied with the run request; it is
/// omitted from the prompt when absent or blank.
#[must_use]
pub fn failure_analysis(
    commit_message: &str,
    error_log: &str,
    operator_context: Option<&str>,
) -> String {
    let context_line = operator_context
        .map(str::trim)
        .filter(|ctx| !ctx.is_empty())
        .map_or_else(String::new, |ctx| {
            format!("The user has provided the following additional context to focus on: \"{ctx}\"\n")
        });

    format!(
        r#"Act as an AI Site Reliability Engineer (SRE) diagnosing a CI/CD pipeline failure.
The commit message was: "{commit_message}".
The build failed with the following error log:
```
{error_log}
```
{context_line}Provide a brief, markdown-formatted root cause analysis with two sections:
1.  **Likely Cause**: What is the most probable reason for the failure?
2.  **Suggested Fix**: What is the recommended action to resolve this issue?"#
    )
}

/// Prompt for the deployment strategy stage.
#[must_use]
pub fn deployment_strategy(commit_message: &str) -> String {
    format!(
        r#"Act as an AI DevOps specialist advising on a deployment.
The upcoming deployment includes the change: "{commit_message}".
Recommend a suitable gradual rollout strategy (e.g., Canary, Blue-Green, Rolling Update).
Provide a brief, markdown-formatted response with two sections:
1.  **Recommendation**: The name of the recommended strategy.
2.  **Rationale**: A short explanation for why this strategy is a good fit for this type of change."#
    )
}

/// Prompt for the release notes stage.
#[must_use]
pub fn release_notes(commit_message: &str) -> String {
    format!(
        r#"Act as an AI Technical Writer generating release notes.
The commit for the new release is: "{commit_message}".
Generate concise, user-friendly release notes in markdown format.
Include three sections:
1.  **Summary**: A one-sentence overview of the change.
2.  **Key Changes**: A bulleted list of 2-3 specific updates.
3.  **Potential Risks**: A brief note on any potential risks or areas to monitor post-deployment."#
    )
}

/// Prompt for the automated rollback stage inserted after a production
/// deployment failure.
#[must_use]
pub fn rollback_analysis(commit_message: &str, deployment_error: &str) -> String {
    format!(
        r#"Act as an expert AI Site Reliability Engineer (SRE) performing an emergency rollback and providing a clear, actionable root cause analysis hint for the on-call engineer.

The deployment for commit "{commit_message}" has failed in production with the following critical error:
```
{deployment_error}
```

Your task is to provide a brief, markdown-formatted report with two sections:

1.  **Action Taken**: State clearly and confidently that the previous stable version has been automatically redeployed to restore service. This is the top priority.

2.  **Post-Rollback Triage**: This is the most critical part of your response. Based *specifically* on the deployment error provided, suggest 1-2 immediate, targeted, and easy-to-understand actions for the on-call engineer to begin their investigation. Your suggestions should be diagnostic, not just a restatement of the error. Guide them on *where* to look and *what* to check.

---

**Crucial Guidelines for Triage Suggestions:**

*   **Be Specific:** Don't just say "check the logs." Say "Examine the application startup logs from the failed container/pod just before the rollback was initiated. Look for stack traces or database connection errors."
*   **Be Context-Aware:** Your advice must directly relate to the error message.
*   **Format for Clarity:** Use bullet points or numbered lists for the triage steps.

**Examples of High-Quality Triage Suggestions:**

*   **If the error is `Invalid credentials` or `Authentication Failed`:**
    *   "**Check Secret Management:** Verify that the correct database/API credentials are set and have been successfully mounted in the production environment variables or secret manager (e.g., AWS Secrets Manager, HashiCorp Vault)."
    *   "**Review Recent Changes:** Check for any recent credential rotations or IAM policy changes that might have affected the application's access."

*   **If the error is `CrashLoopBackOff`:**
    *   "**Examine Application Logs:** The primary suspect is a fatal application error on startup. Check the logs from the failed pod (`kubectl logs <pod-name-previous>`) to identify the exact stack trace or error message that caused the crash."
    *   "**Verify Configuration:** Ensure all required environment variables and configuration maps are present and correctly formatted for the production environment."

*   **If the error is `ImagePullBackOff` or `ErrImagePull`:**
    *   "**Confirm Image Tag and Registry:** Double-check that the container image tag specified in the deployment manifest exists in the container registry (e.g., GCR, Docker Hub, ECR)."
    *   "**Check Cluster Permissions:** Ensure the production cluster's service account or node IAM role has the necessary permissions to pull images from the specified registry."

*   **If the error is `502 Bad Gateway` or a failed health check:**
    *   "**Inspect Health Check Endpoint:** Review the application's health check endpoint (`/health`, `/ping`, etc.). It might be failing due to a downstream dependency issue."
    *   "**Test Dependencies:** Check for connectivity issues to critical dependencies like databases, caches, or external APIs that might be failing during the application's startup sequence.""#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_setup_includes_both_inputs() {
        let prompt = project_setup("React Frontend", "feat: add avatars");
        assert!(prompt.contains("React Frontend"));
        assert!(prompt.contains("feat: add avatars"));
        assert!(prompt.contains("Pipeline Configuration"));
    }

    #[test]
    fn test_merge_check_includes_commit() {
        let prompt = merge_check("fix: cart totals");
        assert!(prompt.contains("fix: cart totals"));
        assert!(prompt.contains("Conflict Risk"));
    }

    #[test]
    fn test_security_scan_includes_commit() {
        let prompt = security_scan("feat: oauth login");
        assert!(prompt.contains("feat: oauth login"));
        assert!(prompt.contains("Vulnerability Check"));
    }

    #[test]
    fn test_code_analysis_mentions_both_sections() {
        let prompt = code_analysis("refactor: api client");
        assert!(prompt.contains("Maintainability"));
        assert!(prompt.contains("Performance"));
    }

    #[test]
    fn test_test_cases_requests_bulleted_list() {
        let prompt = test_cases("feat: websockets");
        assert!(prompt.contains("bulleted list"));
    }

    #[test]
    fn test_failure_analysis_embeds_error_log() {
        let prompt = failure_analysis("fix: x", "Error: Module not found", None);
        assert!(prompt.contains("Error: Module not found"));
        assert!(prompt.contains("Likely Cause"));
    }

    #[test]
    fn test_failure_analysis_includes_context_when_present() {
        let prompt = failure_analysis("fix: x", "err", Some("flaky CI runner"));
        assert!(prompt.contains("flaky CI runner"));
        assert!(prompt.contains("additional context"));
    }

    #[test]
    fn test_failure_analysis_omits_context_when_absent() {
        let prompt = failure_analysis("fix: x", "err", None);
        assert!(!prompt.contains("additional context"));
    }

    #[test]
    fn test_failure_analysis_treats_blank_context_as_absent() {
        let prompt = failure_analysis("fix: x", "err", Some("   "));
        assert!(!prompt.contains("additional context"));
    }

    #[test]
    fn test_deployment_strategy_includes_commit() {
        let prompt = deployment_strategy("perf: query caching");
        assert!(prompt.contains("perf: query caching"));
        assert!(prompt.contains("Recommendation"));
    }

    #[test]
    fn test_release_notes_sections() {
        let prompt = release_notes("feat: dark mode");
        assert!(prompt.contains("Summary"));
        assert!(prompt.contains("Key Changes"));
        assert!(prompt.contains("Potential Risks"));
    }

    #[test]
    fn test_rollback_analysis_embeds_deployment_error() {
        let prompt = rollback_analysis("chore: upgrade", "Error: `CrashLoopBackOff`");
        assert!(prompt.contains("CrashLoopBackOff"));
        assert!(prompt.contains("Action Taken"));
        assert!(prompt.contains("Post-Rollback Triage"));
    }
}
