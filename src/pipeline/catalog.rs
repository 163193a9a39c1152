//! Static pipeline definitions
//!
//! The initial stage catalog, the failure-string catalogs for the two
//! checkpoints, the fixed project-type list, and the sample commit pool.

use crate::pipeline::config::PipelineSettings;
use crate::stage::{PipelineStage, StageName};

/// Dynamically inserted stages take ids from a counter starting here,
/// above every id the initial catalog can produce.
pub const DYNAMIC_ID_BASE: u32 = 20;

/// Project types the simulator accepts.
pub const PROJECT_TYPES: &[&str] = &[
    "Node.js API",
    "React Frontend",
    "Vue.js Frontend",
    "Angular Frontend",
    "Django API",
    "Spring Boot API",
];

/// Plausible build-failure logs, one of which is picked when the
/// Build & Test checkpoint fails.
pub const BUILD_ERRORS: &[&str] = &[
    "Error: Test failed. `TypeError: Cannot read properties of undefined (reading 'avatarUrl')` in `ProfileHeader.test.tsx`.",
    "Error: Build failed. `ReferenceError: 'config' is not defined` in `scripts/deploy.js` at line 42.",
    "Error: Test suite failed to run. `Jest worker encountered 1 child process exceptions, exceeding retry limit.`",
    "Error: Module not found: Can't resolve './utils/formatters' in `/app/src/components/UserProfile.tsx`.",
    "Error: Integration test failed. `[404] Not Found` for API endpoint `GET /api/v1/users/123`.",
];

/// Plausible production-deployment failure logs for the second checkpoint.
pub const DEPLOYMENT_ERRORS: &[&str] = &[
    "Error: Deployment failed. `CrashLoopBackOff`: The application is crashing and restarting.",
    "Error: Deployment failed. `ImagePullBackOff`: Cannot pull the container image from the registry.",
    "Error: Deployment failed. `502 Bad Gateway`: Health checks are failing on the new revision.",
    "Error: Deployment failed. `Invalid credentials` for database connection.",
];

/// Sample commit messages used when the user does not supply one.
pub const SAMPLE_COMMITS: &[&str] = &[
    "feat: Add two-factor authentication via email",
    "fix: Correct price calculation for discounted items in cart",
    "refactor: Simplify state management using Zustand store",
    "perf: Optimize database queries for dashboard loading",
    "docs: Update API documentation for v2 endpoints",
    "test: Add end-to-end tests for user checkout flow",
    "chore: Upgrade Next.js to the latest version",
    "style: Implement dark mode theme across the application",
    "feat: Integrate user profile avatars",
    "fix: Resolve memory leak in data processing worker",
    "refactor: Migrate legacy API client to use async/await",
    "perf: Implement caching for frequently accessed product data",
    "feat: Enable OAuth login with Google and GitHub providers",
    "fix: Ensure proper error handling for external API timeouts",
    "test: Increase unit test coverage for payment module to 95%",
    "chore: Update build process to use esbuild for faster bundling",
    "feat: Implement real-time notifications with WebSockets",
    "fix: Prevent SQL injection vulnerability in search API",
];

/// Build the initial stage list for one run: every stage `Pending`, ids
/// assigned in order from 1, no diagnostic stages.
///
/// The Merge Conflict Check stage is included only when the settings ask
/// for it, giving a 10- or 9-stage catalog.
#[must_use]
pub fn initial_stages(settings: &PipelineSettings) -> Vec<PipelineStage> {
    let mut names = vec![StageName::ProjectSetup];
    if settings.merge_check {
        names.push(StageName::MergeCheck);
    }
    names.extend([
        StageName::SecurityScan,
        StageName::CodeAnalysis,
        StageName::TestGeneration,
        StageName::BuildAndTest,
        StageName::DeploymentStrategy,
        StageName::DeployToStaging,
        StageName::ReleaseNotes,
        StageName::DeployToProduction,
    ]);

    names
        .into_iter()
        .zip(1u32..)
        .map(|(name, id)| PipelineStage::new(id, name))
        .collect()
}

/// Whether the given project type is one of the accepted fixed set.
#[must_use]
pub fn is_known_project_type(project_type: &str) -> bool {
    PROJECT_TYPES.contains(&project_type)
}
