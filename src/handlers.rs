// ABOUTME: Status-reporting sink invoked as the orchestration progresses.
// ABOUTME: All methods default to no-ops; implementations handle their own failures.

use async_trait::async_trait;

use crate::api::{Deployment, StageName};

/// Callbacks fired by the orchestrator. Each is awaited before the run
/// proceeds and never retried. Implementations must not fail the run;
/// report problems through logging instead.
#[async_trait]
pub trait DeploymentHandlers: Send + Sync {
    /// The deployment exists on the platform.
    async fn on_start(&self, _deployment: &Deployment) {}

    /// A stage was confirmed started. Fires exactly once per stage and
    /// never for skipped stages.
    async fn on_stage_change(&self, _stage: &StageName) {}

    /// The final stage ended in success.
    async fn on_success(&self) {}

    /// The run ended in a failed stage or an error.
    async fn on_failure(&self) {}
}

/// Handler set that does nothing.
#[derive(Debug, Default)]
pub struct NoopHandlers;

#[async_trait]
impl DeploymentHandlers for NoopHandlers {}
