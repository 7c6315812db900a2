// ABOUTME: Ephemeral deploy-hook transaction for non-default-branch deployments.
// ABOUTME: Create, trigger, delete; a failed cleanup is its own surfaced error, never masked.

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use tracing::{debug, info, warn};

use crate::api::{Deployment, PagesApi};

use super::error::TrackError;

/// Globally unique hook name: a normalized timestamp plus a random suffix.
/// The name is what an operator greps for if cleanup ever fails.
pub fn hook_name(now: DateTime<Utc>) -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(|c| char::from(c).to_ascii_lowercase())
        .collect();
    format!("shipwatch-{}-{}", now.format("%Y%m%d%H%M%S"), suffix)
}

/// Deploy a non-production branch through a one-shot webhook.
///
/// The create endpoint only triggers production-branch builds directly, so
/// we create a uniquely named, branch-scoped hook, execute it (which
/// returns the new deployment's id), delete the hook, then fetch the full
/// deployment.
///
/// Not idempotent and never retried; at most one hook exists at a time.
/// If execution fails the hook is still deleted, and if THAT delete fails
/// the caller gets a distinct cleanup error naming the hook rather than
/// the original execution error.
pub async fn deploy_via_hook<A: PagesApi + ?Sized>(
    api: &A,
    branch: &str,
) -> Result<Deployment, TrackError> {
    let name = hook_name(Utc::now());
    info!("Creating one-shot deploy hook '{name}' for branch {branch}.");

    // Create failure needs no cleanup: nothing exists yet.
    let hook = api
        .create_hook(&name, branch)
        .await
        .map_err(|source| TrackError::Api { source })?;

    let executed = api.execute_hook(&hook.hook_id).await;

    debug!("deleting deploy hook '{name}'");
    let deleted = api.delete_hook(&hook.hook_id).await;

    if let Err(source) = deleted {
        if let Err(exec_err) = &executed {
            // Surfacing the cleanup failure wins; still record the trigger
            // failure it eclipses.
            warn!("deploy hook execution had already failed: {exec_err}");
        }
        return Err(TrackError::HookCleanup {
            hook_name: name,
            source,
        });
    }

    let execution = executed.map_err(|source| TrackError::Api { source })?;

    api.get_deployment_info(&execution.id)
        .await
        .map_err(|source| TrackError::Api { source })
}
