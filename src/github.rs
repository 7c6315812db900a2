// ABOUTME: GitHub deployment-status sink: mirrors run progress onto a GitHub deployment.
// ABOUTME: Failures here are logged, never allowed to abort the tracked run.

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, warn};

use crate::api::{Deployment, StageName};
use crate::dashboard::dashboard_deployment_url;
use crate::handlers::DeploymentHandlers;

const GITHUB_API: &str = "https://api.github.com";

#[derive(Debug, Error)]
enum GithubError {
    #[error("[GitHub API error] status: {status}, message: {message}")]
    Status { status: u16, message: String },

    #[error("[GitHub API error] {0}")]
    Transport(#[from] reqwest::Error),
}

/// What we remember about the GitHub deployment created at `on_start`.
#[derive(Debug, Clone)]
struct TrackedDeployment {
    github_id: u64,
    owner: String,
    repo: String,
    environment: String,
    environment_url: String,
    log_url: String,
}

/// Reports run progress as a GitHub deployment plus deployment statuses.
pub struct GithubStatusSink {
    client: Client,
    base_url: String,
    token: String,
    account_id: String,
    tracked: Mutex<Option<TrackedDeployment>>,
}

impl GithubStatusSink {
    pub fn new(token: String, account_id: String) -> Self {
        Self::with_base_url(token, account_id, GITHUB_API)
    }

    pub fn with_base_url(token: String, account_id: String, base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            account_id,
            tracked: Mutex::new(None),
        }
    }

    async fn post(&self, path: &str, body: serde_json::Value) -> Result<u64, GithubError> {
        #[derive(Deserialize)]
        struct Created {
            id: u64,
        }

        let url = format!("{}{}", self.base_url, path);
        debug!("POST {path}");

        let response = self
            .client
            .post(&url)
            .header("Accept", "application/vnd.github+json")
            .header("Authorization", format!("Bearer {}", self.token))
            .header("User-Agent", "shipwatch")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() != 201 {
            let message = response.text().await.unwrap_or_default();
            return Err(GithubError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<Created>().await?.id)
    }

    async fn create_status(&self, state: &str, with_environment_url: bool) {
        let tracked = self.tracked.lock().clone();
        let Some(tracked) = tracked else {
            return;
        };

        let body = json!({
            "state": state,
            "log_url": tracked.log_url,
            "environment": tracked.environment,
            "environment_url": if with_environment_url {
                Some(tracked.environment_url.as_str())
            } else {
                None
            },
        });

        let path = format!(
            "/repos/{}/{}/deployments/{}/statuses",
            tracked.owner, tracked.repo, tracked.github_id
        );

        if let Err(e) = self.post(&path, body).await {
            warn!("could not update GitHub deployment status to '{state}': {e}");
        }
    }
}

/// Maps a pipeline stage to a GitHub deployment state, if it has one.
fn deploy_state_from_stage(stage: &StageName) -> Option<&'static str> {
    match stage {
        StageName::Queued => Some("queued"),
        StageName::Initialize => Some("in_progress"),
        _ => None,
    }
}

fn environment_label(environment: &str, branch: &str) -> String {
    if environment == "production" {
        "production".to_string()
    } else {
        format!("preview ({branch})")
    }
}

#[async_trait]
impl DeploymentHandlers for GithubStatusSink {
    async fn on_start(&self, deployment: &Deployment) {
        let owner = deployment.source.config.owner.clone();
        let repo = deployment.source.config.repo_name.clone();
        let production = deployment.environment == "production";
        let environment = environment_label(
            &deployment.environment,
            &deployment.deployment_trigger.metadata.branch,
        );
        let log_url = dashboard_deployment_url(
            &self.account_id,
            &deployment.project_name,
            Some(&deployment.id),
        );

        let body = json!({
            "ref": deployment.deployment_trigger.metadata.commit_hash,
            "task": "deploy",
            "environment": environment,
            "production_environment": production,
            "required_contexts": [],
        });

        match self.post(&format!("/repos/{owner}/{repo}/deployments"), body).await {
            Ok(github_id) => {
                *self.tracked.lock() = Some(TrackedDeployment {
                    github_id,
                    owner,
                    repo,
                    environment,
                    environment_url: deployment.url.clone(),
                    log_url,
                });
            }
            Err(e) => warn!("could not create GitHub deployment: {e}"),
        }
    }

    async fn on_stage_change(&self, stage: &StageName) {
        if let Some(state) = deploy_state_from_stage(stage) {
            self.create_status(state, false).await;
        }
    }

    async fn on_success(&self) {
        self.create_status("success", true).await;
    }

    async fn on_failure(&self) {
        self.create_status("failure", false).await;
    }
}
