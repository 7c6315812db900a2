// ABOUTME: Pages API collaborator trait and its reqwest-backed implementation.
// ABOUTME: Every call goes through one envelope-aware fetch helper with auth headers.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use super::error::ApiError;
use super::live::{self, LiveLogsHandle};
use super::types::{
    ApiEnvelope, DeployHook, Deployment, HookExecution, LogEntry, Project, StageLogs, StageName,
};

const DEFAULT_BASE_URL: &str = "https://api.cloudflare.com/client/v4";

/// Receives push-mode log entries as they arrive over the live connection.
pub type LogSink = Box<dyn Fn(LogEntry) + Send + Sync>;

/// The deployment API this tool observes. The pipeline itself runs on the
/// remote platform; everything here is a read or a trigger, never execution.
#[async_trait]
pub trait PagesApi: Send + Sync {
    async fn get_project(&self) -> Result<Project, ApiError>;

    /// Create a deployment. `None` targets the project's production branch;
    /// the endpoint cannot target other branches directly (see deploy hooks).
    async fn create_deployment(&self, branch: Option<&str>) -> Result<Deployment, ApiError>;

    async fn get_deployment_info(&self, id: &str) -> Result<Deployment, ApiError>;

    /// Fetch the full log history for one stage. There is no tail-only fetch.
    async fn get_stage_logs(&self, id: &str, stage: &StageName) -> Result<StageLogs, ApiError>;

    async fn create_hook(&self, name: &str, branch: &str) -> Result<DeployHook, ApiError>;

    async fn execute_hook(&self, hook_id: &str) -> Result<HookExecution, ApiError>;

    async fn delete_hook(&self, hook_id: &str) -> Result<(), ApiError>;

    /// Open the push-mode log connection for a deployment. Fails if the
    /// deployment is still queued; the platform rejects early subscriptions.
    async fn open_live_logs(&self, id: &str, on_log: LogSink)
    -> Result<LiveLogsHandle, ApiError>;
}

/// Credentials and addressing for one Pages project.
#[derive(Debug, Clone)]
pub struct PagesClientConfig {
    pub account_id: String,
    pub project_name: String,
    pub api_key: String,
    pub email: String,
}

/// reqwest-backed [`PagesApi`] implementation.
pub struct PagesClient {
    client: Client,
    base_url: String,
    config: PagesClientConfig,
}

impl PagesClient {
    pub fn new(config: PagesClientConfig) -> Result<Self, ApiError> {
        Self::with_base_url(config, DEFAULT_BASE_URL)
    }

    /// Point the client at a different API host, mainly for tests.
    pub fn with_base_url(
        config: PagesClientConfig,
        base_url: &str,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|source| ApiError::Transport {
                method: "INIT",
                path: String::new(),
                source,
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            config,
        })
    }

    fn project_path(&self, suffix: &str) -> String {
        format!(
            "/accounts/{}/pages/projects/{}{}",
            self.config.account_id, self.config.project_name, suffix
        )
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        method: &'static str,
        path: &str,
        form: Option<&[(&str, &str)]>,
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("{method} {path}");

        let mut request = match method {
            "POST" => self.client.post(&url),
            "DELETE" => self.client.delete(&url),
            _ => self.client.get(&url),
        };

        request = request
            .header("X-Auth-Key", &self.config.api_key)
            .header("X-Auth-Email", &self.config.email);

        if let Some(form) = form {
            request = request.form(form);
        }

        let response = request.send().await.map_err(|source| ApiError::Transport {
            method,
            path: path.to_string(),
            source,
        })?;

        let status = response.status();
        debug!("{method} {path} [{status}]");

        let envelope: ApiEnvelope<T> =
            response.json().await.map_err(|source| ApiError::Transport {
                method,
                path: path.to_string(),
                source,
            })?;

        if !envelope.success {
            return Err(ApiError::Platform {
                method,
                path: path.to_string(),
                status: status.as_u16(),
                errors: envelope.errors,
            });
        }

        envelope.result.ok_or_else(|| ApiError::Decode {
            method,
            path: path.to_string(),
            detail: "successful response with empty result".to_string(),
        })
    }

    /// Like [`Self::fetch`] but for endpoints whose envelope carries a null
    /// result on success (deletes).
    async fn fetch_no_content(&self, method: &'static str, path: &str) -> Result<(), ApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("{method} {path}");

        let mut request = match method {
            "POST" => self.client.post(&url),
            "DELETE" => self.client.delete(&url),
            _ => self.client.get(&url),
        };

        request = request
            .header("X-Auth-Key", &self.config.api_key)
            .header("X-Auth-Email", &self.config.email);

        let response = request.send().await.map_err(|source| ApiError::Transport {
            method,
            path: path.to_string(),
            source,
        })?;

        let status = response.status();
        let envelope: ApiEnvelope<serde_json::Value> =
            response.json().await.map_err(|source| ApiError::Transport {
                method,
                path: path.to_string(),
                source,
            })?;

        if !envelope.success {
            return Err(ApiError::Platform {
                method,
                path: path.to_string(),
                status: status.as_u16(),
                errors: envelope.errors,
            });
        }

        Ok(())
    }

    async fn post_body<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {path}");

        let response = self
            .client
            .post(&url)
            .header("X-Auth-Key", &self.config.api_key)
            .header("X-Auth-Email", &self.config.email)
            .json(body)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                method: "POST",
                path: path.to_string(),
                source,
            })?;

        let status = response.status();
        let envelope: ApiEnvelope<T> =
            response.json().await.map_err(|source| ApiError::Transport {
                method: "POST",
                path: path.to_string(),
                source,
            })?;

        if !envelope.success {
            return Err(ApiError::Platform {
                method: "POST",
                path: path.to_string(),
                status: status.as_u16(),
                errors: envelope.errors,
            });
        }

        envelope.result.ok_or_else(|| ApiError::Decode {
            method: "POST",
            path: path.to_string(),
            detail: "successful response with empty result".to_string(),
        })
    }
}

/// Response to the live-log token fetch.
#[derive(Debug, serde::Deserialize)]
struct LiveLogsToken {
    jwt: String,
}

#[async_trait]
impl PagesApi for PagesClient {
    async fn get_project(&self) -> Result<Project, ApiError> {
        self.fetch("GET", &self.project_path(""), None).await
    }

    async fn create_deployment(&self, branch: Option<&str>) -> Result<Deployment, ApiError> {
        let path = self.project_path("/deployments");
        match branch {
            None => {
                info!(
                    "Creating a deployment for the production branch of {}.",
                    self.config.project_name
                );
                self.fetch("POST", &path, None).await
            }
            Some(branch) => {
                info!("Creating a preview for branch {branch}.");
                self.fetch("POST", &path, Some(&[("branch", branch)])).await
            }
        }
    }

    async fn get_deployment_info(&self, id: &str) -> Result<Deployment, ApiError> {
        self.fetch("GET", &self.project_path(&format!("/deployments/{id}")), None)
            .await
    }

    async fn get_stage_logs(&self, id: &str, stage: &StageName) -> Result<StageLogs, ApiError> {
        let path = self.project_path(&format!("/deployments/{id}/history/{stage}/logs"));
        self.fetch("GET", &path, None).await
    }

    async fn create_hook(&self, name: &str, branch: &str) -> Result<DeployHook, ApiError> {
        let path = self.project_path("/deploy_hooks");
        self.post_body(&path, &serde_json::json!({ "name": name, "branch": branch }))
            .await
    }

    async fn execute_hook(&self, hook_id: &str) -> Result<HookExecution, ApiError> {
        let path = format!("/pages/webhooks/deploy_hooks/{hook_id}");
        self.fetch("POST", &path, None).await
    }

    async fn delete_hook(&self, hook_id: &str) -> Result<(), ApiError> {
        let path = self.project_path(&format!("/deploy_hooks/{hook_id}"));
        self.fetch_no_content("DELETE", &path).await
    }

    async fn open_live_logs(
        &self,
        id: &str,
        on_log: LogSink,
    ) -> Result<LiveLogsHandle, ApiError> {
        let token: LiveLogsToken = self
            .fetch("GET", &self.project_path(&format!("/deployments/{id}/live")), None)
            .await?;

        live::connect(&live::live_logs_url(&token.jwt), on_log).await
    }
}
