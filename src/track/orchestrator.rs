// ABOUTME: Top-level driver: create the deployment, walk its stages, classify the outcome.
// ABOUTME: One live-log connection per run, opened past queued, closed on every exit path.

use std::sync::Arc;

use tracing::debug;

use crate::api::{Deployment, LiveLogsHandle, PagesApi, StageName};
use crate::console::Console;
use crate::handlers::DeploymentHandlers;

use super::error::TrackError;
use super::hook;
use super::poll::Poller;
use super::tracker::StageTracker;
use super::window::{LogWindow, SharedLogWindow};

/// Which log-delivery mechanism drives a run. Exactly one per deployment;
/// the two are never combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogMode {
    /// Push: one websocket connection feeds a shared window for the whole
    /// run.
    #[default]
    Live,
    /// Pull: each stage's full log history is refetched every poll.
    Poll,
}

/// Drives a whole deployment to completion.
pub struct Orchestrator<'a> {
    api: &'a dyn PagesApi,
    console: &'a dyn Console,
    handlers: &'a dyn DeploymentHandlers,
    poller: Poller,
    mode: LogMode,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        api: &'a dyn PagesApi,
        console: &'a dyn Console,
        handlers: &'a dyn DeploymentHandlers,
        poller: Poller,
        mode: LogMode,
    ) -> Self {
        Self {
            api,
            console,
            handlers,
            poller,
            mode,
        }
    }

    /// Create a deployment for `branch` (production when `None`) and track
    /// it to its terminal state.
    ///
    /// A failed stage is a normal return: the caller inspects
    /// `latest_stage`. Remote-call failures come back as a
    /// [`TrackError::Deployment`] carrying the last-known snapshot.
    pub async fn run(&self, branch: Option<&str>) -> Result<Deployment, TrackError> {
        let deployment = self.create(branch).await?;
        debug!("deployment {} created for {}", deployment.id, deployment.project_name);

        self.handlers.on_start(&deployment).await;

        let result = match self.mode {
            LogMode::Live => self.run_live(deployment).await,
            LogMode::Poll => self.run_poll(deployment).await,
        };

        match &result {
            Ok(d) if d.latest_stage.as_ref().is_some_and(|s| s.status.is_success()) => {
                self.handlers.on_success().await;
            }
            _ => self.handlers.on_failure().await,
        }

        result
    }

    /// The create endpoint only triggers production-branch builds; any
    /// other branch goes through the one-shot deploy hook transaction.
    async fn create(&self, branch: Option<&str>) -> Result<Deployment, TrackError> {
        let Some(branch) = branch else {
            return self
                .api
                .create_deployment(None)
                .await
                .map_err(|source| TrackError::Api { source });
        };

        let project = self
            .api
            .get_project()
            .await
            .map_err(|source| TrackError::Api { source })?;

        if project.production_branch() == branch {
            self.api
                .create_deployment(None)
                .await
                .map_err(|source| TrackError::Api { source })
        } else {
            hook::deploy_via_hook(self.api, branch).await
        }
    }

    async fn run_live(&self, mut deployment: Deployment) -> Result<Deployment, TrackError> {
        let window = LogWindow::shared();
        let mut live: Option<LiveLogsHandle> = None;
        let tracker = StageTracker::new(self.api, self.console, self.handlers, &self.poller);

        let result = self
            .drive_live(&mut deployment, &window, &mut live, &tracker)
            .await;

        // Both exit paths share this: drain the window, close the
        // connection. Close is idempotent and safe on a dead connection.
        for entry in window.lock().flush(None) {
            self.console.line(&entry.message);
        }
        if let Some(mut handle) = live.take() {
            handle.close().await;
        }

        match result {
            Ok(()) => Ok(deployment),
            Err(source) => Err(TrackError::Deployment {
                deployment: Box::new(deployment),
                source,
            }),
        }
    }

    async fn drive_live(
        &self,
        deployment: &mut Deployment,
        window: &SharedLogWindow,
        live: &mut Option<LiveLogsHandle>,
        tracker: &StageTracker<'_>,
    ) -> Result<(), crate::api::ApiError> {
        let stage_names: Vec<StageName> =
            deployment.stages.iter().map(|s| s.name.clone()).collect();

        for name in stage_names {
            // The live endpoint rejects subscriptions while still queued,
            // so the one connection opens at the first later stage.
            if live.is_none() && name != StageName::Queued {
                let sink = Arc::clone(window);
                let handle = self
                    .api
                    .open_live_logs(
                        &deployment.id,
                        Box::new(move |entry| sink.lock().enqueue(entry)),
                    )
                    .await?;
                *live = Some(handle);
            }

            *deployment = tracker
                .track_stage(&name, deployment.clone(), window)
                .await?;

            // Stages after a failure never run.
            if deployment
                .latest_stage
                .as_ref()
                .is_some_and(|s| s.status.is_failure())
            {
                break;
            }
        }

        Ok(())
    }

    async fn run_poll(&self, deployment: Deployment) -> Result<Deployment, TrackError> {
        let tracker = StageTracker::new(self.api, self.console, self.handlers, &self.poller);
        let stage_names: Vec<StageName> =
            deployment.stages.iter().map(|s| s.name.clone()).collect();

        for name in &stage_names {
            match tracker.track_stage_logs(&deployment.id, name).await {
                Ok(outcome) => {
                    if outcome.status.is_failure() {
                        break;
                    }
                }
                Err(source) => {
                    return Err(TrackError::Deployment {
                        deployment: Box::new(deployment),
                        source,
                    });
                }
            }
        }

        self.api
            .get_deployment_info(&deployment.id)
            .await
            .map_err(|source| TrackError::Deployment {
                deployment: Box::new(deployment.clone()),
                source,
            })
    }
}
