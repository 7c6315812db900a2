// ABOUTME: Per-stage state machine: Pending -> (optionally) LogGroupOpen -> Complete.
// ABOUTME: One log group per non-skipped stage, every line emitted exactly once.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::api::{ApiError, Deployment, PagesApi, StageName, StageStatus};
use crate::console::Console;
use crate::handlers::DeploymentHandlers;

use super::poll::{PollState, Poller};
use super::stage::{
    banner_lines, display_name, is_past_stage, is_queued_stage, is_stage_complete,
    is_stage_success,
};
use super::window::{PullCursor, SharedLogWindow};

/// Stage-completion timestamps can lag the log timestamps observed from
/// the API. Polling watermarks sit this far in the past so lines never
/// land in the wrong group, at the cost of running a few seconds behind.
const WATERMARK_SKEW_MS: i64 = 2500;

fn watermark_now() -> DateTime<Utc> {
    Utc::now() - chrono::Duration::milliseconds(WATERMARK_SKEW_MS)
}

/// How one tracked stage ended.
#[derive(Debug, Clone, PartialEq)]
pub struct StageOutcome {
    pub status: StageStatus,
    pub skipped: bool,
}

/// Drives a single stage to completion against the polling API.
pub struct StageTracker<'a> {
    api: &'a dyn PagesApi,
    console: &'a dyn Console,
    handlers: &'a dyn DeploymentHandlers,
    poller: &'a Poller,
}

impl<'a> StageTracker<'a> {
    pub fn new(
        api: &'a dyn PagesApi,
        console: &'a dyn Console,
        handlers: &'a dyn DeploymentHandlers,
        poller: &'a Poller,
    ) -> Self {
        Self {
            api,
            console,
            handlers,
            poller,
        }
    }

    /// Push-mode drive: poll the deployment snapshot while the shared
    /// window collects live log entries, flushing up to the watermark.
    ///
    /// Returns the freshest deployment snapshot once the stage is
    /// complete, skipped, or the anomaly guard fires.
    pub async fn track_stage(
        &self,
        name: &StageName,
        deployment: Deployment,
        window: &SharedLogWindow,
    ) -> Result<Deployment, ApiError> {
        let mut state = PollState::default();
        let mut current = deployment;
        let mut polled_at = watermark_now();

        loop {
            let Some(stage) = current.stages.iter().find(|s| &s.name == name).cloned() else {
                // The platform dropped the stage from the list. Nothing
                // left to observe.
                if state.group_started {
                    self.console.group_end();
                }
                return Ok(current);
            };

            let until = stage.ended_on.unwrap_or(polled_at);

            if state.poll_count == 0
                && is_queued_stage(&stage)
                && is_stage_success(&stage)
                && window.lock().peek(Some(until)) == 0
            {
                // Instantaneous queueing: no group, no callback.
                debug!("skipping {name}: already successful with no logs");
                return Ok(current);
            }

            if !state.stage_has_logs && window.lock().peek(Some(until)) > 0 {
                state.stage_has_logs = true;
            }

            if !state.change_reported && stage.started_on.is_some() {
                self.handlers.on_stage_change(name).await;
                state.change_reported = true;
            }

            if !state.group_started && stage.started_on.is_some() && state.stage_has_logs {
                self.console.group_start(display_name(name));
                if let Some(started) = stage.started_on {
                    debug!("{name} started on {started}");
                }
                state.group_started = true;
            }

            // The queued stage commonly produces zero log lines while
            // genuinely active: after more than one empty poll, believe it.
            if !state.group_started
                && stage.started_on.is_some()
                && !state.stage_has_logs
                && is_queued_stage(&stage)
                && state.poll_count > 1
            {
                self.console.group_start(display_name(name));
                self.console.line("Build is queued");
                state.group_started = true;
            }

            if state.group_started {
                for entry in window.lock().flush(Some(until)) {
                    self.console.line(&entry.message);
                }
            }

            let complete = is_stage_complete(&stage);
            let moved_past = Poller::should_check_past_stage(state.poll_count)
                && is_past_stage(&current, name);

            if complete || moved_past {
                if state.group_started {
                    if let Some(ended) = stage.ended_on {
                        debug!("{name} ended on {ended}");
                    }
                    self.console.group_end();
                }
                return Ok(current);
            }

            self.poller.wait_for(name).await;
            polled_at = watermark_now();
            current = self.api.get_deployment_info(&current.id).await?;
            state.poll_count += 1;
        }
    }

    /// Pull-mode drive: refetch the stage's full log snapshot each poll
    /// and emit only what the cursor has not seen.
    pub async fn track_stage_logs(
        &self,
        deployment_id: &str,
        name: &StageName,
    ) -> Result<StageOutcome, ApiError> {
        let mut snapshot = self.api.get_stage_logs(deployment_id, name).await?;

        if name == &StageName::Queued && snapshot.status.is_success() && snapshot.data.is_empty()
        {
            debug!("skipping {name}: already successful with no logs");
            return Ok(StageOutcome {
                status: snapshot.status,
                skipped: true,
            });
        }

        self.handlers.on_stage_change(name).await;
        self.console.group_start(display_name(name));
        for line in banner_lines(name) {
            self.console.line(line);
        }

        let mut cursor = PullCursor::new();
        let mut poll_count: u32 = 0;
        let mut moved_past = false;

        loop {
            for entry in cursor.new_since(&snapshot) {
                self.console.line(&entry.message);
            }

            if snapshot.status.is_complete() || moved_past {
                break;
            }

            self.poller.wait_for(name).await;
            cursor.advance(&snapshot);
            snapshot = self.api.get_stage_logs(deployment_id, name).await?;
            poll_count += 1;

            if Poller::should_check_past_stage(poll_count) {
                let info = self.api.get_deployment_info(deployment_id).await?;
                // Implicitly complete; no failure is synthesized.
                moved_past = is_past_stage(&info, name);
                if moved_past {
                    debug!("{name} never reached a terminal status but the deployment moved on");
                }
            }
        }

        self.console.group_end();
        Ok(StageOutcome {
            status: snapshot.status,
            skipped: false,
        })
    }
}
