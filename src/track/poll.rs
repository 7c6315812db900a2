// ABOUTME: Polling pacing: per-stage wait intervals, env overrides, and guard cadence.
// ABOUTME: Overrides exist mainly so tests can collapse the loop to tight polling.

use std::collections::HashMap;
use std::time::Duration;

use tracing::warn;

use crate::api::StageName;

/// Cross-check `latest_stage` against the tracked stage every this many
/// polls. Bounds the worst case to one stale stage's worth of extra polls.
pub const PAST_STAGE_CHECK_EVERY: u32 = 5;

/// Fallback wait for stage names we have no default for.
const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

/// Per-stage state for one tracked stage. Created at stage entry,
/// discarded at stage exit.
#[derive(Debug, Default)]
pub struct PollState {
    pub poll_count: u32,
    pub group_started: bool,
    pub stage_has_logs: bool,
    pub change_reported: bool,
}

/// Resolved wait intervals, one per known stage.
#[derive(Debug, Clone)]
pub struct PollIntervals {
    per_stage: HashMap<StageName, Duration>,
}

impl PollIntervals {
    /// Built-in defaults: slow stages wait longer between polls.
    pub fn defaults() -> Self {
        let mut per_stage = HashMap::new();
        per_stage.insert(StageName::Queued, Duration::from_secs(15));
        per_stage.insert(StageName::Initialize, Duration::from_secs(15));
        per_stage.insert(StageName::Build, Duration::from_secs(15));
        per_stage.insert(StageName::CloneRepo, Duration::from_secs(5));
        per_stage.insert(StageName::Deploy, Duration::from_secs(5));
        Self { per_stage }
    }

    /// Defaults plus `SHIPWATCH_POLL_<STAGE>_MS` overrides, read once.
    /// Invalid values are ignored with a warning.
    pub fn from_env() -> Self {
        let mut intervals = Self::defaults();

        for name in StageName::KNOWN {
            let var = override_var(&name);
            let Ok(raw) = std::env::var(&var) else {
                continue;
            };
            match raw.parse::<u64>() {
                Ok(ms) => {
                    intervals
                        .per_stage
                        .insert(name, Duration::from_millis(ms));
                }
                Err(_) => {
                    warn!("ignoring {var}={raw}: not a number of milliseconds");
                }
            }
        }

        intervals
    }

    /// Zero waits everywhere. Collapses the poll loop for tests.
    pub fn zero() -> Self {
        let per_stage = StageName::KNOWN
            .into_iter()
            .map(|name| (name, Duration::ZERO))
            .collect();
        Self { per_stage }
    }

    pub fn interval_for(&self, name: &StageName) -> Duration {
        self.per_stage.get(name).copied().unwrap_or(DEFAULT_INTERVAL)
    }
}

fn override_var(name: &StageName) -> String {
    format!(
        "SHIPWATCH_POLL_{}_MS",
        name.as_str().to_ascii_uppercase()
    )
}

/// Paces the repeat-fetch loop. The loop itself lives in the tracker; the
/// poller only decides how long to wait and when the anomaly guard runs.
#[derive(Debug, Clone)]
pub struct Poller {
    intervals: PollIntervals,
}

impl Poller {
    pub fn new(intervals: PollIntervals) -> Self {
        Self { intervals }
    }

    /// Sleep out the configured interval for `name`, returning how long
    /// was waited.
    pub async fn wait_for(&self, name: &StageName) -> Duration {
        let interval = self.intervals.interval_for(name);
        if !interval.is_zero() {
            tokio::time::sleep(interval).await;
        }
        interval
    }

    /// Whether the `latest_stage` cross-check runs on this poll.
    pub fn should_check_past_stage(poll_count: u32) -> bool {
        poll_count > 0 && poll_count.is_multiple_of(PAST_STAGE_CHECK_EVERY)
    }
}
